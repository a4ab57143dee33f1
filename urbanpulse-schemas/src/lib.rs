//! Wire and file data model shared by the UrbanPulse dashboard crates.

pub mod camera;
pub mod file_formats;
pub mod geojson;
pub mod layer;
pub mod simulation;
