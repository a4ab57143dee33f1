//! View model and backend client for the UrbanPulse scenario dashboard.

pub mod cameras;
pub mod dashboard;
pub mod diagnostics;
pub mod error;
pub mod transport;
