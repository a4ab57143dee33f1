pub mod builder;
pub mod control;
pub mod engine;
pub mod map;
pub mod metrics;
pub mod sequencer;
pub mod shell;
