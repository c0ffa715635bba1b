pub mod config;
pub mod cra;
pub mod error;
pub mod telemetry;
