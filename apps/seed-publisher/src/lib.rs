pub mod cli;
pub mod config;
pub mod publisher;
pub mod telemetry;
