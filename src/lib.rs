pub mod aggregate;
pub mod config;
pub mod error;
pub mod probe;
pub mod report;
pub mod worker;

pub use aggregate::{CycleReport, Tally, extract_domain, run_cycle};
pub use config::{Config, Endpoint, Settings};
pub use error::Error;
pub use probe::{HttpProber, Outcome, Probe, classify};
pub use report::calculate_availability;
pub use worker::Monitor;
