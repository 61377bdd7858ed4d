//! Dispensary domain: pharmacy dispensing and billing

/// Line items, totals and bill numbers
pub mod billing;

/// Clinic stores the dispensary reads and writes
pub mod clinic;

/// Environment configuration
pub mod config;

/// Dispense aggregate
pub mod dispenses;

/// Domain errors
pub mod errors;

pub use config::Config;
pub use errors::Error;
