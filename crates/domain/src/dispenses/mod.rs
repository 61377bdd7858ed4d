/// Dispense aggregate
pub mod aggregate;

/// Commands
pub mod commands;

/// Events
pub mod events;

/// Input DTOs
pub mod inputs;

/// Patient/appointment resolution for new dispenses
pub mod resolver;

/// Read model
pub mod view;

/// Stock decrement after a dispense
pub mod stock;

/// Appointment status after a dispense
pub mod appointment_marker;

/// Draft items from prescriptions
pub mod prefill;

/// Operations facade
pub mod service;

/// DynamoDB read model store
pub mod dynamo;

/// CQRS setup
pub mod cqrs;

pub use aggregate::{Dispense, Services, AGGREGATE_TYPE};
pub use commands::Command;
pub use events::Event;
pub use prefill::PrefillTarget;
pub use resolver::DispenseIdentity;
pub use service::Dispensary;
pub use view::{DispenseDetails, DispenseFilter, DispenseViewStore};
