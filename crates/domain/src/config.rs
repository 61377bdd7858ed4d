use std::env;

/// DynamoDB table names, overridable through the environment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableNames {
    pub event_log: String,
    pub event_snapshots: String,
    pub dispenses_view: String,
    pub patients: String,
    pub appointments: String,
    pub medicines: String,
    pub medical_records: String,
}

impl TableNames {
    pub fn from_env() -> Self {
        Self {
            event_log: var_or("DYNAMODB_EVENT_LOG_TABLE", "dispensary-event-log"),
            event_snapshots: var_or("DYNAMODB_EVENT_SNAPSHOTS_TABLE", "dispensary-event-snapshots"),
            dispenses_view: var_or("DYNAMODB_DISPENSES_VIEW_TABLE", "dispensary-dispenses-view"),
            patients: var_or("DYNAMODB_PATIENTS_TABLE", "clinic-patients"),
            appointments: var_or("DYNAMODB_APPOINTMENTS_TABLE", "clinic-appointments"),
            medicines: var_or("DYNAMODB_MEDICINES_TABLE", "pharmacy-medicines"),
            medical_records: var_or("DYNAMODB_MEDICAL_RECORDS_TABLE", "clinic-medical-records"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub tables: TableNames,
    /// Events between aggregate snapshots.
    pub snapshot_size: usize,
}

impl Config {
    pub const DEFAULT_SNAPSHOT_SIZE: usize = 5;

    pub fn from_env() -> Self {
        Self {
            tables: TableNames::from_env(),
            snapshot_size: parse_snapshot_size(env::var("DISPENSARY_SNAPSHOT_SIZE").ok().as_deref()),
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or(default.to_string())
}

fn parse_snapshot_size(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse().ok())
        .filter(|size| *size > 0)
        .unwrap_or(Config::DEFAULT_SNAPSHOT_SIZE)
}
