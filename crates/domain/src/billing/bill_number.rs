use chrono::{DateTime, Utc};
use ulid::Ulid;

const SUFFIX_LEN: usize = 4;
const FRAGMENT_MODULUS: i64 = 1_000_000;

/// Where the trailing segment of a bill number comes from.
#[derive(Clone, Copy, Debug)]
pub enum BillSuffix<'a> {
    /// Random characters, used when the bill is opened.
    Random,
    /// Tail of the dispense id, used when a bill is numbered on payment.
    FromId(&'a str),
}

/// `YYYYMMDD-<last 6 digits of the epoch millis>-<suffix>`.
///
/// Collisions are possible but require the same day, the same millisecond
/// fragment and the same suffix.
pub struct BillNumber;

impl BillNumber {
    pub fn generate(now: DateTime<Utc>, suffix: BillSuffix<'_>) -> String {
        let fragment = now.timestamp_millis().rem_euclid(FRAGMENT_MODULUS);
        let suffix = match suffix {
            BillSuffix::Random => tail(&Ulid::new().to_string(), SUFFIX_LEN),
            BillSuffix::FromId(id) => tail(id, SUFFIX_LEN),
        };

        format!("{}-{:06}-{}", now.format("%Y%m%d"), fragment, suffix.to_uppercase())
    }
}

fn tail(value: &str, len: usize) -> String {
    let skip = value.chars().count().saturating_sub(len);
    value.chars().skip(skip).collect()
}
