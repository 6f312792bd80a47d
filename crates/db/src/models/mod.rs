mod assignment;
mod broadcast;
mod match_result;
mod season;

pub use assignment::*;
pub use broadcast::*;
pub use match_result::*;
pub use season::*;

use chrono::{DateTime, Utc};

pub(crate) fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}

pub(crate) fn datetime_to_timestamp(dt: DateTime<Utc>) -> i64 {
    dt.timestamp()
}
