use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A business-system record: field name to JSON value.
///
/// Records cross the `DataStore` and `EntityGateway` seams in this shape;
/// the engine never assumes a schema beyond the fields a template or
/// action names.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Epoch-seconds timestamp for stored instants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }

    /// Midnight UTC of the day containing this instant.
    pub fn day_start(&self) -> Self {
        Self(self.0 - self.0.rem_euclid(86400))
    }
}
