//! Repair order audit events.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Metadata key for an authorized amount.
pub const AMOUNT: &str = "amount";
/// Metadata key for the authorization version.
pub const VERSION: &str = "version";
/// Metadata key for the total real cost at completion time.
pub const TOTAL_REAL: &str = "total_real";
/// Metadata key for the reauthorization limit.
pub const LIMIT: &str = "limit";
/// Metadata key for a cancellation reason.
pub const REASON: &str = "reason";

/// The transitions that get recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Diagnosed,
    Authorized,
    InProgress,
    WaitingForApproval,
    Completed,
    Reauthorized,
    Delivered,
    Cancelled,
}

impl EventType {
    /// Returns the event type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Diagnosed => "DIAGNOSED",
            EventType::Authorized => "AUTHORIZED",
            EventType::InProgress => "IN_PROGRESS",
            EventType::WaitingForApproval => "WAITING_FOR_APPROVAL",
            EventType::Completed => "COMPLETED",
            EventType::Reauthorized => "REAUTHORIZED",
            EventType::Delivered => "DELIVERED",
            EventType::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single metadata value.
///
/// Tagged so an amount never comes back as text (or the other way round)
/// after a serialization round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MetadataValue {
    Amount(Decimal),
    Integer(u64),
    Text(String),
}

impl MetadataValue {
    pub fn as_amount(&self) -> Option<Decimal> {
        match self {
            MetadataValue::Amount(amount) => Some(*amount),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<u64> {
        match self {
            MetadataValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataValue::Amount(amount) => write!(f, "{amount}"),
            MetadataValue::Integer(n) => write!(f, "{n}"),
            MetadataValue::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<Decimal> for MetadataValue {
    fn from(amount: Decimal) -> Self {
        MetadataValue::Amount(amount)
    }
}

impl From<u64> for MetadataValue {
    fn from(n: u64) -> Self {
        MetadataValue::Integer(n)
    }
}

impl From<u32> for MetadataValue {
    fn from(n: u32) -> Self {
        MetadataValue::Integer(u64::from(n))
    }
}

impl From<String> for MetadataValue {
    fn from(text: String) -> Self {
        MetadataValue::Text(text)
    }
}

impl From<&str> for MetadataValue {
    fn from(text: &str) -> Self {
        MetadataValue::Text(text.to_string())
    }
}

/// Event metadata, keyed by name. Ordered so serialized events are stable.
pub type EventMetadata = BTreeMap<String, MetadataValue>;

/// An immutable audit record of one lifecycle transition.
///
/// Only the order creates events; there is no way to change one after
/// the fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    event_type: EventType,
    occurred_at: DateTime<Utc>,
    #[serde(default)]
    metadata: EventMetadata,
}

impl Event {
    pub(crate) fn new(
        event_type: EventType,
        occurred_at: DateTime<Utc>,
        metadata: EventMetadata,
    ) -> Self {
        Self {
            event_type,
            occurred_at,
            metadata,
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// When the order recorded the transition.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    /// Looks up a metadata value by key.
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.metadata.get(key)
    }
}

/// Builds an [`EventMetadata`] from `key => value` pairs.
macro_rules! metadata {
    () => {
        $crate::order::events::EventMetadata::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut metadata = $crate::order::events::EventMetadata::new();
        $(
            metadata.insert(
                ($key).to_string(),
                $crate::order::events::MetadataValue::from($value),
            );
        )+
        metadata
    }};
}

pub(crate) use metadata;

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_event_type_names() {
        assert_eq!(EventType::WaitingForApproval.as_str(), "WAITING_FOR_APPROVAL");
        assert_eq!(
            serde_json::to_string(&EventType::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
    }

    #[test]
    fn test_metadata_macro() {
        let metadata = metadata! { AMOUNT => dec!(1160.00), VERSION => 1u32 };
        assert_eq!(metadata[AMOUNT].as_amount(), Some(dec!(1160.00)));
        assert_eq!(metadata[VERSION].as_integer(), Some(1));
        assert!(metadata!().is_empty());
    }

    #[test]
    fn test_event_serialization_keeps_value_kinds() {
        let at = Utc.with_ymd_and_hms(2024, 5, 2, 14, 30, 0).unwrap();
        let event = Event::new(
            EventType::Cancelled,
            at,
            metadata! { REASON => "100", AMOUNT => dec!(100) },
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "CANCELLED");
        assert_eq!(json["metadata"]["reason"]["kind"], "text");

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.get(REASON).and_then(MetadataValue::as_text), Some("100"));
        assert_eq!(back.occurred_at(), at);
    }
}
