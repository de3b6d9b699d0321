use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// Webhook payload sent to subscribers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookPayload {
    pub event: String,

    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,

    pub data: Map<String, Value>,
}

impl WebhookPayload {
    /// Create a payload stamped with the current time
    pub fn new(event: impl Into<String>, data: Map<String, Value>) -> Self {
        Self::with_timestamp(event, OffsetDateTime::now_utc(), data)
    }

    pub fn with_timestamp(
        event: impl Into<String>,
        timestamp: OffsetDateTime,
        data: Map<String, Value>,
    ) -> Self {
        Self {
            event: event.into(),
            timestamp,
            data,
        }
    }

    /// Serialize once into the bytes that are both signed and sent
    pub fn to_bytes(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }
}

/// Outcome of a single delivery attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered {
        status_code: u16,
        response_time_ms: u64,
    },

    Failed {
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
        error: String,
    },
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

/// Per-subscription result collected by the dispatcher. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryReport {
    pub subscription_id: String,

    pub url: String,

    pub outcome: DeliveryOutcome,
}

/// Aggregate of one dispatch call
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchSummary {
    pub event: String,

    pub reports: Vec<DeliveryReport>,
}

impl DispatchSummary {
    pub fn attempted(&self) -> usize {
        self.reports.len()
    }

    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    /// Report for a given subscription, if one was attempted
    pub fn report_for(&self, subscription_id: &str) -> Option<&DeliveryReport> {
        self.reports
            .iter()
            .find(|r| r.subscription_id == subscription_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn data(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_payload_wire_shape() -> Result<(), serde_json::Error> {
        let payload = WebhookPayload::with_timestamp(
            "order.paid",
            datetime!(2024-03-01 12:30:00 UTC),
            data(json!({"order_id": "ord-1", "total": 42.5})),
        );

        let value: Value = serde_json::from_slice(&payload.to_bytes()?)?;

        assert_eq!(value["event"], "order.paid");
        assert_eq!(value["timestamp"], "2024-03-01T12:30:00Z");
        assert_eq!(value["data"]["order_id"], "ord-1");
        assert_eq!(value.as_object().map(|o| o.len()), Some(3));
        Ok(())
    }

    #[test]
    fn test_payload_timestamp_is_generated() {
        let before = OffsetDateTime::now_utc();
        let payload = WebhookPayload::new("stock.low", Map::new());

        assert!(payload.timestamp >= before);
    }

    #[test]
    fn test_delivery_outcome_serialization() -> Result<(), serde_json::Error> {
        let delivered = DeliveryOutcome::Delivered {
            status_code: 200,
            response_time_ms: 12,
        };
        let failed = DeliveryOutcome::Failed {
            status_code: None,
            error: "connection refused".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&delivered)?,
            json!({"status": "delivered", "status_code": 200, "response_time_ms": 12})
        );
        assert_eq!(
            serde_json::to_value(&failed)?,
            json!({"status": "failed", "error": "connection refused"})
        );
        Ok(())
    }

    #[test]
    fn test_summary_counts() {
        let summary = DispatchSummary {
            event: "order.paid".to_string(),
            reports: vec![
                DeliveryReport {
                    subscription_id: "a".to_string(),
                    url: "https://a.example".to_string(),
                    outcome: DeliveryOutcome::Delivered {
                        status_code: 204,
                        response_time_ms: 3,
                    },
                },
                DeliveryReport {
                    subscription_id: "b".to_string(),
                    url: "https://b.example".to_string(),
                    outcome: DeliveryOutcome::Failed {
                        status_code: Some(500),
                        error: "boom".to_string(),
                    },
                },
            ],
        };

        assert_eq!(summary.attempted(), 2);
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 1);
        assert!(summary.report_for("b").is_some());
        assert!(summary.report_for("c").is_none());
    }
}
