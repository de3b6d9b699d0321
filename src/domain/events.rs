use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Business events raised by the POS back office that external systems can
/// subscribe to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event_type", content = "payload")]
pub enum PosEvent {
    // Sales
    OrderPaid(OrderPaidEvent),
    OrderRefunded(OrderRefundedEvent),

    // Inventory
    StockLow(StockLevelEvent),
    StockOut(StockLevelEvent),

    // Attendance
    AttendanceClockIn(AttendanceEvent),
    AttendanceClockOut(AttendanceEvent),

    // Purchasing
    PurchaseOrderCreated(PurchaseOrderEvent),
    PurchaseOrderReceived(PurchaseOrderEvent),

    // Customers
    CustomerCreated(CustomerCreatedEvent),
}

impl PosEvent {
    /// Dot-case name used by webhook subscriptions
    pub fn event_name(&self) -> &'static str {
        match self {
            PosEvent::OrderPaid(_) => "order.paid",
            PosEvent::OrderRefunded(_) => "order.refunded",
            PosEvent::StockLow(_) => "stock.low",
            PosEvent::StockOut(_) => "stock.out",
            PosEvent::AttendanceClockIn(_) => "attendance.clock_in",
            PosEvent::AttendanceClockOut(_) => "attendance.clock_out",
            PosEvent::PurchaseOrderCreated(_) => "purchase_order.created",
            PosEvent::PurchaseOrderReceived(_) => "purchase_order.received",
            PosEvent::CustomerCreated(_) => "customer.created",
        }
    }

    /// The event body as a JSON object, as it appears under `data`
    pub fn data(&self) -> Result<Map<String, Value>, serde_json::Error> {
        let value = match self {
            PosEvent::OrderPaid(e) => serde_json::to_value(e),
            PosEvent::OrderRefunded(e) => serde_json::to_value(e),
            PosEvent::StockLow(e) | PosEvent::StockOut(e) => serde_json::to_value(e),
            PosEvent::AttendanceClockIn(e) | PosEvent::AttendanceClockOut(e) => {
                serde_json::to_value(e)
            }
            PosEvent::PurchaseOrderCreated(e) | PosEvent::PurchaseOrderReceived(e) => {
                serde_json::to_value(e)
            }
            PosEvent::CustomerCreated(e) => serde_json::to_value(e),
        }?;

        Ok(match value {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        })
    }
}

// ============================================================================
// Sales
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderPaidEvent {
    pub order_id: String,
    pub customer_id: Option<String>,
    pub total: f64,
    pub payment_method: String,
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRefundedEvent {
    pub order_id: String,
    pub amount: f64,
    pub reason: Option<String>,
}

// ============================================================================
// Inventory
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockLevelEvent {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub threshold: i64,
}

// ============================================================================
// Attendance
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceEvent {
    pub employee_id: String,
    pub attendance_id: String,
}

// ============================================================================
// Purchasing & customers
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PurchaseOrderEvent {
    pub purchase_order_id: String,
    pub supplier_id: String,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerCreatedEvent {
    pub customer_id: String,
    pub name: String,
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock_low() -> PosEvent {
        PosEvent::StockLow(StockLevelEvent {
            product_id: "prod-1".to_string(),
            product_name: "Espresso beans".to_string(),
            quantity: 3,
            threshold: 5,
        })
    }

    #[test]
    fn test_event_names() {
        assert_eq!(stock_low().event_name(), "stock.low");
        assert_eq!(
            PosEvent::AttendanceClockIn(AttendanceEvent {
                employee_id: "emp-1".to_string(),
                attendance_id: "att-1".to_string(),
            })
            .event_name(),
            "attendance.clock_in"
        );
    }

    #[test]
    fn test_data_is_inner_payload() -> Result<(), serde_json::Error> {
        let data = stock_low().data()?;

        assert_eq!(data["product_id"], "prod-1");
        assert_eq!(data["quantity"], 3);
        assert!(!data.contains_key("event_type"));
        Ok(())
    }

    #[test]
    fn test_event_serialization_is_tagged() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(stock_low())?;

        assert_eq!(json["event_type"], "StockLow");
        assert_eq!(json["payload"]["threshold"], 5);
        Ok(())
    }
}
