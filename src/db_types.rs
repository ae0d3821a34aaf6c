use crate::vapi_types::VapiCall;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::time::OffsetDateTime;
use sqlx::FromRow;

#[derive(Serialize, Deserialize, FromRow, Clone, Debug, PartialEq)]
pub struct Order {
    pub id: i32,
    pub customer_name: String,
    pub phone_number: String,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_color: String,
    pub store_name: String,
    pub order_number: String,
    pub items: Value,
    pub success_evaluation: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Order {
    /// The items payload as the text handed to the assistant.
    pub fn items_text(&self) -> String {
        match &self.items {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Request body for creating an order; everything except the generated fields.
#[derive(Deserialize, Clone, Debug)]
pub struct NewOrder {
    pub customer_name: String,
    pub phone_number: String,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_color: String,
    pub store_name: String,
    pub order_number: String,
    pub items: Value,
}

#[derive(Serialize, Deserialize, FromRow, Clone, Debug, PartialEq)]
pub struct Call {
    pub call_id: String,
    pub order_id: i32,
    pub assistant_id: Option<String>,
    pub phone_number_id: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub call_type: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    pub org_id: Option<String>,
    pub cost: f64,
    pub customer_number: Option<String>,
    pub status: Option<String>,
    pub phone_call_provider: Option<String>,
    pub phone_call_provider_id: Option<String>,
    pub phone_call_transport: Option<String>,
    pub assistant_overrides: Option<Value>,
    pub monitor_data: Option<Value>,
}

impl Call {
    /// Build the row recorded for `order_id` from the provider's freshly created call.
    pub fn from_vapi(order_id: i32, call: VapiCall) -> Self {
        Self {
            call_id: call.id,
            order_id,
            assistant_id: call.assistant_id,
            phone_number_id: call.phone_number_id,
            call_type: call.call_type,
            created_at: call.created_at.unwrap_or_else(OffsetDateTime::now_utc),
            updated_at: call.updated_at,
            org_id: call.org_id,
            cost: call.cost.unwrap_or(0.0),
            customer_number: call.customer.and_then(|c| c.number),
            status: call.status,
            phone_call_provider: call.phone_call_provider,
            phone_call_provider_id: call.phone_call_provider_id,
            phone_call_transport: call.phone_call_transport,
            assistant_overrides: call.assistant_overrides,
            monitor_data: call.monitor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn call_row_from_provider_call() {
        let vapi: VapiCall = serde_json::from_value(json!({
            "id": "call-1",
            "assistantId": "asst",
            "phoneNumberId": "pn",
            "type": "outboundPhoneCall",
            "createdAt": "2025-01-02T03:04:05Z",
            "orgId": "org",
            "customer": {"number": "555"},
            "status": "queued",
            "phoneCallProvider": "twilio",
            "phoneCallTransport": "pstn",
            "assistantOverrides": {"variableValues": {"customer_name": "A"}},
            "monitor": {"listenUrl": "wss://x"}
        }))
        .unwrap();

        let call = Call::from_vapi(7, vapi);
        assert_eq!(call.call_id, "call-1");
        assert_eq!(call.order_id, 7);
        assert_eq!(call.cost, 0.0);
        assert_eq!(call.customer_number.as_deref(), Some("555"));
        assert_eq!(call.created_at.unix_timestamp(), 1_735_787_045);
        assert_eq!(call.monitor_data, Some(json!({"listenUrl": "wss://x"})));

        let rendered = serde_json::to_value(&call).unwrap();
        assert_eq!(rendered["type"], "outboundPhoneCall");
        assert_eq!(rendered["created_at"], "2025-01-02T03:04:05Z");
        assert!(rendered["updated_at"].is_null());
    }

    #[test]
    fn items_text_passes_strings_through() {
        let mut order = Order {
            id: 1,
            customer_name: "A".into(),
            phone_number: "555".into(),
            vehicle_make: "Ford".into(),
            vehicle_model: "F150".into(),
            vehicle_color: "Red".into(),
            store_name: "S".into(),
            order_number: "42".into(),
            items: json!("2x filter"),
            success_evaluation: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        assert_eq!(order.items_text(), "2x filter");

        order.items = json!(["filter", "wipers"]);
        assert_eq!(order.items_text(), r#"["filter","wipers"]"#);
    }
}
