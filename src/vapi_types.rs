use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// Variables substituted into the assistant's prompt templates.
#[derive(Serialize, Debug, PartialEq)]
pub struct VariableValues {
    pub customer_name: String,
    pub store_name: String,
    pub order_number: String,
    pub order_items: String,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_color: String,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssistantOverrides {
    pub variable_values: VariableValues,
}

#[derive(Serialize, Deserialize, Clone, Default, Debug, PartialEq)]
pub struct CallCustomer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
}

/// Body of `POST /call`.
#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateCallPayload {
    pub assistant_id: String,
    pub phone_number_id: String,
    pub customer: CallCustomer,
    pub assistant_overrides: AssistantOverrides,
}

/// The subset of the Vapi call object that we persist.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VapiCall {
    pub id: String,
    #[serde(default)]
    pub assistant_id: Option<String>,
    #[serde(default)]
    pub phone_number_id: Option<String>,
    #[serde(default, rename = "type")]
    pub call_type: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub customer: Option<CallCustomer>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub phone_call_provider: Option<String>,
    #[serde(default)]
    pub phone_call_provider_id: Option<String>,
    #[serde(default)]
    pub phone_call_transport: Option<String>,
    #[serde(default)]
    pub assistant_overrides: Option<Value>,
    #[serde(default)]
    pub monitor: Option<Value>,
}

/// Read `analysis.successEvaluation` out of a raw call object.
///
/// Vapi reports the evaluation as a string, boolean or number depending on the rubric the
/// assistant uses.  Only truthy values count: `false`, `0`, `""` and `null` mean no evaluation.
/// Everything else is stored in its JSON text form.
pub fn success_evaluation(call: &Value) -> Option<String> {
    match call.get("analysis")?.get("successEvaluation")? {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}
