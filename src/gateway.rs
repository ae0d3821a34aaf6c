use crate::db_types::Order;
use crate::error::GatewayError;
use crate::vapi_types::{
    AssistantOverrides, CallCustomer, CreateCallPayload, VapiCall, VariableValues,
};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error};

/// Outbound voice-call provider.  One attempt per call; errors go straight back to the caller.
#[async_trait]
pub trait CallGateway: Send + Sync {
    /// Place a call to the order's customer.
    async fn initiate(&self, order: &Order) -> Result<VapiCall, GatewayError>;

    /// The provider's current view of a call, verbatim.
    async fn fetch_details(&self, call_id: &str) -> Result<Value, GatewayError>;
}

pub struct VapiClient {
    http_client: reqwest::Client,
    base_url: String,
    api_token: String,
    assistant_id: String,
    phone_number_id: String,
}

impl VapiClient {
    pub fn new(
        http_client: reqwest::Client,
        base_url: String,
        api_token: String,
        assistant_id: String,
        phone_number_id: String,
    ) -> Self {
        Self {
            http_client,
            base_url,
            api_token,
            assistant_id,
            phone_number_id,
        }
    }

    pub fn create_call_payload(&self, order: &Order) -> CreateCallPayload {
        CreateCallPayload {
            assistant_id: self.assistant_id.clone(),
            phone_number_id: self.phone_number_id.clone(),
            customer: CallCustomer {
                number: Some(order.phone_number.clone()),
            },
            assistant_overrides: AssistantOverrides {
                variable_values: VariableValues {
                    customer_name: order.customer_name.clone(),
                    store_name: order.store_name.clone(),
                    order_number: order.order_number.clone(),
                    order_items: order.items_text(),
                    vehicle_make: order.vehicle_make.clone(),
                    vehicle_model: order.vehicle_model.clone(),
                    vehicle_color: order.vehicle_color.clone(),
                },
            },
        }
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        error!(%status, body=%body, "vapi rejected request");
        Err(GatewayError::Status { status, body })
    }
}

#[async_trait]
impl CallGateway for VapiClient {
    async fn initiate(&self, order: &Order) -> Result<VapiCall, GatewayError> {
        let payload = self.create_call_payload(order);
        debug!(order_id = order.id, payload=?payload, "creating vapi call");
        let resp = self
            .http_client
            .post(format!("{}/call", self.base_url))
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await?;
        let call = Self::check(resp).await?.json::<VapiCall>().await?;
        debug!(order_id = order.id, call_id=%call.id, "vapi call created");
        Ok(call)
    }

    async fn fetch_details(&self, call_id: &str) -> Result<Value, GatewayError> {
        let resp = self
            .http_client
            .get(format!("{}/call/{call_id}", self.base_url))
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        let details = Self::check(resp).await?.json::<Value>().await?;
        Ok(details)
    }
}
