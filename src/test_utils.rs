//! In-memory stand-ins for Postgres and Vapi used by the unit tests.

use crate::db_types::{Call, NewOrder, Order};
use crate::error::{GatewayError, StoreError};
use crate::gateway::CallGateway;
use crate::store::{CallStore, OrderStore};
use crate::vapi_types::VapiCall;

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

pub fn new_order(customer_name: &str) -> NewOrder {
    NewOrder {
        customer_name: customer_name.to_string(),
        phone_number: "555".to_string(),
        vehicle_make: "Ford".to_string(),
        vehicle_model: "F150".to_string(),
        vehicle_color: "Red".to_string(),
        store_name: "S".to_string(),
        order_number: "42".to_string(),
        items: json!("2x filter"),
    }
}

#[derive(Default)]
struct Tables {
    next_id: i32,
    orders: Vec<Order>,
    calls: Vec<Call>,
}

/// Both stores over plain vectors.  Deleting an order removes its calls, as the foreign key
/// does in Postgres.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_call_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_call_inserts(&self) {
        self.fail_call_inserts.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        tables.next_id += 1;
        // distinct, increasing timestamps so "newest first" is observable
        let created_at =
            OffsetDateTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + tables.next_id as u64);
        let order = Order {
            id: tables.next_id,
            customer_name: order.customer_name,
            phone_number: order.phone_number,
            vehicle_make: order.vehicle_make,
            vehicle_model: order.vehicle_model,
            vehicle_color: order.vehicle_color,
            store_name: order.store_name,
            order_number: order.order_number,
            items: order.items,
            success_evaluation: None,
            created_at,
        };
        tables.orders.push(order.clone());
        Ok(order)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut orders = tables.orders.clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn find_order(&self, id: i32) -> Result<Option<Order>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn delete_order(&self, id: i32) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.orders.len();
        tables.orders.retain(|o| o.id != id);
        tables.calls.retain(|c| c.order_id != id);
        Ok(tables.orders.len() != before)
    }

    async fn set_success_evaluation(&self, id: i32, value: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        match tables.orders.iter_mut().find(|o| o.id == id) {
            Some(order) => {
                order.success_evaluation = Some(value.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl CallStore for MemoryStore {
    async fn insert_call(&self, call: Call) -> Result<Call, StoreError> {
        if self.fail_call_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        let mut tables = self.tables.lock().unwrap();
        if !tables.orders.iter().any(|o| o.id == call.order_id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }
        tables.calls.push(call.clone());
        Ok(call)
    }

    async fn list_calls(&self) -> Result<Vec<Call>, StoreError> {
        Ok(self.tables.lock().unwrap().calls.clone())
    }

    async fn calls_for_order(&self, order_id: i32) -> Result<Vec<Call>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .calls
            .iter()
            .filter(|c| c.order_id == order_id)
            .cloned()
            .collect())
    }
}

/// Records what it was asked and answers with canned data.
pub struct StubGateway {
    details: Value,
    fail: AtomicBool,
    initiated: Mutex<Vec<i32>>,
    fetched: Mutex<Vec<String>>,
}

impl StubGateway {
    pub fn with_details(details: Value) -> Self {
        Self {
            details,
            fail: AtomicBool::new(false),
            initiated: Mutex::new(Vec::new()),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_requests(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Order ids calls were placed for.
    pub fn initiated(&self) -> Vec<i32> {
        self.initiated.lock().unwrap().clone()
    }

    /// Call ids whose details were requested.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    fn failure() -> GatewayError {
        GatewayError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: "upstream unavailable".to_string(),
        }
    }
}

#[async_trait]
impl CallGateway for StubGateway {
    async fn initiate(&self, order: &Order) -> Result<VapiCall, GatewayError> {
        self.initiated.lock().unwrap().push(order.id);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        let call = json!({
            "id": Uuid::new_v4().to_string(),
            "assistantId": "assistant-1",
            "phoneNumberId": "phone-1",
            "type": "outboundPhoneCall",
            "createdAt": "2025-01-02T03:04:05Z",
            "orgId": "org-1",
            "customer": {"number": order.phone_number},
            "status": "queued",
        });
        Ok(serde_json::from_value(call).unwrap())
    }

    async fn fetch_details(&self, call_id: &str) -> Result<Value, GatewayError> {
        self.fetched.lock().unwrap().push(call_id.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(self.details.clone())
    }
}
