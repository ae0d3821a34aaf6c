use crate::db_types::{Call, NewOrder, Order};
use crate::error::StoreError;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

const ORDER_COLUMNS: &str = "id, customer_name, phone_number, vehicle_make, vehicle_model, \
                             vehicle_color, store_name, order_number, items, \
                             success_evaluation, created_at";

const CALL_COLUMNS: &str = "call_id, order_id, assistant_id, phone_number_id, type, created_at, \
                            updated_at, org_id, cost, customer_number, status, \
                            phone_call_provider, phone_call_provider_id, phone_call_transport, \
                            assistant_overrides, monitor_data";

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    /// All orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;

    async fn find_order(&self, id: i32) -> Result<Option<Order>, StoreError>;

    /// Returns whether a row was removed.  Calls for the order go with it.
    async fn delete_order(&self, id: i32) -> Result<bool, StoreError>;

    async fn set_success_evaluation(&self, id: i32, value: &str) -> Result<bool, StoreError>;
}

/// Insert-only record of calls placed for orders.
#[async_trait]
pub trait CallStore: Send + Sync {
    async fn insert_call(&self, call: Call) -> Result<Call, StoreError>;

    async fn list_calls(&self) -> Result<Vec<Call>, StoreError>;

    async fn calls_for_order(&self, order_id: i32) -> Result<Vec<Call>, StoreError>;
}

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let sql = format!(
            "INSERT INTO orders \
             (customer_name, phone_number, vehicle_make, vehicle_model, vehicle_color, \
              store_name, order_number, items) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {ORDER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Order>(&sql)
            .bind(order.customer_name)
            .bind(order.phone_number)
            .bind(order.vehicle_make)
            .bind(order.vehicle_model)
            .bind(order.vehicle_color)
            .bind(order.store_name)
            .bind(order.order_number)
            .bind(order.items)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC");
        let orders = sqlx::query_as::<_, Order>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }

    async fn find_order(&self, id: i32) -> Result<Option<Order>, StoreError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    async fn delete_order(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_success_evaluation(&self, id: i32, value: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE orders SET success_evaluation = $1 WHERE id = $2")
            .bind(value)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CallStore for PgStore {
    async fn insert_call(&self, call: Call) -> Result<Call, StoreError> {
        let sql = format!(
            "INSERT INTO calls ({CALL_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING {CALL_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Call>(&sql)
            .bind(call.call_id)
            .bind(call.order_id)
            .bind(call.assistant_id)
            .bind(call.phone_number_id)
            .bind(call.call_type)
            .bind(call.created_at)
            .bind(call.updated_at)
            .bind(call.org_id)
            .bind(call.cost)
            .bind(call.customer_number)
            .bind(call.status)
            .bind(call.phone_call_provider)
            .bind(call.phone_call_provider_id)
            .bind(call.phone_call_transport)
            .bind(call.assistant_overrides)
            .bind(call.monitor_data)
            .fetch_one(&self.pool)
            .await?;
        Ok(inserted)
    }

    async fn list_calls(&self) -> Result<Vec<Call>, StoreError> {
        let sql = format!("SELECT {CALL_COLUMNS} FROM calls ORDER BY created_at DESC");
        let calls = sqlx::query_as::<_, Call>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(calls)
    }

    async fn calls_for_order(&self, order_id: i32) -> Result<Vec<Call>, StoreError> {
        let sql =
            format!("SELECT {CALL_COLUMNS} FROM calls WHERE order_id = $1 ORDER BY created_at DESC");
        let calls = sqlx::query_as::<_, Call>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(calls)
    }
}
