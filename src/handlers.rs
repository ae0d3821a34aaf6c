use crate::db_types::{Call, NewOrder, Order};
use crate::error::ApiError;
use crate::types::{AppState, CallInitiated};

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info};

pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/orders", get(list_orders).post(create_order))
        .route("/api/orders/:id", delete(delete_order))
        .route("/api/orders/:id/calls", get(list_order_calls))
        .route("/api/calls", get(list_calls))
        .route("/api/call/:id", post(initiate_call))
        .route("/api/call-details/:call_id", get(call_details))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub async fn list_orders(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = app_state.orders.list_orders().await.map_err(|e| {
        error!(error=%e, "failed to fetch orders");
        ApiError::Internal("Error fetching orders")
    })?;
    Ok(Json(orders))
}

pub async fn list_calls(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<Call>>, ApiError> {
    let calls = app_state.calls.list_calls().await.map_err(|e| {
        error!(error=%e, "failed to fetch calls");
        ApiError::Internal("Error fetching calls")
    })?;
    debug!(count = calls.len(), "fetched calls");
    Ok(Json(calls))
}

pub async fn list_order_calls(
    id: Result<Path<i32>, PathRejection>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<Call>>, ApiError> {
    let Path(id) = id?;
    let calls = app_state.calls.calls_for_order(id).await.map_err(|e| {
        error!(order_id = id, error=%e, "failed to fetch calls for order");
        ApiError::Internal("Error fetching calls")
    })?;
    Ok(Json(calls))
}

pub async fn create_order(
    State(app_state): State<Arc<AppState>>,
    new_order: Result<Json<NewOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let Json(new_order) = new_order?;
    let order = app_state.orders.create_order(new_order).await.map_err(|e| {
        error!(error=%e, "failed to create order");
        ApiError::Internal("Error creating order")
    })?;
    info!(order_id = order.id, order_number=%order.order_number, "order created");
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn delete_order(
    id: Result<Path<i32>, PathRejection>,
    State(app_state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    let existed = app_state.orders.delete_order(id).await.map_err(|e| {
        error!(order_id = id, error=%e, "failed to delete order");
        ApiError::Internal("Error deleting order")
    })?;
    app_state.follow_ups.cancel_for_order(id);
    if existed {
        info!(order_id = id, "order deleted");
    } else {
        debug!(order_id = id, "delete requested for unknown order");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Place a call for an order, record it, and arm the outcome follow-up.
///
/// Not transactional: if recording fails after Vapi accepted the call, the call stays live with
/// no local row and no follow-up.
pub async fn initiate_call(
    id: Result<Path<i32>, PathRejection>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<CallInitiated>, ApiError> {
    let Path(id) = id?;
    let order = app_state
        .orders
        .find_order(id)
        .await
        .map_err(|e| {
            error!(order_id = id, error=%e, "failed to look up order");
            ApiError::Internal("Error initiating call")
        })?
        .ok_or(ApiError::NotFound("Order not found"))?;

    let vapi_call = app_state.gateway.initiate(&order).await.map_err(|e| {
        error!(order_id = id, error=%e, "failed to initiate vapi call");
        ApiError::Internal("Error initiating call")
    })?;

    let call = app_state
        .calls
        .insert_call(Call::from_vapi(order.id, vapi_call))
        .await
        .map_err(|e| {
            error!(order_id = id, error=%e, "failed to record initiated call");
            ApiError::Internal("Error initiating call")
        })?;

    app_state.follow_ups.arm(&call.call_id, order.id);
    info!(order_id = id, call_id=%call.call_id, "call initiated");

    Ok(Json(CallInitiated {
        message: "Call initiated successfully",
        call_id: call.call_id,
    }))
}

pub async fn call_details(
    Path(call_id): Path<String>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let details = app_state
        .gateway
        .fetch_details(&call_id)
        .await
        .map_err(|e| {
            error!(call_id=%call_id, error=%e, "failed to retrieve call details");
            ApiError::Internal("Error retrieving call details")
        })?;
    debug!(call_id=%call_id, details=%details, "call details");
    Ok(Json(details))
}
