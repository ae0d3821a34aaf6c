use crate::gateway::CallGateway;
use crate::store::{CallStore, OrderStore};
use crate::tasks::FollowUpScheduler;

use serde::Serialize;
use std::sync::Arc;

pub struct AppState {
    pub orders: Arc<dyn OrderStore>,
    pub calls: Arc<dyn CallStore>,
    pub gateway: Arc<dyn CallGateway>,
    pub follow_ups: FollowUpScheduler,
}

/// Response body for a successfully placed call.
#[derive(Serialize, Debug)]
pub struct CallInitiated {
    pub message: &'static str,
    #[serde(rename = "callId")]
    pub call_id: String,
}
