//! Webhook HTTP surface
//!
//! A liveness probe and the endpoint Telegram posts updates to.

mod handlers;

pub use handlers::create_router;

use crate::runtime::UpdateHandler;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<dyn UpdateHandler>,
}

impl AppState {
    pub fn new(handler: Arc<dyn UpdateHandler>) -> Self {
        Self { handler }
    }
}
