//! Shared application state handed to every axum handler.

use std::sync::Arc;

use crate::campaign::CampaignLifecycle;
use crate::engine::IssuanceEngine;

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<CampaignLifecycle>,
    pub engine: Arc<IssuanceEngine>,
}
