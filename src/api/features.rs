//! Optional feature discovery for clients.

use axum::extract::State;

use super::{success, ApiResult};
use crate::config::FeatureFlags;
use crate::AppState;

/// GET /api/features - Which optional integrations are configured.
pub async fn get_features(State(state): State<AppState>) -> ApiResult<FeatureFlags> {
    success(state.config.features())
}
