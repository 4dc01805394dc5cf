//! HTTP handlers mapping the three RPC operations onto the engine/lifecycle (spec §4.6).

use axum::extract::State;
use axum::Json;
use tracing::instrument;

use crate::api::dto::{
    CampaignView, CreateCampaignRequest, CreateCampaignResponse, GetCampaignRequest,
    GetCampaignResponse, IssueCouponRequest, IssueCouponResponse,
};
use crate::error::EngineError;
use crate::state::AppState;

#[instrument(skip(state, req))]
pub async fn create_campaign(
    State(state): State<AppState>,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<Json<CreateCampaignResponse>, EngineError> {
    let campaign_id = state
        .lifecycle
        .create_campaign(&req.name, req.start_time, req.total_coupons)
        .await?;
    Ok(Json(CreateCampaignResponse { campaign_id }))
}

#[instrument(skip(state, req))]
pub async fn issue_coupon(
    State(state): State<AppState>,
    Json(req): Json<IssueCouponRequest>,
) -> Result<Json<IssueCouponResponse>, EngineError> {
    let coupon_code = state.engine.issue_coupon(req.campaign_id).await?;
    Ok(Json(IssueCouponResponse { coupon_code }))
}

#[instrument(skip(state, req))]
pub async fn get_campaign(
    State(state): State<AppState>,
    Json(req): Json<GetCampaignRequest>,
) -> Result<Json<GetCampaignResponse>, EngineError> {
    let (campaign, coupon_codes) = state.lifecycle.get_campaign(req.campaign_id).await?;
    Ok(Json(GetCampaignResponse {
        campaign: CampaignView::from(campaign),
        coupon_codes,
    }))
}
