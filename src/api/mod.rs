//! The RPC surface: three unary operations over a framed HTTP-based RPC (spec §4.6), built on
//! the teacher's `axum` router-and-`serve` shape.

pub mod dto;
pub mod handlers;

use axum::routing::post;
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/CreateCampaign", post(handlers::create_campaign))
        .route("/IssueCoupon", post(handlers::issue_coupon))
        .route("/GetCampaign", post(handlers::get_campaign))
        .with_state(state)
}
