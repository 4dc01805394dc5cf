//! Request/response bodies for the three RPC operations (spec §6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Campaign;

#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub total_coupons: i64,
}

#[derive(Debug, Serialize)]
pub struct CreateCampaignResponse {
    pub campaign_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct IssueCouponRequest {
    pub campaign_id: i64,
}

#[derive(Debug, Serialize)]
pub struct IssueCouponResponse {
    pub coupon_code: String,
}

#[derive(Debug, Deserialize)]
pub struct GetCampaignRequest {
    pub campaign_id: i64,
}

#[derive(Debug, Serialize)]
pub struct CampaignView {
    pub id: i64,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub total_coupons: i64,
}

impl From<Campaign> for CampaignView {
    fn from(c: Campaign) -> Self {
        Self {
            id: c.id,
            name: c.name,
            start_time: c.start_time,
            total_coupons: c.total_coupons,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GetCampaignResponse {
    pub campaign: CampaignView,
    pub coupon_codes: Vec<String>,
}
