use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::SwipeDirection;

/// Request to open a browsing session
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StartSessionRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(range(min = 0.1, max = 100.0))]
    #[serde(alias = "radius_miles", rename = "radiusMiles", default)]
    pub radius_miles: Option<f64>,
}

/// Request for the next cards in a session
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NextCardsRequest {
    #[validate(range(min = 1, max = 50))]
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_count() -> usize {
    5
}

/// Request to record a swipe
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SwipeRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "restaurant_id", rename = "restaurantId")]
    pub restaurant_id: String,
    pub direction: SwipeDirection,
}
