use serde::{Deserialize, Serialize};
use crate::core::notify::Notice;
use crate::models::domain::{Favorite, FilterCriteria, Restaurant};

/// Response for a newly opened session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "radiusMiles")]
    pub radius_miles: f64,
    pub criteria: FilterCriteria,
    #[serde(rename = "deckSize")]
    pub deck_size: usize,
    pub notices: Vec<Notice>,
}

/// Next batch of cards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardsResponse {
    pub cards: Vec<Restaurant>,
    pub notices: Vec<Notice>,
    /// Terminal "no more restaurants" state
    pub exhausted: bool,
    /// Dropped because a refill was already running
    #[serde(default)]
    pub skipped: bool,
    #[serde(rename = "radiusMiles", default, skip_serializing_if = "Option::is_none")]
    pub radius_miles: Option<f64>,
}

/// Swipe acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeResponse {
    pub success: bool,
    #[serde(rename = "alreadySaved")]
    pub already_saved: bool,
    #[serde(rename = "achievementCheck")]
    pub achievement_check: bool,
    pub notices: Vec<Notice>,
}

/// Criteria update acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriteriaResponse {
    pub criteria: FilterCriteria,
    #[serde(rename = "deckSize")]
    pub deck_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoritesResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub favorites: Vec<Favorite>,
    pub count: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
