use serde::{Deserialize, Serialize};
use validator::Validate;

/// Ordinal price tier of a restaurant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriceTier {
    #[serde(rename = "$", alias = "low")]
    Low,
    #[serde(rename = "$$", alias = "medium")]
    Medium,
    #[serde(rename = "$$$", alias = "high")]
    High,
}

impl PriceTier {
    /// The next tier up, saturating at `High`
    pub fn step_up(self) -> Self {
        match self {
            PriceTier::Low => PriceTier::Medium,
            PriceTier::Medium | PriceTier::High => PriceTier::High,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            PriceTier::Low => "$",
            PriceTier::Medium => "$$",
            PriceTier::High => "$$$",
        }
    }
}

impl Default for PriceTier {
    fn default() -> Self {
        PriceTier::High
    }
}

/// Restaurant candidate as returned by the search service or the bundled fallback list
///
/// Immutable once fetched; sessions clone snapshots into the deck and history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub cuisine: String,
    #[serde(rename = "priceTier")]
    pub price_tier: PriceTier,
    pub rating: f64,
    #[serde(rename = "distanceMiles", default)]
    pub distance_miles: f64,
    #[serde(rename = "dietaryTags", default)]
    pub dietary_tags: Vec<String>,
    #[serde(rename = "etaMinutes", default)]
    pub eta_minutes: u16,
    #[serde(default)]
    pub deal: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
}

impl Restaurant {
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
            _ => None,
        }
    }
}

/// How dietary tags are compared against a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DietaryMatch {
    /// At least one requested tag must be listed by the candidate
    #[default]
    Overlap,
    /// Candidates that list no dietary tags at all are also admitted
    Lenient,
}

/// User-owned filter criteria, persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FilterCriteria {
    #[serde(rename = "maxPriceTier", default)]
    pub max_price_tier: PriceTier,
    #[serde(rename = "maxDistanceMiles", default)]
    #[validate(range(min = 0.0))]
    pub max_distance_miles: Option<f64>,
    #[serde(rename = "minRating", default)]
    #[validate(range(min = 0.0, max = 5.0))]
    pub min_rating: f64,
    #[serde(rename = "dietaryTags", default)]
    pub dietary_tags: Vec<String>,
    #[serde(rename = "cuisinePreferences", default)]
    pub cuisine_preferences: Vec<String>,
    #[serde(rename = "dietaryMatch", default)]
    pub dietary_match: DietaryMatch,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            max_price_tier: PriceTier::High,
            max_distance_miles: None,
            min_rating: 0.0,
            dietary_tags: vec![],
            cuisine_preferences: vec![],
            dietary_match: DietaryMatch::Overlap,
        }
    }
}

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Swipe direction on a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Left,
    Right,
}

/// Append-only record of a single swipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeEvent {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub restaurant: Restaurant,
    pub direction: SwipeDirection,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Persisted favorite created by a right swipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "restaurantId")]
    pub restaurant_id: String,
    pub restaurant: Restaurant,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Request sent to the restaurant search service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius in meters, the search service's native unit
    pub radius: f64,
    pub limit: usize,
}

/// Tuning knobs for the supply pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupplyTuning {
    /// Expansion runs once the deck holds this many cards or fewer
    pub refill_threshold: usize,
    /// Stages stop once this many unique candidates are collected
    pub target_count: usize,
    pub max_radius_miles: f64,
    pub radius_growth: f64,
    pub rating_step: f64,
    pub rating_floor: f64,
    pub fallback_batch: usize,
    pub fetch_limit: usize,
}

impl Default for SupplyTuning {
    fn default() -> Self {
        Self {
            refill_threshold: 3,
            target_count: 10,
            max_radius_miles: 40.0,
            radius_growth: 1.5,
            rating_step: 0.5,
            rating_floor: 3.0,
            fallback_batch: 20,
            fetch_limit: 50,
        }
    }
}
