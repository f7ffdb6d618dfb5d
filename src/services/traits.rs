use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::models::{Favorite, FilterCriteria, Restaurant, SearchRequest, SwipeEvent};
use crate::services::{BackendError, CacheError, StoreError};

/// External restaurant search (the backend's search function)
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Restaurant>, BackendError>;
}

/// Fire-and-forget achievement evaluation
#[async_trait]
pub trait AchievementChecker: Send + Sync {
    async fn check_achievements(&self, user_id: &str) -> Result<(), BackendError>;
}

/// Persisted favorites
///
/// Inserts are not idempotent; a second insert of the same restaurant
/// yields `StoreError::DuplicateFavorite`.
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    async fn insert_favorite(&self, favorite: &Favorite) -> Result<(), StoreError>;

    async fn list_favorites(&self, user_id: &str) -> Result<Vec<Favorite>, StoreError>;

    async fn liked_ids(&self, user_id: &str) -> Result<Vec<String>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}

/// Append-only swipe history
#[async_trait]
pub trait SwipeEventStore: Send + Sync {
    async fn insert_swipe(&self, event: &SwipeEvent) -> Result<(), StoreError>;

    /// Latest left swipe per restaurant made after `since`
    async fn recent_passes(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<(String, DateTime<Utc>)>, StoreError>;
}

/// Per-user filter criteria kept between sessions
#[async_trait]
pub trait CriteriaStore: Send + Sync {
    async fn load_criteria(&self, user_id: &str) -> Result<Option<FilterCriteria>, CacheError>;

    async fn save_criteria(&self, user_id: &str, criteria: &FilterCriteria) -> Result<(), CacheError>;
}
