// Shared fakes for the integration and API tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use munch_algo::models::{
    Favorite, FilterCriteria, GeoPoint, PriceTier, Restaurant, SearchRequest, SwipeDirection,
    SwipeEvent,
};
use munch_algo::services::{
    AchievementChecker, BackendError, CacheError, CandidateSource, CriteriaStore, FavoriteStore,
    StoreError, SwipeEventStore,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

pub const ORIGIN: GeoPoint = GeoPoint {
    latitude: 40.7128,
    longitude: -74.0060,
};

pub fn create_test_restaurant(id: &str, tier: PriceTier, rating: f64) -> Restaurant {
    Restaurant {
        id: id.to_string(),
        name: format!("Restaurant {}", id),
        cuisine: "Italian".to_string(),
        price_tier: tier,
        rating,
        distance_miles: 1.5,
        dietary_tags: vec![],
        eta_minutes: 25,
        deal: None,
        latitude: None,
        longitude: None,
        image_url: None,
    }
}

/// `count` matching restaurants with ids `{prefix}-0..`
pub fn batch(prefix: &str, count: usize) -> Vec<Restaurant> {
    (0..count)
        .map(|i| create_test_restaurant(&format!("{}-{}", prefix, i), PriceTier::Low, 4.5))
        .collect()
}

pub fn ids(restaurants: &[Restaurant]) -> Vec<String> {
    restaurants.iter().map(|r| r.id.clone()).collect()
}

/// Candidate source replaying scripted responses in order
///
/// Once the script runs out every call returns `fallthrough`.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Vec<Restaurant>, String>>>,
    fallthrough: Result<Vec<Restaurant>, String>,
    requests: Mutex<Vec<SearchRequest>>,
    delay: Option<Duration>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Vec<Restaurant>, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallthrough: Ok(vec![]),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Every call fails
    pub fn failing() -> Self {
        Self {
            fallthrough: Err("search service unavailable".to_string()),
            ..Self::new(vec![])
        }
    }

    /// Every call returns the same batch
    pub fn always(restaurants: Vec<Restaurant>) -> Self {
        Self {
            fallthrough: Ok(restaurants),
            ..Self::new(vec![])
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandidateSource for ScriptedSource {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Restaurant>, BackendError> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallthrough.clone());

        next.map_err(BackendError::ApiError)
    }
}

/// In-memory favorites and swipe history
#[derive(Default)]
pub struct MemoryStore {
    favorites: Mutex<Vec<Favorite>>,
    swipes: Mutex<Vec<SwipeEvent>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write and read fails
    pub fn failing() -> Self {
        let store = Self::default();
        store.failing.store(true, Ordering::SeqCst);
        store
    }

    pub fn with_favorites(favorites: Vec<Favorite>) -> Self {
        let store = Self::default();
        *store.favorites.lock().unwrap() = favorites;
        store
    }

    pub fn with_swipes(swipes: Vec<SwipeEvent>) -> Self {
        let store = Self::default();
        *store.swipes.lock().unwrap() = swipes;
        store
    }

    pub fn favorite_ids(&self) -> Vec<String> {
        self.favorites
            .lock()
            .unwrap()
            .iter()
            .map(|f| f.restaurant_id.clone())
            .collect()
    }

    pub fn swipe_count(&self) -> usize {
        self.swipes.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl FavoriteStore for MemoryStore {
    async fn insert_favorite(&self, favorite: &Favorite) -> Result<(), StoreError> {
        self.check()?;

        let mut favorites = self.favorites.lock().unwrap();
        if favorites
            .iter()
            .any(|f| f.user_id == favorite.user_id && f.restaurant_id == favorite.restaurant_id)
        {
            return Err(StoreError::DuplicateFavorite {
                user_id: favorite.user_id.clone(),
                restaurant_id: favorite.restaurant_id.clone(),
            });
        }
        favorites.push(favorite.clone());
        Ok(())
    }

    async fn list_favorites(&self, user_id: &str) -> Result<Vec<Favorite>, StoreError> {
        self.check()?;
        Ok(self
            .favorites
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn liked_ids(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .list_favorites(user_id)
            .await?
            .into_iter()
            .map(|f| f.restaurant_id)
            .collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(!self.failing.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl SwipeEventStore for MemoryStore {
    async fn insert_swipe(&self, event: &SwipeEvent) -> Result<(), StoreError> {
        self.check()?;
        self.swipes.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn recent_passes(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<(String, DateTime<Utc>)>, StoreError> {
        self.check()?;

        let mut latest: HashMap<String, DateTime<Utc>> = HashMap::new();
        for event in self.swipes.lock().unwrap().iter() {
            if event.user_id != user_id
                || event.direction != SwipeDirection::Left
                || event.created_at <= since
            {
                continue;
            }
            let entry = latest.entry(event.restaurant.id.clone()).or_insert(event.created_at);
            if event.created_at > *entry {
                *entry = event.created_at;
            }
        }
        Ok(latest.into_iter().collect())
    }
}

/// Criteria kept in a map instead of Redis
#[derive(Default)]
pub struct MemoryCriteria {
    saved: Mutex<HashMap<String, FilterCriteria>>,
}

impl MemoryCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self, user_id: &str) -> Option<FilterCriteria> {
        self.saved.lock().unwrap().get(user_id).cloned()
    }
}

#[async_trait]
impl CriteriaStore for MemoryCriteria {
    async fn load_criteria(&self, user_id: &str) -> Result<Option<FilterCriteria>, CacheError> {
        Ok(self.saved(user_id))
    }

    async fn save_criteria(&self, user_id: &str, criteria: &FilterCriteria) -> Result<(), CacheError> {
        self.saved
            .lock()
            .unwrap()
            .insert(user_id.to_string(), criteria.clone());
        Ok(())
    }
}

/// Reports each achievement check on a channel
pub struct ChannelAchievements {
    sender: mpsc::UnboundedSender<String>,
}

impl ChannelAchievements {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl AchievementChecker for ChannelAchievements {
    async fn check_achievements(&self, user_id: &str) -> Result<(), BackendError> {
        self.sender
            .send(user_id.to_string())
            .map_err(|e| BackendError::ApiError(e.to_string()))
    }
}
