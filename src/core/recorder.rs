use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use crate::core::{exclusion::ExclusionTracker, notify::Notifier};
use crate::models::{Favorite, Restaurant, SwipeDirection, SwipeEvent};
use crate::services::{AchievementChecker, FavoriteStore, StoreError, SwipeEventStore};

/// A persistence write waiting on the write-behind queue
#[derive(Debug, Clone)]
pub enum PendingWrite {
    Favorite(Favorite),
    Swipe(SwipeEvent),
}

/// Write-behind queue for swipe and favorite persistence
///
/// Local state is updated before writes are enqueued. The worker only logs
/// failures; nothing is retried or rolled back.
#[derive(Clone)]
pub struct WriteBehindQueue {
    sender: mpsc::UnboundedSender<PendingWrite>,
}

impl WriteBehindQueue {
    /// Spawn the background writer
    ///
    /// The worker exits once every queue handle is dropped and the queue
    /// is drained.
    pub fn spawn(
        favorites: Arc<dyn FavoriteStore>,
        swipes: Arc<dyn SwipeEventStore>,
    ) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<PendingWrite>();

        let handle = tokio::spawn(async move {
            while let Some(write) = receiver.recv().await {
                persist(write, favorites.as_ref(), swipes.as_ref()).await;
            }
            tracing::debug!("Write-behind queue closed");
        });

        (Self { sender }, handle)
    }

    /// Returns false if the worker is gone and the write was dropped
    pub fn enqueue(&self, write: PendingWrite) -> bool {
        match self.sender.send(write) {
            Ok(()) => true,
            Err(mpsc::error::SendError(write)) => {
                tracing::error!("Write-behind worker stopped, dropping {:?}", write);
                false
            }
        }
    }
}

async fn persist(write: PendingWrite, favorites: &dyn FavoriteStore, swipes: &dyn SwipeEventStore) {
    match write {
        PendingWrite::Favorite(favorite) => match favorites.insert_favorite(&favorite).await {
            Ok(()) => {}
            Err(StoreError::DuplicateFavorite { user_id, restaurant_id }) => {
                tracing::info!("Favorite {} already saved for {}", restaurant_id, user_id);
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to save favorite {} for {}: {}",
                    favorite.restaurant_id,
                    favorite.user_id,
                    e
                );
            }
        },
        PendingWrite::Swipe(event) => {
            if let Err(e) = swipes.insert_swipe(&event).await {
                tracing::warn!(
                    "Failed to record swipe {} for {}: {}",
                    event.restaurant.id,
                    event.user_id,
                    e
                );
            }
        }
    }
}

/// What a swipe did locally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwipeOutcome {
    pub direction: SwipeDirection,
    /// Right swipe on a restaurant that was already a favorite
    pub already_saved: bool,
    /// This swipe triggered an achievement check
    pub achievement_check: bool,
}

/// Records swipes for one user
///
/// Exclusion state changes immediately (optimistic); the favorite and
/// swipe-event writes go through the write-behind queue.
pub struct SwipeRecorder {
    user_id: String,
    queue: WriteBehindQueue,
    achievements: Arc<dyn AchievementChecker>,
    achievement_interval: u64,
    swipe_count: u64,
}

impl SwipeRecorder {
    pub fn new(
        user_id: String,
        queue: WriteBehindQueue,
        achievements: Arc<dyn AchievementChecker>,
        achievement_interval: u64,
    ) -> Self {
        Self {
            user_id,
            queue,
            achievements,
            achievement_interval,
            swipe_count: 0,
        }
    }

    pub fn swipe_count(&self) -> u64 {
        self.swipe_count
    }

    pub fn record_swipe(
        &mut self,
        restaurant: &Restaurant,
        direction: SwipeDirection,
        exclusions: &mut ExclusionTracker,
        notifier: &mut dyn Notifier,
    ) -> SwipeOutcome {
        let now = Utc::now();
        let mut already_saved = false;

        match direction {
            SwipeDirection::Right => {
                if exclusions.record_like(restaurant.id.clone()) {
                    self.queue.enqueue(PendingWrite::Favorite(Favorite {
                        user_id: self.user_id.clone(),
                        restaurant_id: restaurant.id.clone(),
                        restaurant: restaurant.clone(),
                        created_at: now,
                    }));
                } else {
                    already_saved = true;
                    notifier.info(format!("{} is already in your favorites", restaurant.name));
                }
            }
            SwipeDirection::Left => exclusions.record_pass_at(restaurant.id.clone(), now),
        }

        self.queue.enqueue(PendingWrite::Swipe(SwipeEvent {
            user_id: self.user_id.clone(),
            restaurant: restaurant.clone(),
            direction,
            created_at: now,
        }));

        self.swipe_count += 1;
        let achievement_check =
            self.achievement_interval > 0 && self.swipe_count % self.achievement_interval == 0;

        if achievement_check {
            self.spawn_achievement_check();
        }

        SwipeOutcome {
            direction,
            already_saved,
            achievement_check,
        }
    }

    fn spawn_achievement_check(&self) {
        let achievements = Arc::clone(&self.achievements);
        let user_id = self.user_id.clone();

        tokio::spawn(async move {
            if let Err(e) = achievements.check_achievements(&user_id).await {
                tracing::warn!("Achievement check failed for {}: {}", user_id, e);
            }
        });
    }
}
