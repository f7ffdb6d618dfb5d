use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use crate::core::{
    filters::apply_filters,
    notify::Notifier,
    recorder::{SwipeOutcome, SwipeRecorder},
    supply::{RefreshMonitor, RefreshTicket, SupplyExpander, SupplyState},
};
use crate::models::{FilterCriteria, Restaurant, SwipeDirection};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Restaurant {0} is not part of this session")]
    UnknownRestaurant(String),
}

/// Result of one card request
#[derive(Debug, Clone, Default)]
pub struct CardDraw {
    pub cards: Vec<Restaurant>,
    /// The request raced a running expansion and was dropped
    pub skipped: bool,
    pub exhausted: bool,
    /// Unknown when the request was dropped without reaching the session
    pub radius_miles: Option<f64>,
    pub deck_left: usize,
}

/// One user's browsing session
///
/// Owns every piece of mutable browsing state (criteria, exclusions,
/// shown-history, radius and the deck of undisplayed cards) and hands it
/// to the filter engine, expander and recorder explicitly.
pub struct SessionController {
    session_id: String,
    user_id: String,
    state: SupplyState,
    deck: Vec<Restaurant>,
    expander: SupplyExpander,
    recorder: SwipeRecorder,
    exhausted: bool,
}

impl SessionController {
    pub fn new(
        session_id: String,
        user_id: String,
        state: SupplyState,
        expander: SupplyExpander,
        recorder: SwipeRecorder,
    ) -> Self {
        Self {
            session_id,
            user_id,
            state,
            deck: Vec::new(),
            expander,
            recorder,
            exhausted: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.state.criteria
    }

    pub fn state(&self) -> &SupplyState {
        &self.state
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    pub fn swipe_count(&self) -> u64 {
        self.recorder.swipe_count()
    }

    /// Terminal "no more restaurants" state from the last request
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Fill the deck from the search service at the current radius
    ///
    /// A failed fetch leaves the deck empty; the next card request then
    /// runs the expander.
    pub async fn load_initial(&mut self) -> usize {
        match self.expander.fetch_filtered(&self.state).await {
            Ok(candidates) => self.extend_deck(candidates),
            Err(e) => {
                tracing::warn!("Initial fetch failed for session {}: {}", self.session_id, e);
                0
            }
        }
    }

    pub fn refresh_monitor(&self) -> RefreshMonitor {
        self.expander.monitor()
    }

    /// Hand out up to `count` cards, refilling the deck when it runs low
    pub async fn next_cards(&mut self, count: usize, notifier: &mut dyn Notifier) -> Vec<Restaurant> {
        self.draw(count, None, notifier).await.cards
    }

    /// Like `next_cards`, but a refill is dropped when an expansion ran or
    /// was running after `ticket` was taken
    pub async fn draw(
        &mut self,
        count: usize,
        ticket: Option<RefreshTicket>,
        notifier: &mut dyn Notifier,
    ) -> CardDraw {
        self.prune_deck();

        if self.deck.len() <= self.expander.tuning().refill_threshold {
            let monitor = self.expander.monitor();
            if ticket.is_some_and(|t| monitor.superseded(&t)) {
                tracing::debug!(
                    "Session {} refill raced another expansion, ignoring trigger",
                    self.session_id
                );
                return self.skipped_draw();
            }

            tracing::debug!(
                "Deck for session {} down to {}, expanding supply",
                self.session_id,
                self.deck.len()
            );
            let outcome = self.expander.expand(&mut self.state, notifier).await;
            if outcome.skipped {
                return self.skipped_draw();
            }
            self.extend_deck(outcome.candidates);
        }

        let take = count.min(self.deck.len());
        let cards: Vec<Restaurant> = self.deck.drain(..take).collect();
        for card in &cards {
            self.state.shown.mark(card);
        }

        self.exhausted = cards.is_empty();
        CardDraw {
            cards,
            skipped: false,
            exhausted: self.exhausted,
            radius_miles: Some(self.state.radius_miles),
            deck_left: self.deck.len(),
        }
    }

    fn skipped_draw(&self) -> CardDraw {
        CardDraw {
            cards: vec![],
            skipped: true,
            exhausted: self.exhausted,
            radius_miles: Some(self.state.radius_miles),
            deck_left: self.deck.len(),
        }
    }

    /// Record a swipe on a card from this session
    pub fn swipe(
        &mut self,
        restaurant_id: &str,
        direction: SwipeDirection,
        notifier: &mut dyn Notifier,
    ) -> Result<SwipeOutcome, SessionError> {
        let restaurant = self
            .state
            .shown
            .get(restaurant_id)
            .or_else(|| self.deck.iter().find(|r| r.id == restaurant_id))
            .cloned()
            .ok_or_else(|| SessionError::UnknownRestaurant(restaurant_id.to_string()))?;

        let outcome = self.recorder.record_swipe(
            &restaurant,
            direction,
            &mut self.state.exclusions,
            notifier,
        );

        self.deck.retain(|r| r.id != restaurant_id);
        self.state.shown.mark(&restaurant);

        Ok(outcome)
    }

    /// Replace the criteria and re-narrow the deck
    ///
    /// Refetches at the current radius when the narrowed deck runs low.
    pub async fn update_criteria(&mut self, criteria: FilterCriteria) -> usize {
        self.state.criteria = criteria;
        self.exhausted = false;

        let deck = std::mem::take(&mut self.deck);
        self.deck = apply_filters(deck, &self.state.criteria, &self.state.exclusions, Utc::now());

        if self.deck.len() <= self.expander.tuning().refill_threshold {
            match self.expander.fetch_filtered(&self.state).await {
                Ok(candidates) => {
                    self.extend_deck(candidates);
                }
                Err(e) => {
                    tracing::warn!("Refetch after criteria change failed: {}", e);
                }
            }
        }

        self.deck.len()
    }

    /// Drop cards that became liked or were shown since they were queued
    fn prune_deck(&mut self) {
        let state = &self.state;
        self.deck
            .retain(|r| !state.exclusions.is_liked(&r.id) && !state.shown.contains(&r.id));
    }

    fn extend_deck(&mut self, candidates: Vec<Restaurant>) -> usize {
        let mut ids: HashSet<String> = self.deck.iter().map(|r| r.id.clone()).collect();
        let before = self.deck.len();

        for candidate in candidates {
            if self.state.exclusions.is_liked(&candidate.id) {
                continue;
            }
            if ids.insert(candidate.id.clone()) {
                self.deck.push(candidate);
            }
        }

        self.deck.len() - before
    }
}

/// Shared access to a live session
///
/// The refresh monitor is read without taking the session lock, so a card
/// request that arrives mid-expansion is dropped instead of queued.
#[derive(Clone)]
pub struct SessionHandle {
    session: Arc<Mutex<SessionController>>,
    refresh: RefreshMonitor,
}

impl SessionHandle {
    pub fn new(session: SessionController) -> Self {
        let refresh = session.refresh_monitor();
        Self {
            session: Arc::new(Mutex::new(session)),
            refresh,
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, SessionController> {
        self.session.lock().await
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_refreshing()
    }

    /// Card request entry point for concurrent callers
    pub async fn next_cards(&self, count: usize, notifier: &mut dyn Notifier) -> CardDraw {
        let ticket = self.refresh.ticket();
        if self.refresh.superseded(&ticket) {
            tracing::debug!("Expansion in flight, ignoring card request");
            return CardDraw {
                skipped: true,
                ..CardDraw::default()
            };
        }

        let mut session = self.session.lock().await;
        session.draw(count, Some(ticket), notifier).await
    }
}

/// Live sessions keyed by session id, evicted after an idle period
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: moka::future::Cache<String, SessionHandle>,
}

impl SessionRegistry {
    pub fn new(max_sessions: u64, idle_timeout: Duration) -> Self {
        let sessions = moka::future::Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(idle_timeout)
            .build();

        Self { sessions }
    }

    pub async fn insert(&self, session: SessionController) -> SessionHandle {
        let id = session.session_id().to_string();
        let handle = SessionHandle::new(session);
        self.sessions.insert(id, handle.clone()).await;
        handle
    }

    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.get(session_id).await
    }

    pub async fn remove(&self, session_id: &str) {
        self.sessions.invalidate(session_id).await;
    }
}
