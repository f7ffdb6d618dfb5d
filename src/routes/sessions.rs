use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;
use crate::core::{
    recency_window, CollectingNotifier, ExclusionTracker, SessionController, SessionError,
    SessionRegistry, SupplyExpander, SupplyState, SwipeRecorder, WriteBehindQueue,
};
use crate::models::{
    CardsResponse, CriteriaResponse, ErrorResponse, FavoritesResponse, FilterCriteria, GeoPoint,
    HealthResponse, NextCardsRequest, StartSessionRequest, StartSessionResponse, SupplyTuning,
    SwipeRequest, SwipeResponse,
};
use crate::services::{
    AchievementChecker, CandidateSource, CriteriaStore, FallbackDataset, FavoriteStore,
    SwipeEventStore,
};

/// Session defaults applied when a request leaves them out
#[derive(Debug, Clone, Copy)]
pub struct SessionDefaults {
    pub radius_miles: f64,
    pub achievement_interval: u64,
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn CandidateSource>,
    pub achievements: Arc<dyn AchievementChecker>,
    pub favorites: Arc<dyn FavoriteStore>,
    pub swipes: Arc<dyn SwipeEventStore>,
    pub criteria_store: Arc<dyn CriteriaStore>,
    pub fallback: Arc<FallbackDataset>,
    pub writes: WriteBehindQueue,
    pub sessions: SessionRegistry,
    pub tuning: SupplyTuning,
    pub defaults: SessionDefaults,
}

/// Configure all session routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/sessions", web::post().to(start_session))
        .route("/sessions/{session_id}", web::delete().to(end_session))
        .route("/sessions/{session_id}/cards", web::post().to(next_cards))
        .route("/sessions/{session_id}/swipe", web::post().to(swipe))
        .route("/sessions/{session_id}/criteria", web::put().to(update_criteria))
        .route("/users/{user_id}/favorites", web::get().to(list_favorites));
}

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message,
        status_code: 400,
    })
}

fn session_not_found(session_id: &str) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse {
        error: "Session not found".to_string(),
        message: format!("No active session {}", session_id),
        status_code: 404,
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.favorites.health_check().await.unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Open a browsing session
///
/// POST /api/v1/sessions
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "latitude": 40.71,
///   "longitude": -74.0,
///   "radiusMiles": 5
/// }
/// ```
async fn start_session(
    state: web::Data<AppState>,
    req: web::Json<StartSessionRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for start_session request: {:?}", errors);
        return bad_request(errors.to_string());
    }

    let user_id = req.user_id.clone();

    let criteria = match state.criteria_store.load_criteria(&user_id).await {
        Ok(Some(criteria)) => criteria,
        Ok(None) => FilterCriteria::default(),
        Err(e) => {
            tracing::warn!("Failed to load criteria for {}, using defaults: {}", user_id, e);
            FilterCriteria::default()
        }
    };

    // Seed exclusions from server history; a failed read degrades to an empty set
    let liked = match state.favorites.liked_ids(&user_id).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!("Failed to fetch favorites for {}, proceeding without: {}", user_id, e);
            vec![]
        }
    };

    let since = Utc::now() - recency_window();
    let passes = match state.swipes.recent_passes(&user_id, since).await {
        Ok(passes) => passes,
        Err(e) => {
            tracing::warn!("Failed to fetch recent passes for {}, proceeding without: {}", user_id, e);
            vec![]
        }
    };

    tracing::debug!(
        "Seeding session for {} with {} liked and {} passed",
        user_id,
        liked.len(),
        passes.len()
    );

    let origin = GeoPoint {
        latitude: req.latitude,
        longitude: req.longitude,
    };
    let radius_miles = req.radius_miles.unwrap_or(state.defaults.radius_miles);

    let mut supply_state = SupplyState::new(origin, radius_miles, criteria.clone());
    supply_state.exclusions = ExclusionTracker::seed(liked, passes);

    let expander = SupplyExpander::new(
        Arc::clone(&state.source),
        Arc::clone(&state.fallback),
        state.tuning,
    );
    let recorder = SwipeRecorder::new(
        user_id.clone(),
        state.writes.clone(),
        Arc::clone(&state.achievements),
        state.defaults.achievement_interval,
    );

    let session_id = uuid::Uuid::new_v4().to_string();
    let mut session = SessionController::new(
        session_id.clone(),
        user_id.clone(),
        supply_state,
        expander,
        recorder,
    );

    let deck_size = session.load_initial().await;
    state.sessions.insert(session).await;

    tracing::info!(
        "Started session {} for {} ({} cards within {:.1}mi)",
        session_id,
        user_id,
        deck_size,
        radius_miles
    );

    HttpResponse::Created().json(StartSessionResponse {
        session_id,
        radius_miles,
        criteria,
        deck_size,
        notices: vec![],
    })
}

/// Close a session
///
/// DELETE /api/v1/sessions/{session_id}
async fn end_session(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let session_id = path.into_inner();

    if state.sessions.get(&session_id).await.is_none() {
        return session_not_found(&session_id);
    }

    state.sessions.remove(&session_id).await;
    tracing::info!("Ended session {}", session_id);

    HttpResponse::NoContent().finish()
}

/// Next cards for a session
///
/// POST /api/v1/sessions/{session_id}/cards
///
/// Request body:
/// ```json
/// { "count": 5 }
/// ```
async fn next_cards(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<NextCardsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request(errors.to_string());
    }

    let session_id = path.into_inner();
    let Some(handle) = state.sessions.get(&session_id).await else {
        return session_not_found(&session_id);
    };

    let mut notifier = CollectingNotifier::new();
    let draw = handle.next_cards(req.count, &mut notifier).await;

    if draw.skipped {
        tracing::info!("Card request for session {} dropped, refill in flight", session_id);
    } else {
        tracing::info!(
            "Returning {} cards for session {} ({} left in deck)",
            draw.cards.len(),
            session_id,
            draw.deck_left
        );
    }

    HttpResponse::Ok().json(CardsResponse {
        cards: draw.cards,
        notices: notifier.into_notices(),
        exhausted: draw.exhausted,
        skipped: draw.skipped,
        radius_miles: draw.radius_miles,
    })
}

/// Record a swipe
///
/// POST /api/v1/sessions/{session_id}/swipe
///
/// Request body:
/// ```json
/// {
///   "restaurantId": "string",
///   "direction": "left|right"
/// }
/// ```
async fn swipe(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<SwipeRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request(errors.to_string());
    }

    let session_id = path.into_inner();
    let Some(handle) = state.sessions.get(&session_id).await else {
        return session_not_found(&session_id);
    };

    let mut session = handle.lock().await;
    let mut notifier = CollectingNotifier::new();

    match session.swipe(&req.restaurant_id, req.direction, &mut notifier) {
        Ok(outcome) => {
            tracing::debug!(
                "Swipe {:?} on {} in session {}",
                outcome.direction,
                req.restaurant_id,
                session_id
            );

            HttpResponse::Ok().json(SwipeResponse {
                success: true,
                already_saved: outcome.already_saved,
                achievement_check: outcome.achievement_check,
                notices: notifier.into_notices(),
            })
        }
        Err(e @ SessionError::UnknownRestaurant(_)) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Unknown restaurant".to_string(),
            message: e.to_string(),
            status_code: 404,
        }),
    }
}

/// Replace the session's filter criteria and persist them for later sessions
///
/// PUT /api/v1/sessions/{session_id}/criteria
async fn update_criteria(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<FilterCriteria>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request(errors.to_string());
    }

    let session_id = path.into_inner();
    let Some(handle) = state.sessions.get(&session_id).await else {
        return session_not_found(&session_id);
    };

    let criteria = req.into_inner();
    let mut session = handle.lock().await;
    let deck_size = session.update_criteria(criteria.clone()).await;

    if let Err(e) = state
        .criteria_store
        .save_criteria(session.user_id(), &criteria)
        .await
    {
        tracing::warn!("Failed to persist criteria for {}: {}", session.user_id(), e);
    }

    HttpResponse::Ok().json(CriteriaResponse { criteria, deck_size })
}

/// List a user's saved favorites
///
/// GET /api/v1/users/{user_id}/favorites
async fn list_favorites(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();

    match state.favorites.list_favorites(&user_id).await {
        Ok(favorites) => HttpResponse::Ok().json(FavoritesResponse {
            count: favorites.len(),
            user_id,
            favorites,
        }),
        Err(e) => {
            tracing::error!("Failed to fetch favorites for {}: {}", user_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch favorites".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}
