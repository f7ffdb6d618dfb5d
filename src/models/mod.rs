// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    DietaryMatch, Favorite, FilterCriteria, GeoPoint, PriceTier, Restaurant, SearchRequest,
    SupplyTuning, SwipeDirection, SwipeEvent,
};
pub use requests::{NextCardsRequest, StartSessionRequest, SwipeRequest};
pub use responses::{
    CardsResponse, CriteriaResponse, ErrorResponse, FavoritesResponse, HealthResponse,
    StartSessionResponse, SwipeResponse,
};
