// Service exports
pub mod backend;
pub mod cache;
pub mod fallback;
pub mod postgres;
pub mod traits;

pub use backend::{BackendClient, BackendError, BackendFunctions};
pub use cache::{CacheError, CacheKey, CacheManager};
pub use fallback::FallbackDataset;
pub use postgres::{PostgresClient, StoreError};
pub use traits::{AchievementChecker, CandidateSource, CriteriaStore, FavoriteStore, SwipeEventStore};
