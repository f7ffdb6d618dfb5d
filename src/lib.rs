//! Munch Algo - restaurant candidate supply service for the Munch swipe app
//!
//! This library keeps a swipe deck supplied: it filters restaurant
//! candidates against the user's criteria and exclusion history, and runs
//! an ordered fallback chain when the deck runs low.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{apply_filters, ExclusionTracker, SessionController, SupplyExpander, SupplyState};
pub use models::{FilterCriteria, PriceTier, Restaurant, SupplyTuning, SwipeDirection};
