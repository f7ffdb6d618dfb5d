// Core supply pipeline exports
pub mod distance;
pub mod exclusion;
pub mod filters;
pub mod history;
pub mod notify;
pub mod recorder;
pub mod session;
pub mod supply;

pub use distance::{distance_miles, expanded_radius, meters_to_miles, miles_to_meters};
pub use exclusion::{recency_window, ExclusionTracker, RECENCY_WINDOW_DAYS};
pub use filters::{apply_filters, is_excluded, matches_criteria, relax_criteria};
pub use history::ShownHistory;
pub use notify::{CollectingNotifier, Notice, NoticeLevel, Notifier};
pub use recorder::{PendingWrite, SwipeOutcome, SwipeRecorder, WriteBehindQueue};
pub use session::{CardDraw, SessionController, SessionError, SessionHandle, SessionRegistry};
pub use supply::{
    dedupe_by_id, shuffle_candidates, RefreshMonitor, RefreshTicket, StageReport, SupplyExpander,
    SupplyOutcome, SupplyStage, SupplyState,
};
