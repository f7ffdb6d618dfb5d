use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use crate::core::{
    distance::{expanded_radius, miles_to_meters},
    exclusion::ExclusionTracker,
    filters::{apply_filters, is_excluded, relax_criteria},
    history::ShownHistory,
    notify::Notifier,
};
use crate::models::{FilterCriteria, GeoPoint, Restaurant, SearchRequest, SupplyTuning};
use crate::services::{BackendError, CandidateSource, FallbackDataset};

/// Mutable browsing state the expander reads and updates
#[derive(Debug, Clone)]
pub struct SupplyState {
    pub origin: GeoPoint,
    pub radius_miles: f64,
    pub criteria: FilterCriteria,
    pub exclusions: ExclusionTracker,
    pub shown: ShownHistory,
}

impl SupplyState {
    pub fn new(origin: GeoPoint, radius_miles: f64, criteria: FilterCriteria) -> Self {
        Self {
            origin,
            radius_miles,
            criteria,
            exclusions: ExclusionTracker::new(),
            shown: ShownHistory::new(),
        }
    }
}

/// One fallback strategy in the expansion chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplyStage {
    RadiusExpansion,
    FilterRelaxation,
    StaticFallback,
    HistoryRecycling,
}

impl SupplyStage {
    /// Stages in the order they are tried
    pub const CHAIN: [SupplyStage; 4] = [
        SupplyStage::RadiusExpansion,
        SupplyStage::FilterRelaxation,
        SupplyStage::StaticFallback,
        SupplyStage::HistoryRecycling,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SupplyStage::RadiusExpansion => "radius_expansion",
            SupplyStage::FilterRelaxation => "filter_relaxation",
            SupplyStage::StaticFallback => "static_fallback",
            SupplyStage::HistoryRecycling => "history_recycling",
        }
    }

    fn notice(self, state: &SupplyState) -> String {
        match self {
            SupplyStage::RadiusExpansion => {
                format!("Expanded search radius to {:.0} miles", state.radius_miles)
            }
            SupplyStage::FilterRelaxation => "Relaxed your filters to find more spots".to_string(),
            SupplyStage::StaticFallback => "Added some popular picks".to_string(),
            SupplyStage::HistoryRecycling => "Showing fresh picks from earlier".to_string(),
        }
    }
}

/// What a single stage contributed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub stage: SupplyStage,
    /// New unique candidates this stage added
    pub added: usize,
    pub failed: bool,
}

/// Result of one expansion run
#[derive(Debug, Clone, Default)]
pub struct SupplyOutcome {
    /// Deduplicated and shuffled
    pub candidates: Vec<Restaurant>,
    pub stages: Vec<StageReport>,
    /// True when another expansion was already in flight
    pub skipped: bool,
}

impl SupplyOutcome {
    pub fn ran(&self, stage: SupplyStage) -> bool {
        self.stages.iter().any(|report| report.stage == stage)
    }
}

/// Clears the in-flight flag when the expansion finishes
struct RefreshGuard<'a>(&'a AtomicBool);

impl<'a> RefreshGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Snapshot of an expander's refresh state taken when a trigger arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    runs: u64,
    in_flight: bool,
}

/// Read-only view of an expander's re-entrancy flag, usable without
/// holding the session that owns the expander
#[derive(Debug, Clone)]
pub struct RefreshMonitor {
    refreshing: Arc<AtomicBool>,
    runs: Arc<AtomicU64>,
}

impl RefreshMonitor {
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    /// Runs are read before the flag; `expand` sets the flag before counting a run
    pub fn ticket(&self) -> RefreshTicket {
        let runs = self.runs.load(Ordering::Acquire);
        let in_flight = self.refreshing.load(Ordering::Acquire);
        RefreshTicket { runs, in_flight }
    }

    /// True when an expansion was running at ticket time or has started since
    pub fn superseded(&self, ticket: &RefreshTicket) -> bool {
        ticket.in_flight || self.runs.load(Ordering::Acquire) != ticket.runs
    }
}

/// Keeps the deck supplied once the filtered candidates run low
///
/// # Fallback chain
/// 1. Radius expansion
/// 2. Filter relaxation
/// 3. Static fallback inclusion
/// 4. Shown-history recycling
///
/// Stages run in order until `target_count` unique candidates are
/// collected. A failing stage counts as zero and the chain continues.
pub struct SupplyExpander {
    source: Arc<dyn CandidateSource>,
    fallback: Arc<FallbackDataset>,
    tuning: SupplyTuning,
    refreshing: Arc<AtomicBool>,
    runs: Arc<AtomicU64>,
}

impl SupplyExpander {
    pub fn new(
        source: Arc<dyn CandidateSource>,
        fallback: Arc<FallbackDataset>,
        tuning: SupplyTuning,
    ) -> Self {
        Self {
            source,
            fallback,
            tuning,
            refreshing: Arc::new(AtomicBool::new(false)),
            runs: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn tuning(&self) -> &SupplyTuning {
        &self.tuning
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    pub fn monitor(&self) -> RefreshMonitor {
        RefreshMonitor {
            refreshing: Arc::clone(&self.refreshing),
            runs: Arc::clone(&self.runs),
        }
    }

    /// Fetch at the current radius and filter with the current criteria
    ///
    /// Used for the initial deck and after criteria changes.
    pub async fn fetch_filtered(&self, state: &SupplyState) -> Result<Vec<Restaurant>, BackendError> {
        let fetched = self.fetch(state.origin, state.radius_miles).await?;
        let filtered = apply_filters(fetched, &state.criteria, &state.exclusions, Utc::now());
        Ok(unseen(filtered, &state.shown))
    }

    /// Run the fallback chain
    ///
    /// A call made while another expansion is in flight returns an empty,
    /// skipped outcome without touching `state`.
    pub async fn expand(&self, state: &mut SupplyState, notifier: &mut dyn Notifier) -> SupplyOutcome {
        let Some(_guard) = RefreshGuard::acquire(&self.refreshing) else {
            tracing::debug!("Supply expansion already in flight, ignoring trigger");
            return SupplyOutcome {
                skipped: true,
                ..SupplyOutcome::default()
            };
        };
        self.runs.fetch_add(1, Ordering::AcqRel);

        let now = Utc::now();
        let mut collected: Vec<Restaurant> = Vec::new();
        let mut collected_ids: HashSet<String> = HashSet::new();
        let mut stages = Vec::new();

        for stage in SupplyStage::CHAIN {
            if collected_ids.len() >= self.tuning.target_count {
                break;
            }

            let result = match stage {
                SupplyStage::RadiusExpansion => self.expand_radius(state, now).await,
                SupplyStage::FilterRelaxation => self.relax_filters(state, now).await,
                SupplyStage::StaticFallback => Ok(self.static_fallback(state, now)),
                SupplyStage::HistoryRecycling => Ok(recycle_history(state)),
            };

            let report = match result {
                Ok(batch) => {
                    let added = merge_unique(&mut collected, &mut collected_ids, batch);
                    if added > 0 {
                        notifier.info(stage.notice(state));
                    }
                    StageReport { stage, added, failed: false }
                }
                Err(e) => {
                    tracing::warn!("Supply stage {} failed, continuing: {}", stage.name(), e);
                    StageReport { stage, added: 0, failed: true }
                }
            };

            tracing::debug!(
                "Supply stage {} added {} (total {})",
                stage.name(),
                report.added,
                collected.len()
            );
            stages.push(report);
        }

        shuffle_candidates(&mut collected, &mut rand::thread_rng());

        if collected.is_empty() {
            tracing::info!("Supply exhausted after {} stages", stages.len());
            notifier.error("No more restaurants nearby. Try widening your filters.".to_string());
        } else {
            tracing::info!(
                "Supply expansion produced {} candidates (radius {:.1}mi)",
                collected.len(),
                state.radius_miles
            );
        }

        SupplyOutcome {
            candidates: collected,
            stages,
            skipped: false,
        }
    }

    async fn fetch(&self, origin: GeoPoint, radius_miles: f64) -> Result<Vec<Restaurant>, BackendError> {
        let request = SearchRequest {
            latitude: origin.latitude,
            longitude: origin.longitude,
            radius: miles_to_meters(radius_miles),
            limit: self.tuning.fetch_limit,
        };
        self.source.search(&request).await
    }

    /// Stage 1: search again at a wider radius, adopting it on success
    async fn expand_radius(
        &self,
        state: &mut SupplyState,
        now: DateTime<Utc>,
    ) -> Result<Vec<Restaurant>, BackendError> {
        let Some(radius) = expanded_radius(
            state.radius_miles,
            self.tuning.radius_growth,
            self.tuning.max_radius_miles,
        ) else {
            tracing::debug!("Search radius already at {:.0}mi ceiling", state.radius_miles);
            return Ok(vec![]);
        };

        let fetched = self.fetch(state.origin, radius).await?;
        state.radius_miles = radius;

        let filtered = apply_filters(fetched, &state.criteria, &state.exclusions, now);
        Ok(unseen(filtered, &state.shown))
    }

    /// Stage 2: search at the current radius with loosened criteria
    ///
    /// The user's stored criteria are left untouched.
    async fn relax_filters(
        &self,
        state: &mut SupplyState,
        now: DateTime<Utc>,
    ) -> Result<Vec<Restaurant>, BackendError> {
        let relaxed = relax_criteria(&state.criteria, &self.tuning);
        let fetched = self.fetch(state.origin, state.radius_miles).await?;

        let filtered = apply_filters(fetched, &relaxed, &state.exclusions, now);
        Ok(unseen(filtered, &state.shown))
    }

    /// Stage 3: bundled dataset minus excluded and already shown
    ///
    /// Criteria are not applied here, exclusions are.
    fn static_fallback(&self, state: &SupplyState, now: DateTime<Utc>) -> Vec<Restaurant> {
        self.fallback
            .candidates_near(state.origin)
            .into_iter()
            .filter(|r| !is_excluded(r, &state.exclusions, now) && !state.shown.contains(&r.id))
            .take(self.tuning.fallback_batch)
            .collect()
    }
}

/// Stage 4: re-admit shown cards that were not liked, then forget the history
fn recycle_history(state: &mut SupplyState) -> Vec<Restaurant> {
    let recycled = state.shown.recyclable(&state.exclusions);
    state.shown.clear();
    tracing::debug!("Recycled {} previously shown candidates", recycled.len());
    recycled
}

fn unseen(candidates: Vec<Restaurant>, shown: &ShownHistory) -> Vec<Restaurant> {
    candidates
        .into_iter()
        .filter(|r| !shown.contains(&r.id))
        .collect()
}

/// Append candidates whose id was not collected yet; first occurrence wins
fn merge_unique(
    collected: &mut Vec<Restaurant>,
    ids: &mut HashSet<String>,
    batch: Vec<Restaurant>,
) -> usize {
    let before = collected.len();
    for restaurant in batch {
        if ids.insert(restaurant.id.clone()) {
            collected.push(restaurant);
        }
    }
    collected.len() - before
}

/// Drop repeated ids, keeping the first occurrence and input order
pub fn dedupe_by_id(candidates: Vec<Restaurant>) -> Vec<Restaurant> {
    let mut ids = HashSet::new();
    let mut unique = Vec::with_capacity(candidates.len());
    merge_unique(&mut unique, &mut ids, candidates);
    unique
}

/// Uniform in-place permutation (Fisher–Yates)
pub fn shuffle_candidates<R: Rng + ?Sized>(candidates: &mut [Restaurant], rng: &mut R) {
    candidates.shuffle(rng);
}
