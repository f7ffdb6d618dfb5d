use std::collections::HashSet;
use crate::core::exclusion::ExclusionTracker;
use crate::models::Restaurant;

/// Session-scoped record of cards already displayed
///
/// Keeps the snapshots in display order so the recycling stage can
/// re-admit them.
#[derive(Debug, Clone, Default)]
pub struct ShownHistory {
    ids: HashSet<String>,
    shown: Vec<Restaurant>,
}

impl ShownHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the card was already in the history
    pub fn mark(&mut self, restaurant: &Restaurant) -> bool {
        if !self.ids.insert(restaurant.id.clone()) {
            return false;
        }
        self.shown.push(restaurant.clone());
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn get(&self, id: &str) -> Option<&Restaurant> {
        if !self.contains(id) {
            return None;
        }
        self.shown.iter().find(|r| r.id == id)
    }

    /// Shown cards eligible for recycling: everything not liked
    pub fn recyclable(&self, exclusions: &ExclusionTracker) -> Vec<Restaurant> {
        self.shown
            .iter()
            .filter(|r| !exclusions.is_liked(&r.id))
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.shown.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
