use chrono::{DateTime, Utc};
use crate::core::exclusion::ExclusionTracker;
use crate::models::{DietaryMatch, FilterCriteria, Restaurant, SupplyTuning};

/// Check a candidate against the user's filter criteria
///
/// All predicates must hold. Distance is not checked here: the fetch
/// radius already constrains it.
#[inline]
pub fn matches_criteria(candidate: &Restaurant, criteria: &FilterCriteria) -> bool {
    if candidate.price_tier > criteria.max_price_tier {
        return false;
    }

    if candidate.rating < criteria.min_rating {
        return false;
    }

    if !matches_dietary(candidate, criteria) {
        return false;
    }

    matches_cuisine(candidate, &criteria.cuisine_preferences)
}

/// Dietary tag predicate
#[inline]
pub fn matches_dietary(candidate: &Restaurant, criteria: &FilterCriteria) -> bool {
    if criteria.dietary_tags.is_empty() {
        return true;
    }

    if criteria.dietary_match == DietaryMatch::Lenient && candidate.dietary_tags.is_empty() {
        return true;
    }

    candidate.dietary_tags.iter().any(|tag| {
        criteria
            .dietary_tags
            .iter()
            .any(|wanted| wanted.eq_ignore_ascii_case(tag))
    })
}

/// Cuisine predicate: case-insensitive substring match in either direction
#[inline]
pub fn matches_cuisine(candidate: &Restaurant, preferences: &[String]) -> bool {
    if preferences.is_empty() {
        return true;
    }

    // A candidate without a cuisine cannot satisfy a cuisine preference
    let cuisine = candidate.cuisine.trim().to_lowercase();
    if cuisine.is_empty() {
        return false;
    }

    preferences.iter().any(|preference| {
        let preference = preference.trim().to_lowercase();
        !preference.is_empty() && (cuisine.contains(&preference) || preference.contains(&cuisine))
    })
}

/// True when the candidate was liked, or passed within the recency window
#[inline]
pub fn is_excluded(candidate: &Restaurant, exclusions: &ExclusionTracker, now: DateTime<Utc>) -> bool {
    exclusions.is_liked(&candidate.id) || exclusions.is_recently_passed(&candidate.id, now)
}

/// Narrow a candidate list to those passing the criteria and exclusions
///
/// Pure and order preserving; an empty result is a valid outcome.
pub fn apply_filters(
    candidates: Vec<Restaurant>,
    criteria: &FilterCriteria,
    exclusions: &ExclusionTracker,
    now: DateTime<Utc>,
) -> Vec<Restaurant> {
    candidates
        .into_iter()
        .filter(|candidate| !is_excluded(candidate, exclusions, now))
        .filter(|candidate| matches_criteria(candidate, criteria))
        .collect()
}

/// Loosen criteria for the relaxation stage
///
/// Raises the price ceiling one tier, lowers the rating floor by one step
/// (never below `rating_floor`, never raising a lower value) and admits
/// candidates that list no dietary tags.
pub fn relax_criteria(criteria: &FilterCriteria, tuning: &SupplyTuning) -> FilterCriteria {
    let lowered = criteria.min_rating - tuning.rating_step;
    let min_rating = if criteria.min_rating <= tuning.rating_floor {
        criteria.min_rating
    } else {
        lowered.max(tuning.rating_floor)
    };

    FilterCriteria {
        max_price_tier: criteria.max_price_tier.step_up(),
        min_rating,
        dietary_match: DietaryMatch::Lenient,
        ..criteria.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceTier;

    fn create_test_restaurant(id: &str, tier: PriceTier, rating: f64, cuisine: &str) -> Restaurant {
        Restaurant {
            id: id.to_string(),
            name: format!("Restaurant {}", id),
            cuisine: cuisine.to_string(),
            price_tier: tier,
            rating,
            distance_miles: 1.2,
            dietary_tags: vec!["vegetarian".to_string()],
            eta_minutes: 25,
            deal: None,
            latitude: None,
            longitude: None,
            image_url: None,
        }
    }

    #[test]
    fn test_price_and_rating() {
        let criteria = FilterCriteria {
            max_price_tier: PriceTier::Medium,
            min_rating: 4.0,
            ..FilterCriteria::default()
        };

        assert!(matches_criteria(&create_test_restaurant("1", PriceTier::Low, 4.0, "Thai"), &criteria));
        assert!(!matches_criteria(&create_test_restaurant("2", PriceTier::High, 4.8, "Thai"), &criteria));
        assert!(!matches_criteria(&create_test_restaurant("3", PriceTier::Low, 3.9, "Thai"), &criteria));
    }

    #[test]
    fn test_cuisine_substring_case_insensitive() {
        let restaurant = create_test_restaurant("1", PriceTier::Low, 4.0, "Northern Thai");

        assert!(matches_cuisine(&restaurant, &["thai".to_string()]));
        assert!(matches_cuisine(&restaurant, &["Mexican".to_string(), "THAI".to_string()]));
        assert!(!matches_cuisine(&restaurant, &["sushi".to_string()]));
        assert!(matches_cuisine(&restaurant, &[]));
    }

    #[test]
    fn test_missing_cuisine_fails_preferences() {
        let blank = create_test_restaurant("1", PriceTier::Low, 4.0, "");
        let spaces = create_test_restaurant("2", PriceTier::Low, 4.0, "  ");
        let criteria = FilterCriteria {
            cuisine_preferences: vec!["sushi".to_string()],
            ..FilterCriteria::default()
        };

        assert!(!matches_cuisine(&blank, &criteria.cuisine_preferences));
        assert!(!matches_cuisine(&spaces, &criteria.cuisine_preferences));
        assert!(!matches_criteria(&blank, &criteria));

        // No preference still admits it
        assert!(matches_cuisine(&blank, &[]));
    }

    #[test]
    fn test_dietary_overlap_vs_lenient() {
        let mut untagged = create_test_restaurant("1", PriceTier::Low, 4.0, "Thai");
        untagged.dietary_tags.clear();

        let mut criteria = FilterCriteria {
            dietary_tags: vec!["Vegan".to_string(), "vegetarian".to_string()],
            ..FilterCriteria::default()
        };

        assert!(matches_dietary(&create_test_restaurant("2", PriceTier::Low, 4.0, "Thai"), &criteria));
        assert!(!matches_dietary(&untagged, &criteria));

        criteria.dietary_match = DietaryMatch::Lenient;
        assert!(matches_dietary(&untagged, &criteria));
    }

    #[test]
    fn test_relax_criteria() {
        let tuning = SupplyTuning::default();
        let criteria = FilterCriteria {
            max_price_tier: PriceTier::Low,
            min_rating: 4.5,
            ..FilterCriteria::default()
        };

        let relaxed = relax_criteria(&criteria, &tuning);
        assert_eq!(relaxed.max_price_tier, PriceTier::Medium);
        assert_eq!(relaxed.min_rating, 4.0);
        assert_eq!(relaxed.dietary_match, DietaryMatch::Lenient);

        let floor = relax_criteria(&FilterCriteria { min_rating: 3.2, ..criteria.clone() }, &tuning);
        assert_eq!(floor.min_rating, 3.0);

        let below = relax_criteria(&FilterCriteria { min_rating: 2.0, ..criteria }, &tuning);
        assert_eq!(below.min_rating, 2.0);
    }

    #[test]
    fn test_relax_caps_at_highest_tier() {
        let criteria = FilterCriteria::default();
        let relaxed = relax_criteria(&criteria, &SupplyTuning::default());
        assert_eq!(relaxed.max_price_tier, PriceTier::High);
    }
}
