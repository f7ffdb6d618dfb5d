use serde::Deserialize;
use crate::core::distance::distance_miles;
use crate::models::{GeoPoint, Restaurant};

const BUNDLED: &str = include_str!("../../data/fallback_restaurants.toml");

#[derive(Debug, Deserialize)]
struct DatasetFile {
    #[serde(default)]
    restaurants: Vec<Restaurant>,
}

/// Fixed backup list used only when live sources under-supply
#[derive(Debug, Clone, Default)]
pub struct FallbackDataset {
    restaurants: Vec<Restaurant>,
}

impl FallbackDataset {
    /// Parse the dataset bundled with the binary
    pub fn bundled() -> Result<Self, toml::de::Error> {
        Self::from_toml(BUNDLED)
    }

    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        let file: DatasetFile = toml::from_str(source)?;
        Ok(Self { restaurants: file.restaurants })
    }

    pub fn new(restaurants: Vec<Restaurant>) -> Self {
        Self { restaurants }
    }

    pub fn len(&self) -> usize {
        self.restaurants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.restaurants.is_empty()
    }

    /// Snapshot of the dataset with distances measured from `origin`
    ///
    /// Records without coordinates keep their bundled distance.
    pub fn candidates_near(&self, origin: GeoPoint) -> Vec<Restaurant> {
        self.restaurants
            .iter()
            .map(|restaurant| {
                let mut restaurant = restaurant.clone();
                if let Some(location) = restaurant.location() {
                    restaurant.distance_miles = distance_miles(origin, location);
                }
                restaurant
            })
            .collect()
    }
}
