use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;
use crate::models::{Favorite, Restaurant, SwipeDirection, SwipeEvent};
use crate::services::traits::{FavoriteStore, SwipeEventStore};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Restaurant {restaurant_id} is already saved for {user_id}")]
    DuplicateFavorite {
        user_id: String,
        restaurant_id: String,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        StoreError::SqlxError(value)
    }
}

/// Swipe direction column type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "swipe_direction", rename_all = "lowercase")]
pub enum DirectionColumn {
    Left,
    Right,
}

impl From<SwipeDirection> for DirectionColumn {
    fn from(value: SwipeDirection) -> Self {
        match value {
            SwipeDirection::Left => DirectionColumn::Left,
            SwipeDirection::Right => DirectionColumn::Right,
        }
    }
}

/// PostgreSQL client for favorites and swipe history
///
/// The swipe table is append-only. Recency of passes is evaluated by the
/// query at read time; nothing is pruned.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

#[async_trait]
impl FavoriteStore for PostgresClient {
    async fn insert_favorite(&self, favorite: &Favorite) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO favorites (user_id, restaurant_id, snapshot, created_at)
            VALUES ($1, $2, $3, $4)
        "#;

        let result = sqlx::query(query)
            .bind(&favorite.user_id)
            .bind(&favorite.restaurant_id)
            .bind(Json(&favorite.restaurant))
            .bind(favorite.created_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => {
                tracing::debug!(
                    "Saved favorite: {} -> {}",
                    favorite.user_id,
                    favorite.restaurant_id
                );
                Ok(())
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateFavorite {
                    user_id: favorite.user_id.clone(),
                    restaurant_id: favorite.restaurant_id.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_favorites(&self, user_id: &str) -> Result<Vec<Favorite>, StoreError> {
        let query = r#"
            SELECT user_id, restaurant_id, snapshot, created_at
            FROM favorites
            WHERE user_id = $1
            ORDER BY created_at DESC
        "#;

        let rows = sqlx::query(query).bind(user_id).fetch_all(&self.pool).await?;

        let favorites = rows
            .iter()
            .map(|row| -> Result<Favorite, sqlx::Error> {
                let snapshot: Json<Restaurant> = row.try_get("snapshot")?;
                Ok(Favorite {
                    user_id: row.try_get("user_id")?,
                    restaurant_id: row.try_get("restaurant_id")?,
                    restaurant: snapshot.0,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(favorites)
    }

    async fn liked_ids(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let query = r#"
            SELECT restaurant_id
            FROM favorites
            WHERE user_id = $1
        "#;

        let rows = sqlx::query(query).bind(user_id).fetch_all(&self.pool).await?;

        let ids: Vec<String> = rows
            .iter()
            .map(|row| row.try_get::<String, _>("restaurant_id"))
            .collect::<Result<_, sqlx::Error>>()?;

        tracing::debug!("User {} has {} favorites", user_id, ids.len());

        Ok(ids)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl SwipeEventStore for PostgresClient {
    async fn insert_swipe(&self, event: &SwipeEvent) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO swipe_events (user_id, restaurant_id, direction, snapshot, created_at)
            VALUES ($1, $2, $3, $4, $5)
        "#;

        sqlx::query(query)
            .bind(&event.user_id)
            .bind(&event.restaurant.id)
            .bind(DirectionColumn::from(event.direction))
            .bind(Json(&event.restaurant))
            .bind(event.created_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Recorded swipe: {} -> {} ({:?})",
            event.user_id,
            event.restaurant.id,
            event.direction
        );

        Ok(())
    }

    async fn recent_passes(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<(String, DateTime<Utc>)>, StoreError> {
        let query = r#"
            SELECT restaurant_id, MAX(created_at) AS passed_at
            FROM swipe_events
            WHERE user_id = $1
              AND direction = 'left'
              AND created_at > $2
            GROUP BY restaurant_id
        "#;

        let rows = sqlx::query(query)
            .bind(user_id)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        let passes = rows
            .iter()
            .map(|row| -> Result<(String, DateTime<Utc>), sqlx::Error> {
                Ok((row.try_get("restaurant_id")?, row.try_get("passed_at")?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(passes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_conversion() {
        assert!(matches!(DirectionColumn::from(SwipeDirection::Left), DirectionColumn::Left));
        assert!(matches!(DirectionColumn::from(SwipeDirection::Right), DirectionColumn::Right));
    }

    #[test]
    fn test_duplicate_favorite_message() {
        let err = StoreError::DuplicateFavorite {
            user_id: "u1".to_string(),
            restaurant_id: "r1".to_string(),
        };
        assert_eq!(err.to_string(), "Restaurant r1 is already saved for u1");
    }
}
