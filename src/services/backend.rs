use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use crate::models::{Restaurant, SearchRequest};
use crate::services::traits::{AchievementChecker, CandidateSource};

/// Errors that can occur when calling the backend functions
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Function names exposed by the backend
#[derive(Debug, Clone)]
pub struct BackendFunctions {
    pub restaurant_search: String,
    pub check_achievements: String,
}

impl Default for BackendFunctions {
    fn default() -> Self {
        Self {
            restaurant_search: "restaurant-search".to_string(),
            check_achievements: "check-achievements".to_string(),
        }
    }
}

/// Client for the hosted backend's serverless functions
///
/// Handles:
/// - Restaurant search (proxied third-party providers)
/// - Achievement checks after swipes
pub struct BackendClient {
    base_url: String,
    api_key: String,
    client: Client,
    functions: BackendFunctions,
}

impl BackendClient {
    /// Create a new backend client
    pub fn new(
        base_url: String,
        api_key: String,
        timeout_secs: u64,
        functions: BackendFunctions,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
            functions,
        })
    }

    fn function_url(&self, name: &str) -> String {
        format!(
            "{}/functions/v1/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(name)
        )
    }

    async fn invoke(&self, name: &str, body: &Value) -> Result<Value, BackendError> {
        let url = self.function_url(name);

        tracing::debug!("Invoking backend function: {}", url);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(BackendError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Backend function {} failed: {} - {}", name, status, body);
            return Err(BackendError::ApiError(format!("{} returned {}", name, status)));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CandidateSource for BackendClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Restaurant>, BackendError> {
        let body = serde_json::to_value(request)
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to encode request: {}", e)))?;

        let json = self.invoke(&self.functions.restaurant_search, &body).await?;

        let records = json
            .get("restaurants")
            .and_then(|r| r.as_array())
            .ok_or_else(|| BackendError::InvalidResponse("Missing restaurants array".into()))?;

        // Skip malformed records rather than failing the whole batch
        let restaurants: Vec<Restaurant> = records
            .iter()
            .filter_map(|record| match serde_json::from_value(record.clone()) {
                Ok(restaurant) => Some(restaurant),
                Err(e) => {
                    tracing::debug!("Skipping malformed restaurant record: {}", e);
                    None
                }
            })
            .collect();

        tracing::debug!(
            "Search returned {} restaurants (radius: {:.0}m)",
            restaurants.len(),
            request.radius
        );

        Ok(restaurants)
    }
}

#[async_trait]
impl AchievementChecker for BackendClient {
    async fn check_achievements(&self, user_id: &str) -> Result<(), BackendError> {
        self.invoke(&self.functions.check_achievements, &json!({ "userId": user_id }))
            .await?;

        tracing::debug!("Achievement check completed for {}", user_id);
        Ok(())
    }
}
