use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use crate::models::SupplyTuning;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    #[serde(default)]
    pub supply: SupplySettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    pub endpoint: String,
    pub api_key: String,
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_search_function")]
    pub search_function: String,
    #[serde(default = "default_achievements_function")]
    pub achievements_function: String,
}

fn default_search_function() -> String { "restaurant-search".to_string() }
fn default_achievements_function() -> String { "check-achievements".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub redis_url: String,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupplySettings {
    #[serde(default = "default_refill_threshold")]
    pub refill_threshold: usize,
    #[serde(default = "default_target_count")]
    pub target_count: usize,
    #[serde(default = "default_max_radius_miles")]
    pub max_radius_miles: f64,
    #[serde(default = "default_radius_growth")]
    pub radius_growth: f64,
    #[serde(default = "default_rating_step")]
    pub rating_step: f64,
    #[serde(default = "default_rating_floor")]
    pub rating_floor: f64,
    #[serde(default = "default_fallback_batch")]
    pub fallback_batch: usize,
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
}

impl Default for SupplySettings {
    fn default() -> Self {
        Self {
            refill_threshold: default_refill_threshold(),
            target_count: default_target_count(),
            max_radius_miles: default_max_radius_miles(),
            radius_growth: default_radius_growth(),
            rating_step: default_rating_step(),
            rating_floor: default_rating_floor(),
            fallback_batch: default_fallback_batch(),
            fetch_limit: default_fetch_limit(),
        }
    }
}

fn default_refill_threshold() -> usize { 3 }
fn default_target_count() -> usize { 10 }
fn default_max_radius_miles() -> f64 { 40.0 }
fn default_radius_growth() -> f64 { 1.5 }
fn default_rating_step() -> f64 { 0.5 }
fn default_rating_floor() -> f64 { 3.0 }
fn default_fallback_batch() -> usize { 20 }
fn default_fetch_limit() -> usize { 50 }

impl From<&SupplySettings> for SupplyTuning {
    fn from(settings: &SupplySettings) -> Self {
        Self {
            refill_threshold: settings.refill_threshold,
            target_count: settings.target_count,
            max_radius_miles: settings.max_radius_miles,
            radius_growth: settings.radius_growth,
            rating_step: settings.rating_step,
            rating_floor: settings.rating_floor,
            fallback_batch: settings.fallback_batch,
            fetch_limit: settings.fetch_limit,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_radius_miles")]
    pub default_radius_miles: f64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
    #[serde(default = "default_achievement_interval")]
    pub achievement_interval: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_radius_miles: default_radius_miles(),
            idle_timeout_secs: default_idle_timeout_secs(),
            max_sessions: default_max_sessions(),
            achievement_interval: default_achievement_interval(),
        }
    }
}

fn default_radius_miles() -> f64 { 5.0 }
fn default_idle_timeout_secs() -> u64 { 1800 }
fn default_max_sessions() -> u64 { 10_000 }
fn default_achievement_interval() -> u64 { 5 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with MUNCH__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., MUNCH__SERVER__PORT -> server.port
            .add_source(env_source())
            .build()?;

        let settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        settings.try_deserialize()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("MUNCH")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Apply the conventional unprefixed variables used by hosting platforms
///
/// `DATABASE_URL`, `REDIS_URL` and `BACKEND_API_KEY` take precedence when set.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", url)?;
    }
    if let Ok(url) = env::var("REDIS_URL") {
        builder = builder.set_override("cache.redis_url", url)?;
    }
    if let Ok(key) = env::var("BACKEND_API_KEY") {
        builder = builder.set_override("backend.api_key", key)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_supply_settings() {
        let tuning = SupplyTuning::from(&SupplySettings::default());
        assert_eq!(tuning, SupplyTuning::default());
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("munch-config-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
            [server]
            host = "127.0.0.1"
            port = 8081

            [backend]
            endpoint = "https://backend.test"
            api_key = "anon"

            [database]
            url = "postgres://localhost/munch"

            [cache]
            redis_url = "redis://127.0.0.1:6379"

            [supply]
            target_count = 12
            "#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.server.port, 8081);
        assert_eq!(settings.supply.target_count, 12);
        assert_eq!(settings.supply.max_radius_miles, 40.0);
        assert_eq!(settings.session.achievement_interval, 5);
        assert_eq!(settings.backend.search_function, "restaurant-search");
    }
}
