use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use munch_algo::config::Settings;
use munch_algo::core::{SessionRegistry, WriteBehindQueue};
use munch_algo::models::SupplyTuning;
use munch_algo::routes::{self, AppState, SessionDefaults};
use munch_algo::services::{
    BackendClient, BackendFunctions, CacheManager, FallbackDataset, PostgresClient,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

fn init_tracing(default_level: &str, default_format: &str) {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| default_format.to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Logging settings come from the environment until config is loaded
    let settings = Settings::load();
    match &settings {
        Ok(s) => init_tracing(&s.logging.level, &s.logging.format),
        Err(_) => init_tracing("info", "json"),
    }
    let settings = settings.map_err(|e| startup_error("Failed to load configuration", e))?;

    info!("Starting Munch supply service...");

    let functions = BackendFunctions {
        restaurant_search: settings.backend.search_function.clone(),
        check_achievements: settings.backend.achievements_function.clone(),
    };

    let backend = Arc::new(
        BackendClient::new(
            settings.backend.endpoint.clone(),
            settings.backend.api_key.clone(),
            settings.backend.timeout_secs.unwrap_or(10),
            functions,
        )
        .map_err(|e| startup_error("Failed to build backend client", e))?,
    );

    info!("Backend client initialized ({})", settings.backend.endpoint);

    let cache_ttl = settings.cache.ttl_secs.unwrap_or(2_592_000);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

    let cache = Arc::new(
        CacheManager::new(&settings.cache.redis_url, l1_cache_size, cache_ttl)
            .await
            .map_err(|e| startup_error("Failed to connect to Redis", e))?,
    );

    info!("Cache manager initialized (L1: {} entries, TTL: {}s)", l1_cache_size, cache_ttl);

    let postgres = Arc::new(
        PostgresClient::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
            settings.database.acquire_timeout_secs,
            settings.database.idle_timeout_secs,
        )
        .await
        .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?,
    );

    info!("PostgreSQL client initialized");

    let fallback = Arc::new(
        FallbackDataset::bundled()
            .map_err(|e| startup_error("Failed to parse bundled fallback restaurants", e))?,
    );

    info!("Loaded {} fallback restaurants", fallback.len());

    let (writes, _writer) = WriteBehindQueue::spawn(postgres.clone(), postgres.clone());

    let sessions = SessionRegistry::new(
        settings.session.max_sessions,
        Duration::from_secs(settings.session.idle_timeout_secs),
    );

    let tuning = SupplyTuning::from(&settings.supply);
    info!("Supply tuning: {:?}", tuning);

    let app_state = AppState {
        source: backend.clone(),
        achievements: backend,
        favorites: postgres.clone(),
        swipes: postgres,
        criteria_store: cache,
        fallback,
        writes,
        sessions,
        tuning,
        defaults: SessionDefaults {
            radius_miles: settings.session.default_radius_miles,
            achievement_interval: settings.session.achievement_interval,
        },
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
            .app_data(web::PathConfig::default().error_handler(routes::handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
