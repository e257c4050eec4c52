use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use kindred_match::config::Settings;
use kindred_match::core::MatchEngine;
use kindred_match::routes::{self, matches::AppState};
use kindred_match::services::{
    CacheManager, EventSink, InMemoryProfileStore, PostgresProfileStore, ProfileStore, TracingEventSink,
};
use std::sync::Arc;
use tracing::{info, error, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_logging(settings: &Settings) {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

async fn build_store(settings: &Settings) -> std::io::Result<Arc<dyn ProfileStore>> {
    let db = &settings.database;

    if let Some(url) = &db.url {
        let store = PostgresProfileStore::new(
            url,
            db.max_connections.unwrap_or(10),
            db.min_connections.unwrap_or(1),
        )
        .await
        .map_err(|e| {
            error!("Failed to connect to PostgreSQL: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?;
        return Ok(Arc::new(store));
    }

    let store = match &db.seed_file {
        Some(path) => InMemoryProfileStore::from_json_file(path).map_err(|e| {
            error!("Failed to load profiles from {}: {}", path, e);
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?,
        None => InMemoryProfileStore::default(),
    };
    info!("Using in-memory profile store ({} profiles)", store.len().await);
    Ok(Arc::new(store))
}

async fn build_cache(settings: &Settings) -> Arc<CacheManager> {
    let cache = &settings.cache;
    if !cache.enabled {
        info!("Response cache disabled");
        return Arc::new(CacheManager::disabled());
    }

    match &cache.redis_url {
        Some(url) => match CacheManager::new(url, cache.l1_cache_size, cache.ttl_secs).await {
            Ok(c) => {
                info!("Cache manager initialized (L1: {} entries, L2: redis, TTL: {}s)", cache.l1_cache_size, cache.ttl_secs);
                Arc::new(c)
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), falling back to in-process cache", e);
                Arc::new(CacheManager::in_memory(cache.l1_cache_size, cache.ttl_secs))
            }
        },
        None => {
            info!("Cache manager initialized (L1 only: {} entries, TTL: {}s)", cache.l1_cache_size, cache.ttl_secs);
            Arc::new(CacheManager::in_memory(cache.l1_cache_size, cache.ttl_secs))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings);
    info!("Starting Kindred matching service...");

    let store = build_store(&settings).await?;
    let cache = build_cache(&settings).await;
    let events: Arc<dyn EventSink> = Arc::new(TracingEventSink);

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    // Evaluations run on their own runtime so HTTP workers stay responsive
    let eval_threads = settings
        .matching
        .workers
        .unwrap_or_else(|| std::thread::available_parallelism().map_or(4, |n| n.get()));
    let eval_runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(eval_threads)
        .thread_name("kindred-eval")
        .enable_all()
        .build()?;

    let engine = MatchEngine::new(settings.engine_config()).with_worker_pool(eval_runtime.handle().clone());
    info!("Match engine initialized ({} evaluation threads)", eval_threads);

    let app_state = AppState {
        engine,
        store,
        cache,
        events,
        limits: settings.matching.clone(),
    };

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host.as_str(), port));

    let result = match server {
        Ok(server) => {
            info!("Starting HTTP server on {}:{}", host, port);
            server.run().await
        }
        Err(e) => {
            error!("Failed to bind {}:{}: {}", host, port, e);
            Err(e)
        }
    };

    // A runtime cannot be dropped from async context
    eval_runtime.shutdown_background();
    result
}
