use std::sync::Arc;

use actix_web::{middleware::from_fn, middleware::Logger, web, App, HttpServer};

use business_profile_service::config::{AppConfig, StoreBackend};
use business_profile_service::cors::{self, CorsPolicy};
use business_profile_service::handlers;
use business_profile_service::service::QueryService;
use business_profile_service::store::{DynamoStore, InMemoryStore, RecordStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|err| {
        log::error!("Invalid configuration: {err}");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, err)
    })?;
    let bind_address = config.bind_address();

    let store: Arc<dyn RecordStore> = match config.store_backend {
        StoreBackend::DynamoDb => Arc::new(
            DynamoStore::connect(
                &config.aws_region,
                config.dynamodb_endpoint.as_deref(),
                config.tables.clone(),
                config.scan_follow_pages,
            )
            .await,
        ),
        StoreBackend::Memory => {
            let memory = match &config.memory_seed_path {
                Some(path) => InMemoryStore::from_seed_file(path).await.map_err(|err| {
                    log::error!("Failed to seed in-memory store: {err}");
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, err)
                })?,
                None => {
                    log::warn!("STORE_BACKEND=memory without MEMORY_SEED_PATH; starting empty");
                    InMemoryStore::new()
                }
            };
            Arc::new(memory)
        }
    };

    let service = web::Data::new(QueryService::new(store, config.fetch_concurrency));
    let cors_policy = web::Data::new(CorsPolicy::new(config.allowed_origins.clone()));

    log::info!(
        "🚀 Starting Business Profile Service on {} ({:?} store, fetch concurrency {})",
        bind_address,
        config.store_backend,
        config.fetch_concurrency
    );

    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .app_data(cors_policy.clone())
            .wrap(from_fn(cors::allowlisted_origin))
            .wrap(Logger::default())
            .configure(handlers::routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
