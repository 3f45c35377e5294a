use actix_web::{web, App, HttpServer};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use db_pool::{create_pool, DbConfig};
use feed_service::db::PgFeedStore;
use feed_service::handlers;
use feed_service::metrics::serve_metrics;
use feed_service::services::{CategoryBlocklist, CategoryCatalog};
use feed_service::{AppServices, Config};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Feed Service
///
/// Serves personalized and recency-ordered feeds.
///
/// # Routes
///
/// - `/api/v1/feed` - Ranked feed for the caller
/// - `/api/v1/categories/{name}/posts` - Posts in one category
/// - `/api/v1/interests` - Caller's recorded interests
/// - `/api/v1/internal/classifications` - Record classifier output for a post
/// - `/metrics` - Prometheus metrics
#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting feed-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);
    if config.feed.internal_api_key.is_none() {
        tracing::warn!(
            "INTERNAL_API_KEY not set, /api/v1/internal/classifications accepts unauthenticated writes"
        );
    }

    let mut db_cfg = DbConfig::from_env("feed-service", &config.database.url);
    if std::env::var("DB_MAX_CONNECTIONS").is_err() {
        db_cfg.max_connections = config.database.max_connections;
    }
    db_cfg.min_connections = db_cfg.min_connections.min(db_cfg.max_connections);
    db_cfg.log_config();

    let db_pool = match create_pool(db_cfg).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {:#}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    let blocklist = match &config.feed.blocked_categories_path {
        Some(path) => CategoryBlocklist::load_from_file(path),
        None => {
            tracing::info!("BLOCKED_CATEGORIES_PATH not set, no categories blocked");
            CategoryBlocklist::empty()
        }
    };
    let catalog = match &config.feed.categories_path {
        Some(path) => CategoryCatalog::load_from_file(path),
        None => CategoryCatalog::default(),
    };

    let services = AppServices::new(
        Arc::new(PgFeedStore::new(db_pool)),
        blocklist,
        catalog,
        &config.feed,
    );
    let feed_state = web::Data::new(services.feed);
    let classification_state = web::Data::new(services.classification);
    let internal_key = web::Data::new(services.internal_api_key);

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(feed_state.clone())
            .app_data(classification_state.clone())
            .app_data(internal_key.clone())
            .configure(handlers::extractor_configs)
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(serve_metrics))
            .service(web::scope("/api/v1").configure(handlers::configure))
    })
    .bind(&bind_address)?
    .shutdown_timeout(30)
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, stopping HTTP server");
        handle.stop(true).await;
    });

    server.await?;
    tracing::info!("feed-service stopped");
    Ok(())
}
