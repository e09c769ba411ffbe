//! School records server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use school_records_lib::api::{self, ApiDoc};
use school_records_lib::auth::SessionKeys;
use school_records_lib::config::Config;
use school_records_lib::db::DbPool;
use school_records_lib::middleware;
use school_records_lib::services::{BroadcastEmitter, NotificationEmitter};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, SCHOOL_DB_URL and SCHOOL_SESSION_SECRET must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  School Records Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
        info!("Using development defaults for SCHOOL_DB_URL and SCHOOL_SESSION_SECRET");
    }

    let pool = match DbPool::new(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = pool.run_migrations().await {
        error!("Failed to run migrations: {}", e);
        std::process::exit(1);
    }
    info!("Database migrations complete");

    // One emitter for the whole process: sockets subscribe to it, handlers
    // see it only through the NotificationEmitter trait.
    let emitter = Arc::new(BroadcastEmitter::with_capacity(
        config.notification_channel_capacity,
    ));
    let emitter_data = web::Data::from(emitter.clone());
    let notifier: Arc<dyn NotificationEmitter> = emitter;
    let notifier_data: web::Data<dyn NotificationEmitter> = web::Data::from(notifier);

    let session_keys = web::Data::new(SessionKeys::from_settings(&config.session));
    let pool_data = web::Data::new(pool);

    let bind_address = config.bind_address();
    let is_development = config.is_development();
    let cors_origins = config.cors_origins.clone();

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    let server = HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
            .max_age(3600);
        if is_development {
            cors = cors
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000");
        }
        for origin in &cors_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            // CORS must wrap everything else
            .wrap(cors)
            .wrap(middleware::RequestLogger)
            .app_data(pool_data.clone())
            .app_data(session_keys.clone())
            .app_data(emitter_data.clone())
            .app_data(notifier_data.clone())
            .app_data(api::json_config())
            .app_data(api::query_config())
            .app_data(api::path_config())
            .service(
                web::scope("/api/v1")
                    .configure(api::configure_api)
                    .configure(api::configure_websocket_routes),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
