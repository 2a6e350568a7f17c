use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stock_service::db::{create_pool, run_migrations, PgMentionRepo, PgStockRepo};
use stock_service::middleware::JwtAuthMiddleware;
use stock_service::services::StockService;
use stock_service::{handlers, routes, Config};

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,stock_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Starting stock-service ({} mode)", config.app.env);

    let pool = create_pool(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to create database pool")?;

    run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations applied");

    let stock_service = StockService::new(
        Arc::new(PgStockRepo::new(pool.clone())),
        Arc::new(PgMentionRepo::new(pool.clone())),
    );

    let bind_addr = (config.app.host.clone(), config.app.port);
    tracing::info!("Listening on {}:{}", config.app.host, config.app.port);

    let app_config = config.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_config.clone()))
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(stock_service.clone()))
            .route("/health", web::get().to(handlers::health_check))
            .service(
                web::scope("/v1")
                    .wrap(JwtAuthMiddleware::new(app_config.auth.jwt_secret.clone()))
                    .configure(routes::configure),
            )
    })
    .bind(bind_addr)
    .context("Failed to bind HTTP listener")?
    .run()
    .await
    .context("HTTP server failed")
}
