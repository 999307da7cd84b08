use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use inkrelay::ai::{session, ArticleGenerator, BackendFactory, PromptSessionCache};
use inkrelay::api::middleware::BearerAuth;
use inkrelay::cli::{
    commands::{Cli, Commands},
    run_cli,
};
use inkrelay::config::AppConfig;
use inkrelay::db;
use inkrelay::identity::IdentityFactory;
use inkrelay::realtime::{MessagingChannel, PresenceTracker, SessionRegistry};

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({"status": "healthy"}))
}

async fn index() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Inkrelay API is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if !matches!(cli.command, Commands::Serve) {
        run_cli(cli.command, cli.config).await;
        return Ok(());
    }

    info!("Starting Inkrelay server...");

    let config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let db_pool = match db::get_connection(&config.database) {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let identity = match IdentityFactory::create_default(&config) {
        Some(provider) => provider,
        None => {
            error!("Failed to initialize identity provider from config mapping");
            std::process::exit(1);
        }
    };

    let backend = match BackendFactory::create_default(&config) {
        Some(backend) => backend,
        None => {
            error!("Failed to initialize AI backend from config mapping");
            std::process::exit(1);
        }
    };

    let prompt_cache = Arc::new(PromptSessionCache::default());
    session::spawn_sweeper(prompt_cache.clone(), session::SWEEP_INTERVAL);

    let generator = Arc::new(ArticleGenerator::new(
        backend,
        config.ai.models.clone(),
        prompt_cache,
    ));

    let registry = Arc::new(SessionRegistry::new());
    let presence = PresenceTracker::new(registry.clone(), db_pool.clone());
    let channel = MessagingChannel::new(registry.clone(), db_pool.clone());

    let host = config.server.host.clone();
    let port = config.server.port;

    info!("Server listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(identity.clone()))
            .app_data(web::Data::new(generator.clone()))
            .app_data(web::Data::new(presence.clone()))
            .app_data(web::Data::new(channel.clone()))
            .route("/", web::get().to(index))
            .route("/health", web::get().to(health))
            .wrap(BearerAuth)
            .configure(inkrelay::api::routes::configure)
            .configure(inkrelay::api::websocket::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
