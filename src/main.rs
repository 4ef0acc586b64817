use actix_cors::Cors;
use actix_web::{middleware::Compress, web, App, HttpServer};
use anyhow::Context;
use tracing::{info, Level};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi; // bring trait into scope for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use talentpitch::auth::TokenKeys;
use talentpitch::config::AppConfig;
use talentpitch::openapi::ApiDoc;
use talentpitch::repo::build_repo;
use talentpitch::{config, AppState, AuthGate};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env automatically only in debug builds to reduce manual setup overhead.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cfg = AppConfig::from_env().context("invalid configuration")?;
    info!(storage = ?cfg.storage, port = cfg.port, "bootstrapping talentpitch server");

    // bound exactly once; every service gets its handle from AppState
    let repo = build_repo(&cfg).await.context("failed to bind storage backend")?;
    let state = AppState::new(repo, TokenKeys::new(&cfg.jwt_secret));
    let gate = AuthGate::new(TokenKeys::new(&cfg.jwt_secret));
    let openapi = ApiDoc::openapi();
    let frontend_url = cfg.frontend_url.clone();

    let server = HttpServer::new(move || {
        let cors = {
            let mut c = Cors::default()
                // during local dev allow React/Vite default ports
                .allowed_origin("http://localhost:5173")
                .allowed_origin("http://127.0.0.1:5173")
                .allow_any_header()
                .allowed_methods(["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .max_age(3600);
            if let Some(front) = frontend_url.as_deref() {
                c = c.allowed_origin(front);
            }
            c
        };

        // wrap order: the last wrap runs first, so CORS preflight and logging
        // see the request before the gate does
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(gate.clone())
            .wrap(Compress::default())
            .wrap(cors)
            .wrap(TracingLogger::default())
            .configure(config)
            .service(SwaggerUi::new("/docs/{_:.*}").url("/docs/openapi.json", openapi.clone()))
    })
    .bind((cfg.bind_addr.as_str(), cfg.port))
    .with_context(|| format!("failed to bind {}:{}", cfg.bind_addr, cfg.port))?;

    info!("Listening on http://{}:{}", cfg.bind_addr, cfg.port);

    server.run().await?;
    Ok(())
}
