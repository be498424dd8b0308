use actix_web::{web, App, HttpServer};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pricing_service::artifacts::registry::ArtifactStore;
use pricing_service::artifacts::InferenceContext;
use pricing_service::config::Config;
use pricing_service::handlers::{
    explain_price, get_model_info, get_reference, predict_price, PricingHandlerState,
};

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");

    tracing::info!("Starting pricing-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    // Initialization barrier: every artifact must load and cross-check
    // before the listener binds. A partially initialized service would
    // silently corrupt predictions, so refuse to start instead.
    let store = ArtifactStore::from_config(&config.artifacts)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let context = match InferenceContext::load(&store).await {
        Ok(ctx) => {
            tracing::info!(
                trees = ctx.ensemble.tree_count(),
                features = ctx.schema.len(),
                explainer = ctx.explainer.is_some(),
                "inference context ready"
            );
            Arc::new(ctx)
        }
        Err(e) => {
            tracing::error!("Failed to initialize inference context: {:?}", e);
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to initialize inference context: {}", e),
            ));
        }
    };

    if config.auth.jwt_secret.is_none() {
        tracing::warn!("AUTH_JWT_SECRET not set - prediction endpoints are open (development only)");
    }

    let state = web::Data::new(PricingHandlerState {
        context,
        jwt_secret: config.auth.jwt_secret.clone(),
    });

    tracing::info!("HTTP server listening on 0.0.0.0:{}", config.app.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/health", web::get().to(|| async { "OK" }))
            .service(predict_price)
            .service(explain_price)
            .service(get_reference)
            .service(get_model_info)
    })
    .bind(format!("0.0.0.0:{}", config.app.port))?
    .run()
    .await
}
