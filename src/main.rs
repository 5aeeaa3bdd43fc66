//! Kalyana gateway server

use kalyana::config::GatewayConfig;
use kalyana::gateway::{create_router, AppState};
use kalyana::llm::build_upstream;
use kalyana::persona::load_persona;
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kalyana=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = GatewayConfig::from_env();

    // An unreadable override is a deployment mistake; refuse to start
    let persona = load_persona(config.persona_path.as_deref())?;
    tracing::info!(
        chars = persona.chars().count(),
        custom = config.persona_path.is_some(),
        "Persona loaded"
    );

    // A key that is set but unusable stops startup
    let upstream = build_upstream(&config.llm)?;
    match &upstream {
        Some(service) => tracing::info!(model = %service.model_id(), "Upstream configured"),
        None => tracing::warn!(
            "No upstream credential configured. Set ANTHROPIC_API_KEY; chat requests will fail."
        ),
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(AppState::new(upstream, persona))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Kalyana gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
