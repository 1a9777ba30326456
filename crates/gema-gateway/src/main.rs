//! Gema Gateway — minimal proxy between the chat clients and the upstream
//! completion/speech models. Three endpoints under `/api`, health on the side.

mod error;
mod openai;
mod routes;

use gema_core::CoreConfig;
use openai::OpenAiBridge;
use routes::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CoreConfig::from_env();
    let bridge = match OpenAiBridge::from_config(&config) {
        Ok(bridge) => Arc::new(bridge),
        Err(e) => {
            tracing::error!("cannot start: {}", e);
            std::process::exit(1);
        }
    };

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        completion: bridge.clone(),
        speech: bridge,
        config: Arc::new(config),
    };
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    tracing::info!("gema gateway listening on {}", bind_addr);
    axum::serve(listener, app).await.unwrap();
}
