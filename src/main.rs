use anyhow::Context;
use http::{header, HeaderName, HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod routes;
mod state;
mod crypto {
    pub mod key;
    pub mod seal;
}

mod models {
    pub mod payload;
}

mod services {
    pub mod session;
}

mod handlers {
    pub mod health;
    pub mod session;
    pub mod user;
}

mod middleware_layer {
    pub mod auth;
    pub mod issuer;
}

mod validation {
    pub mod payload;
}

use config::Config;
use state::AppState;

/// Handles `--generate-key [128|256]`; returns `true` when the flag was present.
fn generate_key_command() -> anyhow::Result<bool> {
    let mut args = std::env::args().skip(1);
    if args.next().as_deref() != Some("--generate-key") {
        return Ok(false);
    }

    let bits: u32 = match args.next() {
        Some(bits) => bits.parse().context("Key size must be 128 or 256")?,
        None => 256,
    };

    println!("{}", crypto::key::generate_key_base64(bits)?);
    Ok(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if generate_key_command()? {
        return Ok(());
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config);

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .frontend_url
                .parse::<HeaderValue>()
                .context("FRONTEND_URL must be a valid origin")?,
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::COOKIE,
            HeaderName::from_static(middleware_layer::auth::SESSION_HEADER),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400));

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(1)
            .burst_size(50)
            .use_headers()
            .finish()
            .context("Invalid rate limit configuration")?,
    );

    let app = routes::build(state)
        .layer(tower_governor::GovernorLayer::new(governor_conf))
        .layer(cors);

    let addr = config.bind_addr;
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
