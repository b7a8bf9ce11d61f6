//! Social Sentiment Analyzer — Binary Entrypoint
//! Boots the Axum HTTP server: config, Reddit client, analyzer state and `/metrics`.

use shuttle_axum::ShuttleAxum;
use social_sentiment_analyzer::{app, metrics::Metrics};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default, JSON lines when LOG_FORMAT=json.
/// RUST_LOG overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("social_sentiment_analyzer=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let (json_layer, compact_layer) = if json {
        (Some(fmt::layer().json()), None)
    } else {
        (None, Some(fmt::layer().compact()))
    };

    // The runtime may already have installed a subscriber; keep it in that case.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(compact_layer)
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev (Reddit credentials, SENTIMENT_CONFIG_PATH); no-op in prod.
    let _ = dotenvy::dotenv();

    init_tracing();

    let mut router = app()?;
    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics disabled"),
    }

    Ok(router.into())
}
