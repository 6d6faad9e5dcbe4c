use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::{routing::get, Router};
use http::{HeaderName, HeaderValue, StatusCode};
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::SmartIpKeyExtractor;
use tower_governor::{GovernorError, GovernorLayer};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod routes;
mod services;

use config::Config;
use services::{email::EmailService, init, whatsapp::WhatsAppService};

pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Config,
    pub email: EmailService,
    pub whatsapp: WhatsAppService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_notifications=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Horizon Estates lead notification service");

    // Initialize database
    let pool = init::init_db(&config).await?;

    // Initialize delivery executors
    let email = EmailService::new(&config.email)?;
    let whatsapp = WhatsAppService::new()?;

    let app_state = Arc::new(AppState {
        db: pool,
        config: config.clone(),
        email,
        whatsapp,
    });

    // Rate limiter for the public endpoints (dispatch + lead intake).
    // The error handler returns a JSON 429 with a Retry-After header.
    let mut builder = GovernorConfigBuilder::default();
    builder.per_second(config.rate_limit.webhook_per_second.into());
    builder.burst_size(config.rate_limit.webhook_burst);
    let mut builder = builder.key_extractor(SmartIpKeyExtractor);
    builder.error_handler(governor_error_response);
    let governor_conf = Arc::new(
        builder
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Failed to build governor config"))?,
    );

    // Periodically evict stale rate-limiter keys
    {
        let limiter = governor_conf.limiter().clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                tracing::debug!("rate limiter size: {}", limiter.len());
                limiter.retain_recent();
            }
        });
    }

    let origins = config
        .server
        .allowed_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| anyhow::anyhow!("Invalid origin in ALLOWED_ORIGINS"))?;

    // Build router
    let app = Router::new()
        // Health check
        .route("/health", get(routes::health::health_check))
        // Notification dispatch + integration log listing (rate limited)
        .nest(
            "/api/notifications",
            routes::notifications::router().layer(GovernorLayer {
                config: governor_conf.clone(),
            }),
        )
        // Notification settings rows
        .nest("/api/settings", routes::settings::router())
        // Integration API keys
        .nest("/api/integrations", routes::integrations::router())
        // Lead-intake webhooks from portals and social platforms (rate limited)
        .nest(
            "/webhooks",
            routes::webhooks::router().layer(GovernorLayer {
                config: governor_conf.clone(),
            }),
        )
        // Add shared state
        .with_state(app_state)
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([
                    http::Method::GET,
                    http::Method::POST,
                    http::Method::PUT,
                    http::Method::DELETE,
                    http::Method::OPTIONS,
                ])
                .allow_headers([
                    http::header::CONTENT_TYPE,
                    http::header::AUTHORIZATION,
                    http::header::ACCEPT,
                    HeaderName::from_static("x-api-key"),
                ]),
        );

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to bind SIGTERM");
        tokio::select! {
            _ = ctrl_c => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.expect("Failed to bind Ctrl+C");
    }

    tracing::info!("Shutdown signal received");
}

fn governor_error_response(error: GovernorError) -> http::Response<Body> {
    match error {
        GovernorError::TooManyRequests { wait_time, headers } => {
            // `wait_time` is provided as seconds
            let body = serde_json::json!({
                "error": "rate_limit_exceeded",
                "retry_after_seconds": wait_time
            })
            .to_string();

            let mut resp = http::Response::new(Body::from(body));
            *resp.status_mut() = StatusCode::TOO_MANY_REQUESTS;
            resp.headers_mut().insert(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );

            if let Some(hmap) = headers {
                for (name, value) in hmap.iter() {
                    resp.headers_mut().append(name.clone(), value.clone());
                }
            }

            resp.headers_mut().insert(
                http::header::RETRY_AFTER,
                HeaderValue::from_str(&wait_time.to_string()).unwrap(),
            );

            resp
        }
        GovernorError::UnableToExtractKey => {
            let mut resp = http::Response::new(Body::from(
                "Unable to determine client IP for rate limiting",
            ));
            *resp.status_mut() = StatusCode::BAD_REQUEST;
            resp
        }
        GovernorError::Other { code, msg, headers } => {
            let body = msg.unwrap_or_else(|| "Rate limiting error".to_string());
            let mut resp = http::Response::new(Body::from(body));
            *resp.status_mut() =
                StatusCode::from_u16(code.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if let Some(hmap) = headers {
                for (name, value) in hmap.iter() {
                    resp.headers_mut().append(name.clone(), value.clone());
                }
            }
            resp
        }
    }
}
