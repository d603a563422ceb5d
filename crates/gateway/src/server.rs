use std::{net::SocketAddr, sync::Arc, time::Duration};

use {
    axum::{
        Router,
        extract::State,
        response::{IntoResponse, Json},
        routing::get,
    },
    buran_config::BuranConfig,
    tokio_util::sync::CancellationToken,
    tower_http::{
        cors::{Any, CorsLayer},
        trace::TraceLayer,
    },
    tracing::{info, warn},
};

use crate::{
    chat_routes, db, dto::iso_timestamp, lead_routes, metrics_routes::prometheus_metrics_handler,
    services::Services, state::AppState,
};

/// Prefixes the chat routes are served under. The website widget uses the
/// second one.
pub const CHAT_PREFIXES: &[&str] = &["/api/chat", "/api/telegram"];

/// How long shutdown waits for queued outbound sends.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the router (shared between production startup and tests).
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/api/health", get(health_handler))
        .route("/metrics", get(prometheus_metrics_handler))
        .merge(lead_routes::router());

    for prefix in CHAT_PREFIXES {
        router = router.merge(chat_routes::router(&state, prefix));
    }

    #[cfg(feature = "metrics")]
    let router = router.layer(axum::middleware::from_fn(
        crate::metrics_middleware::http_metrics_middleware,
    ));

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(feature = "metrics")]
fn recorder_config(config: &buran_config::MetricsConfig) -> buran_metrics::MetricsRecorderConfig {
    buran_metrics::MetricsRecorderConfig {
        enabled: config.enabled,
        global_labels: config
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

/// Start the HTTP server, the outbound dispatcher and the reply poller.
///
/// Runs until SIGINT/SIGTERM, then stops polling and drains queued sends.
pub async fn start_gateway(config: BuranConfig) -> anyhow::Result<()> {
    #[cfg(feature = "metrics")]
    let metrics_handle = buran_metrics::init_metrics(recorder_config(&config.metrics))?;

    let pool = db::connect(&config).await?;
    db::migrate(&pool).await?;

    let cancel = CancellationToken::new();
    let services = Services::build(&config, pool, cancel.clone())?;

    let polling = match (&services.bot, &services.poller) {
        (Some(bot), Some(poller)) => {
            if let Err(e) = buran_telegram::connect(bot).await {
                warn!(error = %e, "telegram bot check failed, polling anyway");
            }
            Some(buran_telegram::spawn_polling(
                Arc::clone(poller),
                Duration::from_secs(config.telegram.poll_interval_secs),
                cancel.clone(),
            ))
        },
        _ => {
            info!("telegram not configured, operator relay disabled");
            None
        },
    };

    let state = AppState::new(services.chat.clone(), services.leads.clone())
        .with_admin_token(config.auth.admin_token.clone());
    #[cfg(feature = "metrics")]
    let state = state.with_metrics(metrics_handle);
    if state.admin_token.is_none() {
        warn!("no admin token configured, admin chat routes are open");
    }

    let app = build_app(state);
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, version = env!("CARGO_PKG_VERSION"), "buran gateway listening");

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown.cancel();
        })
        .await?;

    cancel.cancel();
    if let Some(polling) = polling {
        let _ = polling.await;
    }
    match tokio::time::timeout(DRAIN_TIMEOUT, services.dispatcher_task).await {
        Ok(_) => info!("outbound queue drained"),
        Err(_) => warn!("outbound queue did not drain in time"),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": iso_timestamp(buran_common::now_ms()),
        "version": state.version,
        "uptimeSecs": state.started_at.elapsed().as_secs(),
    }))
}

#[cfg(all(test, feature = "metrics"))]
mod tests {
    use super::*;

    #[test]
    fn recorder_config_carries_configured_labels() {
        let mut metrics = buran_config::MetricsConfig::default();
        metrics.labels.insert("instance".into(), "tashkent-1".into());
        metrics.labels.insert("env".into(), "prod".into());

        let recorder = recorder_config(&metrics);
        assert!(recorder.enabled);
        assert_eq!(recorder.global_labels, vec![
            ("env".to_string(), "prod".to_string()),
            ("instance".to_string(), "tashkent-1".to_string()),
        ]);
    }
}
