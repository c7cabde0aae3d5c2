use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::{error, info};

use consent_api::{ControllerApiAdapter, HttpApi};
use consent_core::{MetricsHandle, RateLimiter, RunController, init_uptime};
use consent_hubspot::HubSpotClient;
use consent_observe::logger_init;
use consent_prometheus::{Encoder, PrometheusMetrics, TextEncoder};

mod config;
use config::AgentConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_uptime();

    // 1) Config
    let cfg = AgentConfig::from_env().context("loading configuration")?;

    // 2) Logger
    logger_init(&cfg.logger).context("initializing logger")?;
    info!(
        form_id = %cfg.defaults.form_id,
        dry_run = cfg.defaults.dry_run,
        page_size = cfg.defaults.page_size,
        fields = cfg.defaults.mapping.len(),
        "configuration loaded"
    );

    // 3) Upstream + pacing + metrics
    let client = HubSpotClient::new(cfg.hubspot.clone()).context("building hubspot client")?;
    let metrics = PrometheusMetrics::new().context("registering metrics")?;
    let handle: MetricsHandle = Arc::new(metrics.clone());
    let limiter = RateLimiter::new(cfg.pacing.clone()).with_metrics(Arc::clone(&handle));

    // 4) Controller
    let controller = Arc::new(
        RunController::new(Arc::new(client), limiter, cfg.defaults.clone()).with_metrics(handle),
    );

    // 5) HTTP
    let api = HttpApi::new(Arc::new(ControllerApiAdapter::new(Arc::clone(&controller))));
    let app = api.router().merge(metrics_router(metrics));

    let listener = tokio::net::TcpListener::bind(cfg.bind)
        .await
        .with_context(|| format!("binding {}", cfg.bind))?;
    info!(addr = %cfg.bind, "http api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown(controller))
        .await
        .context("http server")?;

    info!("shut down");
    Ok(())
}

fn metrics_router(metrics: PrometheusMetrics) -> Router {
    Router::new()
        .route("/metrics", get(serve_metrics))
        .with_state(metrics)
}

/// GET /metrics
async fn serve_metrics(State(metrics): State<PrometheusMetrics>) -> Response {
    match metrics.encode() {
        Ok(body) => {
            let content_type = TextEncoder::new().format_type().to_string();
            ([(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Err(e) => {
            error!(error = %e, "encoding metrics failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Resolves on Ctrl+C; an active run is killed so it stops at the next boundary.
async fn shutdown(controller: Arc<RunController>) {
    on_signal(tokio::signal::ctrl_c(), controller).await
}

/// Without a working signal handler the server keeps serving.
async fn on_signal<F>(signal: F, controller: Arc<RunController>)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        error!(error = %e, "listening for shutdown signal failed, serving until killed");
        std::future::pending::<()>().await;
    }
    info!("shutting down...");
    if controller.kill() {
        info!("active run asked to stop");
    }
}
