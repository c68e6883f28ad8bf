use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::VERSION;
use crate::api;
use crate::config::ServerConfig;
use crate::planner::TripPlanner;

/// Full HTTP surface: `/api/*` plus `/health`
pub fn app(planner: Arc<TripPlanner>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .with_state(planner.clone())
        .nest("/api", api::router(planner))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

async fn health(State(planner): State<Arc<TripPlanner>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": VERSION,
        "stations": planner.catalog().len(),
    }))
}

pub async fn run(config: &ServerConfig, planner: Arc<TripPlanner>) -> Result<()> {
    let ip: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid server host '{}'", config.host))?;
    let addr = SocketAddr::from((ip, config.port));
    let app = app(planner);

    let handle = axum_server::Handle::new();
    tokio::spawn(shutdown_on_ctrl_c(handle.clone()));

    match &config.tls {
        #[cfg(feature = "tls")]
        Some(tls) => {
            let rustls =
                axum_server::tls_rustls::RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                    .await
                    .with_context(|| {
                        format!("Failed to load TLS certificate {:?}", tls.cert_path)
                    })?;

            info!("Web server running at https://{}", addr);
            axum_server::bind_rustls(addr, rustls)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("HTTPS server failed")?;
        }
        #[cfg(not(feature = "tls"))]
        Some(_) => {
            anyhow::bail!("TLS is configured but tripfuel was built without the `tls` feature")
        }
        None => {
            info!("Web server running at http://{}", addr);
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("HTTP server failed")?;
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_on_ctrl_c(handle: axum_server::Handle) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received, draining connections...");
        handle.graceful_shutdown(Some(Duration::from_secs(10)));
    }
}
