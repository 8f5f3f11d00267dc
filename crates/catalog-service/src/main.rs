//! Catalog API HTTP service.
//!
//! Serves the service and software catalog plus the simulated AI endpoints.
//! See `routes` for the full route table.
//!
//! # Configuration
//!
//! Read from the environment, optionally seeded from a `.env` file:
//!
//! - `PORT` - HTTP port (default: 3000)
//! - `ENABLE_HTTPS`, `HTTPS_PORT`, `SSL_CERT_PATH`, `SSL_KEY_PATH` - optional HTTPS listener
//! - `APP_ENV` - development, test or production
//! - `LOG_FORMAT` - json (default) or text; `RUST_LOG` sets the level
//! - `API_DOCS_PATH` - preferred API description document

use std::net::SocketAddr;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use catalog_service::{build_router, docs};
use catalog_service_shared::{
    init_logging, init_metrics, load_tls_config, spawn_rate_limit_sweeper, AppState, LoggingConfig,
    MetricsConfig, MetricsError, Pipeline, ServiceConfig, TlsListener, TlsPeer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    let logging_config = LoggingConfig::from_env();
    if let Err(e) = init_logging(&logging_config) {
        eprintln!("failed to initialize logging: {e}");
    }

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "ignoring unreadable environment file"),
    }

    match init_metrics(&MetricsConfig::from_env()) {
        Ok(()) => {}
        Err(MetricsError::Disabled) => info!("metrics disabled"),
        Err(e) => warn!(error = %e, "failed to initialize metrics, continuing without metrics"),
    }

    let config = ServiceConfig::from_env().context("invalid configuration")?;
    info!(
        port = config.port,
        environment = config.environment.as_str(),
        https = config.tls.enabled,
        "starting catalog service"
    );

    let document = docs::load_api_document(
        &docs::candidate_paths(config.api_docs_path.as_deref()),
        &config.api_version,
    );
    let state = AppState::load(config.clone())
        .context("failed to load application state")?
        .with_api_document(document);

    let pipeline = Pipeline::new(&config);
    if config.rate_limit.enabled {
        spawn_rate_limit_sweeper(pipeline.rate_limiter(), config.rate_limit.window);
    }
    let app = build_router(state, pipeline);

    if config.tls.enabled {
        start_https(app.clone(), &config).await;
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "HTTP listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server failed")?;

    info!("shutdown complete");
    Ok(())
}

/// Start the HTTPS listener in the background. Any failure leaves the
/// service running on plain HTTP only.
async fn start_https(app: Router, config: &ServiceConfig) {
    let tls_config = match load_tls_config(&config.tls.cert_path, &config.tls.key_path) {
        Ok(tls_config) => tls_config,
        Err(e) => {
            warn!(error = %e, "HTTPS disabled, serving HTTP only");
            return;
        }
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.tls.port));
    let listener = match TlsListener::bind(addr, tls_config).await {
        Ok(listener) => listener,
        Err(e) => {
            warn!(addr = %addr, error = %e, "HTTPS disabled, serving HTTP only");
            return;
        }
    };
    info!(addr = %addr, "HTTPS listening");

    tokio::spawn(async move {
        let served = axum::serve(listener, app.into_make_service_with_connect_info::<TlsPeer>())
            .with_graceful_shutdown(shutdown_signal())
            .await;
        if let Err(e) = served {
            error!(error = %e, "HTTPS server failed");
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
