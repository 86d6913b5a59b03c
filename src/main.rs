use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod gallery;
mod handlers;
mod models;
mod routes;
mod services;

use config::{AppConfig, Cli, Command, ServeArgs};
use services::{s3_backend, storage_service::StorageService};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Serve(args) => serve(args).await,
        Command::Browse(args) => gallery::shell::run(args).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args(args)?;
    tracing::info!("Starting s3-gallery with config: {:?}", cfg);

    // --- Initialize core service ---
    let client = s3_backend::create_s3_client(&cfg.storage).await;
    let backend = s3_backend::S3Backend::new(client, cfg.storage.bucket.clone());
    let shutdown = CancellationToken::new();
    let storage = StorageService::new(Arc::new(backend), shutdown.clone());

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(storage);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr)
                .await
                .with_context(|| format!("binding {}", fallback_addr))?
        }
        Err(err) => return Err(err).with_context(|| format!("binding {}", addr)),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl-C, cancelling every in-flight enumeration and stream first.
async fn shutdown_signal(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown requested"),
        Err(err) => {
            tracing::warn!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    }
    shutdown.cancel();
}
