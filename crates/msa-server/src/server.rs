use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};

use msa_core::adapters::ProcessToolAdapter;
use msa_core::artifacts::FsArtifactStore;
use msa_core::execution::TokioProcessExecutor;
use msa_core::orchestration::TaskOrchestrator;
use msa_core::sqlite::SqliteStore;

use crate::config::ServiceConfig;
use crate::routes;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: TaskOrchestrator,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Migrates the ledger, creates the artifact directories and wires the real tools.
    pub fn bootstrap(config: &ServiceConfig) -> anyhow::Result<Self> {
        let history = SqliteStore::new(&config.database_path);
        history.migrate_to_latest().with_context(|| {
            format!(
                "failed to migrate history database '{}'",
                config.database_path.display()
            )
        })?;

        let artifacts = FsArtifactStore::new(config.artifact_layout());
        artifacts
            .ensure_layout()
            .context("failed to prepare artifact directories")?;

        let adapter =
            ProcessToolAdapter::new(Arc::new(TokioProcessExecutor), config.adapter_config());

        tracing::info!(
            database = %config.database_path.display(),
            uploads = %config.uploads_dir.display(),
            results = %config.results_dir.display(),
            muscle_syntax = config.muscle_syntax.as_str(),
            "service state ready"
        );

        Ok(Self {
            orchestrator: TaskOrchestrator::new(
                Arc::new(artifacts),
                Arc::new(adapter),
                Arc::new(history),
            ),
            max_upload_bytes: config.max_upload_bytes,
        })
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/health", get(routes::health))
        .route("/align", post(routes::align))
        .route("/history", get(routes::history))
        .route("/artifacts/{file_name}", get(routes::artifact))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let state = AppState::bootstrap(&config)?;
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, "msa-server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
