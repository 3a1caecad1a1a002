//! Admin HTTP API: `DELETE /delete-index?filename=<name>`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::delete;
use axum::{Json, Router};
use docsearch_core::traits::SearchBackend;
use docsearch_core::ErrorKind;
use docsearch_hybrid::{remove_index_for, Removal};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub filename: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusBody {
    pub status: String,
    pub message: String,
}

type Reply = (StatusCode, Json<StatusBody>);

fn reply(code: StatusCode, status: &str, message: impl Into<String>) -> Reply {
    (code, Json(StatusBody { status: status.to_string(), message: message.into() }))
}

pub fn router<B: SearchBackend + 'static>(backend: Arc<B>) -> Router {
    Router::new().route("/delete-index", delete(delete_index::<B>)).with_state(backend)
}

async fn delete_index<B: SearchBackend + 'static>(
    State(backend): State<Arc<B>>,
    Query(params): Query<DeleteParams>,
) -> Reply {
    let Some(filename) = params.filename.filter(|f| !f.trim().is_empty()) else {
        return reply(StatusCode::BAD_REQUEST, "error", "query parameter 'filename' is required");
    };
    let target = filename.clone();
    let removal = tokio::task::spawn_blocking(move || remove_index_for(backend.as_ref(), &target)).await;
    match removal {
        Ok(Ok(Removal::Removed(index))) => {
            tracing::info!(file = %filename, index = %index, "index deleted via admin API");
            reply(StatusCode::OK, "success", format!("index '{index}' deleted"))
        }
        Ok(Ok(Removal::Missing(index))) => reply(StatusCode::NOT_FOUND, "error", format!("index '{index}' not found")),
        Ok(Err(e)) if e.kind() == ErrorKind::Input => reply(StatusCode::BAD_REQUEST, "error", e.to_string()),
        Ok(Err(e)) => {
            tracing::error!(file = %filename, error = %e, "index deletion failed");
            reply(StatusCode::INTERNAL_SERVER_ERROR, "error", e.to_string())
        }
        Err(join) => reply(StatusCode::INTERNAL_SERVER_ERROR, "error", join.to_string()),
    }
}

/// Serve until Ctrl-C.
pub async fn serve<B: SearchBackend + 'static>(backend: Arc<B>, bind_addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "admin API listening");
    axum::serve(listener, router(backend))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
