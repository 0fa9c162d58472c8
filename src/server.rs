use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    extract::{Json, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};

use crate::store::result_store::{ResultStore, StoreError};
use crate::store::schema::{
    ErrorResponse, ListResponse, RawBatch, RawSubmission, SubmitAllResponse, SubmitResponse,
};

const INVALID_DATA: &str = "Invalid data submitted";
const SAVE_FAILED: &str = "Failed to save test result";
const SAVE_ALL_FAILED: &str = "Failed to save test results";
const LIST_FAILED: &str = "Failed to retrieve test results";

type SharedStore = Arc<ResultStore>;

pub fn router(store: ResultStore) -> Router {
    Router::new()
        .route("/api/submit", post(submit).get(list_results))
        .route("/api/submit-all", post(submit_all))
        .with_state(Arc::new(store))
}

pub async fn serve(addr: SocketAddr, store: ResultStore) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!(
        "listening on http://{} (results in {})",
        listener.local_addr()?,
        store.base_dir().display()
    );
    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        log::info!("shutting down");
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Map a store failure to 400 for bad payloads and `fallback` otherwise.
fn store_error(err: &StoreError, fallback: &str) -> Response {
    if err.is_invalid() {
        log::warn!("rejected submission: {err}");
        error(StatusCode::BAD_REQUEST, INVALID_DATA)
    } else {
        log::error!("{fallback}: {err}");
        error(StatusCode::INTERNAL_SERVER_ERROR, fallback)
    }
}

/// Run blocking file work off the async workers.
async fn blocking<T, F>(store: &SharedStore, work: F) -> Option<Result<T, StoreError>>
where
    T: Send + 'static,
    F: FnOnce(&ResultStore) -> Result<T, StoreError> + Send + 'static,
{
    let store = Arc::clone(store);
    match tokio::task::spawn_blocking(move || work(&store)).await {
        Ok(result) => Some(result),
        Err(e) => {
            log::error!("storage task failed: {e}");
            None
        }
    }
}

async fn submit(
    State(store): State<SharedStore>,
    payload: Result<Json<RawSubmission>, JsonRejection>,
) -> Response {
    let Ok(Json(raw)) = payload else {
        log::warn!("rejected submission: unreadable body");
        return error(StatusCode::BAD_REQUEST, INVALID_DATA);
    };
    match blocking(&store, move |s| s.submit(&raw)).await {
        Some(Ok(id)) => Json(SubmitResponse { success: true, id }).into_response(),
        Some(Err(e)) => store_error(&e, SAVE_FAILED),
        None => error(StatusCode::INTERNAL_SERVER_ERROR, SAVE_FAILED),
    }
}

async fn submit_all(
    State(store): State<SharedStore>,
    payload: Result<Json<RawBatch>, JsonRejection>,
) -> Response {
    let Ok(Json(raw)) = payload else {
        log::warn!("rejected batch: unreadable body");
        return error(StatusCode::BAD_REQUEST, INVALID_DATA);
    };
    match blocking(&store, move |s| s.submit_batch(&raw)).await {
        Some(Ok(participant_id)) => Json(SubmitAllResponse {
            success: true,
            participant_id,
        })
        .into_response(),
        Some(Err(e)) => store_error(&e, SAVE_ALL_FAILED),
        None => error(StatusCode::INTERNAL_SERVER_ERROR, SAVE_ALL_FAILED),
    }
}

async fn list_results(State(store): State<SharedStore>) -> Response {
    match blocking(&store, |s| s.list()).await {
        Some(Ok(results)) => Json(ListResponse { results }).into_response(),
        Some(Err(e)) => {
            log::error!("{LIST_FAILED}: {e}");
            error(StatusCode::INTERNAL_SERVER_ERROR, LIST_FAILED)
        }
        None => error(StatusCode::INTERNAL_SERVER_ERROR, LIST_FAILED),
    }
}
