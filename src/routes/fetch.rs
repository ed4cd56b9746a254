//! Fetch endpoint
//!
//! The inbound contract of the router: accepts a fetch request plus an
//! optional deadline and returns the serialized FetchResult, including the
//! full attempt trace and site analysis snapshot.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    routing::types::{FetchRequest, FetchResult},
    AppState,
};

/// Default overall deadline when the caller does not supply one
const DEFAULT_DEADLINE_MS: u64 = 120_000;

/// Wire shape of the fetch endpoint body
#[derive(Debug, Deserialize)]
pub struct FetchApiRequest {
    #[serde(flatten)]
    pub request: FetchRequest,
    /// Overall routing deadline in milliseconds
    pub deadline_ms: Option<u64>,
}

/// `POST /v1/fetch`
///
/// Resolves every routed outcome to 200 with a FetchResult body; exhaustion
/// and deadline expiry are reported through `success: false` and the
/// attempt trace, not as HTTP errors.
pub async fn fetch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FetchApiRequest>,
) -> AppResult<Json<FetchResult>> {
    if body.request.url.trim().is_empty() {
        return Err(AppError::BadRequest("url must not be empty".to_string()));
    }
    if let Some(0) = body.deadline_ms {
        return Err(AppError::BadRequest(
            "deadline_ms must be positive".to_string(),
        ));
    }

    let request_id = Uuid::new_v4();
    let deadline_ms = body.deadline_ms.unwrap_or(DEFAULT_DEADLINE_MS);
    let deadline = tokio::time::Instant::now() + Duration::from_millis(deadline_ms);

    info!(
        request_id = %request_id,
        url = %body.request.url,
        intent = ?body.request.intent,
        deadline_ms,
        "Accepted fetch request"
    );

    let result = state.router.fetch(body.request, deadline).await;
    Ok(Json(result))
}
