use crate::error::IngestError;
use crate::ingest;
use crate::schema::StatusCounts;
use crate::store::LeadStore;
use axum::Router;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LeadStore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/upload", post(upload))
        .route("/api/stats", get(stats))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    message: String,
    accepted: usize,
    skipped: usize,
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        let status = match err {
            IngestError::NoValidRows | IngestError::Csv(_) => StatusCode::BAD_REQUEST,
            IngestError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read file: {e}")))?,
            );
            break;
        }
    }
    let Some(data) = data else {
        return Err(ApiError::bad_request("no file uploaded"));
    };

    let report = ingest::ingest_csv(state.store.as_ref(), &data).await?;
    Ok(Json(UploadResponse {
        message: format!("Successfully processed {} leads.", report.accepted),
        accepted: report.accepted,
        skipped: report.skipped,
    }))
}

async fn stats(State(state): State<AppState>) -> Result<Json<StatusCounts>, ApiError> {
    let counts = state
        .store
        .count_by_status()
        .await
        .map_err(IngestError::Store)?;
    Ok(Json(counts))
}
