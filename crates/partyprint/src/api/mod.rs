use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::{Stream, StreamExt};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::admin::AdminActions;
use crate::api::models::{
    CreateJobRequest, CreateJobResponse, GalleryImage, GalleryResponse, JobActionResponse,
    ListJobsQuery, ListJobsResponse, NextJobResponse, UploadResponse,
};
use crate::blob::{sanitize_filename, BlobStore};
use crate::error::QueueError;
use crate::jobs::{Job, JobStatus, NewJob, QueueEngine};
use crate::logs::tail_lines;

pub mod models;

#[derive(Clone)]
pub struct ApiState {
    pub engine: QueueEngine,
    pub admin: AdminActions,
    pub blobs: Arc<dyn BlobStore>,
    pub auto_queue: bool,
    pub max_upload_bytes: usize,
    pub log_path: PathBuf,
    pub log_poll: Duration,
}

pub fn router(state: ApiState) -> Router {
    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        // Upload / gallery
        .route("/upload", post(upload))
        .route("/gallery", get(gallery))
        .route("/blobs/:key", get(get_blob))
        // Queue
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/:id", get(get_job).delete(delete_job))
        .route("/jobs/:id/delete", post(delete_job))
        .route("/print/:id", post(queue_job))
        .route("/next-job", get(next_job))
        .route("/mark-printed/:id", post(mark_printed))
        // Ops
        .route("/logs", get(stream_logs))
        .route("/metrics/prom", get(metrics_prom))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub enum ApiError {
    Queue(QueueError),
    BadRequest(String),
}

impl From<QueueError> for ApiError {
    fn from(e: QueueError) -> Self {
        Self::Queue(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Queue(e @ QueueError::NotFound(_)) => (StatusCode::NOT_FOUND, e.to_string()),
            ApiError::Queue(e @ QueueError::InvalidStatus(_)) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            ApiError::Queue(e) => {
                tracing::error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("internal error: {e}"))
            }
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

fn bad_request(e: impl std::fmt::Display) -> ApiError {
    ApiError::BadRequest(e.to_string())
}

// ----------------------------
// Upload
// ----------------------------

pub async fn upload(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut image: Option<(String, Option<String>, Vec<u8>)> = None;
    let mut user: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let original = field.file_name().unwrap_or("image").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(bad_request)?;
                image = Some((original, content_type, bytes.to_vec()));
            }
            Some("user") => {
                user = Some(field.text().await.map_err(bad_request)?);
            }
            _ => {}
        }
    }

    let Some((original, content_type, bytes)) = image else {
        return Err(ApiError::BadRequest("image is required".into()));
    };
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("image is empty".into()));
    }

    let user = user
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "Anonymous".to_string());

    let key = format!("{}_{}", Uuid::new_v4(), sanitize_filename(&original));

    let url = match state.blobs.put(&key, content_type.as_deref(), bytes).await {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(filename = %key, error = %e, "[UPLOAD ERROR] blob store rejected upload");
            return Err(e.into());
        }
    };

    let job = match state
        .engine
        .create_job(NewJob {
            filename: key.clone(),
            owner: user.clone(),
            url: url.clone(),
        })
        .await
    {
        Ok(job) => job,
        Err(e) => {
            // no row points at the blob, so drop it
            if let Err(blob_err) = state.blobs.delete(&key).await {
                tracing::warn!(filename = %key, error = %blob_err, "[UPLOAD ERROR] orphaned blob");
            }
            return Err(e.into());
        }
    };

    tracing::info!(job_id = %job.id, filename = %key, user = %user, "[UPLOAD] image uploaded");

    // blob and row are stored at this point; a failed auto-queue must not make
    // the client retry the upload and create a duplicate job
    let mut status = job.status;
    if state.auto_queue {
        match state.engine.enqueue(job.id).await {
            Ok(queued) => status = queued.status,
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "[UPLOAD] auto-queue failed, job left uploaded");
            }
        }
    }

    Ok(Json(UploadResponse {
        ok: true,
        id: job.id,
        path: url,
        user,
        status,
    }))
}

pub async fn gallery(State(state): State<ApiState>) -> Result<Json<GalleryResponse>, ApiError> {
    let jobs = state.engine.list_jobs(None, Some(500)).await?;
    let images: Vec<GalleryImage> = jobs
        .into_iter()
        .map(|j| GalleryImage {
            path: j.url,
            user: j.owner,
            status: j.status,
            created_at: j.created_at,
        })
        .collect();

    tracing::info!("[GALLERY] returned {} images", images.len());
    Ok(Json(GalleryResponse { images }))
}

pub async fn get_blob(
    State(state): State<ApiState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    match state.blobs.get(&key).await? {
        Some(obj) => Ok(([(header::CONTENT_TYPE, obj.content_type)], obj.bytes).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: "blob not found".into(),
            }),
        )
            .into_response()),
    }
}

// ----------------------------
// Queue
// ----------------------------

pub async fn create_job(
    State(state): State<ApiState>,
    Json(body): Json<CreateJobRequest>,
) -> Result<Json<CreateJobResponse>, ApiError> {
    if body.filename.trim().is_empty() {
        return Err(ApiError::BadRequest("filename is required".into()));
    }
    if body.url.trim().is_empty() {
        return Err(ApiError::BadRequest("url is required".into()));
    }

    let job = state
        .engine
        .create_job(NewJob {
            filename: body.filename,
            owner: body
                .owner
                .filter(|o| !o.trim().is_empty())
                .unwrap_or_else(|| "Anonymous".to_string()),
            url: body.url,
        })
        .await?;

    Ok(Json(CreateJobResponse { job_id: job.id }))
}

pub async fn list_jobs(
    State(state): State<ApiState>,
    Query(q): Query<ListJobsQuery>,
) -> Result<Json<ListJobsResponse>, ApiError> {
    let status = q
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<JobStatus>)
        .transpose()?;

    let items = state.engine.list_jobs(status, q.limit).await?;
    Ok(Json(ListJobsResponse { items }))
}

pub async fn get_job(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, ApiError> {
    Ok(Json(state.engine.get_job(id).await?))
}

/// Printed jobs are not re-queued; the response carries the job unchanged
/// with a `note` saying so.
pub async fn queue_job(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobActionResponse>, ApiError> {
    let job = state.admin.queue(id).await?;
    let mut res = JobActionResponse::new(job);
    if res.job.status == JobStatus::Printed {
        res.note = Some("job already printed, not queued".to_string());
    }
    Ok(Json(res))
}

pub async fn next_job(State(state): State<ApiState>) -> Result<Json<NextJobResponse>, ApiError> {
    let job = state.engine.dispatch_next().await?;
    Ok(Json(NextJobResponse::from(job)))
}

pub async fn mark_printed(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobActionResponse>, ApiError> {
    let job = state.engine.complete_print(id).await?;
    Ok(Json(JobActionResponse::new(job)))
}

pub async fn delete_job(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobActionResponse>, ApiError> {
    let job = state.admin.delete(id).await?;
    Ok(Json(JobActionResponse::new(job)))
}

// ----------------------------
// Ops
// ----------------------------

pub async fn stream_logs(
    State(state): State<ApiState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let lines = tail_lines(state.log_path.clone(), state.log_poll)
        .map(|line| Ok::<_, Infallible>(Event::default().data(line)));

    Sse::new(lines).keep_alive(KeepAlive::default())
}

pub async fn metrics_prom(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let counts = state.engine.status_counts().await?;

    let mut body = String::from(
        "# HELP partyprint_jobs Number of jobs by status\n# TYPE partyprint_jobs gauge\n",
    );
    for status in JobStatus::ALL {
        let n = match status {
            JobStatus::Uploaded => counts.uploaded,
            JobStatus::Queued => counts.queued,
            JobStatus::Printing => counts.printing,
            JobStatus::Printed => counts.printed,
        };
        body.push_str(&format!("partyprint_jobs{{status=\"{status}\"}} {n}\n"));
    }

    Ok((StatusCode::OK, body).into_response())
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
