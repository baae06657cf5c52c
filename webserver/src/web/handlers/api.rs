//! REST API handlers
//!
//! Upload, poll and health endpoints. Every handler is generic over the
//! injected `TaskService`.

use std::io;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use futures_util::{stream, StreamExt, TryStreamExt};
use orchestrator::ByteStream;
use serde_json::json;
use shared::{process_debug, process_warn, ProcessId, TaskId, TaskOutcome};
use tokio::sync::mpsc;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::error::{WebServerError, WebServerResult};
use crate::traits::TaskService;

/// Form field carrying the CSV in multipart uploads
const UPLOAD_FIELD: &str = "file";

/// Chunks buffered between the multipart reader and storage
const UPLOAD_CHANNEL_DEPTH: usize = 16;

/// Accept a CSV upload - POST /upload
///
/// Takes either a raw CSV body or a `multipart/form-data` form with the CSV
/// in its `file` field. Either way the bytes are streamed straight to
/// storage; only the first chunk is looked at up front to reject empty
/// uploads.
pub async fn upload_csv<T>(State(service): State<Arc<T>>, request: Request) -> WebServerResult<Response>
where
    T: TaskService + 'static,
{
    let task_id = if is_multipart(&request) {
        submit_multipart(service.as_ref(), request).await?
    } else {
        submit_raw(service.as_ref(), request.into_body()).await?
    };

    process_debug!(ProcessId::current(), "📤 Upload accepted as task {}", task_id);
    Ok((StatusCode::ACCEPTED, Json(json!({ "task_id": task_id }))).into_response())
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

async fn submit_raw<T: TaskService>(service: &T, body: Body) -> WebServerResult<TaskId> {
    let mut chunks = body
        .into_data_stream()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e));

    let first = loop {
        match chunks.next().await {
            Some(Ok(chunk)) if chunk.is_empty() => continue,
            Some(Ok(chunk)) => break chunk,
            Some(Err(e)) => return Err(WebServerError::invalid_request(format!("could not read body: {e}"))),
            None => return Err(WebServerError::invalid_request("request body is empty")),
        }
    };

    let stream: ByteStream = Box::pin(stream::once(async move { Ok(first) }).chain(chunks));
    service.submit(stream).await
}

/// Stream the `file` field of a multipart form into storage
///
/// The field borrows the form reader, so its chunks are forwarded over a
/// channel while the service consumes the other end in the same task.
async fn submit_multipart<T: TaskService>(service: &T, request: Request) -> WebServerResult<TaskId> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| WebServerError::invalid_request(e.body_text()))?;

    let mut field = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some(UPLOAD_FIELD) => break field,
            Ok(Some(_)) => continue,
            Ok(None) => return Err(WebServerError::invalid_request("No file part")),
            Err(e) => return Err(WebServerError::invalid_request(format!("could not read form: {e}"))),
        }
    };

    if field.file_name().map_or(true, str::is_empty) {
        return Err(WebServerError::invalid_request("No selected file"));
    }

    let first = loop {
        match field.chunk().await {
            Ok(Some(chunk)) if chunk.is_empty() => continue,
            Ok(Some(chunk)) => break chunk,
            Ok(None) => return Err(WebServerError::invalid_request("uploaded file is empty")),
            Err(e) => return Err(WebServerError::invalid_request(format!("could not read upload: {e}"))),
        }
    };

    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(UPLOAD_CHANNEL_DEPTH);
    let body: ByteStream = Box::pin(stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    }));

    // ends when the field is exhausted or storage stops reading; dropping
    // `tx` closes the stream
    let forward = async move {
        let mut next = Ok(first);
        loop {
            let failed = next.is_err();
            if tx.send(next).await.is_err() || failed {
                break;
            }
            next = match field.chunk().await {
                Ok(Some(chunk)) => Ok(chunk),
                Ok(None) => break,
                Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
            };
        }
    };

    let (submitted, ()) = tokio::join!(service.submit(body), forward);
    submitted
}

/// Poll for the aggregated CSV - GET /result/:task_id
///
/// Completed tasks stream the output file; everything else answers with a
/// small JSON status.
pub async fn get_result<T>(
    State(service): State<Arc<T>>,
    Path(raw_id): Path<String>,
    request: Request,
) -> Response
where
    T: TaskService + 'static,
{
    let Ok(task_id) = TaskId::from_string(&raw_id) else {
        return not_found();
    };

    match service.outcome(&task_id).await {
        TaskOutcome::Completed { output } => {
            match ServeFile::new(&output).oneshot(request).await {
                Ok(response) => response.into_response(),
                Err(never) => match never {},
            }
        }
        TaskOutcome::Pending | TaskOutcome::Running => {
            (StatusCode::ACCEPTED, Json(json!({ "status": "processing" }))).into_response()
        }
        TaskOutcome::Failed { reason } => {
            process_warn!(ProcessId::current(), "Result requested for failed task {}", task_id);
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "status": "failed", "error": reason })),
            )
                .into_response()
        }
        TaskOutcome::NotFound => not_found(),
    }
}

/// Lifecycle snapshot - GET /status/:task_id
pub async fn get_status<T>(State(service): State<Arc<T>>, Path(raw_id): Path<String>) -> Response
where
    T: TaskService + 'static,
{
    let outcome = match TaskId::from_string(&raw_id) {
        Ok(task_id) => service.outcome(&task_id).await,
        Err(_) => TaskOutcome::NotFound,
    };

    let status = match outcome {
        TaskOutcome::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::OK,
    };
    (status, Json(outcome)).into_response()
}

/// Health check - GET /health
pub async fn health_check<T>(State(service): State<Arc<T>>) -> Json<serde_json::Value>
where
    T: TaskService + 'static,
{
    let counts = service.counts().await;
    Json(json!({
        "status": "ok",
        "tasks": counts,
    }))
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "status": "not_found" }))).into_response()
}
