//! HTTP request handlers: health, detect, redact.

use std::io::Write;
use std::path::Path;

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::ocr::FileKind;
use crate::pii::PiiSpan;

use super::AppState;

/// Allowed upload extensions: text, PDF, and image types.
const ALLOWED_EXTENSIONS: &[&str] = &[
    "txt", "md", "csv", "log", "pdf", "png", "jpg", "jpeg", "tif", "tiff", "bmp", "gif",
];

/// Typed handler error mapped onto HTTP status codes.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or invalid request input (400).
    BadRequest(String),
    /// Collaborator or IO failure while processing the request (500).
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Internal(m) => {
                tracing::warn!("Request failed: {}", m);
                (StatusCode::INTERNAL_SERVER_ERROR, m)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "Backend running fine!" }))
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub pii_entities: Vec<PiiSpan>,
}

/// Detect PII in an uploaded file, returning the span list as JSON.
pub async fn detect(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DetectResponse>, ApiError> {
    let upload = save_upload(&state, multipart).await?;
    let text = extract_upload(&state, &upload).await?;

    let pii_entities = state
        .pipeline
        .annotate(&text)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    tracing::debug!(
        "Detected {} entities in {}",
        pii_entities.len(),
        upload.filename
    );
    Ok(Json(DetectResponse { pii_entities }))
    // upload drops here, deleting the temp file
}

/// Redact PII in an uploaded file, returning the redacted text as a
/// downloadable attachment.
pub async fn redact(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = save_upload(&state, multipart).await?;
    let text = extract_upload(&state, &upload).await?;

    let redacted = state
        .pipeline
        .redact(&text)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let attachment = format!("redacted_{}.txt", upload.filename);
    let headers = [
        (
            header::CONTENT_TYPE,
            "text/plain; charset=utf-8".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", attachment),
        ),
    ];
    Ok((headers, redacted).into_response())
}

/// An upload persisted to a request-scoped temp file.
///
/// The file is deleted when this value drops, whether the request
/// succeeded or failed.
struct SavedUpload {
    file: tempfile::NamedTempFile,
    filename: String,
    kind: FileKind,
}

/// Read the `file` field out of the multipart body, validate it, and
/// persist it under the configured upload directory.
async fn save_upload(state: &AppState, mut multipart: Multipart) -> Result<SavedUpload, ApiError> {
    let mut found = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart request: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("").to_string();
        if filename.is_empty() {
            return Err(ApiError::BadRequest("No file selected".to_string()));
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
        found = Some((filename, data));
        break;
    }
    let (filename, data) =
        found.ok_or_else(|| ApiError::BadRequest("No file part in request".to_string()))?;

    if data.len() > state.settings.max_upload_bytes {
        return Err(ApiError::BadRequest(format!(
            "Upload exceeds {} bytes",
            state.settings.max_upload_bytes
        )));
    }

    let filename = sanitize_filename(&filename);
    let ext = Path::new(&filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    if !ext
        .as_deref()
        .is_some_and(|e| ALLOWED_EXTENSIONS.contains(&e))
    {
        return Err(ApiError::BadRequest("Unsupported file type".to_string()));
    }

    let kind = FileKind::from_path(Path::new(&filename));

    let mut file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(&format!("-{}", filename))
        .tempfile_in(&state.settings.upload_dir)
        .map_err(|e| ApiError::Internal(format!("Failed to store upload: {}", e)))?;
    file.write_all(&data)
        .map_err(|e| ApiError::Internal(format!("Failed to store upload: {}", e)))?;

    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    tracing::debug!("Saved upload {} ({} bytes, {})", filename, data.len(), mime);
    Ok(SavedUpload {
        file,
        filename,
        kind,
    })
}

/// Run text extraction for an upload off the async runtime.
async fn extract_upload(state: &AppState, upload: &SavedUpload) -> Result<String, ApiError> {
    let extractor = state.extractor.clone();
    let path = upload.file.path().to_path_buf();
    let kind = upload.kind;

    tokio::task::spawn_blocking(move || extractor.extract(&path, kind))
        .await
        .map_err(|e| ApiError::Internal(format!("Extraction task failed: {}", e)))?
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Keep only the final path component and filesystem-safe characters.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
