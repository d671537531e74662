use std::sync::Arc;

use axum::extract::{Path, State};
use std::fmt::Write as _;

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use tracing::{error, info, warn};
use ufs_protocol::{ErrorBody, FileListing, HealthResponse, StatBody};
use ufs_types::{FileRecord, DEFAULT_MIMETYPE};

use crate::error::ServeError;
use crate::object::ObjectServer;

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            info!(error = %self, "request rejected");
        }
        let body = ErrorBody { error: self.public_message().to_string() };
        (status, Json(body)).into_response()
    }
}

/// `GET /file/{uuid}/stat/`
pub async fn stat_handler(
    State(server): State<Arc<ObjectServer>>,
    Path(uuid): Path<String>,
) -> Result<Json<StatBody>, ServeError> {
    let stat = server.stat(&uuid)?;
    Ok(Json(StatBody::from(&stat)))
}

/// `GET /file/{uuid}/read/`: the whole blob as one body.
pub async fn read_handler(
    State(server): State<Arc<ObjectServer>>,
    Path(uuid): Path<String>,
) -> Result<Response, ServeError> {
    let (record, body) = server.read_all(&uuid).await?;
    Ok((download_headers(&record), body).into_response())
}

/// Headers for a blob download. Stored names and mimetypes are arbitrary
/// text, so neither may turn a readable file into a 500.
pub(crate) fn download_headers(record: &FileRecord) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let content_type = HeaderValue::from_str(&record.mimetype).unwrap_or_else(|_| {
        warn!(id = %record.id, mimetype = %record.mimetype.escape_debug(), "unusable mimetype");
        HeaderValue::from_static(DEFAULT_MIMETYPE)
    });
    headers.insert(header::CONTENT_TYPE, content_type);
    match HeaderValue::from_str(&content_disposition(&record.name)) {
        Ok(value) => {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        Err(_) => warn!(id = %record.id, "omitting content-disposition"),
    }
    headers
}

/// `attachment` with an ASCII fallback name and the exact name in
/// RFC 5987 `filename*` form.
fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| match c {
            ' '..='~' if c != '"' && c != '\\' => c,
            _ => '_',
        })
        .collect();
    let mut value = format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''");
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' => value.push(byte as char),
            b'!' | b'#' | b'$' | b'&' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~' => {
                value.push(byte as char)
            }
            _ => {
                let _ = write!(value, "%{byte:02X}");
            }
        }
    }
    value
}

/// `GET /files/`
pub async fn list_handler(
    State(server): State<Arc<ObjectServer>>,
) -> Result<Json<FileListing>, ServeError> {
    let records = server.store().list()?;
    Ok(Json(FileListing::from_records(&records)))
}

/// Health check handler.
pub async fn health_handler(
    State(server): State<Arc<ObjectServer>>,
) -> Result<Json<HealthResponse>, ServeError> {
    let files = server.store().list()?.len();
    Ok(Json(HealthResponse::ok(files)))
}
