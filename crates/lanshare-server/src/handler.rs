use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio_util::io::{ReaderStream, SyncIoBridge};

use lanshare_ledger::{HistoryLog, UNKNOWN_ADDRESS};
use lanshare_store::{ArtifactStore, Retrieved, Upload};
use lanshare_types::{mime_type, Artifact, ContentClass, Message, StoreKind};

use crate::error::{ServerError, ServerResult};
use crate::extract::ClientAddr;
use crate::state::AppInfo;

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

/// Run blocking store or ledger work off the async executor.
async fn blocking<T, F>(f: F) -> ServerResult<T>
where
    F: FnOnce() -> ServerResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?
}

fn multipart_error(e: MultipartError) -> ServerError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(e.body_text())
    } else {
        ServerError::BadRequest(e.body_text())
    }
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ServerResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ServerError::BadRequest(e.body_text()))
}

// ---------------------------------------------------------------------------
// Artifact stores
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    pub size: u64,
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct ArtifactEntry {
    pub name: String,
    pub size: u64,
    pub modified: f64,
    pub address: String,
    pub class: ContentClass,
}

impl From<Artifact> for ArtifactEntry {
    fn from(artifact: Artifact) -> Self {
        let class = artifact.class();
        let modified = artifact.modified_secs();
        Self {
            address: artifact
                .origin_address
                .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string()),
            name: artifact.name,
            size: artifact.size_bytes,
            modified,
            class,
        }
    }
}

fn label(kind: StoreKind) -> &'static str {
    match kind {
        StoreKind::File => "File",
        StoreKind::Video => "Video",
    }
}

/// Bytes buffered between the request body and the blocking writer.
const UPLOAD_PIPE_BYTES: usize = 64 * 1024;

/// Blocking side of the upload pipe. An end of stream after the client
/// aborted is reported as an error so a truncated upload is never stored.
struct UploadReader<R> {
    inner: R,
    aborted: Arc<AtomicBool>,
}

impl<R: Read> Read for UploadReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && !buf.is_empty() && self.aborted.load(Ordering::Acquire) {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "upload aborted before completion",
            ));
        }
        Ok(n)
    }
}

/// Pipe one multipart field into `ingest` running on the blocking pool.
async fn stream_upload(
    store: Arc<dyn ArtifactStore>,
    origin: String,
    field: &mut Field<'_>,
) -> ServerResult<Artifact> {
    let file_name = field.file_name().map(str::to_string);
    let (mut body_tx, body_rx) = tokio::io::duplex(UPLOAD_PIPE_BYTES);
    let aborted = Arc::new(AtomicBool::new(false));
    let mut reader = UploadReader {
        inner: SyncIoBridge::new(body_rx),
        aborted: Arc::clone(&aborted),
    };
    let ingest = tokio::task::spawn_blocking(move || {
        store.ingest(Upload {
            candidate_name: file_name.as_deref(),
            // Unknown up front; the streamed copy enforces the ceiling.
            byte_size: 0,
            content: Some(&mut reader),
            origin: &origin,
        })
    });

    let mut pumped = Ok(());
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                // The reader is gone: ingest has already finished or rejected.
                if body_tx.write_all(&chunk).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                aborted.store(true, Ordering::Release);
                pumped = Err(multipart_error(e));
                break;
            }
        }
    }
    drop(body_tx);

    let ingested = ingest
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    pumped?;
    Ok(ingested?)
}

/// Stream the `file` field into the store without buffering it whole.
pub async fn upload(
    State(store): State<Arc<dyn ArtifactStore>>,
    ClientAddr(origin): ClientAddr,
    mut multipart: Multipart,
) -> ServerResult<Json<UploadResponse>> {
    let kind = store.kind();
    let mut field = loop {
        match multipart.next_field().await.map_err(multipart_error)? {
            Some(field) if field.name() == Some(UPLOAD_FIELD) => break Some(field),
            Some(_) => continue,
            None => break None,
        }
    };

    let artifact = match field.as_mut() {
        Some(field) => stream_upload(store, origin, field).await?,
        None => {
            blocking(move || {
                Ok(store.ingest(Upload {
                    candidate_name: None,
                    byte_size: 0,
                    content: None,
                    origin: &origin,
                })?)
            })
            .await?
        }
    };

    Ok(Json(UploadResponse {
        message: format!("{} uploaded successfully", label(kind)),
        size: artifact.size_bytes,
        address: artifact
            .origin_address
            .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string()),
        filename: artifact.name,
    }))
}

/// `{"files": [...]}` or `{"videos": [...]}`, newest first.
pub async fn list(State(store): State<Arc<dyn ArtifactStore>>) -> ServerResult<Json<Value>> {
    let key = format!("{}s", store.kind());
    let artifacts = blocking(move || Ok(store.list()?)).await?;
    let entries: Vec<ArtifactEntry> = artifacts.into_iter().map(ArtifactEntry::from).collect();
    Ok(Json(json!({ key: entries })))
}

async fn open(store: Arc<dyn ArtifactStore>, name: String) -> ServerResult<Retrieved> {
    blocking(move || Ok(store.retrieve(&name)?)).await
}

/// Percent-encode for an RFC 5987 `filename*` parameter.
fn encode_ext_value(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for b in name.bytes() {
        if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// `Content-Disposition` with an ASCII fallback and the exact UTF-8 name.
pub fn content_disposition(disposition: &str, name: &str) -> HeaderValue {
    let fallback: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let value = format!(
        "{disposition}; filename=\"{fallback}\"; filename*=UTF-8''{}",
        encode_ext_value(name)
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn stream_file(retrieved: Retrieved, disposition: &str) -> Response {
    let Retrieved { artifact, file } = retrieved;
    let mime = mime_type(artifact.extension().unwrap_or_default());
    let stream = ReaderStream::new(tokio::fs::File::from_std(file));
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(mime)),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(disposition, &artifact.name),
            ),
            (header::CONTENT_LENGTH, HeaderValue::from(artifact.size_bytes)),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}

pub async fn download(
    State(store): State<Arc<dyn ArtifactStore>>,
    Path(name): Path<String>,
) -> ServerResult<Response> {
    let retrieved = open(store, name).await?;
    Ok(stream_file(retrieved, "attachment"))
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Inline body for media, an escaped `<pre>` page for text, 400 otherwise.
pub async fn preview(
    State(store): State<Arc<dyn ArtifactStore>>,
    Path(name): Path<String>,
) -> ServerResult<Response> {
    let retrieved = open(store, name).await?;
    match retrieved.artifact.class() {
        ContentClass::Image | ContentClass::Audio | ContentClass::Video => {
            Ok(stream_file(retrieved, "inline"))
        }
        ContentClass::Text => {
            let Retrieved { mut file, .. } = retrieved;
            let raw = blocking(move || {
                let mut raw = Vec::new();
                file.read_to_end(&mut raw)?;
                Ok(raw)
            })
            .await?;
            let page = format!(
                "<pre style=\"white-space: pre-wrap; word-wrap: break-word;\">{}</pre>",
                escape_html(&String::from_utf8_lossy(&raw))
            );
            Ok((
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                page,
            )
                .into_response())
        }
        ContentClass::Archive | ContentClass::Unsupported => {
            Err(ServerError::PreviewUnsupported(retrieved.artifact.name))
        }
    }
}

pub async fn delete(
    State(store): State<Arc<dyn ArtifactStore>>,
    Path(name): Path<String>,
) -> ServerResult<Json<Value>> {
    let kind = store.kind();
    blocking(move || Ok(store.delete(&name)?)).await?;
    Ok(Json(json!({
        "message": format!("{} deleted successfully", label(kind)),
    })))
}

// ---------------------------------------------------------------------------
// Capacity
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct MaxCountRequest {
    pub max_count: Option<i64>,
}

fn read_max_count(payload: Result<Json<MaxCountRequest>, JsonRejection>) -> ServerResult<i64> {
    json_body(payload)?
        .max_count
        .ok_or_else(|| ServerError::BadRequest("max_count is required".into()))
}

pub async fn get_store_capacity(State(store): State<Arc<dyn ArtifactStore>>) -> Json<Value> {
    Json(json!({ "max_count": store.capacity().get() }))
}

/// Takes effect on the next ingestion's sweep.
pub async fn set_store_capacity(
    State(store): State<Arc<dyn ArtifactStore>>,
    payload: Result<Json<MaxCountRequest>, JsonRejection>,
) -> ServerResult<Json<Value>> {
    let requested = read_max_count(payload)?;
    store.capacity().set(requested)?;
    tracing::info!(store = %store.kind(), max_count = requested, "capacity updated");
    Ok(Json(json!({
        "message": "ok",
        "max_count": store.capacity().get(),
    })))
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PostMessage {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostMessageResponse {
    pub message: &'static str,
    pub entry: Message,
}

pub async fn post_message(
    State(history): State<Arc<HistoryLog>>,
    ClientAddr(origin): ClientAddr,
    payload: Result<Json<PostMessage>, JsonRejection>,
) -> ServerResult<Json<PostMessageResponse>> {
    let text = json_body(payload)?
        .text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServerError::BadRequest("text is required".into()))?;
    let entry = blocking(move || Ok(history.append(&text, &origin)?)).await?;
    Ok(Json(PostMessageResponse {
        message: "ok",
        entry,
    }))
}

pub async fn get_message(State(history): State<Arc<HistoryLog>>) -> ServerResult<Json<Value>> {
    let text = blocking(move || Ok(history.current_text()?)).await?;
    Ok(Json(json!({ "text": text })))
}

pub async fn message_history(
    State(history): State<Arc<HistoryLog>>,
) -> ServerResult<Json<Value>> {
    let entries = blocking(move || Ok(history.read_all()?)).await?;
    Ok(Json(json!({ "history": entries })))
}

pub async fn get_history_capacity(State(history): State<Arc<HistoryLog>>) -> Json<Value> {
    Json(json!({ "max_count": history.capacity().get() }))
}

pub async fn set_history_capacity(
    State(history): State<Arc<HistoryLog>>,
    payload: Result<Json<MaxCountRequest>, JsonRejection>,
) -> ServerResult<Json<Value>> {
    let requested = read_max_count(payload)?;
    history.capacity().set(requested)?;
    tracing::info!(max_count = requested, "message capacity updated");
    Ok(Json(json!({
        "message": "ok",
        "max_count": history.capacity().get(),
    })))
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn info(State(info): State<Arc<AppInfo>>) -> Json<Value> {
    Json(json!({
        "name": info.name,
        "version": info.version,
        "share_url": info.share_url,
    }))
}
