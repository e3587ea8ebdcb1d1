use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use yodo_store::{Metadata, OnceStore, StoredBlob, StoreError};
use yodo_types::BlobId;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::headers::{content_disposition, external_base_url, guess_content_type, mime_essence};
use crate::upload::allocate_from_stream;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OnceStore>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn OnceStore>, config: ServerConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    fn base_url(&self, headers: &HeaderMap) -> String {
        external_base_url(headers, &self.config.bind_addr.to_string())
    }
}

/// `GET /`: usage instructions.
pub async fn usage_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let text = usage_text(&state.base_url(&headers), state.config.upload_limit());
    ([(header::CONTENT_TYPE, "text/plain")], text).into_response()
}

/// `POST /`: store the upload and answer with its one-time URL.
pub async fn upload_handler(
    State(state): State<AppState>,
    request: Request,
) -> ServerResult<Response> {
    let headers = request.headers().clone();
    let limit = state.config.upload_limit();
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let essence = content_type.as_deref().map(mime_essence).unwrap_or_default();

    let id = match essence.as_str() {
        "application/x-www-form-urlencoded" => {
            return Err(ServerError::BadRequest(
                "application/x-www-form-urlencoded not allowed.".into(),
            ));
        }
        "multipart/form-data" => {
            let multipart = Multipart::from_request(request, &state)
                .await
                .map_err(|e| ServerError::BadRequest(e.body_text()))?;
            upload_multipart(&state, multipart, limit).await?
        }
        _ => {
            if let Some(length) = declared_length(&headers) {
                if length > limit {
                    return Err(StoreError::PayloadTooLarge { limit }.into());
                }
            }
            let metadata = Metadata::new(content_type, None);
            let body = request.into_body().into_data_stream();
            allocate_from_stream(state.store.clone(), body, metadata, limit).await?
        }
    };

    tracing::info!(id = %id, "upload stored");
    let url = format!("{}/{id}\n", state.base_url(&headers));
    Ok((StatusCode::CREATED, [(header::CONTENT_TYPE, "text/plain")], url).into_response())
}

/// Store the `file` part of a multipart upload, skipping other parts. Only a
/// part that carries a filename counts as a file.
async fn upload_multipart(
    state: &AppState,
    mut multipart: Multipart,
    limit: u64,
) -> ServerResult<BlobId> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_failure(e, limit))?
    {
        if field.name() != Some("file") || field.file_name().is_none() {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .map(str::to_string)
            .or_else(|| filename.as_deref().and_then(guess_content_type));
        let metadata = Metadata::new(content_type, filename);
        return allocate_from_stream(state.store.clone(), field, metadata, limit).await;
    }
    Err(ServerError::BadRequest("No file part.".into()))
}

/// `GET /{id}`: serve the blob once and destroy it.
pub async fn retrieve_handler(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> ServerResult<Response> {
    let blob = resolve(&state, &identifier, true).await?;
    Ok(blob_response(blob))
}

/// `HEAD /{id}`: report the blob's headers without consuming it.
pub async fn inspect_handler(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> ServerResult<Response> {
    let blob = resolve(&state, &identifier, false).await?;
    Ok(blob_response(blob))
}

/// Resolve on the blocking pool. A started claim finishes even if the client
/// disconnects, so the blob is never left locked.
async fn resolve(state: &AppState, identifier: &str, destructive: bool) -> ServerResult<StoredBlob> {
    let id = BlobId::parse(identifier)
        .map_err(|_| ServerError::BadRequest("Invalid identifier.".into()))?;
    let store = state.store.clone();
    let blob = tokio::task::spawn_blocking(move || store.resolve(&id, destructive))
        .await
        .map_err(|e| ServerError::Internal(format!("resolve task failed: {e}")))??;
    tracing::debug!(id = %id, destructive, size = blob.size(), "blob resolved");
    Ok(blob)
}

fn blob_response(blob: StoredBlob) -> Response {
    let mut headers = HeaderMap::new();
    let content_type = HeaderValue::from_str(blob.metadata.effective_content_type())
        .unwrap_or_else(|_| HeaderValue::from_static(yodo_store::FALLBACK_CONTENT_TYPE));
    headers.insert(header::CONTENT_TYPE, content_type);
    if let Some(name) = blob.metadata.display_filename() {
        if let Ok(value) = HeaderValue::from_str(&content_disposition(name)) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }
    (StatusCode::OK, headers, blob.payload).into_response()
}

/// The body limit can trip while skipping parts; that is still an
/// oversized upload.
fn multipart_failure(e: MultipartError, limit: u64) -> ServerError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        StoreError::PayloadTooLarge { limit }.into()
    } else {
        ServerError::BadRequest(e.body_text())
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

fn usage_text(base: &str, limit: u64) -> String {
    let example = format!("{base}/2c8000bc-7c10-4700-9cc3-eb0dce0a9d1a");
    format!(
        "\
YODO - You Only Download Once
=============================

Ephemeral file hosting: every upload gets a URL that works exactly once.

Upload a file (say, image.png) either as the raw request body:

    $ curl --header 'Content-Type: image/png' --data-binary @image.png {base}/

or as the 'file' part of a multipart/form-data form, which can also carry
a filename:

    $ curl --form 'file=@image.png;type=image/png' {base}/

application/x-www-form-urlencoded bodies are rejected. Uploads are limited
to {limit} bytes.

A successful upload answers 201 Created with the download URL:

    {example}

The first GET of that URL returns the file and deletes it; every later
request gets 404. HEAD requests show the headers without consuming the
file. Content-Type is guessed from the filename when not given, and
Content-Disposition is set when a filename was uploaded:

    $ curl --head {example}
    HTTP/1.1 200 OK
    content-type: image/png
    content-disposition: attachment; filename=\"image.png\"
"
    )
}
