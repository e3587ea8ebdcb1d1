use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use yodo_store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::PayloadTooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Store(_) | Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Plain-text body shown to the client. Never reveals why a blob is
    /// missing.
    pub fn user_message(&self) -> String {
        match self {
            Self::BadRequest(msg) => format!("{msg}\n"),
            Self::Store(StoreError::NotFound(_)) => "Not found.\n".to_string(),
            Self::Store(StoreError::PayloadTooLarge { limit }) => {
                format!("Upload exceeds the {limit} byte limit.\n")
            }
            Self::Store(StoreError::StorageExhausted { .. }) => "Failed to allocate URL.\n".to_string(),
            Self::Store(StoreError::UpstreamRead(_)) => "Failed to receive upload.\n".to_string(),
            _ => "Internal server error.\n".to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match &self {
            Self::Store(StoreError::StorageExhausted { .. }) => {
                tracing::error!(error = %self, "storage health failure");
            }
            Self::Store(StoreError::UpstreamRead(_)) => {
                tracing::warn!(error = %self, "upload aborted");
            }
            Self::Store(StoreError::InvalidRoot { .. })
            | Self::Config(_)
            | Self::Io(_)
            | Self::Internal(_) => {
                tracing::error!(error = %self, "internal service error");
            }
            Self::BadRequest(_) | Self::Store(_) => {
                tracing::debug!(error = %self, "client error");
            }
        }

        (
            self.status_code(),
            [(header::CONTENT_TYPE, "text/plain")],
            self.user_message(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yodo_types::BlobId;

    #[test]
    fn status_mapping() {
        let cases = [
            (ServerError::BadRequest("no".into()), 400),
            (StoreError::NotFound(BlobId::generate()).into(), 404),
            (StoreError::PayloadTooLarge { limit: 1 }.into(), 413),
            (StoreError::StorageExhausted { reason: "disk".into() }.into(), 500),
            (
                StoreError::UpstreamRead(std::io::Error::other("reset")).into(),
                500,
            ),
            (ServerError::Internal("join".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{err}");
        }
    }

    #[test]
    fn not_found_message_is_uniform() {
        let err: ServerError = StoreError::NotFound(BlobId::generate()).into();
        assert_eq!(err.user_message(), "Not found.\n");
    }

    #[test]
    fn response_is_plain_text() {
        let response = ServerError::BadRequest("No file part.".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    }
}
