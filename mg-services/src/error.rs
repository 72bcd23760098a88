use thiserror::Error;

/// Result type for blob storage operations, internal to the `BlobStore` layer.
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors that can occur inside the storage backend / upload coordinator.
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("blob not found: {id}")]
    NotFound { id: String },

    #[error("invalid request: {message}")]
    Invalid { message: String },

    #[error("operation not supported by this store")]
    Unsupported,

    #[error("upload session not found: {upload_id}")]
    UploadNotFound { upload_id: String },

    #[error("upload failed: {reason}")]
    UploadFailed { reason: String },

    #[error("storage backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl BlobError {
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend { source: Box::new(error) }
    }

    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid { message: message.into() }
    }

    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn upload_not_found<S: Into<String>>(upload_id: S) -> Self {
        Self::UploadNotFound { upload_id: upload_id.into() }
    }

    pub fn upload_failed<S: Into<String>>(reason: S) -> Self {
        Self::UploadFailed { reason: reason.into() }
    }
}

/// Result type returned at every service-client trait boundary
/// (`TtsService`, `ImageGenerationService`, `FileStorageService`,
/// `DigitalHumanService`, `LlmService`).
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Classification used by the worker/pipeline layer to decide whether a
/// failed step is worth retrying. Mirrors the three-way split `base_client.py`
/// draws between `httpx.HTTPStatusError` (4xx vs 5xx), `httpx.RequestError`
/// (connection/timeout), and response parsing errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Connection refused, timed out, or the remote returned 5xx — safe to retry.
    #[error("transient service error: {0}")]
    Transient(String),

    /// The request itself was rejected (4xx) — retrying unchanged won't help.
    #[error("permanent client error: {0}")]
    PermanentClient(String),

    /// The remote returned 2xx but the body couldn't be understood, or some
    /// other non-retryable failure happened on our side of the call.
    #[error("permanent server error: {0}")]
    PermanentServer(String),
}

impl ServiceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    pub fn timeout(what: &str) -> Self {
        Self::Transient(format!("{what} timed out"))
    }

    /// Classify an HTTP response status the way `raise_for_status` +
    /// `httpx.HTTPStatusError` handling does in `base_client.py`.
    pub fn from_status(status: u16, body_snippet: impl Into<String>) -> Self {
        let snippet = body_snippet.into();
        if status >= 500 {
            Self::Transient(format!("server returned {status}: {snippet}"))
        } else if status >= 400 {
            Self::PermanentClient(format!("server returned {status}: {snippet}"))
        } else {
            Self::PermanentServer(format!("unexpected status {status}: {snippet}"))
        }
    }
}

impl From<BlobError> for ServiceError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::NotFound { .. } | BlobError::UploadNotFound { .. } => {
                ServiceError::PermanentClient(err.to_string())
            }
            BlobError::Invalid { .. } | BlobError::Unsupported => {
                ServiceError::PermanentClient(err.to_string())
            }
            BlobError::UploadFailed { .. } | BlobError::Backend { .. } | BlobError::Io { .. } => {
                ServiceError::Transient(err.to_string())
            }
            BlobError::Serialization { .. } => ServiceError::PermanentServer(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            return ServiceError::Transient(err.to_string());
        }
        if let Some(status) = err.status() {
            return ServiceError::from_status(status.as_u16(), err.to_string());
        }
        if err.is_decode() {
            return ServiceError::PermanentServer(err.to_string());
        }
        ServiceError::Transient(err.to_string())
    }
}
