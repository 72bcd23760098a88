use bytes::Bytes;
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::pin::Pin;
use uuid::Uuid;

/// Stream of bytes for blob content.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Wraps an already-in-memory buffer as a single-chunk `ByteStream`, for
/// callers (like `mg-steps::UploadStep`) that read a finished artifact off
/// disk rather than streaming it live.
pub fn byte_stream_from_bytes(bytes: Bytes) -> ByteStream {
    Box::pin(futures_util::stream::once(async move { Ok::<_, std::io::Error>(bytes) }))
}

/// Unique identifier for a blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobId(pub String);

impl BlobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BlobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an upload session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadId(pub String);

impl UploadId {
    pub fn new() -> Self {
        Self(format!("upl_{}", Uuid::new_v4().simple()))
    }

    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UploadId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UploadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context threaded through every blob/service call: who asked, and which
/// request this is, for tracing. The job execution engine has no tenant
/// concept (see `mg-queue::QueueCtx`), so this only carries actor + request.
#[derive(Debug, Clone)]
pub struct BlobCtx {
    pub actor_id: Option<String>,
    pub request_id: String,
}

impl BlobCtx {
    pub fn new() -> Self {
        Self { actor_id: None, request_id: Uuid::new_v4().to_string() }
    }

    pub fn with_actor(mut self, actor_id: String) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn with_request_id(mut self, request_id: String) -> Self {
        self.request_id = request_id;
        self
    }
}

impl Default for BlobCtx {
    fn default() -> Self {
        Self::new()
    }
}

/// Request to store a blob.
#[derive(Debug, Clone)]
pub struct BlobPut {
    pub content_type: Option<String>,
    pub filename: Option<String>,
    pub size_hint: Option<u64>,
    pub attributes: serde_json::Value,
    pub key_hints: BTreeMap<String, String>,
    pub idempotency_key: Option<String>,
}

impl Default for BlobPut {
    fn default() -> Self {
        Self {
            content_type: None,
            filename: None,
            size_hint: None,
            attributes: serde_json::Value::Null,
            key_hints: BTreeMap::new(),
            idempotency_key: None,
        }
    }
}

impl BlobPut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_filename<S: Into<String>>(mut self, filename: S) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_size_hint(mut self, size: u64) -> Self {
        self.size_hint = Some(size);
        self
    }

    pub fn with_attribute<K: Into<String>, V: serde::Serialize>(mut self, key: K, value: V) -> Self {
        if self.attributes.is_null() {
            self.attributes = serde_json::Value::Object(serde_json::Map::new());
        }
        if let Some(obj) = self.attributes.as_object_mut() {
            obj.insert(key.into(), serde_json::to_value(value).unwrap_or(serde_json::Value::Null));
        }
        self
    }

    /// Hint consulted by [`crate::store::BlobKeyStrategy`]. `"static_key"`
    /// pins the object key exactly (used by batch uploads that key objects
    /// by `{prefix}/{file_type}` rather than by blob id).
    pub fn with_key_hint<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.key_hints.insert(key.into(), value.into());
        self
    }

    pub fn with_idempotency_key<S: Into<String>>(mut self, key: S) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Byte range for partial content requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl ByteRange {
    pub fn new(start: u64, end: Option<u64>) -> Self {
        Self { start, end }
    }

    pub fn from_start(start: u64) -> Self {
        Self { start, end: None }
    }

    pub fn length(&self, total_size: u64) -> u64 {
        match self.end {
            Some(end) => end.saturating_sub(self.start) + 1,
            None => total_size.saturating_sub(self.start),
        }
    }

    pub fn is_valid(&self, total_size: u64) -> bool {
        if self.start >= total_size {
            return false;
        }
        match self.end {
            Some(end) => end >= self.start && end < total_size,
            None => true,
        }
    }
}

/// Status of an upload session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    Active,
    Completed { completed_at: i64 },
    Aborted { aborted_at: i64 },
    Failed { failed_at: i64, reason: String },
}

/// Upload session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSession {
    pub upload_id: UploadId,
    pub blob_id: BlobId,
    pub actor_id: Option<String>,

    pub created_at: i64,
    pub updated_at: i64,

    pub total_parts: Option<u32>,
    pub status: UploadStatus,

    pub content_type: String,
    pub filename: Option<String>,
    pub size_hint: Option<u64>,
    pub attributes: serde_json::Value,

    pub progress: UploadProgress,
}

/// Progress tracking for upload sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadProgress {
    pub parts: BTreeMap<u32, PartReceipt>,
    pub received_bytes: u64,
}

/// Receipt for an uploaded part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartReceipt {
    pub part_number: u32,
    pub size_bytes: u64,
    pub etag: Option<String>,
    pub checksum: Option<String>,
    pub uploaded_at: i64,
}
