use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use parking_lot::RwLock;

use crate::{
    byte_stream_from_bytes, BlobError, BlobResult, BlobStore, ByteRange, ByteStream, GetResult, ObjectHead, PartReceipt,
    PutResult, ResolvedRange, StoreCapabilities, UploadId, UploadSession, UploadSessionStore,
    UploadStatus,
};

/// In-process object store, the same `RwLock<HashMap<_>>` shape as
/// `mg_queue::backend::memory::MemoryBackend`. Stands in for an S3-compatible
/// backend behind the `BlobStore` trait until a real object-store deployment
/// swaps it out — no code above this layer needs to change when that happens.
#[derive(Default)]
pub struct InMemoryBlobStore {
    objects: RwLock<HashMap<String, StoredObject>>,
}

struct StoredObject {
    bytes: Bytes,
    content_type: Option<String>,
    etag: String,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }
}

async fn collect(mut stream: ByteStream) -> BlobResult<Bytes> {
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(Bytes::from(buf))
}

fn byte_stream_of(bytes: Bytes) -> ByteStream {
    byte_stream_from_bytes(bytes)
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, content_type: Option<&str>, stream: ByteStream) -> BlobResult<PutResult> {
        let bytes = collect(stream).await?;
        let size_bytes = bytes.len() as u64;
        let etag = format!("{:x}", md5_like_digest(&bytes));

        self.objects.write().insert(
            key.to_string(),
            StoredObject { bytes, content_type: content_type.map(str::to_string), etag: etag.clone() },
        );

        Ok(PutResult { etag: Some(etag), size_bytes, checksum: None })
    }

    async fn get(&self, key: &str, range: Option<ByteRange>) -> BlobResult<GetResult> {
        let object = {
            let guard = self.objects.read();
            let obj = guard.get(key).ok_or_else(|| BlobError::not_found(key))?;
            (obj.bytes.clone(), obj.content_type.clone(), obj.etag.clone())
        };
        let (bytes, content_type, etag) = object;
        let total_size = bytes.len() as u64;

        let (slice, resolved_range) = match range {
            Some(r) => {
                if !r.is_valid(total_size) {
                    return Err(BlobError::invalid("range not satisfiable"));
                }
                let end = r.end.unwrap_or(total_size.saturating_sub(1)).min(total_size.saturating_sub(1));
                let start = r.start as usize;
                let end_inclusive = end as usize;
                (bytes.slice(start..=end_inclusive), Some(ResolvedRange { start: r.start, end, total_size }))
            }
            None => (bytes, None),
        };

        Ok(GetResult {
            size_bytes: slice.len() as u64,
            stream: byte_stream_of(slice),
            content_type,
            etag: Some(etag),
            resolved_range,
        })
    }

    async fn head(&self, key: &str) -> BlobResult<ObjectHead> {
        let guard = self.objects.read();
        let obj = guard.get(key).ok_or_else(|| BlobError::not_found(key))?;
        Ok(ObjectHead {
            size_bytes: obj.bytes.len() as u64,
            content_type: obj.content_type.clone(),
            etag: Some(obj.etag.clone()),
            last_modified: None,
        })
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        self.objects.write().remove(key);
        Ok(())
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities::basic().with_range()
    }
}

/// Cheap, non-cryptographic content fingerprint — good enough for an etag
/// on an in-memory dev store, not meant to stand in for a real checksum.
fn md5_like_digest(bytes: &[u8]) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

/// In-process upload session store, mirroring `InMemoryBlobStore`'s shape.
#[derive(Default)]
pub struct InMemoryUploadSessionStore {
    sessions: RwLock<HashMap<String, UploadSession>>,
}

impl InMemoryUploadSessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UploadSessionStore for InMemoryUploadSessionStore {
    async fn create(&self, session: UploadSession) -> BlobResult<UploadSession> {
        self.sessions.write().insert(session.upload_id.as_str().to_string(), session.clone());
        Ok(session)
    }

    async fn get(&self, upload_id: &UploadId) -> BlobResult<UploadSession> {
        self.sessions
            .read()
            .get(upload_id.as_str())
            .cloned()
            .ok_or_else(|| BlobError::upload_not_found(upload_id.as_str()))
    }

    async fn update(&self, session: UploadSession) -> BlobResult<UploadSession> {
        self.sessions.write().insert(session.upload_id.as_str().to_string(), session.clone());
        Ok(session)
    }

    async fn delete(&self, upload_id: &UploadId) -> BlobResult<()> {
        self.sessions.write().remove(upload_id.as_str());
        Ok(())
    }

    async fn record_part(&self, upload_id: &UploadId, part: PartReceipt) -> BlobResult<()> {
        let mut guard = self.sessions.write();
        let session = guard.get_mut(upload_id.as_str()).ok_or_else(|| BlobError::upload_not_found(upload_id.as_str()))?;
        session.progress.received_bytes += part.size_bytes;
        session.progress.parts.insert(part.part_number, part);
        Ok(())
    }

    async fn mark_completed(&self, upload_id: &UploadId, completed_at: i64) -> BlobResult<()> {
        let mut guard = self.sessions.write();
        let session = guard.get_mut(upload_id.as_str()).ok_or_else(|| BlobError::upload_not_found(upload_id.as_str()))?;
        session.status = UploadStatus::Completed { completed_at };
        Ok(())
    }

    async fn mark_failed(&self, upload_id: &UploadId, failed_at: i64, reason: String) -> BlobResult<()> {
        let mut guard = self.sessions.write();
        let session = guard.get_mut(upload_id.as_str()).ok_or_else(|| BlobError::upload_not_found(upload_id.as_str()))?;
        session.status = UploadStatus::Failed { failed_at, reason };
        Ok(())
    }

    async fn mark_aborted(&self, upload_id: &UploadId, aborted_at: i64) -> BlobResult<()> {
        let mut guard = self.sessions.write();
        let session = guard.get_mut(upload_id.as_str()).ok_or_else(|| BlobError::upload_not_found(upload_id.as_str()))?;
        session.status = UploadStatus::Aborted { aborted_at };
        Ok(())
    }
}

pub fn shared_memory_store() -> Arc<InMemoryBlobStore> {
    Arc::new(InMemoryBlobStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let store = InMemoryBlobStore::new();
        let body = byte_stream_of(Bytes::from_static(b"hello world"));
        let put = store.put("a/b/c", Some("text/plain"), body).await.unwrap();
        assert_eq!(put.size_bytes, 11);

        let got = store.get("a/b/c", None).await.unwrap();
        assert_eq!(got.size_bytes, 11);
        assert_eq!(got.content_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let store = InMemoryBlobStore::new();
        let err = store.get("missing", None).await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound { .. }));
    }

    #[tokio::test]
    async fn range_get_returns_requested_slice() {
        let store = InMemoryBlobStore::new();
        store.put("range-me", None, byte_stream_of(Bytes::from_static(b"0123456789"))).await.unwrap();

        let got = store.get("range-me", Some(ByteRange::new(2, Some(4)))).await.unwrap();
        assert_eq!(got.size_bytes, 3);
    }
}
