use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{adapter::BlobAdapter, BlobCtx, BlobId, BlobPut, ByteStream, OpenedContent, ServiceError, ServiceResult};

/// Result of uploading a single file, grounded on `storage_client.py`'s
/// `FileUploadResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUploadResult {
    pub success: bool,
    pub file_key: Option<String>,
    pub url: Option<String>,
    pub error_message: Option<String>,
}

/// Result of `upload_batch`, grounded on `storage_client.py`'s
/// `BatchUploadResult` — one entry per logical file type (`audio`, `video`,
/// `srt`, `cover`, ...) in the final-asset handoff to object storage.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchUploadResult {
    pub results: HashMap<String, FileUploadResult>,
    pub total_size: u64,
    pub success_count: u32,
    pub failed_count: u32,
}

/// One file to upload as part of a batch: a logical type name
/// (`"audio"`, `"video"`, ...), the put request, and its content.
pub struct BatchUploadItem {
    pub file_type: String,
    pub put: BlobPut,
    pub body: ByteStream,
}

/// Final-asset storage boundary used by `UploadStep` and `mg-api`'s download
/// endpoints. Grounded directly on `dog-blob::BlobStore` + `BlobAdapter`;
/// `upload_file`/`upload_batch`/`get_download_url`/`delete_file` mirror
/// `storage_client.py`'s `StorageClient` one-for-one.
#[async_trait]
pub trait FileStorageService: Send + Sync {
    async fn upload_file(&self, ctx: BlobCtx, put: BlobPut, body: ByteStream) -> ServiceResult<FileUploadResult>;

    async fn upload_batch(&self, ctx: BlobCtx, prefix: &str, files: Vec<BatchUploadItem>) -> ServiceResult<BatchUploadResult>;

    async fn get_download_url(&self, ctx: BlobCtx, id: BlobId, expires_in: Duration) -> ServiceResult<Option<String>>;

    async fn delete_file(&self, ctx: BlobCtx, id: BlobId) -> ServiceResult<bool>;
}

/// `FileStorageService` implementation backed by a `BlobAdapter` over any
/// `BlobStore` (the in-memory store by default, or a future S3-compatible one).
pub struct BlobFileStorageService {
    adapter: BlobAdapter,
    timeout: Duration,
}

impl BlobFileStorageService {
    pub fn new(adapter: BlobAdapter, timeout: Duration) -> Self {
        Self { adapter, timeout }
    }
}

#[async_trait]
impl FileStorageService for BlobFileStorageService {
    async fn upload_file(&self, ctx: BlobCtx, put: BlobPut, body: ByteStream) -> ServiceResult<FileUploadResult> {
        let fut = self.adapter.put(ctx, put, body);
        match tokio::time::timeout(self.timeout, fut).await {
            Err(_) => Ok(FileUploadResult {
                success: false,
                file_key: None,
                url: None,
                error_message: Some("upload timed out".to_string()),
            }),
            Ok(Err(e)) => Ok(FileUploadResult {
                success: false,
                file_key: None,
                url: None,
                error_message: Some(e.to_string()),
            }),
            Ok(Ok(receipt)) => Ok(FileUploadResult {
                success: true,
                file_key: Some(receipt.key),
                url: None,
                error_message: None,
            }),
        }
    }

    async fn upload_batch(&self, ctx: BlobCtx, prefix: &str, files: Vec<BatchUploadItem>) -> ServiceResult<BatchUploadResult> {
        let mut batch = BatchUploadResult::default();

        for item in files {
            let put = item.put.with_key_hint("static_key", format!("{}/{}", prefix, item.file_type));
            let result = self.upload_file(ctx.clone(), put, item.body).await?;

            if result.success {
                batch.success_count += 1;
            } else {
                batch.failed_count += 1;
            }
            batch.results.insert(item.file_type, result);
        }

        Ok(batch)
    }

    async fn get_download_url(&self, ctx: BlobCtx, id: BlobId, expires_in: Duration) -> ServiceResult<Option<String>> {
        let fut = self.adapter.open(ctx, id, None);
        let opened = match tokio::time::timeout(self.timeout, fut).await {
            Err(_) => return Err(ServiceError::timeout("get_download_url")),
            Ok(result) => result?,
        };

        Ok(match opened.content {
            OpenedContent::SignedUrl { url, .. } => Some(url),
            OpenedContent::Stream { .. } => {
                let _ = expires_in;
                None
            }
        })
    }

    async fn delete_file(&self, ctx: BlobCtx, id: BlobId) -> ServiceResult<bool> {
        let fut = self.adapter.delete(ctx, id);
        match tokio::time::timeout(self.timeout, fut).await {
            Err(_) => Err(ServiceError::timeout("delete_file")),
            Ok(Ok(())) => Ok(true),
            Ok(Err(e)) => {
                let err: ServiceError = e.into();
                if matches!(err, ServiceError::PermanentClient(_)) {
                    Ok(false)
                } else {
                    Err(err)
                }
            }
        }
    }
}
