//! Service-client boundary for the job execution engine: speech synthesis,
//! image generation, digital-human overlay, an LLM completion cache, and
//! final-asset object storage. Each client is a small `async_trait` trait
//! with a typed request/response pair, a single `tokio::time::timeout`
//! deadline per call, and no internal retry — retry policy belongs to the
//! worker that dispatches pipeline steps, not to the client.
//!
//! Storage is the one client grounded on a full pre-existing subsystem
//! (`BlobStore`/`BlobAdapter`, streaming-first with optional multipart);
//! the rest (`tts`, `image`, `digital_human`, `llm`) are thin `reqwest`
//! adapters over the upstream HTTP services they describe.

pub mod adapter;
mod config;
mod coordinator;
pub mod digital_human;
mod error;
pub mod file_storage;
mod http;
pub mod image;
pub mod llm;
mod memory_store;
mod receipt;
pub mod store;
pub mod tts;
mod types;
mod upload;

pub use adapter::BlobAdapter;
pub use config::{BlobConfig, UploadRules};
pub use coordinator::DefaultUploadCoordinator;
pub use digital_human::{DigitalHumanMode, DigitalHumanRequest, DigitalHumanResponse, DigitalHumanService, HttpDigitalHumanService};
pub use error::{BlobError, BlobResult, ServiceError, ServiceResult};
pub use file_storage::{BatchUploadItem, BatchUploadResult, BlobFileStorageService, FileStorageService, FileUploadResult};
pub use image::{HttpImageGenerationService, ImageGenerationRequest, ImageGenerationResponse, ImageGenerationService, LoraSpec};
pub use llm::{CachedLlmService, HttpLlmService, LlmRequest, LlmResponse, LlmService};
pub use memory_store::{shared_memory_store, InMemoryBlobStore, InMemoryUploadSessionStore};
pub use receipt::{BlobReceipt, OpenedBlob, OpenedContent, ResolvedRange};
pub use store::{
    BlobKeyStrategy, BlobStore, DefaultKeyStrategy, GetResult, MultipartBlobStore, ObjectHead, PutResult,
    SignedUrlBlobStore, StoreCapabilities,
};
pub use tts::{HttpTtsService, TtsRequest, TtsResponse, TtsService};
pub use types::{
    byte_stream_from_bytes, BlobCtx, BlobId, BlobPut, ByteRange, ByteStream, PartReceipt, UploadId, UploadProgress,
    UploadSession, UploadStatus,
};
pub use upload::{UploadCoordinator, UploadIntent, UploadSessionStore};

/// Convenience imports for crates embedding `mg-services`.
pub mod prelude {
    pub use crate::{
        BlobAdapter, BlobConfig, BlobCtx, BlobError, BlobId, BlobPut, BlobReceipt, BlobResult, BlobStore, ByteStream,
        DigitalHumanService, FileStorageService, ImageGenerationService, LlmService, ServiceError, ServiceResult,
        TtsService,
    };
    pub use async_trait::async_trait;
}
