//! Worker process entry point: loads config, wires up the (in-memory,
//! swappable) store/queue/service backends, assembles the eight-step
//! pipeline, and runs the dequeue/dispatch/ack loop alongside the periodic
//! maintenance scheduler until the process is killed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mg_core::{AppConfig, RawConfig};
use mg_pipeline::PipelineBuilder;
use mg_queue::backend::memory::MemoryBackend;
use mg_services::{
    BlobAdapter, BlobConfig, BlobFileStorageService, HttpDigitalHumanService, HttpImageGenerationService,
    HttpTtsService, InMemoryBlobStore,
};
use mg_steps::{DigitalHumanStep, ImageStep, PostProcessStep, SplitStep, SubtitleStep, TtsStep, UploadStep, VideoStep};
use mg_store::{InMemoryStore, StoreBackend};
use mg_worker::{Beat, JobExecutor, WorkerRuntime};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .json()
        .init();

    let raw = RawConfig::from_env("MG__");
    let config = AppConfig::load(&raw)?;

    tracing::info!(
        environment = %config.environment,
        concurrency = config.worker_concurrency,
        "starting mg-worker"
    );

    let store: Arc<dyn StoreBackend> = Arc::new(InMemoryStore::new());
    let queue_backend = Arc::new(MemoryBackend::new());

    let tts_service = Arc::new(HttpTtsService::new(
        config.tts_base_url.clone().unwrap_or_else(|| "http://localhost:8101".to_string()),
    ));
    let image_service = Arc::new(HttpImageGenerationService::new(
        config.image_base_url.clone().unwrap_or_else(|| "http://localhost:8102".to_string()),
    ));
    let digital_human_service = Arc::new(HttpDigitalHumanService::new(
        config.digital_human_base_url.clone().unwrap_or_else(|| "http://localhost:8103".to_string()),
    ));

    let blob_adapter = BlobAdapter::new(InMemoryBlobStore::new(), BlobConfig::default());
    let file_storage = Arc::new(BlobFileStorageService::new(blob_adapter, Duration::from_secs(300)));

    let steps = PipelineBuilder::new()
        .add_step(TtsStep::new(tts_service))
        .add_step(SubtitleStep::default())
        .add_step(SplitStep::default())
        .add_step(ImageStep::new(image_service))
        .add_step(VideoStep::default())
        .add_conditional_step(DigitalHumanStep::new(digital_human_service))
        .add_step(PostProcessStep::new())
        .add_step(UploadStep::new(file_storage))
        .build();

    let workspace_base = std::env::var("MG_WORKSPACE_DIR").map(PathBuf::from).unwrap_or_else(|_| std::env::temp_dir().join("mg-worker"));

    let executor = Arc::new(JobExecutor::new(store.clone(), steps, workspace_base));
    let runtime = Arc::new(WorkerRuntime::new(store, queue_backend.clone(), executor, &config));
    let beat = Beat::new(queue_backend);

    tokio::select! {
        _ = runtime.run() => {}
        result = beat.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "scheduler stopped unexpectedly");
            }
        }
    }

    Ok(())
}
