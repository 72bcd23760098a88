//! Pipeline framework for the media generation job engine: the `Step`
//! trait, the tagged `StepResult` union, the step input resolver, and the
//! `PipelineExecutor` that drives them to completion against a shared,
//! read-only `PipelineContext` (spec.md §4.4). Functional mode only — the
//! source system's parallel context-mutation API is dropped entirely
//! rather than carried as a compatibility shim (spec.md §9).

pub mod builder;
pub mod context;
pub mod error;
pub mod executor;
pub mod input_resolver;
pub mod result;
pub mod status;
pub mod step;

pub use builder::{PipelineBuilder, PipelineStep};
pub use context::PipelineContext;
pub use error::{PipelineError, StepError, ValidationError};
pub use executor::PipelineExecutor;
pub use input_resolver::resolve_inputs;
pub use result::{
    DigitalHumanResult, ImageResult, PostProcessResult, ResultManager, SplitResult, StepResult, SubtitleResult, TtsResult,
    UploadOutcome, UploadResult, VideoResult,
};
pub use status::{RecordingStatusUpdater, StatusUpdater, StoreStatusUpdater};
pub use step::{ConditionalStep, Step, StepInputs};

pub mod prelude {
    pub use crate::{ConditionalStep, PipelineBuilder, PipelineContext, PipelineExecutor, Step, StepError, StepInputs, StepResult};
    pub use async_trait::async_trait;
}
