//! `PipelineBuilder` — assembles the ordered step list a `PipelineExecutor`
//! runs (spec.md §4.4 builder pattern). Grounded on the `with_*`
//! builder-style chaining in `mg-queue::adapter::QueueAdapter`/`QueueConfig`,
//! applied here to step composition instead of queue configuration.

use crate::step::{ConditionalStep, Step};

/// A step in the pipeline, either unconditional or gated by
/// `ConditionalStep::should_execute`.
pub enum PipelineStep {
    Plain(Box<dyn Step>),
    Conditional(Box<dyn ConditionalStep>),
}

impl PipelineStep {
    pub fn as_step(&self) -> &dyn Step {
        match self {
            Self::Plain(s) => s.as_ref(),
            Self::Conditional(s) => s.as_ref(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.as_step().name()
    }
}

#[derive(Default)]
pub struct PipelineBuilder {
    steps: Vec<PipelineStep>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(PipelineStep::Plain(Box::new(step)));
        self
    }

    pub fn add_conditional_step(mut self, step: impl ConditionalStep + 'static) -> Self {
        self.steps.push(PipelineStep::Conditional(Box::new(step)));
        self
    }

    pub fn add_steps(mut self, steps: Vec<PipelineStep>) -> Self {
        self.steps.extend(steps);
        self
    }

    pub fn insert_step(mut self, index: usize, step: PipelineStep) -> Self {
        self.steps.insert(index, step);
        self
    }

    pub fn remove_step(mut self, step_name: &str) -> Self {
        self.steps.retain(|s| s.name() != step_name);
        self
    }

    pub fn clear_steps(mut self) -> Self {
        self.steps.clear();
        self
    }

    pub fn get_step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn build(self) -> Vec<PipelineStep> {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PipelineContext;
    use crate::error::StepError;
    use crate::result::{StepResult, TtsResult};
    use crate::step::StepInputs;
    use async_trait::async_trait;
    use serde_json::Value;

    struct DummyStep;

    #[async_trait]
    impl Step for DummyStep {
        fn name(&self) -> &'static str {
            "DummyStep"
        }

        async fn execute(&self, _ctx: &PipelineContext, _inputs: StepInputs) -> Result<StepResult, StepError> {
            Ok(StepResult::Tts(TtsResult {
                audio_path: "a.wav".into(),
                srt_path: "a.srt".into(),
                duration_secs: 1.0,
                metadata: Value::Null,
            }))
        }
    }

    #[test]
    fn add_then_remove_empties_builder() {
        let builder = PipelineBuilder::new().add_step(DummyStep).add_step(DummyStep);
        assert_eq!(builder.get_step_count(), 2);

        let builder = builder.remove_step("DummyStep");
        assert_eq!(builder.get_step_count(), 0);
    }

    #[test]
    fn clear_steps_empties_regardless_of_name() {
        let builder = PipelineBuilder::new().add_step(DummyStep).clear_steps();
        assert_eq!(builder.get_step_count(), 0);
    }
}
