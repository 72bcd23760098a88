//! The durable store contract (spec.md §4.1). Split into one trait per
//! entity family — rather than a single reflection-style generic CRUD
//! trait — since the entity set is fixed and small; combined into
//! [`StoreBackend`] for callers that need the whole surface, mirroring how
//! `dog-queue::backend::QueueBackend` bundles its operations into one trait.

use crate::entities::{Account, Job, JobExecution, JobSplit, Language, Topic, User, Voice};
use crate::error::StoreResult;
use crate::filter::{Query, QueryPage};
use async_trait::async_trait;
use mg_core::{ExecutionId, JobId, SplitId, UserId};

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_job(&self, job: Job) -> StoreResult<Job>;
    async fn get_job(&self, id: &JobId) -> StoreResult<Job>;
    async fn update_job(&self, job: Job) -> StoreResult<Job>;
    /// Soft-deletes the job and cascades to its executions (spec.md §3).
    async fn soft_delete_job(&self, id: &JobId) -> StoreResult<()>;
    async fn list_jobs(&self, query: Query) -> StoreResult<QueryPage<Job>>;
}

#[async_trait]
pub trait ExecutionStore: Send + Sync {
    async fn create_execution(&self, execution: JobExecution) -> StoreResult<JobExecution>;
    async fn get_execution(&self, id: &ExecutionId) -> StoreResult<JobExecution>;
    /// Persists a (typically already-validated) execution update. Callers
    /// go through [`JobExecution::transition`] for the state-machine edges.
    async fn update_execution(&self, execution: JobExecution) -> StoreResult<JobExecution>;
    async fn list_executions(&self, query: Query) -> StoreResult<QueryPage<JobExecution>>;
    /// Highest `retry_count` among any execution of this job so far, used
    /// to enforce the monotonic-non-decreasing invariant (spec.md §3) when
    /// starting a fresh execution.
    async fn max_retry_count(&self, job_id: &JobId) -> StoreResult<u32>;
}

#[async_trait]
pub trait SplitStore: Send + Sync {
    /// Transactional batch write: replaces all splits for `job_id`.
    async fn replace_splits(&self, job_id: &JobId, splits: Vec<JobSplit>) -> StoreResult<Vec<JobSplit>>;
    async fn get_splits(&self, job_id: &JobId) -> StoreResult<Vec<JobSplit>>;
    async fn update_split(&self, split: JobSplit) -> StoreResult<JobSplit>;
    async fn get_split(&self, id: &SplitId) -> StoreResult<JobSplit>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_user(&self, id: &UserId) -> StoreResult<User>;
    async fn get_language(&self, id: &str) -> StoreResult<Language>;
    async fn get_voice(&self, id: &str) -> StoreResult<Voice>;
    async fn get_topic(&self, id: &str) -> StoreResult<Topic>;
    async fn get_account(&self, id: &str) -> StoreResult<Account>;
}

/// The full durable-store surface a production deployment implements.
pub trait StoreBackend: JobStore + ExecutionStore + SplitStore + CatalogStore {}

impl<T: JobStore + ExecutionStore + SplitStore + CatalogStore> StoreBackend for T {}
