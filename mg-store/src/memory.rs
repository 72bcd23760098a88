//! `InMemoryStore` — the only backend this repo ships (SPEC_FULL §4.1). A
//! SQL backend is a named, unimplemented extension point; no vendor crate
//! stub stands in for it.

use crate::backend::{CatalogStore, ExecutionStore, JobStore, SplitStore};
use crate::entities::{Account, Job, JobExecution, JobSplit, Language, Topic, User, Voice};
use crate::error::{StoreError, StoreResult};
use crate::filter::{Filter, Query, QueryPage, SortDirection};
use async_trait::async_trait;
use mg_core::{ExecutionId, JobId, SplitId, UserId};
use parking_lot::RwLock;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

/// In-memory backend for tests and local development. Required indexes
/// from spec.md §4.1 are kept as derived lookup maps beside the primary
/// table rather than literal DB indexes, so the same access patterns stay
/// O(matching rows) instead of a full scan.
#[derive(Default)]
pub struct InMemoryStore {
    jobs: RwLock<HashMap<JobId, Job>>,
    jobs_by_owner: RwLock<HashMap<UserId, Vec<JobId>>>,
    executions: RwLock<HashMap<ExecutionId, JobExecution>>,
    executions_by_job: RwLock<HashMap<JobId, Vec<ExecutionId>>>,
    splits: RwLock<HashMap<SplitId, JobSplit>>,
    splits_by_job: RwLock<HashMap<JobId, Vec<SplitId>>>,
    users: RwLock<HashMap<UserId, User>>,
    languages: RwLock<HashMap<String, Language>>,
    voices: RwLock<HashMap<String, Voice>>,
    topics: RwLock<HashMap<String, Topic>>,
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_user(&self, user: User) {
        self.users.write().insert(user.id.clone(), user);
    }

    pub fn seed_language(&self, language: Language) {
        self.languages.write().insert(language.id.clone(), language);
    }

    pub fn seed_voice(&self, voice: Voice) {
        self.voices.write().insert(voice.id.clone(), voice);
    }

    pub fn seed_topic(&self, topic: Topic) {
        self.topics.write().insert(topic.id.clone(), topic);
    }

    pub fn seed_account(&self, account: Account) {
        self.accounts.write().insert(account.id.clone(), account);
    }
}

fn matches_filter(value: &Value, filter: &Filter) -> bool {
    let field = value.get(filter.field());
    match filter {
        Filter::Eq(_, v) => field == Some(v),
        Filter::Ne(_, v) => field != Some(v),
        Filter::Gt(_, v) => compare_numeric(field, v) == Some(Ordering::Greater),
        Filter::Ge(_, v) => matches!(compare_numeric(field, v), Some(Ordering::Greater) | Some(Ordering::Equal)),
        Filter::Lt(_, v) => compare_numeric(field, v) == Some(Ordering::Less),
        Filter::Le(_, v) => matches!(compare_numeric(field, v), Some(Ordering::Less) | Some(Ordering::Equal)),
        Filter::In(_, values) => field.map(|f| values.contains(f)).unwrap_or(false),
        Filter::Like(_, pattern) => field
            .and_then(|f| f.as_str())
            .map(|s| s.contains(pattern.as_str()))
            .unwrap_or(false),
        Filter::ILike(_, pattern) => field
            .and_then(|f| f.as_str())
            .map(|s| s.to_lowercase().contains(&pattern.to_lowercase()))
            .unwrap_or(false),
    }
}

fn compare_numeric(field: Option<&Value>, rhs: &Value) -> Option<Ordering> {
    let a = field?.as_f64()?;
    let b = rhs.as_f64()?;
    a.partial_cmp(&b)
}

/// Apply a [`Query`] (filters, ordering, pagination) to an owned collection
/// of entities by round-tripping through `serde_json::Value`. Acceptable
/// here since this is the in-memory reference backend, not a hot path.
fn apply_query<T: serde::Serialize + Clone>(items: Vec<T>, query: &Query) -> StoreResult<QueryPage<T>> {
    let mut tagged: Vec<(Value, T)> = items
        .into_iter()
        .map(|item| Ok((serde_json::to_value(&item)?, item)))
        .collect::<Result<_, serde_json::Error>>()?;

    tagged.retain(|(value, _)| query.filters.iter().all(|f| matches_filter(value, f)));

    for order in query.order_by.iter().rev() {
        tagged.sort_by(|(a, _), (b, _)| {
            let av = a.get(&order.field);
            let bv = b.get(&order.field);
            let cmp = compare_values(av, bv);
            match order.direction {
                SortDirection::Asc => cmp,
                SortDirection::Desc => cmp.reverse(),
            }
        });
    }

    let total = tagged.len();
    let items: Vec<T> = match query.page {
        Some(page) => tagged.into_iter().skip(page.offset()).take(page.limit()).map(|(_, item)| item).collect(),
        None => tagged.into_iter().map(|(_, item)| item).collect(),
    };

    Ok(QueryPage { items, total })
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a.and_then(|v| v.as_f64()), b.and_then(|v| v.as_f64())) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => a.and_then(|v| v.as_str()).cmp(&b.and_then(|v| v.as_str())),
    }
}

#[async_trait]
impl JobStore for InMemoryStore {
    async fn create_job(&self, job: Job) -> StoreResult<Job> {
        self.jobs_by_owner.write().entry(job.owner_id.clone()).or_default().push(job.id.clone());
        self.jobs.write().insert(job.id.clone(), job.clone());
        Ok(job)
    }

    async fn get_job(&self, id: &JobId) -> StoreResult<Job> {
        self.jobs
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { entity: "Job", id: id.to_string() })
    }

    async fn update_job(&self, job: Job) -> StoreResult<Job> {
        let mut jobs = self.jobs.write();
        if !jobs.contains_key(&job.id) {
            return Err(StoreError::NotFound { entity: "Job", id: job.id.to_string() });
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    async fn soft_delete_job(&self, id: &JobId) -> StoreResult<()> {
        {
            let mut jobs = self.jobs.write();
            let job = jobs.get_mut(id).ok_or_else(|| StoreError::NotFound { entity: "Job", id: id.to_string() })?;
            job.deleted_at = Some(chrono::Utc::now());
        }
        // Cascade: soft-delete is a configuration-layer concept, but
        // deleting a Job cascades its executions (spec.md §3).
        if let Some(exec_ids) = self.executions_by_job.read().get(id).cloned() {
            let mut executions = self.executions.write();
            for exec_id in exec_ids {
                executions.remove(&exec_id);
            }
        }
        Ok(())
    }

    async fn list_jobs(&self, query: Query) -> StoreResult<QueryPage<Job>> {
        let items: Vec<Job> = self.jobs.read().values().filter(|j| !j.is_deleted()).cloned().collect();
        apply_query(items, &query)
    }
}

#[async_trait]
impl ExecutionStore for InMemoryStore {
    async fn create_execution(&self, execution: JobExecution) -> StoreResult<JobExecution> {
        self.executions_by_job.write().entry(execution.job_id.clone()).or_default().push(execution.id.clone());
        self.executions.write().insert(execution.id.clone(), execution.clone());
        Ok(execution)
    }

    async fn get_execution(&self, id: &ExecutionId) -> StoreResult<JobExecution> {
        self.executions
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { entity: "JobExecution", id: id.to_string() })
    }

    async fn update_execution(&self, execution: JobExecution) -> StoreResult<JobExecution> {
        let mut executions = self.executions.write();
        if !executions.contains_key(&execution.id) {
            return Err(StoreError::NotFound { entity: "JobExecution", id: execution.id.to_string() });
        }
        executions.insert(execution.id.clone(), execution.clone());
        Ok(execution)
    }

    async fn list_executions(&self, query: Query) -> StoreResult<QueryPage<JobExecution>> {
        let items: Vec<JobExecution> = self.executions.read().values().cloned().collect();
        apply_query(items, &query)
    }

    async fn max_retry_count(&self, job_id: &JobId) -> StoreResult<u32> {
        let executions = self.executions.read();
        let exec_ids = self.executions_by_job.read();
        let max = exec_ids
            .get(job_id)
            .into_iter()
            .flatten()
            .filter_map(|id| executions.get(id))
            .map(|e| e.retry_count)
            .max()
            .unwrap_or(0);
        Ok(max)
    }
}

#[async_trait]
impl SplitStore for InMemoryStore {
    async fn replace_splits(&self, job_id: &JobId, splits: Vec<JobSplit>) -> StoreResult<Vec<JobSplit>> {
        let mut by_job = self.splits_by_job.write();
        let mut all = self.splits.write();

        if let Some(old_ids) = by_job.remove(job_id) {
            for id in old_ids {
                all.remove(&id);
            }
        }

        let mut new_ids = Vec::with_capacity(splits.len());
        for split in &splits {
            new_ids.push(split.id.clone());
            all.insert(split.id.clone(), split.clone());
        }
        by_job.insert(job_id.clone(), new_ids);

        Ok(splits)
    }

    async fn get_splits(&self, job_id: &JobId) -> StoreResult<Vec<JobSplit>> {
        let by_job = self.splits_by_job.read();
        let all = self.splits.read();
        let mut splits: Vec<JobSplit> = by_job.get(job_id).into_iter().flatten().filter_map(|id| all.get(id).cloned()).collect();
        splits.sort_by_key(|s| s.index);
        Ok(splits)
    }

    async fn update_split(&self, split: JobSplit) -> StoreResult<JobSplit> {
        let mut all = self.splits.write();
        if !all.contains_key(&split.id) {
            return Err(StoreError::NotFound { entity: "JobSplit", id: split.id.to_string() });
        }
        all.insert(split.id.clone(), split.clone());
        Ok(split)
    }

    async fn get_split(&self, id: &SplitId) -> StoreResult<JobSplit> {
        self.splits
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { entity: "JobSplit", id: id.to_string() })
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn get_user(&self, id: &UserId) -> StoreResult<User> {
        self.users.read().get(id).cloned().ok_or_else(|| StoreError::NotFound { entity: "User", id: id.to_string() })
    }

    async fn get_language(&self, id: &str) -> StoreResult<Language> {
        self.languages.read().get(id).cloned().ok_or_else(|| StoreError::NotFound { entity: "Language", id: id.to_string() })
    }

    async fn get_voice(&self, id: &str) -> StoreResult<Voice> {
        self.voices.read().get(id).cloned().ok_or_else(|| StoreError::NotFound { entity: "Voice", id: id.to_string() })
    }

    async fn get_topic(&self, id: &str) -> StoreResult<Topic> {
        self.topics.read().get(id).cloned().ok_or_else(|| StoreError::NotFound { entity: "Topic", id: id.to_string() })
    }

    async fn get_account(&self, id: &str) -> StoreResult<Account> {
        self.accounts.read().get(id).cloned().ok_or_else(|| StoreError::NotFound { entity: "Account", id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Orientation;
    use serde_json::json;

    fn sample_job(owner: &UserId) -> Job {
        let now = chrono::Utc::now();
        Job {
            id: JobId::new(),
            owner_id: owner.clone(),
            title: "demo".into(),
            content: "hello world".into(),
            language_id: "en".into(),
            voice_id: "v1".into(),
            topic_id: "t1".into(),
            account_id: "a1".into(),
            speech_speed: 1.0,
            orientation: Orientation::Landscape,
            extras: json!({}),
            run_order: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn create_and_get_job_round_trips() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        let job = sample_job(&owner);
        let job_id = job.id.clone();
        store.create_job(job).await.unwrap();

        let fetched = store.get_job(&job_id).await.unwrap();
        assert_eq!(fetched.id, job_id);
    }

    #[tokio::test]
    async fn soft_delete_job_cascades_executions() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        let job = sample_job(&owner);
        let job_id = job.id.clone();
        store.create_job(job).await.unwrap();

        let execution = JobExecution::new(job_id.clone());
        let exec_id = execution.id.clone();
        store.create_execution(execution).await.unwrap();

        store.soft_delete_job(&job_id).await.unwrap();

        assert!(store.get_execution(&exec_id).await.is_err());
        let fetched = store.jobs.read().get(&job_id).cloned().unwrap();
        assert!(fetched.is_deleted());
    }

    #[tokio::test]
    async fn list_jobs_filters_and_orders() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        let mut job_a = sample_job(&owner);
        job_a.run_order = 2;
        let mut job_b = sample_job(&owner);
        job_b.run_order = 1;
        store.create_job(job_a).await.unwrap();
        store.create_job(job_b).await.unwrap();

        let page = store
            .list_jobs(Query::new().order(crate::filter::OrderBy::asc("run_order")))
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].run_order, 1);
        assert_eq!(page.items[1].run_order, 2);
    }

    #[tokio::test]
    async fn retry_count_is_monotonic_across_executions() {
        let store = InMemoryStore::new();
        let job_id = JobId::new();

        let mut first = JobExecution::new(job_id.clone());
        first.retry_count = 2;
        store.create_execution(first).await.unwrap();

        assert_eq!(store.max_retry_count(&job_id).await.unwrap(), 2);
    }
}
