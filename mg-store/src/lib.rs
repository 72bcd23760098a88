//! mg-store: the durable store abstraction for jobs, executions, splits,
//! and catalog reference data (spec.md §3, §4.1).

pub mod backend;
pub mod entities;
pub mod error;
pub mod filter;
pub mod memory;

pub use backend::{CatalogStore, ExecutionStore, JobStore, SplitStore, StoreBackend};
pub use entities::{
    Account, GenerateType, HumanInsertionMode, Job, JobExecution, JobSplit, Language, Orientation, StyleAdapter, Topic,
    TopicExtras, User, Voice,
};
pub use error::{StoreError, StoreResult};
pub use filter::{Filter, OrderBy, Page, Query, QueryPage, SortDirection};
pub use memory::InMemoryStore;
