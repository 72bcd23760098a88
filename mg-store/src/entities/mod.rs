pub mod catalog;
pub mod execution;
pub mod job;
pub mod split;

pub use catalog::{Account, GenerateType, HumanInsertionMode, Language, StyleAdapter, Topic, TopicExtras, User, Voice};
pub use execution::JobExecution;
pub use job::{Job, Orientation};
pub use split::JobSplit;
