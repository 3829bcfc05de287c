pub mod engine;
pub mod memory;
pub mod model;
pub mod repo;
pub mod store;

pub use engine::{EngineConfig, QueueEngine};
pub use memory::MemoryJobStore;
pub use model::{Job, JobId, JobStatus, NewJob, SortOrder, StatusCounts};
pub use repo::PgJobStore;
pub use store::JobStore;
