pub mod admin;
pub mod api;
pub mod blob;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod logs;
pub mod telemetry;

pub use error::{QueueError, QueueResult};
