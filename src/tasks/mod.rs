// src/tasks/mod.rs

pub mod store;
pub mod types;

pub use store::TaskStore;
pub use types::{Task, TaskBreakdown, TaskContext, TaskRequest, TaskStep};
