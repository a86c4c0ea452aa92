//! Typed errors for orchestrator lifecycle operations
//!
//! Nothing in this engine is fatal to the process: data insufficiency
//! degrades to low-confidence defaults, assignment conflicts are collected
//! per task, and only lifecycle misuse (unknown ids, invalid transitions)
//! surfaces as a typed `Err` to the caller.

use crate::types::TaskStatus;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("technician not found: {0}")]
    TechnicianNotFound(String),

    #[error("invalid transition for task {task_id}: {from} -> {to}")]
    InvalidTransition {
        task_id: String,
        from: TaskStatus,
        to: TaskStatus,
    },
}
