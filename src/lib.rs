//! OpSentry: Predictive Maintenance & Scheduling Engine
//!
//! Turns streams of equipment sensor readings into failure-risk predictions,
//! and turns those predictions into prioritized maintenance tasks assigned
//! to qualified, available personnel.
//!
//! ## Architecture
//!
//! Data flows one direction:
//! readings → analyses → predictions → tasks → assignments → schedules
//!
//! - **Sensor Analyzer**: per-reading deviation, trend, and anomaly scoring
//! - **Failure Predictor**: per-equipment probability, confidence, and risk,
//!   with a bounded reading history and a 1-hour result cache
//! - **Task Factory**: prediction → concrete work order with parts staging
//! - **Technician Assigner**: multi-factor scoring and workload-aware dates
//! - **Schedule Builder**: per-technician aggregates with efficiency metrics
//! - **Maintenance Scheduler**: the orchestrator owning session state and
//!   the task lifecycle
//!
//! The engine is synchronous, in-memory computation; a scheduling pass is a
//! strict sequential fold over prioritized predictions. Hosts embedding it
//! concurrently must wrap a pass in a single mutual-exclusion boundary.

pub mod analyzer;
pub mod assignment;
pub mod config;
pub mod error;
pub mod ingest;
pub mod predictor;
pub mod schedule;
pub mod scheduler;
pub mod tasks;
pub mod types;

// Re-export configuration
pub use config::{EngineConfig, PredictionConfig, SchedulingConfig};

// Re-export commonly used types
pub use types::{
    Equipment, HealthStatus, InventoryItem, MaintenanceSchedule, MaintenanceTask, NormalRange,
    PredictiveAnalysis, RiskLevel, SensorAnalysis, SensorKind, SensorReading, TaskPriority,
    TaskStatus, Technician, Trend,
};

// Re-export engine components
pub use assignment::{Assignment, AssignmentOutcome};
pub use error::EngineError;
pub use predictor::FailurePredictor;
pub use scheduler::{MaintenanceScheduler, RiskSummary, SchedulingReport};
pub use tasks::TaskFactory;
