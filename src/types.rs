//! Shared data structures for the predictive maintenance engine
//!
//! This module defines the core types along the engine's data flow:
//! - Stage 1: SensorReading (raw telemetry from the device layer)
//! - Stage 2: SensorAnalysis (per-reading anomaly assessment)
//! - Stage 3: PredictiveAnalysis (per-equipment failure prediction)
//! - Stage 4: MaintenanceTask (unit of work derived from a prediction)
//! - Stage 5: Technician assignment and MaintenanceSchedule aggregates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Stage 1: Sensor Telemetry
// ============================================================================

/// Kind of measurement a sensor reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Temperature,
    Vibration,
    Voltage,
    Pressure,
    Current,
    Humidity,
    /// Cumulative runtime hours; feeds the wear factor in failure prediction
    Runtime,
}

impl SensorKind {
    /// Parse from string (for CSV ingestion and collaborator payloads)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "temperature" | "temp" => Some(SensorKind::Temperature),
            "vibration" => Some(SensorKind::Vibration),
            "voltage" => Some(SensorKind::Voltage),
            "pressure" => Some(SensorKind::Pressure),
            "current" => Some(SensorKind::Current),
            "humidity" => Some(SensorKind::Humidity),
            "runtime" | "runtime_hours" => Some(SensorKind::Runtime),
            _ => None,
        }
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorKind::Temperature => write!(f, "temperature"),
            SensorKind::Vibration => write!(f, "vibration"),
            SensorKind::Voltage => write!(f, "voltage"),
            SensorKind::Pressure => write!(f, "pressure"),
            SensorKind::Current => write!(f, "current"),
            SensorKind::Humidity => write!(f, "humidity"),
            SensorKind::Runtime => write!(f, "runtime"),
        }
    }
}

/// Normal operating range [min, max] for a sensor channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NormalRange {
    pub min: f64,
    pub max: f64,
}

impl NormalRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Check whether a value sits inside the normal band (inclusive)
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Health status bucket shared by readings, analyses, and predictions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    #[default]
    Normal = 0,
    Warning = 1,
    Critical = 2,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Normal => write!(f, "NORMAL"),
            HealthStatus::Warning => write!(f, "WARNING"),
            HealthStatus::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// One timestamped sensor measurement from the device/stream layer
///
/// Immutable once created. The engine does not own readings past the point
/// of analysis, but the failure predictor retains a bounded most-recent-N
/// history per equipment unit for trend and probability computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    /// Equipment unit this reading belongs to
    pub equipment_id: String,
    /// Measurement kind
    pub kind: SensorKind,
    /// Measured value in `unit`
    pub value: f64,
    /// Unit string, e.g. "°F", "mm/s", "V", "psi", "h"
    pub unit: String,
    /// Normal operating band for this channel
    pub normal_range: NormalRange,
    /// Status tag supplied by the device layer
    #[serde(default)]
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
}

impl SensorReading {
    /// Check whether the value sits inside the normal band
    pub fn is_within_range(&self) -> bool {
        self.normal_range.contains(self.value)
    }
}

// ============================================================================
// Stage 2: Per-Reading Analysis
// ============================================================================

/// Direction of change over the most recent samples
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Increasing => write!(f, "increasing"),
            Trend::Decreasing => write!(f, "decreasing"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

/// Normalized anomaly assessment of a single reading
///
/// Ephemeral - recomputed on every new reading, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorAnalysis {
    pub equipment_id: String,
    pub kind: SensorKind,
    pub value: f64,
    pub normal_range: NormalRange,
    /// Fractional distance outside the normal range (0.0 when inside)
    pub deviation: f64,
    /// Direction of change over the last 3 stored readings
    pub trend: Trend,
    /// Normalized anomaly measure in [0, 1]
    pub anomaly_score: f64,
    pub status: HealthStatus,
    /// Free-text operator recommendations
    pub recommendations: Vec<String>,
}

// ============================================================================
// Stage 3: Failure Prediction
// ============================================================================

/// Qualitative risk bucket derived from failure probability and
/// predicted days to failure
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low = 0,
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Central prediction record - one per equipment unit
///
/// Cached by the failure predictor for up to 1 hour per equipment id.
/// Invariant: `risk_level` is a deterministic function of
/// (`failure_probability`, `predicted_failure_in_days`) and is never set
/// independently of those inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictiveAnalysis {
    pub equipment_id: String,
    pub equipment_name: String,
    /// Current health classification from recent readings
    pub status: HealthStatus,
    /// Blended failure probability in [0, 0.95]
    pub failure_probability: f64,
    /// Predicted days until failure, clamped to [1, 90]
    pub predicted_failure_in_days: f64,
    /// Prediction confidence in [0, 0.95]; grows with history length
    pub confidence: f64,
    /// Operator-facing recommended action
    pub recommended_action: String,
    pub risk_level: RiskLevel,
    /// Readings that triggered warning/critical classification,
    /// formatted as "<kind> reading: <value><unit>"
    pub contributing_factors: Vec<String>,
    pub last_analysis: DateTime<Utc>,
    /// Cache expiry - recomputation happens on demand after this instant
    pub next_analysis: DateTime<Utc>,
}

// ============================================================================
// Stage 4: Maintenance Tasks
// ============================================================================

/// Task urgency bucket, mapped 1:1 from the prediction's risk level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    #[default]
    Low = 0,
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl From<RiskLevel> for TaskPriority {
    fn from(risk: RiskLevel) -> Self {
        match risk {
            RiskLevel::Low => TaskPriority::Low,
            RiskLevel::Medium => TaskPriority::Medium,
            RiskLevel::High => TaskPriority::High,
            RiskLevel::Critical => TaskPriority::Critical,
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskPriority::Low => write!(f, "LOW"),
            TaskPriority::Medium => write!(f, "MEDIUM"),
            TaskPriority::High => write!(f, "HIGH"),
            TaskPriority::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Task lifecycle state
///
/// pending → scheduled → in-progress → completed, with cancelled reachable
/// from any non-terminal state. Pending and completed are never re-entered
/// once left.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    /// Whether the lifecycle permits moving from `self` to `next`
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Scheduled)
                | (Scheduled, InProgress)
                | (Scheduled, Completed)
                | (InProgress, Completed)
                | (Pending, Cancelled)
                | (Scheduled, Cancelled)
                | (InProgress, Cancelled)
        )
    }

    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Scheduled => write!(f, "scheduled"),
            TaskStatus::InProgress => write!(f, "in-progress"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A unit of maintenance work derived from a prediction
///
/// Created by the task factory, mutated by the assigner (assignment fields,
/// status → scheduled) and by the orchestrator's lifecycle operations.
/// Never deleted, only status-transitioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceTask {
    pub id: String,
    pub equipment_id: String,
    pub equipment_name: String,
    pub description: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    /// Name of the assigned technician; None until scheduled
    #[serde(default)]
    pub assigned_to: Option<String>,
    /// Estimated duration in minutes
    pub estimated_duration_mins: u32,
    /// Actual duration in minutes, recorded at completion
    #[serde(default)]
    pub actual_duration_mins: Option<u32>,
    #[serde(default)]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_date: Option<DateTime<Utc>>,
    /// Carried over from the source prediction for prioritization display
    pub predicted_failure_in_days: f64,
    /// Parts to stage for the job; only parts actually in stock are listed
    #[serde(default)]
    pub required_parts: Vec<String>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set by the external sync collaborator once persisted; this engine
    /// only ever creates tasks with `synced = false`
    #[serde(default)]
    pub synced: bool,
}

// ============================================================================
// Stage 5: Personnel & Scheduling
// ============================================================================

/// A maintenance technician from the directory collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technician {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub department: String,
    /// Free-text skill tags, e.g. "generator", "hvac", "electrical"
    pub skills: Vec<String>,
    /// Percentage of an 8-hour day already committed (0-100)
    pub current_workload: f64,
    pub is_available: bool,
    #[serde(default)]
    pub location: String,
    pub last_active: DateTime<Utc>,
}

/// Equipment record supplied by the directory collaborator; read-only input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    pub id: String,
    pub name: String,
    /// Equipment type tag, e.g. "generator", "ac_unit", "pump", "compressor"
    pub equipment_type: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub status: HealthStatus,
    #[serde(default)]
    pub last_maintenance: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_maintenance: Option<DateTime<Utc>>,
    #[serde(default)]
    pub runtime_hours: f64,
    /// How critical this unit is to operations; pads duration estimates
    #[serde(default)]
    pub criticality: RiskLevel,
    #[serde(default)]
    pub department: String,
}

/// One line of the stock collaborator's availability snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    pub quantity: u32,
}

/// Per-technician schedule aggregate
///
/// Fully recomputed by the schedule builder on every scheduling pass,
/// never incrementally updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceSchedule {
    pub technician_id: String,
    pub technician_name: String,
    /// Tasks assigned to this technician, in assignment order
    pub tasks: Vec<MaintenanceTask>,
    /// Total scheduled hours across all tasks
    pub total_hours: f64,
    /// Efficiency percentage: skill-match ratio x workload factor x 100
    pub efficiency: f64,
}
