//! Maintenance Scheduler - orchestrates predictions into assigned work
//!
//! The single owner of mutable scheduling state: the canonical task list,
//! technician roster, equipment list, and schedule list for a session. All
//! other components are pure transformations; this module drives them in
//! order and writes their value updates back.
//!
//! A scheduling pass is a strict sequential fold - each assignment raises
//! the chosen technician's workload, which the next assignment's scoring
//! depends on, so items are never processed out of priority order.

use crate::assignment::{self, AssignmentOutcome};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::predictor::FailurePredictor;
use crate::schedule;
use crate::tasks::TaskFactory;
use crate::types::{
    Equipment, HealthStatus, InventoryItem, MaintenanceSchedule, MaintenanceTask,
    PredictiveAnalysis, RiskLevel, SensorAnalysis, SensorReading, TaskStatus, Technician,
};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{info, warn};

/// Outcome of one scheduling pass.
#[derive(Debug, Clone, Default)]
pub struct SchedulingReport {
    /// Tasks successfully assigned and scheduled, in processing order
    pub scheduled_tasks: Vec<MaintenanceTask>,
    /// Tasks that could not be assigned; they remain pending
    pub unscheduled_tasks: Vec<MaintenanceTask>,
    /// One human-readable conflict message per unscheduled task
    pub conflicts: Vec<String>,
    /// Per-technician schedules rebuilt from the full assignment map
    pub schedules: Vec<MaintenanceSchedule>,
}

/// Per-risk-level counts over a set of predictions; the dashboard-facing
/// aggregate the surrounding application reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiskSummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Count predictions per risk level.
pub fn risk_summary(predictions: &[PredictiveAnalysis]) -> RiskSummary {
    let mut summary = RiskSummary::default();
    for p in predictions {
        match p.risk_level {
            RiskLevel::Critical => summary.critical += 1,
            RiskLevel::High => summary.high += 1,
            RiskLevel::Medium => summary.medium += 1,
            RiskLevel::Low => summary.low += 1,
        }
    }
    summary
}

/// Order predictions for scheduling: non-normal only, critical risk first,
/// then ascending predicted days, then descending confidence. Each
/// tiebreaker applies only when the previous key is equal.
pub fn prioritize(predictions: &[PredictiveAnalysis]) -> Vec<PredictiveAnalysis> {
    let mut pending: Vec<PredictiveAnalysis> = predictions
        .iter()
        .filter(|p| p.status != HealthStatus::Normal)
        .cloned()
        .collect();
    pending.sort_by(|a, b| {
        let a_critical = a.risk_level == RiskLevel::Critical;
        let b_critical = b.risk_level == RiskLevel::Critical;
        b_critical
            .cmp(&a_critical)
            .then_with(|| {
                a.predicted_failure_in_days
                    .partial_cmp(&b.predicted_failure_in_days)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| {
                b.confidence
                    .partial_cmp(&a.confidence)
                    .unwrap_or(Ordering::Equal)
            })
    });
    pending
}

/// Orchestrator for a scheduling session.
pub struct MaintenanceScheduler {
    config: EngineConfig,
    predictor: FailurePredictor,
    factory: TaskFactory,
    tasks: Vec<MaintenanceTask>,
    technicians: Vec<Technician>,
    equipment: Vec<Equipment>,
    schedules: Vec<MaintenanceSchedule>,
}

impl MaintenanceScheduler {
    pub fn new(config: EngineConfig) -> Self {
        let predictor = FailurePredictor::new(config.prediction.clone());
        Self {
            config,
            predictor,
            factory: TaskFactory::new(),
            tasks: Vec::new(),
            technicians: Vec::new(),
            equipment: Vec::new(),
            schedules: Vec::new(),
        }
    }

    /// Replace the technician roster (snapshot from the directory
    /// collaborator).
    pub fn set_technicians(&mut self, technicians: Vec<Technician>) {
        self.technicians = technicians;
    }

    /// Replace the equipment list (snapshot from the directory
    /// collaborator).
    pub fn set_equipment(&mut self, equipment: Vec<Equipment>) {
        self.equipment = equipment;
    }

    pub fn tasks(&self) -> &[MaintenanceTask] {
        &self.tasks
    }

    pub fn technicians(&self) -> &[Technician] {
        &self.technicians
    }

    pub fn schedules(&self) -> &[MaintenanceSchedule] {
        &self.schedules
    }

    /// Feed one sensor reading into the predictor's history.
    pub fn record_reading(&mut self, reading: SensorReading) -> SensorAnalysis {
        self.predictor.record_reading(reading)
    }

    /// Predict failure for every known equipment unit.
    pub fn predict_all(&mut self) -> Vec<PredictiveAnalysis> {
        let mut predictions = Vec::with_capacity(self.equipment.len());
        for eq in &self.equipment {
            predictions.push(
                self.predictor
                    .predict_failure(&eq.id, &eq.name, &eq.equipment_type),
            );
        }
        predictions
    }

    /// Drop cached predictions (histories are kept).
    pub fn clear_prediction_cache(&mut self) {
        self.predictor.clear_cache();
    }

    /// Run one scheduling pass over the given predictions.
    ///
    /// Predictions are prioritized, then folded in order: build task →
    /// attempt assignment, writing each updated technician back before the
    /// next attempt. Failures are collected as conflicts; the pass always
    /// completes. All schedules are rebuilt at the end from the full
    /// assignment map.
    pub fn schedule_maintenance(
        &mut self,
        predictions: &[PredictiveAnalysis],
        inventory: &[InventoryItem],
    ) -> SchedulingReport {
        let prioritized = prioritize(predictions);
        let mut report = SchedulingReport::default();
        let mut assignments: HashMap<String, Vec<MaintenanceTask>> = HashMap::new();

        for prediction in &prioritized {
            let equipment = self
                .equipment
                .iter()
                .find(|eq| eq.id == prediction.equipment_id);
            let equipment_type = equipment.map(|eq| eq.equipment_type.as_str()).unwrap_or("");

            let task = self.factory.build(prediction, equipment, inventory);
            match assignment::assign(
                task,
                equipment_type,
                &self.technicians,
                &self.config.scheduling,
            ) {
                AssignmentOutcome::Assigned(assigned) => {
                    let assignment::Assignment {
                        task, technician, ..
                    } = *assigned;
                    let technician_id = technician.id.clone();
                    self.write_back_technician(technician);
                    assignments
                        .entry(technician_id)
                        .or_default()
                        .push(task.clone());
                    self.tasks.push(task.clone());
                    report.scheduled_tasks.push(task);
                }
                AssignmentOutcome::Unassigned { task, reason } => {
                    warn!(task_id = %task.id, "Scheduling conflict: {}", reason);
                    self.tasks.push(task.clone());
                    report.conflicts.push(reason);
                    report.unscheduled_tasks.push(task);
                }
            }
        }

        let equipment_types: HashMap<String, String> = self
            .equipment
            .iter()
            .map(|eq| (eq.id.clone(), eq.equipment_type.clone()))
            .collect();
        self.schedules =
            schedule::build_schedules(&assignments, &self.technicians, &equipment_types);
        report.schedules = self.schedules.clone();

        info!(
            scheduled = report.scheduled_tasks.len(),
            unscheduled = report.unscheduled_tasks.len(),
            conflicts = report.conflicts.len(),
            schedules = report.schedules.len(),
            "Completed scheduling pass"
        );
        report
    }

    /// Move a scheduled task to in-progress.
    pub fn start_task(&mut self, task_id: &str) -> Result<(), EngineError> {
        self.transition(task_id, TaskStatus::InProgress)?;
        Ok(())
    }

    /// Complete a task, recording the actual duration if given and
    /// releasing the assigned technician's workload.
    ///
    /// Valid only from scheduled or in-progress; anything else is an
    /// `InvalidTransition` with no partial mutation. The workload
    /// decrement is floored at 0 and re-enables availability once the
    /// technician drops back to the cutoff or below.
    pub fn complete_task(
        &mut self,
        task_id: &str,
        actual_duration_mins: Option<u32>,
    ) -> Result<(), EngineError> {
        let index = self.transition(task_id, TaskStatus::Completed)?;
        let now = Utc::now();

        let task = &mut self.tasks[index];
        task.completed_date = Some(now);
        task.actual_duration_mins = actual_duration_mins;
        let released_mins = actual_duration_mins.unwrap_or(task.estimated_duration_mins);
        let assigned_to = task.assigned_to.clone();
        let task_id = task.id.clone();

        let Some(name) = assigned_to else {
            warn!(task_id = %task_id, "Completed task had no assigned technician");
            return Ok(());
        };
        let Some(tech) = self.technicians.iter_mut().find(|t| t.name == name) else {
            warn!(task_id = %task_id, technician = %name, "Assigned technician not in roster");
            return Ok(());
        };

        let released =
            f64::from(released_mins) / f64::from(self.config.scheduling.workday_minutes) * 100.0;
        tech.current_workload = (tech.current_workload - released).max(0.0);
        if tech.current_workload <= self.config.scheduling.availability_cutoff {
            tech.is_available = true;
        }
        info!(
            task_id = %task_id,
            technician = %name,
            released_workload = released,
            new_workload = tech.current_workload,
            "Completed task"
        );
        Ok(())
    }

    /// Move a scheduled task to a new date. Valid only while scheduled.
    pub fn reschedule_task(
        &mut self,
        task_id: &str,
        new_date: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let index = self.find_task(task_id)?;
        let task = &self.tasks[index];
        if task.status != TaskStatus::Scheduled {
            return Err(EngineError::InvalidTransition {
                task_id: task_id.to_string(),
                from: task.status,
                to: TaskStatus::Scheduled,
            });
        }
        let task = &mut self.tasks[index];
        task.scheduled_date = Some(new_date);
        task.updated_at = Utc::now();
        info!(task_id = %task_id, new_date = %new_date, "Rescheduled task");
        Ok(())
    }

    /// Cancel a task from any non-terminal state.
    ///
    /// Cancellation does not release technician workload; only completion
    /// does.
    pub fn cancel_task(&mut self, task_id: &str) -> Result<(), EngineError> {
        self.transition(task_id, TaskStatus::Cancelled)?;
        info!(task_id = %task_id, "Cancelled task");
        Ok(())
    }

    /// Validate and apply a status transition; returns the task index.
    fn transition(&mut self, task_id: &str, next: TaskStatus) -> Result<usize, EngineError> {
        let index = self.find_task(task_id)?;
        let task = &self.tasks[index];
        if !task.status.can_transition_to(next) {
            return Err(EngineError::InvalidTransition {
                task_id: task_id.to_string(),
                from: task.status,
                to: next,
            });
        }
        let task = &mut self.tasks[index];
        task.status = next;
        task.updated_at = Utc::now();
        Ok(index)
    }

    fn find_task(&self, task_id: &str) -> Result<usize, EngineError> {
        self.tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| EngineError::TaskNotFound(task_id.to_string()))
    }

    fn write_back_technician(&mut self, updated: Technician) {
        if let Some(slot) = self.technicians.iter_mut().find(|t| t.id == updated.id) {
            *slot = updated;
        } else {
            warn!(technician_id = %updated.id, "Assigned technician missing from roster");
        }
    }
}
