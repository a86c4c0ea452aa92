//! Technician Assigner - multi-factor scoring and task assignment
//!
//! Scores every eligible technician against a task and picks the best fit.
//! An empty pool or a zero best score is an expected outcome surfaced as
//! `AssignmentOutcome::Unassigned` with a conflict reason, never an error.
//!
//! Assignment returns explicit value updates (the scheduled task and the
//! technician with the new workload); the orchestrator writes them back.
//! Nothing here mutates shared state in place, so callers never hold stale
//! aliases of a technician mid-pass.

use crate::config::SchedulingConfig;
use crate::types::{MaintenanceTask, TaskPriority, TaskStatus, Technician};
use chrono::{Duration, Utc};
use tracing::debug;

/// Base score for an available candidate
const AVAILABILITY_SCORE: f64 = 40.0;

/// Maximum workload-penalty credit; shrinks by 0.3 per workload point
const WORKLOAD_CREDIT: f64 = 30.0;
const WORKLOAD_PENALTY_RATE: f64 = 0.3;

/// Bonus for a skill matching the equipment type
const SKILL_BONUS: f64 = 20.0;

/// Bonus for critical-priority tasks
const CRITICAL_PRIORITY_BONUS: f64 = 10.0;

/// Workload percentage points per extra day of scheduling delay
const WORKLOAD_PER_DELAY_DAY: f64 = 20.0;

/// A successful assignment: the scheduled task plus the technician's
/// updated record, to be written back by the caller.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub task: MaintenanceTask,
    pub technician: Technician,
    pub score: f64,
}

/// Outcome of one assignment attempt.
#[derive(Debug, Clone)]
pub enum AssignmentOutcome {
    Assigned(Box<Assignment>),
    /// No suitable technician; the task stays pending and the reason is
    /// reported as a scheduling conflict
    Unassigned {
        task: MaintenanceTask,
        reason: String,
    },
}

/// Bidirectional case-insensitive substring match between a skill tag and
/// an equipment type.
///
/// Deliberately loose (skill "ac" matches type "pump_ac_unit"); the looseness
/// is part of the scoring contract, not an oversight.
pub fn skill_matches(skill: &str, equipment_type: &str) -> bool {
    let skill = skill.to_lowercase();
    let equipment_type = equipment_type.to_lowercase();
    if skill.is_empty() || equipment_type.is_empty() {
        return false;
    }
    skill.contains(&equipment_type) || equipment_type.contains(&skill)
}

/// Score one candidate against a task:
/// - +40 if available
/// - +max(0, 30 − workload × 0.3) workload credit
/// - +20 if any skill tag matches the equipment type
/// - +10 if the task is critical priority
pub fn score_technician(tech: &Technician, task: &MaintenanceTask, equipment_type: &str) -> f64 {
    let mut score = 0.0;
    if tech.is_available {
        score += AVAILABILITY_SCORE;
    }
    score += (WORKLOAD_CREDIT - tech.current_workload * WORKLOAD_PENALTY_RATE).max(0.0);
    if tech.skills.iter().any(|s| skill_matches(s, equipment_type)) {
        score += SKILL_BONUS;
    }
    if task.priority == TaskPriority::Critical {
        score += CRITICAL_PRIORITY_BONUS;
    }
    score
}

/// Attempt to assign a task to the best-scoring eligible technician.
///
/// Eligibility: `is_available` and workload below the configured cutoff.
/// The scheduled date is pushed out by current workload (one day per 20
/// points, rounded up) but never sooner than the priority floor
/// (critical 0, high 1, otherwise 2 days).
pub fn assign(
    mut task: MaintenanceTask,
    equipment_type: &str,
    pool: &[Technician],
    config: &SchedulingConfig,
) -> AssignmentOutcome {
    let mut best: Option<(&Technician, f64)> = None;
    for tech in pool
        .iter()
        .filter(|t| t.is_available && t.current_workload < config.availability_cutoff)
    {
        let score = score_technician(tech, &task, equipment_type);
        debug!(
            task_id = %task.id,
            technician = %tech.name,
            workload = tech.current_workload,
            score = score,
            "Scored assignment candidate"
        );
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((tech, score)),
        }
    }

    let (winner, score) = match best {
        Some((tech, score)) if score > 0.0 => (tech, score),
        _ => {
            let reason = format!(
                "No available technician for {} ({} priority)",
                task.equipment_name, task.priority
            );
            debug!(task_id = %task.id, "Assignment failed: {}", reason);
            return AssignmentOutcome::Unassigned { task, reason };
        }
    };

    let now = Utc::now();
    let workload_delay = (winner.current_workload / WORKLOAD_PER_DELAY_DAY).ceil() as i64;
    let priority_floor = match task.priority {
        TaskPriority::Critical => 0,
        TaskPriority::High => 1,
        _ => 2,
    };
    let delay_days = workload_delay.max(priority_floor);

    task.assigned_to = Some(winner.name.clone());
    task.status = TaskStatus::Scheduled;
    task.scheduled_date = Some(now + Duration::days(delay_days));
    task.updated_at = now;

    let mut technician = winner.clone();
    technician.current_workload +=
        f64::from(task.estimated_duration_mins) / f64::from(config.workday_minutes) * 100.0;
    if technician.current_workload > config.availability_cutoff {
        technician.is_available = false;
    }
    technician.last_active = now;

    debug!(
        task_id = %task.id,
        technician = %technician.name,
        score = score,
        delay_days = delay_days,
        new_workload = technician.current_workload,
        "Assigned task"
    );

    AssignmentOutcome::Assigned(Box::new(Assignment {
        task,
        technician,
        score,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(priority: TaskPriority, duration_mins: u32) -> MaintenanceTask {
        let now = Utc::now();
        MaintenanceTask {
            id: "MT-0001".to_string(),
            equipment_id: "eq-1".to_string(),
            equipment_name: "Pump 1".to_string(),
            description: "Predictive maintenance for Pump 1".to_string(),
            priority,
            status: TaskStatus::Pending,
            assigned_to: None,
            estimated_duration_mins: duration_mins,
            actual_duration_mins: None,
            scheduled_date: None,
            completed_date: None,
            predicted_failure_in_days: 10.0,
            required_parts: vec![],
            notes: String::new(),
            created_at: now,
            updated_at: now,
            synced: false,
        }
    }

    fn technician(name: &str, skills: &[&str], workload: f64) -> Technician {
        Technician {
            id: format!("tech-{name}"),
            name: name.to_string(),
            email: String::new(),
            phone: String::new(),
            department: "Maintenance".to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            current_workload: workload,
            is_available: true,
            location: String::new(),
            last_active: Utc::now(),
        }
    }

    #[test]
    fn test_skill_match_bidirectional_case_insensitive() {
        assert!(skill_matches("Pump", "pump"));
        assert!(skill_matches("pump repair", "pump"));
        assert!(skill_matches("ac", "pump_ac_unit"));
        assert!(!skill_matches("electrical", "pump"));
        assert!(!skill_matches("", "pump"));
    }

    #[test]
    fn test_score_terms() {
        let t = task(TaskPriority::Critical, 120);
        let tech = technician("Ana", &["pump"], 40.0);
        // 40 available + (30 - 12) workload + 20 skill + 10 critical
        assert_eq!(score_technician(&tech, &t, "pump"), 88.0);
    }

    #[test]
    fn test_workload_penalty_floored_at_zero() {
        let t = task(TaskPriority::Low, 120);
        let mut tech = technician("Ana", &[], 150.0);
        tech.is_available = true;
        // Credit term cannot go negative: 40 + 0
        assert_eq!(score_technician(&tech, &t, "pump"), 40.0);
    }

    #[test]
    fn test_skill_outweighs_lower_workload() {
        // Skilled with workload 40: 40 + 18 + 20 = 78
        // Unskilled with workload 0: 40 + 30 = 70
        let t = task(TaskPriority::High, 120);
        let skilled = technician("Ana", &["pump"], 40.0);
        let idle = technician("Ben", &[], 0.0);
        let outcome = assign(t, "pump", &[idle, skilled], &SchedulingConfig::default());
        match outcome {
            AssignmentOutcome::Assigned(a) => assert_eq!(a.technician.name, "Ana"),
            AssignmentOutcome::Unassigned { reason, .. } => panic!("unexpected conflict: {reason}"),
        }
    }

    #[test]
    fn test_empty_pool_is_a_conflict_not_an_error() {
        let t = task(TaskPriority::High, 120);
        let outcome = assign(t, "pump", &[], &SchedulingConfig::default());
        match outcome {
            AssignmentOutcome::Unassigned { task, reason } => {
                assert_eq!(task.status, TaskStatus::Pending);
                assert_eq!(task.assigned_to, None);
                assert!(reason.contains("Pump 1"));
            }
            AssignmentOutcome::Assigned(_) => panic!("expected conflict"),
        }
    }

    #[test]
    fn test_overloaded_and_unavailable_excluded() {
        let t = task(TaskPriority::High, 120);
        let mut off_shift = technician("Ana", &["pump"], 10.0);
        off_shift.is_available = false;
        let overloaded = technician("Ben", &["pump"], 85.0);
        let outcome = assign(t, "pump", &[off_shift, overloaded], &SchedulingConfig::default());
        assert!(matches!(outcome, AssignmentOutcome::Unassigned { .. }));
    }

    #[test]
    fn test_assignment_updates_task_and_technician() {
        let t = task(TaskPriority::High, 240);
        let tech = technician("Ana", &["pump"], 10.0);
        let outcome = assign(t, "pump", &[tech], &SchedulingConfig::default());
        let a = match outcome {
            AssignmentOutcome::Assigned(a) => a,
            AssignmentOutcome::Unassigned { reason, .. } => panic!("unexpected conflict: {reason}"),
        };
        assert_eq!(a.task.status, TaskStatus::Scheduled);
        assert_eq!(a.task.assigned_to.as_deref(), Some("Ana"));
        assert!(a.task.scheduled_date.is_some());
        // 240 / 480 * 100 = 50 points on top of 10
        assert!((a.technician.current_workload - 60.0).abs() < 1e-9);
        assert!(a.technician.is_available);
    }

    #[test]
    fn test_workload_past_cutoff_disables_availability() {
        let t = task(TaskPriority::High, 480);
        let tech = technician("Ana", &["pump"], 30.0);
        let outcome = assign(t, "pump", &[tech], &SchedulingConfig::default());
        let a = match outcome {
            AssignmentOutcome::Assigned(a) => a,
            AssignmentOutcome::Unassigned { reason, .. } => panic!("unexpected conflict: {reason}"),
        };
        // 30 + 100 = 130 > 80
        assert!(!a.technician.is_available);
    }

    #[test]
    fn test_scheduled_date_respects_priority_floor() {
        let now = Utc::now();
        let idle = technician("Ana", &["pump"], 0.0);

        let critical = assign(
            task(TaskPriority::Critical, 60),
            "pump",
            std::slice::from_ref(&idle),
            &SchedulingConfig::default(),
        );
        let a = match critical {
            AssignmentOutcome::Assigned(a) => a,
            _ => panic!("expected assignment"),
        };
        let days = (a.task.scheduled_date.unwrap() - now).num_hours();
        assert!(days < 24, "critical tasks schedule same-day with an idle tech");

        let medium = assign(
            task(TaskPriority::Medium, 60),
            "pump",
            std::slice::from_ref(&idle),
            &SchedulingConfig::default(),
        );
        let a = match medium {
            AssignmentOutcome::Assigned(a) => a,
            _ => panic!("expected assignment"),
        };
        let hours = (a.task.scheduled_date.unwrap() - now).num_hours();
        assert!(hours >= 47, "medium tasks wait at least 2 days");
    }

    #[test]
    fn test_scheduled_date_pushed_by_workload() {
        let now = Utc::now();
        let busy = technician("Ana", &["pump"], 65.0);
        let outcome = assign(
            task(TaskPriority::Critical, 60),
            "pump",
            &[busy],
            &SchedulingConfig::default(),
        );
        let a = match outcome {
            AssignmentOutcome::Assigned(a) => a,
            _ => panic!("expected assignment"),
        };
        // ceil(65 / 20) = 4 days despite the critical floor of 0
        let hours = (a.task.scheduled_date.unwrap() - now).num_hours();
        assert!(hours >= 95, "got {hours} hours");
    }
}
