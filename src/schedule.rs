//! Schedule Builder - per-technician schedule aggregates
//!
//! Rebuilt from scratch on every scheduling pass from the full assignment
//! map; never incrementally updated. Technicians with no assigned tasks
//! produce no schedule record.

use crate::assignment::skill_matches;
use crate::types::{MaintenanceSchedule, MaintenanceTask, Technician};
use std::collections::HashMap;

/// Workload factor floor: a fully loaded technician still counts at 50%
const WORKLOAD_FACTOR_FLOOR: f64 = 0.5;

/// Build one schedule per technician holding at least one assigned task.
///
/// `assignments` maps technician id → tasks in assignment order;
/// `equipment_types` maps equipment id → type tag for skill matching.
/// Efficiency = skill-match ratio × workload factor × 100, where the
/// workload factor is max(0.5, 1 − workload/200).
pub fn build_schedules(
    assignments: &HashMap<String, Vec<MaintenanceTask>>,
    technicians: &[Technician],
    equipment_types: &HashMap<String, String>,
) -> Vec<MaintenanceSchedule> {
    let mut schedules = Vec::new();

    for tech in technicians {
        let Some(tasks) = assignments.get(&tech.id) else {
            continue;
        };
        if tasks.is_empty() {
            continue;
        }

        let total_hours: f64 = tasks
            .iter()
            .map(|t| f64::from(t.estimated_duration_mins) / 60.0)
            .sum();

        let matching = tasks
            .iter()
            .filter(|t| {
                equipment_types
                    .get(&t.equipment_id)
                    .is_some_and(|eq_type| tech.skills.iter().any(|s| skill_matches(s, eq_type)))
            })
            .count();
        let skill_match_ratio = matching as f64 / tasks.len() as f64;
        let workload_factor = (1.0 - tech.current_workload / 200.0).max(WORKLOAD_FACTOR_FLOOR);
        let efficiency = skill_match_ratio * workload_factor * 100.0;

        schedules.push(MaintenanceSchedule {
            technician_id: tech.id.clone(),
            technician_name: tech.name.clone(),
            tasks: tasks.clone(),
            total_hours,
            efficiency,
        });
    }

    tracing::debug!(count = schedules.len(), "Rebuilt maintenance schedules");
    schedules
}
