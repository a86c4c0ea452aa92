//! Task Factory - turns a failure prediction into a concrete work order
//!
//! Pure transformation over the prediction plus optional equipment and
//! inventory context. A missing equipment record or an empty inventory
//! snapshot reduces the task (no type tag, no staged parts) instead of
//! failing - scheduling keeps making progress with whatever context exists.

use crate::types::{
    Equipment, InventoryItem, MaintenanceTask, PredictiveAnalysis, RiskLevel, TaskStatus,
};
use chrono::Utc;
use tracing::debug;

/// Baseline job length in minutes
const BASE_DURATION_MINS: u32 = 120;

/// Parts to stage per equipment type. Filtered against the stock snapshot;
/// the factory never lists a part that is not actually available.
fn parts_for_type(equipment_type: &str) -> &'static [&'static str] {
    match equipment_type {
        "generator" => &["fuel filter", "oil filter", "air filter"],
        "ac_unit" => &["refrigerant", "air filter", "thermostat"],
        "pump" => &["seal kit", "bearings", "gaskets"],
        "compressor" => &["air filter", "oil", "belts"],
        _ => &[],
    }
}

/// Builds maintenance tasks with sequential ids.
pub struct TaskFactory {
    next_id: u64,
}

impl TaskFactory {
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Build a pending, unassigned task from a prediction.
    pub fn build(
        &mut self,
        analysis: &PredictiveAnalysis,
        equipment: Option<&Equipment>,
        inventory: &[InventoryItem],
    ) -> MaintenanceTask {
        let id = format!("MT-{:04}", self.next_id);
        self.next_id += 1;

        let description = build_description(analysis, equipment);
        let estimated_duration_mins = estimate_duration(analysis.risk_level, equipment);
        let required_parts = equipment
            .map(|eq| available_parts(&eq.equipment_type, inventory))
            .unwrap_or_default();

        debug!(
            task_id = %id,
            equipment_id = %analysis.equipment_id,
            priority = %analysis.risk_level,
            duration_mins = estimated_duration_mins,
            parts = required_parts.len(),
            "Built maintenance task"
        );

        let now = Utc::now();
        MaintenanceTask {
            id,
            equipment_id: analysis.equipment_id.clone(),
            equipment_name: analysis.equipment_name.clone(),
            description,
            priority: analysis.risk_level.into(),
            status: TaskStatus::Pending,
            assigned_to: None,
            estimated_duration_mins,
            actual_duration_mins: None,
            scheduled_date: None,
            completed_date: None,
            predicted_failure_in_days: analysis.predicted_failure_in_days,
            required_parts,
            notes: analysis.recommended_action.clone(),
            created_at: now,
            updated_at: now,
            synced: false,
        }
    }
}

impl Default for TaskFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// "Predictive maintenance for <name> (<type>): <first clause of action>"
fn build_description(analysis: &PredictiveAnalysis, equipment: Option<&Equipment>) -> String {
    let mut description = format!("Predictive maintenance for {}", analysis.equipment_name);
    if let Some(eq) = equipment {
        description.push_str(&format!(" ({})", eq.equipment_type));
    }
    let first_clause = analysis
        .recommended_action
        .split('.')
        .next()
        .unwrap_or("")
        .trim();
    if !first_clause.is_empty() {
        description.push_str(": ");
        description.push_str(first_clause);
    }
    description
}

/// Duration estimate in minutes: base 120, raised for risk, padded for
/// equipment criticality.
fn estimate_duration(risk: RiskLevel, equipment: Option<&Equipment>) -> u32 {
    let mut duration = match risk {
        RiskLevel::Critical => 240,
        RiskLevel::High => 180,
        _ => BASE_DURATION_MINS,
    };
    if let Some(eq) = equipment {
        duration += match eq.criticality {
            RiskLevel::Critical => 60,
            RiskLevel::High => 30,
            _ => 0,
        };
    }
    duration
}

/// Type-specific parts list filtered to those in stock with quantity > 0.
fn available_parts(equipment_type: &str, inventory: &[InventoryItem]) -> Vec<String> {
    parts_for_type(equipment_type)
        .iter()
        .filter(|part| {
            inventory
                .iter()
                .any(|item| item.quantity > 0 && item.name.eq_ignore_ascii_case(part))
        })
        .map(|part| part.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HealthStatus, TaskPriority};
    use chrono::Utc;

    fn analysis(risk: RiskLevel) -> PredictiveAnalysis {
        let now = Utc::now();
        PredictiveAnalysis {
            equipment_id: "eq-1".to_string(),
            equipment_name: "Generator A".to_string(),
            status: HealthStatus::Warning,
            failure_probability: 0.5,
            predicted_failure_in_days: 10.0,
            confidence: 0.6,
            recommended_action: "Schedule maintenance within 7 days. Watch: temperature".to_string(),
            risk_level: risk,
            contributing_factors: vec![],
            last_analysis: now,
            next_analysis: now,
        }
    }

    fn equipment(equipment_type: &str, criticality: RiskLevel) -> Equipment {
        Equipment {
            id: "eq-1".to_string(),
            name: "Generator A".to_string(),
            equipment_type: equipment_type.to_string(),
            location: String::new(),
            status: HealthStatus::Normal,
            last_maintenance: None,
            next_maintenance: None,
            runtime_hours: 0.0,
            criticality,
            department: String::new(),
        }
    }

    fn stock(names: &[&str]) -> Vec<InventoryItem> {
        names
            .iter()
            .map(|n| InventoryItem {
                name: n.to_string(),
                quantity: 3,
            })
            .collect()
    }

    #[test]
    fn test_task_starts_pending_and_unassigned() {
        let mut factory = TaskFactory::new();
        let task = factory.build(&analysis(RiskLevel::Medium), None, &[]);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.assigned_to, None);
        assert!(!task.synced);
    }

    #[test]
    fn test_sequential_ids() {
        let mut factory = TaskFactory::new();
        let a = factory.build(&analysis(RiskLevel::Low), None, &[]);
        let b = factory.build(&analysis(RiskLevel::Low), None, &[]);
        assert_eq!(a.id, "MT-0001");
        assert_eq!(b.id, "MT-0002");
    }

    #[test]
    fn test_description_includes_type_and_action_clause() {
        let mut factory = TaskFactory::new();
        let eq = equipment("generator", RiskLevel::Low);
        let task = factory.build(&analysis(RiskLevel::High), Some(&eq), &[]);
        assert_eq!(
            task.description,
            "Predictive maintenance for Generator A (generator): Schedule maintenance within 7 days"
        );
    }

    #[test]
    fn test_description_without_equipment_omits_type() {
        let mut factory = TaskFactory::new();
        let task = factory.build(&analysis(RiskLevel::High), None, &[]);
        assert!(!task.description.contains('('));
        assert!(task.description.starts_with("Predictive maintenance for Generator A"));
    }

    #[test]
    fn test_priority_maps_from_risk() {
        let mut factory = TaskFactory::new();
        let task = factory.build(&analysis(RiskLevel::Critical), None, &[]);
        assert_eq!(task.priority, TaskPriority::Critical);
    }

    #[test]
    fn test_duration_by_risk() {
        let mut factory = TaskFactory::new();
        assert_eq!(
            factory.build(&analysis(RiskLevel::Low), None, &[]).estimated_duration_mins,
            120
        );
        assert_eq!(
            factory.build(&analysis(RiskLevel::Medium), None, &[]).estimated_duration_mins,
            120
        );
        assert_eq!(
            factory.build(&analysis(RiskLevel::High), None, &[]).estimated_duration_mins,
            180
        );
        assert_eq!(
            factory.build(&analysis(RiskLevel::Critical), None, &[]).estimated_duration_mins,
            240
        );
    }

    #[test]
    fn test_duration_padded_for_equipment_criticality() {
        let mut factory = TaskFactory::new();
        let critical_eq = equipment("pump", RiskLevel::Critical);
        let high_eq = equipment("pump", RiskLevel::High);
        assert_eq!(
            factory
                .build(&analysis(RiskLevel::Critical), Some(&critical_eq), &[])
                .estimated_duration_mins,
            300
        );
        assert_eq!(
            factory
                .build(&analysis(RiskLevel::Low), Some(&high_eq), &[])
                .estimated_duration_mins,
            150
        );
    }

    #[test]
    fn test_parts_filtered_by_stock() {
        let mut factory = TaskFactory::new();
        let eq = equipment("generator", RiskLevel::Low);
        let inventory = stock(&["oil filter", "air filter", "belts"]);
        let task = factory.build(&analysis(RiskLevel::High), Some(&eq), &inventory);
        assert_eq!(task.required_parts, vec!["oil filter", "air filter"]);
    }

    #[test]
    fn test_zero_quantity_stock_is_unavailable() {
        let mut factory = TaskFactory::new();
        let eq = equipment("pump", RiskLevel::Low);
        let inventory = vec![
            InventoryItem { name: "seal kit".to_string(), quantity: 0 },
            InventoryItem { name: "bearings".to_string(), quantity: 1 },
        ];
        let task = factory.build(&analysis(RiskLevel::High), Some(&eq), &inventory);
        assert_eq!(task.required_parts, vec!["bearings"]);
    }

    #[test]
    fn test_no_stock_yields_empty_parts() {
        let mut factory = TaskFactory::new();
        let eq = equipment("compressor", RiskLevel::Low);
        let task = factory.build(&analysis(RiskLevel::High), Some(&eq), &[]);
        assert!(task.required_parts.is_empty());
    }

    #[test]
    fn test_unknown_type_has_no_parts_table() {
        let mut factory = TaskFactory::new();
        let eq = equipment("chiller", RiskLevel::Low);
        let inventory = stock(&["air filter"]);
        let task = factory.build(&analysis(RiskLevel::High), Some(&eq), &inventory);
        assert!(task.required_parts.is_empty());
    }
}
