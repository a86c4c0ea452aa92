//! Failure Predictor - per-equipment failure probability and timeframe
//!
//! Aggregates stored sensor history into a `PredictiveAnalysis`: current
//! health classification, blended failure probability, confidence, predicted
//! days to failure, and a qualitative risk level.
//!
//! ## State ownership
//!
//! The predictor exclusively owns its per-equipment bounded reading history
//! and a time-bounded result cache, both keyed by equipment id. Callers
//! needing isolation construct a fresh instance; the only external mutation
//! hook is `clear_cache`.
//!
//! ## Degradation
//!
//! Prediction never fails. Sparse or missing telemetry degrades to
//! low-confidence defaults - predictive maintenance must not block on
//! missing data.

use crate::analyzer;
use crate::config::PredictionConfig;
use crate::types::{
    HealthStatus, PredictiveAnalysis, RiskLevel, SensorAnalysis, SensorKind, SensorReading,
};
use chrono::{Duration, Utc};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};

/// Readings examined for current-status classification
const STATUS_WINDOW: usize = 10;

/// Readings averaged for the failure-probability estimate
const PROBABILITY_WINDOW: usize = 20;

/// Below this many stored readings the predictor uses sparse-history defaults
const MIN_HISTORY_FOR_ESTIMATE: usize = 5;

/// History length at which confidence saturates (len / 50, capped)
const CONFIDENCE_SATURATION: f64 = 50.0;

/// Hard cap on probability and confidence
const PROBABILITY_CAP: f64 = 0.95;

/// Blend weights: anomaly average vs. runtime wear factor
const ANOMALY_WEIGHT: f64 = 0.7;
const RUNTIME_WEIGHT: f64 = 0.3;

/// Anomaly score above which a reading counts as critical
const CRITICAL_SCORE: f64 = 0.8;

/// Anomaly score above which a reading counts as a warning
const WARNING_SCORE: f64 = 0.5;

/// Sparse-history defaults: low probability, middling confidence
const SPARSE_ANOMALY_AVG: f64 = 0.1;
const SPARSE_CONFIDENCE: f64 = 0.5;

/// Qualitative risk bucket for a (probability, predicted-days) pair.
///
/// Rules are evaluated in order; the first match wins:
/// - probability > 0.8 or days ≤ 3 → critical
/// - probability > 0.6 or days ≤ 7 → high
/// - probability > 0.4 or days ≤ 14 → medium
/// - otherwise → low
pub fn risk_level(probability: f64, predicted_days: f64) -> RiskLevel {
    if probability > 0.8 || predicted_days <= 3.0 {
        RiskLevel::Critical
    } else if probability > 0.6 || predicted_days <= 7.0 {
        RiskLevel::High
    } else if probability > 0.4 || predicted_days <= 14.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Per-equipment failure prediction with bounded history and a result cache.
pub struct FailurePredictor {
    config: PredictionConfig,
    /// Most-recent-N readings per equipment unit, oldest first
    history: HashMap<String, VecDeque<SensorReading>>,
    /// Cached predictions, valid until their `next_analysis` instant
    cache: HashMap<String, PredictiveAnalysis>,
}

impl FailurePredictor {
    pub fn new(config: PredictionConfig) -> Self {
        Self {
            config,
            history: HashMap::new(),
            cache: HashMap::new(),
        }
    }

    /// Store a reading in the equipment's bounded history and analyze it.
    ///
    /// The oldest reading is discarded once the history cap is reached.
    pub fn record_reading(&mut self, reading: SensorReading) -> SensorAnalysis {
        let cap = self.config.history_cap;
        let buffer = self
            .history
            .entry(reading.equipment_id.clone())
            .or_default();
        if buffer.len() >= cap {
            buffer.pop_front();
        }
        buffer.push_back(reading);

        // Just pushed, so the buffer is non-empty
        let slice: &[SensorReading] = buffer.make_contiguous();
        let newest = &slice[slice.len() - 1];
        analyzer::analyze(newest, slice)
    }

    /// Number of stored readings for an equipment unit.
    pub fn history_len(&self, equipment_id: &str) -> usize {
        self.history.get(equipment_id).map_or(0, VecDeque::len)
    }

    /// Drop all cached predictions; the stored histories are kept.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Predict failure for one equipment unit.
    ///
    /// Returns the cached result unchanged while it is still fresh
    /// (idempotent within the cache window); otherwise recomputes from the
    /// stored history and re-caches.
    pub fn predict_failure(
        &mut self,
        equipment_id: &str,
        equipment_name: &str,
        equipment_type: &str,
    ) -> PredictiveAnalysis {
        let now = Utc::now();
        if let Some(cached) = self.cache.get(equipment_id) {
            if now < cached.next_analysis {
                debug!(equipment_id = %equipment_id, "Prediction cache hit");
                return cached.clone();
            }
        }

        let history: Vec<SensorReading> = self
            .history
            .get(equipment_id)
            .map(|buf| buf.iter().cloned().collect())
            .unwrap_or_default();

        let (status, contributing_factors) = classify_status(&history);
        let (avg_anomaly, confidence) = anomaly_estimate(&history);
        let runtime_factor = self.runtime_factor(&history, equipment_type);
        let failure_probability =
            (ANOMALY_WEIGHT * avg_anomaly + RUNTIME_WEIGHT * runtime_factor).min(PROBABILITY_CAP);

        // Confidence deliberately shortens the timeframe: an uncertain
        // prediction is treated as more urgent, not as "don't know".
        let base = self.config.base_timeframe(equipment_type);
        let adjusted = base * (1.0 - failure_probability);
        let predicted_days = (adjusted * confidence).clamp(1.0, 90.0);

        let risk = risk_level(failure_probability, predicted_days);
        let recommended_action = recommended_action(status, predicted_days, &contributing_factors);

        let analysis = PredictiveAnalysis {
            equipment_id: equipment_id.to_string(),
            equipment_name: equipment_name.to_string(),
            status,
            failure_probability,
            predicted_failure_in_days: predicted_days,
            confidence,
            recommended_action,
            risk_level: risk,
            contributing_factors,
            last_analysis: now,
            next_analysis: now + Duration::seconds(self.config.cache_ttl_secs as i64),
        };

        info!(
            equipment_id = %equipment_id,
            probability = failure_probability,
            predicted_days = predicted_days,
            confidence = confidence,
            risk = %risk,
            status = %status,
            "Computed failure prediction"
        );

        self.cache
            .insert(equipment_id.to_string(), analysis.clone());
        analysis
    }

    /// Wear factor from runtime-hour readings: average runtime divided by
    /// the per-type critical threshold, clamped to [0, 1]. No runtime
    /// telemetry yields 0.
    fn runtime_factor(&self, history: &[SensorReading], equipment_type: &str) -> f64 {
        let runtime_values: Vec<f64> = history
            .iter()
            .filter(|r| r.kind == SensorKind::Runtime)
            .map(|r| r.value)
            .collect();
        if runtime_values.is_empty() {
            return 0.0;
        }
        let avg = runtime_values.iter().sum::<f64>() / runtime_values.len() as f64;
        let threshold = self.config.runtime_threshold(equipment_type);
        (avg / threshold).clamp(0.0, 1.0)
    }
}

/// Classify current health from the last 10 stored readings.
///
/// Counts anomaly scores above the critical (0.8) and warning (0.5) bars:
/// ≥2 critical readings → critical; ≥3 warnings or ≥1 critical → warning.
/// Every triggering reading is listed as a contributing factor.
fn classify_status(history: &[SensorReading]) -> (HealthStatus, Vec<String>) {
    if history.is_empty() {
        return (
            HealthStatus::Normal,
            vec!["No sensor data available".to_string()],
        );
    }

    let start = history.len().saturating_sub(STATUS_WINDOW);
    let mut critical_count = 0usize;
    let mut warning_count = 0usize;
    let mut factors = Vec::new();

    for reading in &history[start..] {
        let score = analyzer::anomaly_score(analyzer::deviation(reading.value, &reading.normal_range));
        if score > CRITICAL_SCORE {
            critical_count += 1;
        } else if score > WARNING_SCORE {
            warning_count += 1;
        } else {
            continue;
        }
        factors.push(format!(
            "{} reading: {}{}",
            reading.kind, reading.value, reading.unit
        ));
    }

    let status = if critical_count >= 2 {
        HealthStatus::Critical
    } else if warning_count >= 3 || critical_count >= 1 {
        HealthStatus::Warning
    } else {
        HealthStatus::Normal
    };

    (status, factors)
}

/// Average anomaly score over the last 20 readings plus a confidence that
/// grows with history length. Fewer than 5 stored readings yields the
/// sparse-history defaults (0.1 average, 0.5 confidence).
fn anomaly_estimate(history: &[SensorReading]) -> (f64, f64) {
    if history.len() < MIN_HISTORY_FOR_ESTIMATE {
        return (SPARSE_ANOMALY_AVG, SPARSE_CONFIDENCE);
    }

    let start = history.len().saturating_sub(PROBABILITY_WINDOW);
    let window = &history[start..];
    let sum: f64 = window
        .iter()
        .map(|r| analyzer::anomaly_score(analyzer::deviation(r.value, &r.normal_range)))
        .sum();
    let avg = sum / window.len() as f64;

    let confidence = (history.len() as f64 / CONFIDENCE_SATURATION).min(PROBABILITY_CAP);
    (avg, confidence)
}

/// Operator-facing action text, derived purely from (status, predicted days).
fn recommended_action(status: HealthStatus, predicted_days: f64, factors: &[String]) -> String {
    match status {
        HealthStatus::Critical => format!(
            "Immediate maintenance required. Contributing factors: {}",
            factors.join("; ")
        ),
        HealthStatus::Warning => {
            let highlights: Vec<&str> = factors.iter().take(2).map(String::as_str).collect();
            format!(
                "Schedule maintenance within 7 days. Watch: {}",
                highlights.join("; ")
            )
        }
        HealthStatus::Normal => {
            if predicted_days <= 14.0 {
                "Plan maintenance within the next 2 weeks".to_string()
            } else {
                format!(
                    "Continue monitoring; next maintenance in about {:.0} days",
                    predicted_days / 2.0
                )
            }
        }
    }
}
