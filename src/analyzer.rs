//! Sensor Analyzer - per-reading anomaly assessment
//!
//! Deterministic, rule-based scoring of a single sensor reading against its
//! normal operating band. Always returns a result: degenerate ranges and
//! short histories degrade to neutral values instead of erroring, because
//! analysis must never block the telemetry stream.

use crate::types::{HealthStatus, NormalRange, SensorAnalysis, SensorReading, Trend};

/// Deviation above which a reading is classified critical
const CRITICAL_DEVIATION: f64 = 0.2;

/// Absolute slope above which a 3-sample trend counts as moving
const TREND_SLOPE_THRESHOLD: f64 = 0.1;

/// Fractional distance of a value outside its normal range.
///
/// Returns 0.0 for in-range values. A degenerate range bound of 0 yields
/// no deviation rather than dividing by zero.
pub fn deviation(value: f64, range: &NormalRange) -> f64 {
    if value < range.min {
        if range.min == 0.0 {
            return 0.0;
        }
        (range.min - value) / range.min
    } else if value > range.max {
        if range.max == 0.0 {
            return 0.0;
        }
        (value - range.max) / range.max
    } else {
        0.0
    }
}

/// Status band for a deviation value.
///
/// - deviation > 0.2 → critical
/// - 0 < deviation ≤ 0.2 → warning
/// - otherwise → normal
pub fn status_for(dev: f64) -> HealthStatus {
    if dev > CRITICAL_DEVIATION {
        HealthStatus::Critical
    } else if dev > 0.0 {
        HealthStatus::Warning
    } else {
        HealthStatus::Normal
    }
}

/// Normalized anomaly score in [0, 1]: 2x the fractional deviation, capped.
///
/// Monotonic in |deviation| - a larger excursion never scores lower.
pub fn anomaly_score(dev: f64) -> f64 {
    (dev.abs() * 2.0).min(1.0)
}

/// Direction of change over the last 3 stored readings.
///
/// slope = (newest − oldest) / 2; |slope| ≤ 0.1 is stable. With fewer than
/// 3 samples there is not enough signal to call a direction.
pub fn trend_over(history: &[SensorReading]) -> Trend {
    if history.len() < 3 {
        return Trend::Stable;
    }
    let window = &history[history.len() - 3..];
    let slope = (window[2].value - window[0].value) / 2.0;
    if slope > TREND_SLOPE_THRESHOLD {
        Trend::Increasing
    } else if slope < -TREND_SLOPE_THRESHOLD {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

/// Analyze one reading against its normal band and the equipment's stored
/// history (most recent last, already including this reading).
pub fn analyze(reading: &SensorReading, history: &[SensorReading]) -> SensorAnalysis {
    let dev = deviation(reading.value, &reading.normal_range);
    let status = status_for(dev);
    let score = anomaly_score(dev);
    let trend = trend_over(history);
    let recommendations = build_recommendations(reading, status, trend);

    tracing::debug!(
        equipment_id = %reading.equipment_id,
        kind = %reading.kind,
        value = reading.value,
        deviation = dev,
        anomaly_score = score,
        status = %status,
        trend = %trend,
        "Analyzed sensor reading"
    );

    SensorAnalysis {
        equipment_id: reading.equipment_id.clone(),
        kind: reading.kind,
        value: reading.value,
        normal_range: reading.normal_range,
        deviation: dev,
        trend,
        anomaly_score: score,
        status,
        recommendations,
    }
}

/// Operator recommendations for an analyzed reading.
fn build_recommendations(
    reading: &SensorReading,
    status: HealthStatus,
    trend: Trend,
) -> Vec<String> {
    let mut recommendations = Vec::new();
    let above = reading.value > reading.normal_range.max;
    let below = reading.value < reading.normal_range.min;

    if status == HealthStatus::Critical {
        let direction = if above { "too high" } else { "too low" };
        recommendations.push(format!(
            "Immediate action required: {} is {} at {}{}",
            reading.kind, direction, reading.value, reading.unit
        ));
    }

    if (trend == Trend::Increasing && above) || (trend == Trend::Decreasing && below) {
        recommendations.push(format!(
            "{} is trending further outside the normal range - investigate root cause",
            reading.kind
        ));
    }

    recommendations
}
