//! Sensor data ingestion from CSV files
//!
//! The device/stream collaborator normally delivers readings in memory;
//! this module covers the replay path (exported CSV) and generates
//! synthetic degradation scenarios for tests and demos.

use crate::types::{HealthStatus, NormalRange, SensorKind, SensorReading};
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Read sensor readings from a CSV file
///
/// Expected CSV format:
/// timestamp,equipment_id,kind,value,unit,range_min,range_max
pub fn read_csv_readings(path: &str) -> Vec<SensorReading> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::error!(path = %path, error = %e, "Failed to open CSV file");
            return Vec::new();
        }
    };

    let reader = BufReader::new(file);
    let mut readings = Vec::new();
    let mut line_num = 0;

    for line_result in reader.lines() {
        line_num += 1;

        let line = match line_result {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(line = line_num, error = %e, "Error reading CSV line");
                continue;
            }
        };

        // Skip header line
        if line_num == 1 && line.starts_with("timestamp") {
            continue;
        }

        // Skip empty lines
        if line.trim().is_empty() {
            continue;
        }

        match parse_csv_line(&line, line_num) {
            Ok(reading) => readings.push(reading),
            Err(e) => {
                tracing::warn!(line = line_num, error = %e, "Error parsing CSV line");
                continue;
            }
        }
    }

    tracing::info!(count = readings.len(), path = %path, "Loaded sensor readings from CSV");
    readings
}

/// Parse a single CSV line into a SensorReading
fn parse_csv_line(line: &str, line_num: usize) -> Result<SensorReading, String> {
    let fields: Vec<&str> = line.split(',').collect();

    if fields.len() < 7 {
        return Err(format!(
            "Expected at least 7 fields, got {} on line {}",
            fields.len(),
            line_num
        ));
    }

    let timestamp = parse_timestamp(fields[0])?;
    let equipment_id = fields[1].trim().to_string();
    if equipment_id.is_empty() {
        return Err(format!("Empty equipment_id on line {line_num}"));
    }
    let kind = SensorKind::parse(fields[2])
        .ok_or_else(|| format!("Unknown sensor kind '{}' on line {}", fields[2], line_num))?;
    let value = parse_f64(fields[3], "value")?;
    let unit = fields[4].trim().to_string();
    let min = parse_f64(fields[5], "range_min")?;
    let max = parse_f64(fields[6], "range_max")?;

    let normal_range = NormalRange::new(min, max);
    Ok(SensorReading {
        equipment_id,
        kind,
        value,
        unit,
        normal_range,
        status: if normal_range.contains(value) {
            HealthStatus::Normal
        } else {
            HealthStatus::Warning
        },
        timestamp,
    })
}

/// Parse ISO 8601 timestamp or Unix epoch seconds
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();

    // Try direct numeric parsing first (already epoch)
    if let Ok(epoch) = s.parse::<i64>() {
        return DateTime::from_timestamp(epoch, 0)
            .ok_or_else(|| format!("Epoch out of range: '{s}'"));
    }

    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("Cannot parse timestamp '{s}': {e}"))
}

/// Parse a string to f64 with field name for error messages
fn parse_f64(s: &str, field: &str) -> Result<f64, String> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| format!("Cannot parse {} as f64: '{}'", field, s))
}

/// Generate a synthetic degradation scenario for one equipment unit
///
/// Three phases against a [60, 90] temperature band, with runtime-hour
/// readings interleaved: normal operation, upward drift into the warning
/// band, and a critical excursion. Used by tests and demos to exercise
/// the full prediction path.
pub fn generate_degradation_data(equipment_id: &str) -> Vec<SensorReading> {
    let mut readings = Vec::new();
    let base_epoch = 1705564800i64;
    let range = NormalRange::new(60.0, 90.0);

    let mut push = |offset_mins: i64, kind: SensorKind, value: f64, unit: &str, r: NormalRange| {
        readings.push(SensorReading {
            equipment_id: equipment_id.to_string(),
            kind,
            value,
            unit: unit.to_string(),
            normal_range: r,
            status: if r.contains(value) {
                HealthStatus::Normal
            } else {
                HealthStatus::Warning
            },
            timestamp: DateTime::from_timestamp(base_epoch + offset_mins * 60, 0)
                .unwrap_or_default(),
        });
    };

    // Phase 1: normal operation (20 samples around 75)
    for i in 0..20 {
        let value = 75.0 + (i as f64 * 0.4).sin() * 3.0;
        push(i, SensorKind::Temperature, value, "°F", range);
    }

    // Phase 2: upward drift into the warning band (15 samples)
    for i in 0..15 {
        let value = 88.0 + i as f64 * 0.8;
        push(20 + i, SensorKind::Temperature, value, "°F", range);
    }

    // Phase 3: critical excursion (10 samples well above range)
    for i in 0..10 {
        let value = 115.0 + i as f64 * 2.0;
        push(35 + i, SensorKind::Temperature, value, "°F", range);
    }

    // Runtime counter climbing toward the generator threshold
    for i in 0..5 {
        push(
            45 + i,
            SensorKind::Runtime,
            2600.0 + i as f64 * 50.0,
            "h",
            NormalRange::new(0.0, 5000.0),
        );
    }

    tracing::debug!(count = readings.len(), equipment_id = %equipment_id, "Generated synthetic degradation readings");
    readings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_iso8601() {
        let ts = parse_timestamp("2025-01-18T08:00:00Z").unwrap();
        assert_eq!(ts.timestamp(), 1737187200);
    }

    #[test]
    fn test_parse_timestamp_epoch() {
        let ts = parse_timestamp("1705564800").unwrap();
        assert_eq!(ts.timestamp(), 1705564800);
    }

    #[test]
    fn test_parse_f64() {
        assert_eq!(parse_f64("1.234", "test").unwrap(), 1.234);
        assert!(parse_f64("invalid", "test").is_err());
    }

    #[test]
    fn test_parse_csv_line() {
        let reading =
            parse_csv_line("1705564800,eq-1,temperature,95.5,°F,60,90", 2).unwrap();
        assert_eq!(reading.equipment_id, "eq-1");
        assert_eq!(reading.kind, SensorKind::Temperature);
        assert_eq!(reading.value, 95.5);
        assert_eq!(reading.normal_range.min, 60.0);
        assert_eq!(reading.status, HealthStatus::Warning);
    }

    #[test]
    fn test_parse_csv_line_rejects_unknown_kind() {
        assert!(parse_csv_line("1705564800,eq-1,sonar,95.5,dB,60,90", 2).is_err());
    }

    #[test]
    fn test_parse_csv_line_rejects_short_rows() {
        assert!(parse_csv_line("1705564800,eq-1,temperature", 2).is_err());
    }

    #[test]
    fn test_generate_degradation_data_phases() {
        let data = generate_degradation_data("eq-1");
        assert_eq!(data.len(), 50);

        // Normal phase stays in band
        assert!(data[0].is_within_range());
        assert!(data[10].is_within_range());

        // Critical phase is far above
        assert!(data[40].value > 110.0);
        assert!(!data[40].is_within_range());

        // Runtime readings at the tail
        assert_eq!(data[45].kind, SensorKind::Runtime);

        // Timestamps strictly increase
        assert!(data.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }
}
