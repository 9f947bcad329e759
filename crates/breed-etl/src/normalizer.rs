//! Raw breed record normalization
//!
//! Turns the loosely-shaped API objects into [`NormalizedRecord`]s. A record
//! that cannot be normalized is skipped with a [`SkipReason`]; it never fails
//! the batch.
//!
//! Skip policy: a record is kept only if it has a positive integer `id` AND a
//! non-blank string `name`. Every other field falls back to `"Unknown"`.

use crate::error::SkipReason;
use crate::fetcher::RawRecord;
use breed_common::{NormalizedRecord, UNKNOWN};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// A raw record left out of the batch, by position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: SkipReason,
}

/// Result of normalizing a whole batch
#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    /// In input order, not deduplicated
    pub accepted: Vec<NormalizedRecord>,
    pub skipped: Vec<SkippedRecord>,
}

pub struct BreedNormalizer {
    life_span_pattern: Regex,
}

impl BreedNormalizer {
    pub fn new() -> Result<Self, regex::Error> {
        // "15 years", "10 - 12 years", "12 – 14 Years"
        let life_span_pattern = Regex::new(r"(?i)^(\d+)(?:\s*[-–]\s*(\d+))?\s*years?$")?;
        Ok(Self { life_span_pattern })
    }

    pub fn normalize(&self, raw: &[RawRecord]) -> NormalizeOutcome {
        let mut outcome = NormalizeOutcome::default();

        for (index, record) in raw.iter().enumerate() {
            match self.normalize_record(record) {
                Ok(normalized) => outcome.accepted.push(normalized),
                Err(reason) => {
                    warn!(index, reason = %reason, record = %record, "Skipping breed record");
                    outcome.skipped.push(SkippedRecord { index, reason });
                },
            }
        }

        info!(
            accepted = outcome.accepted.len(),
            skipped = outcome.skipped.len(),
            "Normalized breed records"
        );
        outcome
    }

    pub fn normalize_record(&self, raw: &RawRecord) -> Result<NormalizedRecord, SkipReason> {
        let object = raw.as_object().ok_or(SkipReason::NotAnObject)?;

        let breed_id = breed_id(object)?;
        let breed_name = text(object, "name").ok_or(SkipReason::MissingName)?;

        let temperament = text_or_unknown(object, "temperament");
        let life_span = text_or_unknown(object, "life_span");
        let temperament_count = temperament_count(&temperament);
        let avg_lifespan_years = self.avg_lifespan_years(&life_span);

        Ok(NormalizedRecord {
            breed_id,
            breed_name,
            breed_group: text_or_unknown(object, "breed_group"),
            bred_for: text_or_unknown(object, "bred_for"),
            life_span,
            temperament,
            origin: text_or_unknown(object, "origin"),
            weight_kg: metric(object, "weight"),
            height_cm: metric(object, "height"),
            temperament_count,
            avg_lifespan_years,
        })
    }

    /// Mean of the bounds in "N years" / "N - M years"; `None` for anything else.
    pub fn avg_lifespan_years(&self, life_span: &str) -> Option<f64> {
        let captures = self.life_span_pattern.captures(life_span.trim())?;
        let low: u32 = captures.get(1)?.as_str().parse().ok()?;

        match captures.get(2) {
            None => Some(f64::from(low)),
            Some(high) => {
                let high: u32 = high.as_str().parse().ok()?;
                let mean = (f64::from(low) + f64::from(high)) / 2.0;
                Some((mean * 10.0).round() / 10.0)
            },
        }
    }
}

/// Number of non-empty comma-separated traits; `None` when unknown.
pub fn temperament_count(temperament: &str) -> Option<i32> {
    if temperament == UNKNOWN {
        return None;
    }
    let count = temperament
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .count();
    i32::try_from(count).ok()
}

fn breed_id(object: &Map<String, Value>) -> Result<i32, SkipReason> {
    match object.get("id") {
        None | Some(Value::Null) => Err(SkipReason::MissingId),
        Some(value) => value
            .as_i64()
            .filter(|id| *id > 0)
            .and_then(|id| i32::try_from(id).ok())
            .ok_or_else(|| SkipReason::InvalidId(value.to_string())),
    }
}

fn text(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn text_or_unknown(object: &Map<String, Value>, key: &str) -> String {
    text(object, key).unwrap_or_else(|| UNKNOWN.to_string())
}

/// Flatten `{"imperial": .., "metric": ".."}` to its metric value.
fn metric(object: &Map<String, Value>, key: &str) -> String {
    let value = match object.get(key).and_then(|nested| nested.get("metric")) {
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    match value {
        Some(v) if !v.is_empty() => v,
        _ => {
            debug!(field = key, "No metric value, using placeholder");
            UNKNOWN.to_string()
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalizer() -> BreedNormalizer {
        BreedNormalizer::new().unwrap()
    }

    #[test]
    fn test_full_record_is_normalized() {
        let raw = json!({
            "id": 1,
            "name": " Affenpinscher ",
            "breed_group": "Toy",
            "bred_for": "Small rodent hunting, lapdog",
            "life_span": "10 - 12 years",
            "temperament": "Stubborn, Curious, Playful, Adventurous, Active, Fun-loving",
            "origin": "Germany, France",
            "weight": {"imperial": "6 - 13", "metric": "3 - 6"},
            "height": {"imperial": "9 - 11.5", "metric": "23 - 29"},
            "reference_image_id": "BJa4kxc4X"
        });

        let record = normalizer().normalize_record(&raw).unwrap();

        assert_eq!(record.breed_id, 1);
        assert_eq!(record.breed_name, "Affenpinscher");
        assert_eq!(record.breed_group, "Toy");
        assert_eq!(record.bred_for, "Small rodent hunting, lapdog");
        assert_eq!(record.origin, "Germany, France");
        assert_eq!(record.weight_kg, "3 - 6");
        assert_eq!(record.height_cm, "23 - 29");
        assert_eq!(record.temperament_count, Some(6));
        assert_eq!(record.avg_lifespan_years, Some(11.0));
    }

    #[test]
    fn test_missing_optional_fields_become_unknown() {
        let raw = json!({
            "id": 7,
            "name": "Akbash Dog",
            "breed_group": null,
            "origin": "   ",
            "weight": {"imperial": "90 - 120"}
        });

        let record = normalizer().normalize_record(&raw).unwrap();

        assert_eq!(record.breed_group, UNKNOWN);
        assert_eq!(record.bred_for, UNKNOWN);
        assert_eq!(record.origin, UNKNOWN);
        assert_eq!(record.life_span, UNKNOWN);
        assert_eq!(record.temperament, UNKNOWN);
        assert_eq!(record.weight_kg, UNKNOWN);
        assert_eq!(record.height_cm, UNKNOWN);
        assert_eq!(record.temperament_count, None);
        assert_eq!(record.avg_lifespan_years, None);
    }

    #[test]
    fn test_numeric_metric_is_kept_verbatim() {
        let raw = json!({"id": 3, "name": "Basenji", "height": {"metric": 41}});
        let record = normalizer().normalize_record(&raw).unwrap();
        assert_eq!(record.height_cm, "41");
    }

    #[test]
    fn test_lifespan_parsing() {
        let n = normalizer();
        assert_eq!(n.avg_lifespan_years("10 - 12 years"), Some(11.0));
        assert_eq!(n.avg_lifespan_years("15 years"), Some(15.0));
        assert_eq!(n.avg_lifespan_years("10 - 13 years"), Some(11.5));
        assert_eq!(n.avg_lifespan_years("12 – 14 Years"), Some(13.0));
        assert_eq!(n.avg_lifespan_years("Unknown"), None);
        assert_eq!(n.avg_lifespan_years(""), None);
        assert_eq!(n.avg_lifespan_years("about a decade"), None);
        assert_eq!(n.avg_lifespan_years("10 - 12"), None);
    }

    #[test]
    fn test_temperament_counting() {
        assert_eq!(temperament_count("Friendly, Loyal, Active"), Some(3));
        assert_eq!(temperament_count("Unknown"), None);
        assert_eq!(temperament_count("Friendly,,Loyal"), Some(2));
        assert_eq!(temperament_count("Calm"), Some(1));
    }

    #[test]
    fn test_skip_policy_requires_id_and_name() {
        let n = normalizer();

        assert_eq!(n.normalize_record(&json!({})).unwrap_err(), SkipReason::MissingId);
        assert_eq!(
            n.normalize_record(&json!({"name": "Beagle"})).unwrap_err(),
            SkipReason::MissingId
        );
        assert_eq!(
            n.normalize_record(&json!({"id": 12, "name": ""})).unwrap_err(),
            SkipReason::MissingName
        );
        assert_eq!(
            n.normalize_record(&json!({"id": 12})).unwrap_err(),
            SkipReason::MissingName
        );
        assert_eq!(
            n.normalize_record(&json!({"id": "12", "name": "Beagle"})).unwrap_err(),
            SkipReason::InvalidId("\"12\"".to_string())
        );
        assert_eq!(
            n.normalize_record(&json!({"id": 0, "name": "Beagle"})).unwrap_err(),
            SkipReason::InvalidId("0".to_string())
        );
        assert_eq!(n.normalize_record(&json!([1, 2])).unwrap_err(), SkipReason::NotAnObject);
    }

    #[test]
    fn test_batch_keeps_order_and_reports_skips() {
        let raw = vec![
            json!({"id": 2, "name": "Afghan Hound"}),
            json!({"name": "No Id"}),
            json!({"id": 1, "name": "Affenpinscher"}),
            json!({"id": 2, "name": "Afghan Hound (dup)"}),
        ];

        let outcome = normalizer().normalize(&raw);

        let ids: Vec<i32> = outcome.accepted.iter().map(|r| r.breed_id).collect();
        assert_eq!(ids, vec![2, 1, 2]);
        assert_eq!(
            outcome.skipped,
            vec![SkippedRecord {
                index: 1,
                reason: SkipReason::MissingId
            }]
        );
    }
}
