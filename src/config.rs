//! Engine configuration
//!
//! Every threshold the analyzers and narrative rules use. Defaults are the
//! production policy; hosts may load overrides from JSON.

use serde::{Deserialize, Serialize};

use crate::error::{InsightError, Result};

/// Minimum distinct active days before cadence is analyzed
pub const DEFAULT_CADENCE_MIN_ACTIVE_DAYS: usize = 3;

/// Minimum distinct active days before a steady cadence may be reported
pub const DEFAULT_STEADY_MIN_ACTIVE_DAYS: usize = 4;

/// Gap deviation at or below which cadence is steady
pub const DEFAULT_STEADY_VARIANCE_MAX: f64 = 0.4;

/// Gap deviation at or above which cadence is scattered
pub const DEFAULT_SCATTERED_VARIANCE_MIN: f64 = 1.1;

/// Mean consecutive score swing at or above which variation is high
pub const DEFAULT_HIGH_VARIATION_MIN: f64 = 2.2;

/// Week-over-week average change that counts as a shift in tone
pub const DEFAULT_WEEK_DELTA_THRESHOLD: f64 = 0.8;

/// Month-over-month average change that counts as a shift in tone
pub const DEFAULT_MONTH_DELTA_THRESHOLD: f64 = 0.75;

/// Extra active days needed for a month to read as more consistent
pub const DEFAULT_MONTH_ACTIVE_DAY_LEAD: usize = 3;

/// Linked entries in a week needed for a sunday anchor
pub const DEFAULT_SUNDAY_ANCHOR_MIN_LINKS: usize = 2;

/// Repetitions a mood needs to dominate a week
pub const DEFAULT_DOMINANT_MOOD_MIN_COUNT: usize = 3;

/// Active days at or below which a week has too little data
pub const DEFAULT_INSUFFICIENT_MAX_ACTIVE_DAYS: usize = 1;

/// Scored entries the earlier window needs before averages are compared
pub const DEFAULT_PREVIOUS_MIN_SCORED: usize = 2;

/// Thresholds for signal detection and narrative selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    pub cadence_min_active_days: usize,
    pub steady_min_active_days: usize,
    pub steady_variance_max: f64,
    pub scattered_variance_min: f64,
    pub high_variation_min: f64,
    pub week_delta_threshold: f64,
    pub month_delta_threshold: f64,
    pub month_active_day_lead: usize,
    pub sunday_anchor_min_links: usize,
    pub dominant_mood_min_count: usize,
    pub insufficient_max_active_days: usize,
    pub previous_min_scored: usize,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            cadence_min_active_days: DEFAULT_CADENCE_MIN_ACTIVE_DAYS,
            steady_min_active_days: DEFAULT_STEADY_MIN_ACTIVE_DAYS,
            steady_variance_max: DEFAULT_STEADY_VARIANCE_MAX,
            scattered_variance_min: DEFAULT_SCATTERED_VARIANCE_MIN,
            high_variation_min: DEFAULT_HIGH_VARIATION_MIN,
            week_delta_threshold: DEFAULT_WEEK_DELTA_THRESHOLD,
            month_delta_threshold: DEFAULT_MONTH_DELTA_THRESHOLD,
            month_active_day_lead: DEFAULT_MONTH_ACTIVE_DAY_LEAD,
            sunday_anchor_min_links: DEFAULT_SUNDAY_ANCHOR_MIN_LINKS,
            dominant_mood_min_count: DEFAULT_DOMINANT_MOOD_MIN_COUNT,
            insufficient_max_active_days: DEFAULT_INSUFFICIENT_MAX_ACTIVE_DAYS,
            previous_min_scored: DEFAULT_PREVIOUS_MIN_SCORED,
        }
    }
}

impl InsightConfig {
    /// Load a configuration from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject thresholds the analyzers cannot work with
    pub fn validate(&self) -> Result<()> {
        let floats = [
            ("steady_variance_max", self.steady_variance_max),
            ("scattered_variance_min", self.scattered_variance_min),
            ("high_variation_min", self.high_variation_min),
            ("week_delta_threshold", self.week_delta_threshold),
            ("month_delta_threshold", self.month_delta_threshold),
        ];
        for (name, value) in floats {
            if !value.is_finite() || value < 0.0 {
                return Err(InsightError::InvalidConfig(format!(
                    "{name} must be a non-negative finite number, got {value}"
                )));
            }
        }

        // Gaps need at least two active days
        if self.cadence_min_active_days < 2 {
            return Err(InsightError::InvalidConfig(
                "cadence_min_active_days must be at least 2".to_string(),
            ));
        }
        if self.steady_min_active_days < self.cadence_min_active_days {
            return Err(InsightError::InvalidConfig(
                "steady_min_active_days cannot be below cadence_min_active_days".to_string(),
            ));
        }
        if self.steady_variance_max >= self.scattered_variance_min {
            return Err(InsightError::InvalidConfig(
                "steady_variance_max must be below scattered_variance_min".to_string(),
            ));
        }
        if self.previous_min_scored == 0 {
            return Err(InsightError::InvalidConfig(
                "previous_min_scored must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_is_valid() {
        assert!(InsightConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = InsightConfig::from_json(r#"{"high_variation_min": 1.5}"#).unwrap();
        assert_eq!(config.high_variation_min, 1.5);
        assert_eq!(config.steady_variance_max, DEFAULT_STEADY_VARIANCE_MAX);
        assert_eq!(config.cadence_min_active_days, DEFAULT_CADENCE_MIN_ACTIVE_DAYS);
    }

    #[test]
    fn test_roundtrip_json() {
        let config = InsightConfig {
            month_active_day_lead: 5,
            ..Default::default()
        };
        let restored = InsightConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_rejects_overlapping_cadence_thresholds() {
        let result = InsightConfig::from_json(
            r#"{"steady_variance_max": 1.2, "scattered_variance_min": 1.1}"#,
        );
        assert!(matches!(result, Err(InsightError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_negative_threshold() {
        let config = InsightConfig {
            week_delta_threshold: -0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_single_day_cadence() {
        let config = InsightConfig {
            cadence_min_active_days: 1,
            steady_min_active_days: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_previous_minimum() {
        let result = InsightConfig::from_json(r#"{"previous_min_scored": 0}"#);
        assert!(matches!(result, Err(InsightError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            InsightConfig::from_json("{"),
            Err(InsightError::JsonError(_))
        ));
    }
}
