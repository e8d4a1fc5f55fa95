//! Stop-loss validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use trading_core::Direction;

/// Bounds for an acceptable protective stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopValidationConfig {
    pub min_distance: f64,
    pub max_distance: f64,
}

impl Default for StopValidationConfig {
    fn default() -> Self {
        Self {
            min_distance: 0.005,
            max_distance: 0.10,
        }
    }
}

impl StopValidationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.min_distance > 0.0 && self.max_distance > self.min_distance) {
            return Err(format!(
                "stop max_distance ({}) must exceed min_distance ({}) > 0",
                self.max_distance, self.min_distance
            ));
        }
        Ok(())
    }
}

/// What is wrong with a stop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum StopIssue {
    WrongSide,
    TooClose { distance: f64, min: f64 },
    TooFar { distance: f64, max: f64 },
    InvalidPrice,
}

impl fmt::Display for StopIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopIssue::WrongSide => f.write_str("stop is on the wrong side of entry"),
            StopIssue::TooClose { distance, min } => write!(
                f,
                "stop distance too small ({:.2}% < {:.2}%)",
                distance * 100.0,
                min * 100.0
            ),
            StopIssue::TooFar { distance, max } => write!(
                f,
                "stop distance too large ({:.2}% > {:.2}%)",
                distance * 100.0,
                max * 100.0
            ),
            StopIssue::InvalidPrice => f.write_str("entry or stop is not a valid price"),
        }
    }
}

/// Outcome of [`validate_stop_loss`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopValidation {
    pub valid: bool,
    pub reason: Option<StopIssue>,
}

impl StopValidation {
    fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn invalid(issue: StopIssue) -> Self {
        Self {
            valid: false,
            reason: Some(issue),
        }
    }
}

/// Check that `stop` protects a `direction` position entered at `entry`.
pub fn validate_stop_loss(
    entry: f64,
    stop: f64,
    direction: Direction,
    config: &StopValidationConfig,
) -> StopValidation {
    if !(entry.is_finite() && stop.is_finite() && entry > 0.0) {
        return StopValidation::invalid(StopIssue::InvalidPrice);
    }

    let distance = match direction {
        Direction::Long if stop < entry => (entry - stop) / entry,
        Direction::Short if stop > entry => (stop - entry) / entry,
        _ => return StopValidation::invalid(StopIssue::WrongSide),
    };

    if distance < config.min_distance {
        StopValidation::invalid(StopIssue::TooClose {
            distance,
            min: config.min_distance,
        })
    } else if distance > config.max_distance {
        StopValidation::invalid(StopIssue::TooFar {
            distance,
            max: config.max_distance,
        })
    } else {
        StopValidation::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(entry: f64, stop: f64, direction: Direction) -> StopValidation {
        validate_stop_loss(entry, stop, direction, &StopValidationConfig::default())
    }

    #[test]
    fn test_valid_stops() {
        assert!(validate(100.0, 98.0, Direction::Long).valid);
        assert!(validate(100.0, 102.0, Direction::Short).valid);
        assert_eq!(validate(100.0, 98.0, Direction::Long).reason, None);
    }

    #[test]
    fn test_wrong_side() {
        assert_eq!(validate(100.0, 101.0, Direction::Long).reason, Some(StopIssue::WrongSide));
        assert_eq!(validate(100.0, 100.0, Direction::Short).reason, Some(StopIssue::WrongSide));
    }

    #[test]
    fn test_distance_bounds() {
        let close = validate(100.0, 99.8, Direction::Long);
        assert!(!close.valid);
        assert!(matches!(close.reason, Some(StopIssue::TooClose { .. })));

        let far = validate(100.0, 111.0, Direction::Short);
        assert!(matches!(far.reason, Some(StopIssue::TooFar { .. })));
        assert_eq!(
            far.reason.map(|r| r.to_string()).as_deref(),
            Some("stop distance too large (11.00% > 10.00%)")
        );
    }

    #[test]
    fn test_nan_is_invalid() {
        assert_eq!(validate(f64::NAN, 98.0, Direction::Long).reason, Some(StopIssue::InvalidPrice));
    }

    #[test]
    fn test_config_bounds() {
        assert!(StopValidationConfig::default().validate().is_ok());
        let inverted = StopValidationConfig {
            min_distance: 0.10,
            max_distance: 0.005,
        };
        assert!(inverted.validate().is_err());
    }
}
