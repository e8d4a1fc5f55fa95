//! Entry-condition checklists.
//!
//! Each strategy describes its entry rule as a list of named conditions; the
//! same list drives `check_entry` and the readiness report.

use serde::{Deserialize, Serialize};
use std::fmt;
use trading_core::{Direction, StrategyKind};

/// One entry condition evaluated against the current snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionResult {
    pub name: String,
    pub met: bool,
    pub current: String,
    pub required: String,
}

impl ConditionResult {
    pub fn new(name: &str, met: bool, current: impl Into<String>, required: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            met,
            current: current.into(),
            required: required.into(),
        }
    }
}

/// Checklist for one strategy and direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReadiness {
    pub strategy: StrategyKind,
    pub direction: Direction,
    pub conditions: Vec<ConditionResult>,
}

impl SignalReadiness {
    pub fn new(strategy: StrategyKind, direction: Direction, conditions: Vec<ConditionResult>) -> Self {
        Self {
            strategy,
            direction,
            conditions,
        }
    }

    pub fn met_count(&self) -> usize {
        self.conditions.iter().filter(|c| c.met).count()
    }

    pub fn total_count(&self) -> usize {
        self.conditions.len()
    }

    /// Share of conditions met, 0 to 100.
    pub fn readiness_percent(&self) -> f64 {
        if self.conditions.is_empty() {
            return 0.0;
        }
        self.met_count() as f64 / self.total_count() as f64 * 100.0
    }

    /// All conditions met.
    pub fn is_ready(&self) -> bool {
        !self.conditions.is_empty() && self.conditions.iter().all(|c| c.met)
    }

    /// Names of the conditions still blocking entry.
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().filter(|c| !c.met).map(|c| c.name.as_str())
    }
}

impl fmt::Display for SignalReadiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {}: {}/{} ({:.0}%)",
            self.strategy,
            self.direction,
            self.met_count(),
            self.total_count(),
            self.readiness_percent()
        )?;
        for c in &self.conditions {
            writeln!(
                f,
                "  [{}] {:<22} {} (need {})",
                if c.met { "x" } else { " " },
                c.name,
                c.current,
                c.required
            )?;
        }
        Ok(())
    }
}

/// The checklist closest to triggering. Ties go to the earlier entry.
pub fn best_opportunity(readiness: &[SignalReadiness]) -> Option<&SignalReadiness> {
    readiness.iter().fold(None, |best: Option<&SignalReadiness>, r| match best {
        Some(b) if b.readiness_percent() >= r.readiness_percent() => Some(b),
        _ => Some(r),
    })
}
