//! Small enums shared by every component.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Side of a futures position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short.
    #[inline]
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }

    /// Signed P&L fraction of a move from `entry` to `price`.
    pub fn pnl_fraction(&self, entry: f64, price: f64) -> f64 {
        if entry <= 0.0 {
            return 0.0;
        }
        self.sign() * (price - entry) / entry
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => f.write_str("long"),
            Direction::Short => f.write_str("short"),
        }
    }
}

/// Direction reported by the Supertrend tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    #[default]
    Up,
    Down,
}

impl TrendDirection {
    /// Whether this trend supports a position in `direction`.
    pub fn agrees_with(&self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (TrendDirection::Up, Direction::Long) | (TrendDirection::Down, Direction::Short)
        )
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Up => f.write_str("up"),
            TrendDirection::Down => f.write_str("down"),
        }
    }
}

/// Market regime label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarketRegime {
    Trending,
    Ranging,
    #[default]
    Unknown,
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketRegime::Trending => f.write_str("trending"),
            MarketRegime::Ranging => f.write_str("ranging"),
            MarketRegime::Unknown => f.write_str("unknown"),
        }
    }
}

/// The strategies the core can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    TrendFollowing,
    MeanReversion,
}

impl StrategyKind {
    pub fn all() -> &'static [StrategyKind] {
        &[StrategyKind::TrendFollowing, StrategyKind::MeanReversion]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::TrendFollowing => "trend_following",
            StrategyKind::MeanReversion => "mean_reversion",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "trend_following" | "trend" | "momentum" => Ok(StrategyKind::TrendFollowing),
            "mean_reversion" | "reversion" => Ok(StrategyKind::MeanReversion),
            _ => Err(format!("Unknown strategy: {}", s)),
        }
    }
}
