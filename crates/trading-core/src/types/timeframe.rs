//! Candle intervals used by the two-timeframe snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Candle interval, named the way futures venues name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "3m")]
    Minute3,
    #[serde(rename = "5m")]
    #[default]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Daily,
}

impl Timeframe {
    /// Duration of one candle in seconds.
    pub fn as_secs(&self) -> u64 {
        match self {
            Timeframe::Minute1 => 60,
            Timeframe::Minute3 => 180,
            Timeframe::Minute5 => 300,
            Timeframe::Minute15 => 900,
            Timeframe::Minute30 => 1800,
            Timeframe::Hour1 => 3600,
            Timeframe::Hour4 => 14400,
            Timeframe::Daily => 86400,
        }
    }

    /// Duration of one candle in milliseconds.
    pub fn as_millis(&self) -> i64 {
        self.as_secs() as i64 * 1000
    }

    /// Venue label, e.g. `15m`.
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::Minute1 => "1m",
            Timeframe::Minute3 => "3m",
            Timeframe::Minute5 => "5m",
            Timeframe::Minute15 => "15m",
            Timeframe::Minute30 => "30m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Daily => "1d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" | "1min" => Ok(Timeframe::Minute1),
            "3m" | "3min" => Ok(Timeframe::Minute3),
            "5m" | "5min" => Ok(Timeframe::Minute5),
            "15m" | "15min" => Ok(Timeframe::Minute15),
            "30m" | "30min" => Ok(Timeframe::Minute30),
            "1h" | "60m" => Ok(Timeframe::Hour1),
            "4h" | "240m" => Ok(Timeframe::Hour4),
            "1d" | "daily" => Ok(Timeframe::Daily),
            _ => Err(format!("Invalid timeframe: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_duration() {
        assert_eq!(Timeframe::Minute5.as_secs(), 300);
        assert_eq!(Timeframe::Minute15.as_millis(), 900_000);
        assert!(Timeframe::Minute5 < Timeframe::Minute15);
    }

    #[test]
    fn test_timeframe_parse_and_display() {
        assert_eq!(Timeframe::from_str("15m").unwrap(), Timeframe::Minute15);
        assert_eq!(Timeframe::from_str(" 4H ").unwrap(), Timeframe::Hour4);
        assert!(Timeframe::from_str("7m").is_err());
        assert_eq!(Timeframe::Minute5.to_string(), "5m");
    }

    #[test]
    fn test_timeframe_serde_uses_labels() {
        let json = serde_json::to_string(&Timeframe::Minute15).unwrap();
        assert_eq!(json, "\"15m\"");
        let parsed: Timeframe = serde_json::from_str("\"1h\"").unwrap();
        assert_eq!(parsed, Timeframe::Hour1);
    }
}
