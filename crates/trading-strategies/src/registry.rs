//! The strategy set: one instance per strategy, selected by regime.

use serde::{Deserialize, Serialize};
use trading_core::{
    error::StrategyError,
    traits::{Strategy, StrategyConfig},
    types::{Direction, IndicatorSnapshot, MarketRegime, RegimeState, StrategyKind},
};

use crate::readiness::{best_opportunity, SignalReadiness};
use crate::{MeanReversionConfig, MeanReversionStrategy, TrendFollowingConfig, TrendFollowingStrategy};

/// Information about a configured strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    pub kind: StrategyKind,
    pub name: String,
    pub description: String,
    /// Regime the strategy runs in
    pub regime: MarketRegime,
    pub max_holding_cycles: Option<u32>,
    /// Active configuration as JSON
    pub config: serde_json::Value,
}

/// Both strategies, built once from validated configuration.
#[derive(Debug, Clone, Default)]
pub struct StrategySet {
    trend: TrendFollowingStrategy,
    reversion: MeanReversionStrategy,
}

impl StrategySet {
    pub fn new(trend: TrendFollowingConfig, reversion: MeanReversionConfig) -> Result<Self, StrategyError> {
        trend.validate()?;
        reversion.validate()?;
        Ok(Self {
            trend: TrendFollowingStrategy::new(trend),
            reversion: MeanReversionStrategy::new(reversion),
        })
    }

    /// The strategy for `regime`; none while the regime is unknown.
    pub fn select(&self, regime: &RegimeState) -> Option<&dyn Strategy> {
        match regime.regime {
            MarketRegime::Trending => Some(&self.trend),
            MarketRegime::Ranging => Some(&self.reversion),
            MarketRegime::Unknown => None,
        }
    }

    /// The strategy of `kind`, e.g. the one that opened a position.
    pub fn get(&self, kind: StrategyKind) -> &dyn Strategy {
        match kind {
            StrategyKind::TrendFollowing => &self.trend,
            StrategyKind::MeanReversion => &self.reversion,
        }
    }

    pub fn trend_following(&self) -> &TrendFollowingStrategy {
        &self.trend
    }

    pub fn mean_reversion(&self) -> &MeanReversionStrategy {
        &self.reversion
    }

    pub fn list(&self) -> Vec<StrategyInfo> {
        let info = |strategy: &dyn Strategy, regime, config: serde_json::Value| StrategyInfo {
            kind: strategy.kind(),
            name: strategy.name().to_string(),
            description: strategy.description().to_string(),
            regime,
            max_holding_cycles: strategy.max_holding_cycles(),
            config,
        };
        vec![
            info(
                &self.trend,
                MarketRegime::Trending,
                serde_json::to_value(self.trend.config()).unwrap_or_default(),
            ),
            info(
                &self.reversion,
                MarketRegime::Ranging,
                serde_json::to_value(self.reversion.config()).unwrap_or_default(),
            ),
        ]
    }

    /// Entry checklists for every strategy and direction.
    pub fn readiness(&self, snapshot: &IndicatorSnapshot, regime: &RegimeState) -> Vec<SignalReadiness> {
        let mut all = Vec::with_capacity(4);
        for direction in [Direction::Long, Direction::Short] {
            all.push(self.trend.entry_conditions(snapshot, regime, direction));
        }
        for direction in [Direction::Long, Direction::Short] {
            all.push(self.reversion.entry_conditions(snapshot, regime, direction));
        }
        all
    }

    /// The checklist closest to producing an entry.
    pub fn best_opportunity(&self, snapshot: &IndicatorSnapshot, regime: &RegimeState) -> Option<SignalReadiness> {
        best_opportunity(&self.readiness(snapshot, regime)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regime(regime: MarketRegime) -> RegimeState {
        RegimeState {
            regime,
            ..RegimeState::unknown()
        }
    }

    #[test]
    fn test_select_by_regime() {
        let set = StrategySet::default();
        assert_eq!(set.select(&regime(MarketRegime::Trending)).map(|s| s.kind()), Some(StrategyKind::TrendFollowing));
        assert_eq!(set.select(&regime(MarketRegime::Ranging)).map(|s| s.kind()), Some(StrategyKind::MeanReversion));
        assert!(set.select(&regime(MarketRegime::Unknown)).is_none());
    }

    #[test]
    fn test_get_by_kind() {
        let set = StrategySet::default();
        for kind in StrategyKind::all() {
            assert_eq!(set.get(*kind).kind(), *kind);
        }
    }

    #[test]
    fn test_list() {
        let list = StrategySet::default().list();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "trend_following");
        assert_eq!(list[1].max_holding_cycles, Some(16));
        assert_eq!(list[1].config["rsi_oversold"], serde_json::json!(25.0));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let reversion = MeanReversionConfig {
            max_holding_cycles: 0,
            ..Default::default()
        };
        assert!(StrategySet::new(TrendFollowingConfig::default(), reversion).is_err());
    }

    #[test]
    fn test_readiness_covers_all_four() {
        let set = StrategySet::default();
        let snapshot = IndicatorSnapshot::neutral(100.0, 0);
        let all = set.readiness(&snapshot, &regime(MarketRegime::Ranging));
        assert_eq!(all.len(), 4);
        assert!(all.iter().all(|r| !r.is_ready()));

        let best = set.best_opportunity(&snapshot, &regime(MarketRegime::Ranging)).unwrap();
        assert_eq!(best.strategy, StrategyKind::MeanReversion);
    }
}
