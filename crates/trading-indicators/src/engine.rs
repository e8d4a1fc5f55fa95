//! Two-timeframe indicator snapshot engine.
//!
//! | indicator          | timeframe |
//! |--------------------|-----------|
//! | Supertrend fast    | fast      |
//! | Supertrend slow    | slow      |
//! | EMA fast / slow    | fast      |
//! | RSI                | fast      |
//! | Bollinger Bands    | fast      |
//! | ADX, +DI, -DI      | slow      |
//! | ATR                | fast      |

use serde::{Deserialize, Serialize};
use tracing::debug;
use trading_core::error::IndicatorError;
use trading_core::traits::{Indicator, MultiOutputIndicator, OhlcIndicator};
use trading_core::{Bar, BandReading, BarSeries, IndicatorSnapshot, SupertrendReading, Timeframe};

use crate::fallback::FallbackLog;
use crate::momentum::Rsi;
use crate::moving_average::Ema;
use crate::trend::{Adx, Supertrend};
use crate::volatility::{Atr, BollingerBands, BollingerOutput};

/// Indicator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub supertrend_period: usize,
    pub supertrend_multiplier: f64,
    pub ema_fast_period: usize,
    pub ema_slow_period: usize,
    pub rsi_period: usize,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
    pub adx_period: usize,
    pub atr_period: usize,
    /// Bars required beyond the longest lookback
    pub warmup_buffer: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            supertrend_period: 10,
            supertrend_multiplier: 3.0,
            ema_fast_period: 20,
            ema_slow_period: 50,
            rsi_period: 14,
            bollinger_period: 20,
            bollinger_std_dev: 2.0,
            adx_period: 14,
            atr_period: 14,
            warmup_buffer: 10,
        }
    }
}

impl IndicatorConfig {
    /// Bars needed on each timeframe before a snapshot can be built.
    pub fn min_bars(&self) -> usize {
        [
            self.supertrend_period,
            self.ema_slow_period,
            self.bollinger_period,
            self.adx_period,
            self.atr_period,
        ]
        .into_iter()
        .max()
        .unwrap_or_default()
            + self.warmup_buffer
    }

    pub fn validate(&self) -> Result<(), IndicatorError> {
        let periods = [
            ("supertrend_period", self.supertrend_period),
            ("ema_fast_period", self.ema_fast_period),
            ("ema_slow_period", self.ema_slow_period),
            ("rsi_period", self.rsi_period),
            ("adx_period", self.adx_period),
            ("atr_period", self.atr_period),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(IndicatorError::InvalidParameter(format!("{} must be greater than 0", name)));
        }
        if self.bollinger_period < 2 {
            return Err(IndicatorError::InvalidParameter(
                "bollinger_period must be at least 2".to_string(),
            ));
        }
        if self.ema_fast_period >= self.ema_slow_period {
            return Err(IndicatorError::InvalidParameter(format!(
                "ema_fast_period ({}) must be less than ema_slow_period ({})",
                self.ema_fast_period, self.ema_slow_period
            )));
        }
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.supertrend_multiplier) || !positive(self.bollinger_std_dev) {
            return Err(IndicatorError::InvalidParameter(
                "supertrend_multiplier and bollinger_std_dev must be positive".to_string(),
            ));
        }
        // ADX needs two full periods of slow bars
        if 2 * self.adx_period > self.min_bars() {
            return Err(IndicatorError::InvalidParameter(format!(
                "adx_period {} needs {} bars but only {} are required; raise warmup_buffer",
                self.adx_period,
                2 * self.adx_period,
                self.min_bars()
            )));
        }
        Ok(())
    }
}

/// Builds an [`IndicatorSnapshot`] from a fast and a slow bar series.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
    supertrend: Supertrend,
    ema_fast: Ema,
    ema_slow: Ema,
    rsi: Rsi,
    bollinger: BollingerBands,
    adx: Adx,
    atr: Atr,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Result<Self, IndicatorError> {
        config.validate()?;
        Ok(Self {
            supertrend: Supertrend::new(config.supertrend_period, config.supertrend_multiplier),
            ema_fast: Ema::new(config.ema_fast_period),
            ema_slow: Ema::new(config.ema_slow_period),
            rsi: Rsi::new(config.rsi_period),
            bollinger: BollingerBands::new(config.bollinger_period, config.bollinger_std_dev),
            adx: Adx::new(config.adx_period),
            atr: Atr::new(config.atr_period),
            config,
        })
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    pub fn min_bars(&self) -> usize {
        self.config.min_bars()
    }

    /// Compute the snapshot for the latest fast bar.
    pub fn compute(&self, fast: &BarSeries, slow: &BarSeries) -> Result<IndicatorSnapshot, IndicatorError> {
        let fast_bars = self.check_series(fast.as_slice(), fast.timeframe)?;
        let slow_bars = self.check_series(slow.as_slice(), slow.timeframe)?;

        let last = fast_bars[fast_bars.len() - 1];
        let price = last.close;
        if !price.is_finite() || price <= 0.0 {
            return Err(IndicatorError::InvalidPrice { price });
        }

        let (fast_high, fast_low, fast_close) = columns(fast_bars);
        let (slow_high, slow_low, slow_close) = columns(slow_bars);

        let mut log = FallbackLog::new();

        let supertrend_fast = log.latest_by(
            "supertrend_fast",
            &self.supertrend.calculate(&fast_high, &fast_low, &fast_close),
            supertrend_is_finite,
            |r| r.value,
            SupertrendReading::flat(price),
        );
        let supertrend_slow = log.latest_by(
            "supertrend_slow",
            &self.supertrend.calculate(&slow_high, &slow_low, &slow_close),
            supertrend_is_finite,
            |r| r.value,
            SupertrendReading::flat(price),
        );

        let ema_fast = log.latest("ema_fast", &self.ema_fast.calculate(&fast_close), price);
        let ema_slow = log.latest("ema_slow", &self.ema_slow.calculate(&fast_close), price);
        let rsi = log.latest("rsi", &self.rsi.calculate(&fast_close), 50.0);

        let bands = log.latest_by(
            "bollinger",
            &self.bollinger.calculate(&fast_close),
            BollingerOutput::is_finite,
            |b| b.middle,
            BollingerOutput {
                upper: price,
                middle: price,
                lower: price,
                bandwidth: 0.0,
                percent_b: 0.5,
            },
        );
        let bollinger = BandReading::from_bands(bands.upper, bands.middle, bands.lower, price);

        let adx_values = self.adx.calculate(&slow_high, &slow_low, &slow_close);
        let adx = log.latest("adx", &project(&adx_values, |o| o.adx), 20.0);
        let plus_di = log.latest("plus_di", &project(&adx_values, |o| o.plus_di), 20.0);
        let minus_di = log.latest("minus_di", &project(&adx_values, |o| o.minus_di), 20.0);

        let atr = log.latest("atr", &self.atr.calculate(&fast_high, &fast_low, &fast_close), price * 0.02);

        let fallbacks = log.into_entries();
        debug!(
            symbol = %fast.symbol,
            price,
            adx,
            rsi,
            atr,
            fallbacks = fallbacks.len(),
            "Indicator snapshot computed"
        );

        Ok(IndicatorSnapshot {
            timestamp: last.timestamp,
            current_price: price,
            high: last.high,
            low: last.low,
            supertrend_fast,
            supertrend_slow,
            ema_fast,
            ema_slow,
            rsi,
            bollinger,
            adx,
            plus_di,
            minus_di,
            atr,
            atr_percent: atr / price,
            fallbacks,
        })
    }

    fn check_series<'a>(&self, bars: &'a [Bar], timeframe: Timeframe) -> Result<&'a [Bar], IndicatorError> {
        let required = self.min_bars();
        if bars.len() < required {
            return Err(IndicatorError::InsufficientBars {
                timeframe,
                required,
                available: bars.len(),
            });
        }
        if let Some(index) = bars.windows(2).position(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(IndicatorError::UnorderedBars {
                timeframe,
                index: index + 1,
            });
        }
        Ok(bars)
    }
}

fn columns(bars: &[Bar]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let high = bars.iter().map(|b| b.high).collect();
    let low = bars.iter().map(|b| b.low).collect();
    let close = bars.iter().map(|b| b.close).collect();
    (high, low, close)
}

fn project<T>(values: &[T], field: impl Fn(&T) -> f64) -> Vec<f64> {
    values.iter().map(field).collect()
}

fn supertrend_is_finite(reading: &SupertrendReading) -> bool {
    reading.value.is_finite() && reading.upper_band.is_finite() && reading.lower_band.is_finite()
}
