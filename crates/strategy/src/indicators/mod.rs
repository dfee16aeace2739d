pub mod atr;
pub mod ma;
pub mod macd;
pub mod rsi;

pub use atr::AtrIndicator;
pub use ma::MovingAverage;
pub use macd::{MacdIndicator, MacdSeries};
pub use rsi::RsiIndicator;

use serde::{Deserialize, Serialize};

use common::{Candle, Error, Result};

/// Indicator windows (`[indicators]` in the strategy file).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub ma_fast: usize,
    pub ma_slow: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ma_fast: 50,
            ma_slow: 200,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            atr_period: 14,
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ma_fast == 0 || self.ma_slow == 0 || self.atr_period == 0 || self.macd_signal == 0
        {
            return Err(Error::Config("indicator windows must be >= 1".into()));
        }
        if self.rsi_period < 2 {
            return Err(Error::Config("rsi_period must be >= 2".into()));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(Error::Config("macd_fast must be less than macd_slow".into()));
        }
        Ok(())
    }

    pub fn atr(&self) -> AtrIndicator {
        AtrIndicator::new(self.atr_period)
    }
}

/// Indicator values at one candle index, all available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub ma_fast: f64,
    pub ma_slow: f64,
    pub rsi: f64,
    pub macd: f64,
    pub signal: f64,
}

/// Every indicator the strategy reads, aligned index-for-index with the
/// candle series it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub ma_fast: Vec<Option<f64>>,
    pub ma_slow: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub atr: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn compute(candles: &[Candle], cfg: &IndicatorConfig) -> Self {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let MacdSeries { macd, signal } =
            MacdIndicator::new(cfg.macd_fast, cfg.macd_slow, cfg.macd_signal).series(&closes);

        Self {
            ma_fast: MovingAverage::new(cfg.ma_fast).series(&closes),
            ma_slow: MovingAverage::new(cfg.ma_slow).series(&closes),
            rsi: RsiIndicator::new(cfg.rsi_period).series(&closes),
            macd,
            signal,
            atr: cfg.atr().series(candles),
        }
    }

    pub fn len(&self) -> usize {
        self.macd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macd.is_empty()
    }

    /// The snapshot at `index`, or `DataUnavailable` naming the first
    /// indicator whose window has not filled there.
    pub fn snapshot_at(&self, index: usize) -> Result<IndicatorSnapshot> {
        Ok(IndicatorSnapshot {
            ma_fast: required(&self.ma_fast, index, "MA fast")?,
            ma_slow: required(&self.ma_slow, index, "MA slow")?,
            rsi: required(&self.rsi, index, "RSI")?,
            macd: present(&self.macd, index, "MACD")?,
            signal: present(&self.signal, index, "Signal")?,
        })
    }

    pub fn snapshot(&self, index: usize) -> Option<IndicatorSnapshot> {
        self.snapshot_at(index).ok()
    }

    /// ATR on the final candle: the single value used for sizing.
    pub fn last_atr(&self) -> Option<f64> {
        self.atr.last().copied().flatten()
    }
}

fn required(series: &[Option<f64>], index: usize, indicator: &'static str) -> Result<f64> {
    series
        .get(index)
        .copied()
        .flatten()
        .ok_or(Error::DataUnavailable { indicator, index })
}

fn present(series: &[f64], index: usize, indicator: &'static str) -> Result<f64> {
    series
        .get(index)
        .copied()
        .ok_or(Error::DataUnavailable { indicator, index })
}
