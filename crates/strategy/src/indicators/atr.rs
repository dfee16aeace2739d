use common::Candle;

use super::MovingAverage;

/// ATR proxy used for stop and target sizing.
///
/// The per-candle range is the absolute change in high plus the absolute
/// change in low against the previous candle (zero for the first candle),
/// averaged over `period` candles. This is not Wilder's True Range.
#[derive(Debug, Clone)]
pub struct AtrIndicator {
    pub period: usize,
}

impl AtrIndicator {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self { period }
    }

    pub fn series(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        MovingAverage::new(self.period).series(&range_proxy(candles))
    }

    /// ATR on the latest candle, if the window has filled.
    pub fn compute(&self, candles: &[Candle]) -> Option<f64> {
        self.series(candles).last().copied().flatten()
    }
}

fn range_proxy(candles: &[Candle]) -> Vec<f64> {
    std::iter::once(0.0)
        .take(candles.len())
        .chain(
            candles
                .windows(2)
                .map(|w| (w[1].high - w[0].high).abs() + (w[1].low - w[0].low).abs()),
        )
        .collect()
}
