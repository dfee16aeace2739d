/// RSI (Relative Strength Index) indicator.
///
/// Uses simple rolling means of gains and losses over `period` close-to-close
/// changes. The first candle has no predecessor and contributes a zero change,
/// so the first value is available at index `period - 1`.
#[derive(Debug, Clone)]
pub struct RsiIndicator {
    pub period: usize,
}

impl RsiIndicator {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "RSI period must be >= 2");
        Self { period }
    }

    /// RSI at every index of `closes` (oldest first).
    ///
    /// `None` before the window fills, and wherever both average gain and
    /// average loss are zero (a flat window has no defined strength).
    pub fn series(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let (gains, losses): (Vec<f64>, Vec<f64>) = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let change = if i == 0 { 0.0 } else { close - closes[i - 1] };
                (change.max(0.0), (-change).max(0.0))
            })
            .unzip();

        let period = self.period as f64;
        (0..closes.len())
            .map(|i| {
                if i + 1 < self.period {
                    return None;
                }
                let start = i + 1 - self.period;
                let avg_gain = gains[start..=i].iter().sum::<f64>() / period;
                let avg_loss = losses[start..=i].iter().sum::<f64>() / period;
                rsi_from_averages(avg_gain, avg_loss)
            })
            .collect()
    }

    /// RSI on the latest close, if available.
    pub fn compute(&self, closes: &[f64]) -> Option<f64> {
        self.series(closes).last().copied().flatten()
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        // Infinite strength saturates; 0/0 is undefined.
        return (avg_gain > 0.0).then_some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some((100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0))
}
