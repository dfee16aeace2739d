/// MACD (Moving Average Convergence/Divergence) indicator.
///
/// Computes: MACD line = EMA(fast) − EMA(slow), Signal = EMA(macd_line, signal).
/// Every EMA is seeded with the first value and uses `2 / (span + 1)` as its
/// weight, so both lines are defined from the first candle onwards.
#[derive(Debug, Clone)]
pub struct MacdIndicator {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

/// MACD and signal lines, aligned with the input closes.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

impl MacdIndicator {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast < slow, "MACD fast period must be less than slow period");
        assert!(signal >= 1, "MACD signal period must be >= 1");
        Self { fast, slow, signal }
    }

    pub fn series(&self, closes: &[f64]) -> MacdSeries {
        let fast = ema_series(closes, self.fast);
        let slow = ema_series(closes, self.slow);
        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ema_series(&macd, self.signal);
        MacdSeries { macd, signal }
    }
}

impl Default for MacdIndicator {
    fn default() -> Self {
        Self::new(12, 26, 9)
    }
}

/// Exponential moving average of `data` with smoothing span `span`, seeded
/// from the first element and without bias adjustment.
pub fn ema_series(data: &[f64], span: usize) -> Vec<f64> {
    let k = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(data.len());
    let mut iter = data.iter().copied();
    if let Some(first) = iter.next() {
        let mut ema_val = first;
        out.push(ema_val);
        for price in iter {
            ema_val = price * k + ema_val * (1.0 - k);
            out.push(ema_val);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending_up(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64 * 0.5).collect()
    }

    fn trending_down(n: usize) -> Vec<f64> {
        (0..n).map(|i| 200.0 - i as f64 * 0.5).collect()
    }

    #[test]
    fn ema_seeds_from_first_value() {
        // span 3 -> k = 0.5
        assert_eq!(ema_series(&[1.0, 2.0, 4.0], 3), vec![1.0, 1.5, 2.75]);
        assert!(ema_series(&[], 3).is_empty());
    }

    #[test]
    fn macd_available_from_first_candle() {
        let series = MacdIndicator::default().series(&[100.0, 101.0]);
        assert_eq!(series.macd.len(), 2);
        assert_eq!(series.signal.len(), 2);
        assert_eq!(series.macd[0], 0.0);
        assert_eq!(series.signal[0], 0.0);
    }

    #[test]
    fn macd_zero_on_flat_prices() {
        let series = MacdIndicator::default().series(&[42.0; 40]);
        assert!(series.macd.iter().all(|v| v.abs() < 1e-9));
        assert!(series.signal.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn macd_above_signal_in_uptrend() {
        let series = MacdIndicator::default().series(&trending_up(60));
        let last = series.macd.len() - 1;
        assert!(series.macd[last] > 0.0);
        assert!(series.macd[last] > series.signal[last]);
    }

    #[test]
    fn macd_below_signal_in_downtrend() {
        let series = MacdIndicator::default().series(&trending_down(60));
        let last = series.macd.len() - 1;
        assert!(series.macd[last] < 0.0);
        assert!(series.macd[last] < series.signal[last]);
    }

    #[test]
    #[should_panic(expected = "fast period must be less than slow")]
    fn macd_rejects_inverted_periods() {
        MacdIndicator::new(26, 12, 9);
    }
}
