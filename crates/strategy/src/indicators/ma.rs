/// Simple moving average over a trailing window.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    pub window: usize,
}

impl MovingAverage {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "moving average window must be >= 1");
        Self { window }
    }

    /// Mean of the `window` values ending at each index; `None` until the
    /// window fills.
    pub fn series(&self, values: &[f64]) -> Vec<Option<f64>> {
        let leading = (self.window - 1).min(values.len());
        let len = self.window as f64;
        let mut out = vec![None; leading];
        out.extend(
            values
                .windows(self.window)
                .map(|w| Some(w.iter().sum::<f64>() / len)),
        );
        out
    }
}
