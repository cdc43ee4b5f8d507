use serde::{Deserialize, Serialize};

/// Running mean and variance (Welford).
#[derive(Debug, Default, Clone)]
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

impl Accumulator {
    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;
        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;
        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn n_vals(&self) -> usize {
        self.n_vals
    }

    pub fn mean(&self) -> f64 {
        if self.n_vals == 0 { f64::NAN } else { self.mean }
    }

    /// Sample variance.
    pub fn var(&self) -> f64 {
        if self.n_vals < 2 {
            return f64::NAN;
        }
        self.diff_2_sum / (self.n_vals - 1) as f64
    }
}

/// Summary of a recorded time series.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesReport {
    pub mean: f64,
    pub std_dev: f64,
    pub sem: f64,
    pub peak: f64,
    pub peak_step: usize,
    pub last: f64,
}

/// Values of an observable indexed by simulation step.
#[derive(Debug, Default)]
pub struct TimeSeries {
    steps: Vec<usize>,
    vals: Vec<f64>,
}

impl TimeSeries {
    pub fn push(&mut self, step: usize, val: f64) {
        self.steps.push(step);
        self.vals.push(val);
    }

    pub fn report(&self) -> SeriesReport {
        let mut acc = Accumulator::default();
        self.vals.iter().for_each(|&val| acc.add(val));

        let (peak_step, peak) = self
            .steps
            .iter()
            .zip(&self.vals)
            .fold((0, f64::NAN), |(best_step, best), (&step, &val)| {
                if best.is_nan() || val > best {
                    (step, val)
                } else {
                    (best_step, best)
                }
            });

        SeriesReport {
            mean: acc.mean(),
            std_dev: acc.var().sqrt(),
            sem: compute_sem(&self.vals),
            peak,
            peak_step,
            last: self.vals.last().copied().unwrap_or(f64::NAN),
        }
    }
}

/// Standard error of the mean from non-overlapping batch means.
///
/// Batching absorbs the correlation between consecutive records as long as a
/// batch is longer than the correlation time.
fn compute_sem(vals: &[f64]) -> f64 {
    const MAX_BATCHES: usize = 16;
    let n_batches = MAX_BATCHES.min(vals.len());
    if n_batches < 2 {
        return f64::NAN;
    }
    let batch_len = vals.len() / n_batches;

    let mut acc = Accumulator::default();
    for batch in vals.chunks_exact(batch_len).take(n_batches) {
        acc.add(batch.iter().sum::<f64>() / batch_len as f64);
    }
    (acc.var() / acc.n_vals() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_matches_direct_formulas() {
        let mut acc = Accumulator::default();
        for val in [1.0, 2.0, 4.0, 7.0] {
            acc.add(val);
        }
        assert!((acc.mean() - 3.5).abs() < 1e-12);
        assert!((acc.var() - 7.0).abs() < 1e-12);
    }

    #[test]
    fn report_finds_peak() {
        let mut series = TimeSeries::default();
        for (step, val) in [(4, 0.1), (8, 0.6), (12, 0.3), (16, 0.0)] {
            series.push(step, val);
        }
        let report = series.report();
        assert_eq!(report.peak, 0.6);
        assert_eq!(report.peak_step, 8);
        assert_eq!(report.last, 0.0);
        assert!((report.mean - 0.25).abs() < 1e-12);
        assert!(report.sem.is_finite());
    }

    #[test]
    fn empty_series_reports_nan() {
        let report = TimeSeries::default().report();
        assert!(report.mean.is_nan());
        assert!(report.sem.is_nan());
        assert!(report.peak.is_nan());
    }
}
