//! Robust default intensity range from a strided sample of a 2D grid.

use crate::config::SamplingConfig;
use crate::domain::logging::LogComponent;
use crate::log_debug;

/// Read access to a rectangular grid of intensities.
///
/// `cols` is the width of the first row; later rows may be shorter, missing,
/// or hold non-numeric entries, all of which read as `None`.
pub trait IntensityGrid {
    fn rows(&self) -> usize;
    fn cols(&self) -> usize;
    fn value(&self, row: usize, col: usize) -> Option<f64>;
}

impl IntensityGrid for [Vec<f64>] {
    fn rows(&self) -> usize {
        self.len()
    }

    fn cols(&self) -> usize {
        self.first().map_or(0, Vec::len)
    }

    fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.get(row)?.get(col).copied()
    }
}

impl IntensityGrid for Vec<Vec<f64>> {
    fn rows(&self) -> usize {
        self.as_slice().rows()
    }

    fn cols(&self) -> usize {
        self.as_slice().cols()
    }

    fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.as_slice().value(row, col)
    }
}

/// Row-major grid backed by one contiguous buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseGrid {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl DenseGrid {
    /// Returns `None` when `values` does not hold exactly `rows * cols` entries.
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> Option<Self> {
        (rows.checked_mul(cols)? == values.len()).then_some(Self { rows, cols, values })
    }

    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut values = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                values.push(f(r, c));
            }
        }
        Self { rows, cols, values }
    }
}

impl IntensityGrid for DenseGrid {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn value(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.values.get(row * self.cols + col).copied()
    }
}

/// Data-derived display range. Always satisfies `max > min` with a finite
/// width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseRange {
    pub min: f64,
    pub max: f64,
}

impl Default for BaseRange {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl BaseRange {
    /// Falls back to `[0, 1]` unless `high > low` and `high - low` is finite.
    pub fn from_percentiles(low: f64, high: f64) -> Self {
        if high > low && (high - low).is_finite() {
            Self { min: low, max: high }
        } else {
            Self::default()
        }
    }

    pub fn center(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// Interpolated percentile of an ascending slice; `0` for an empty slice.
/// `p` is clamped to `[0, 1]`, and NaN reads as `0`.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
    let idx = (sorted.len() - 1) as f64 * p;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let t = idx - lo as f64;
    sorted[lo] * (1.0 - t) + sorted[hi] * t
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sampler {
    target: usize,
    low: f64,
    high: f64,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(&SamplingConfig::default())
    }
}

impl Sampler {
    pub fn new(config: &SamplingConfig) -> Self {
        Self {
            target: config.target.max(1),
            low: config.low_percentile,
            high: config.high_percentile,
        }
    }

    /// `max(1, floor(sqrt(rows * cols / target)))`
    pub fn stride(&self, rows: usize, cols: usize) -> usize {
        let total = rows as f64 * cols as f64;
        ((total / self.target as f64).sqrt().floor() as usize).max(1)
    }

    /// Finite values from every `stride`-th row and column, in grid order.
    pub fn sample<G: IntensityGrid + ?Sized>(&self, grid: &G) -> Vec<f64> {
        let rows = grid.rows();
        let cols = grid.cols();
        if rows == 0 || cols == 0 {
            return Vec::new();
        }

        let stride = self.stride(rows, cols);
        let mut out = Vec::with_capacity(rows.div_ceil(stride) * cols.div_ceil(stride));
        for r in (0..rows).step_by(stride) {
            for c in (0..cols).step_by(stride) {
                if let Some(v) = grid.value(r, c).filter(|v| v.is_finite()) {
                    out.push(v);
                }
            }
        }
        out
    }

    /// Low/high percentiles of the sample, with the `[0, 1]` fallback.
    pub fn robust_range<G: IntensityGrid + ?Sized>(&self, grid: &G) -> BaseRange {
        let mut samples = self.sample(grid);
        sort_samples(&mut samples);

        let low = percentile(&samples, self.low);
        let high = percentile(&samples, self.high);
        let range = BaseRange::from_percentiles(low, high);
        log_debug!(
            LogComponent::Domain("Sampler"),
            "{}x{} grid, {} samples, percentiles [{}, {}] -> [{}, {}]",
            grid.rows(),
            grid.cols(),
            samples.len(),
            low,
            high,
            range.min,
            range.max
        );
        range
    }
}

#[cfg(not(feature = "parallel"))]
fn sort_samples(samples: &mut [f64]) {
    samples.sort_unstable_by(f64::total_cmp);
}

#[cfg(feature = "parallel")]
fn sort_samples(samples: &mut [f64]) {
    use rayon::prelude::*;
    samples.par_sort_unstable_by(f64::total_cmp);
}
