//! Fixed-width weight histogram with a mean-weight overlay.
//!
//! Only strictly-positive weights take part. The value range is split into
//! [`BIN_COUNT`] equal-width bins; the maximum lands in the last bin. When
//! every weight is identical the range is widened to 1 so all values fall
//! into the first bin, and the mean overlay is omitted.

use serde::Serialize;

use crate::config::WeightUnit;

/// Number of histogram bins.
pub const BIN_COUNT: usize = 15;

/// One histogram bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    /// `"{start}-{end}"`, bounds rounded to the display unit's precision.
    pub range_label: String,
    pub count: usize,
}

/// Histogram of the positive weights in a result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub min_weight: f64,
    pub max_weight: f64,
    pub step: f64,
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    /// Build the histogram, labelling bins at `unit`'s precision. Returns
    /// `None` when no weight is `> 0`.
    pub fn build<I>(weights: I, unit: WeightUnit) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let valid: Vec<f64> = weights.into_iter().filter(|w| *w > 0.0).collect();
        if valid.is_empty() {
            return None;
        }

        let min_weight = valid.iter().copied().fold(f64::INFINITY, f64::min);
        let max_weight = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = match max_weight - min_weight {
            r if r == 0.0 => 1.0,
            r => r,
        };
        let step = range / BIN_COUNT as f64;

        let mut bins: Vec<HistogramBin> = (0..BIN_COUNT)
            .map(|i| {
                let start = min_weight + i as f64 * step;
                let end = min_weight + (i + 1) as f64 * step;
                HistogramBin {
                    range_label: format!("{}-{}", unit.number(start), unit.number(end)),
                    count: 0,
                }
            })
            .collect();

        for w in &valid {
            bins[bin_index(*w, min_weight, step)].count += 1;
        }

        Some(Self {
            min_weight,
            max_weight,
            step,
            bins,
        })
    }

    /// Total number of weights binned.
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    /// Largest bin count, for scaling bars.
    pub fn peak(&self) -> usize {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }

    /// Horizontal position of `avg_weight` as a fraction of the value range,
    /// clamped to `[0, 1]`. `None` for a degenerate (single-value) histogram.
    pub fn mean_ratio(&self, avg_weight: f64) -> Option<f64> {
        if self.max_weight == self.min_weight {
            return None;
        }
        let ratio = (avg_weight - self.min_weight) / (self.max_weight - self.min_weight);
        Some(ratio.clamp(0.0, 1.0))
    }
}

/// Bin for a value, clamped so that `w == max` stays in the last bin.
pub fn bin_index(w: f64, min_weight: f64, step: f64) -> usize {
    let idx = ((w - min_weight) / step).floor();
    if idx <= 0.0 {
        0
    } else {
        (idx as usize).min(BIN_COUNT - 1)
    }
}

/// Map an overlay ratio onto a rendered span starting at `left`.
pub fn overlay_x(ratio: f64, left: f64, width: f64) -> f64 {
    left + width * ratio
}
