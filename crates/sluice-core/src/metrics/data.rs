// Copyright 2025 sluice contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per-kind metric values, their identity elements, and combine operators.
//!
//! Counter and distribution combines are total, commutative, and
//! associative. The gauge combine is order-sensitive and documented as such
//! on [`GaugeData::combine`].

use serde::{Deserialize, Serialize};

/// The identity element for counters.
pub const COUNTER_IDENTITY: i64 = 0;

/// Combines two counter sums.
///
/// Addition, saturating at the `i64` bounds. Commutative and associative.
pub fn combine_counters(a: i64, b: i64) -> i64 {
    a.saturating_add(b)
}

/// An estimated percentile value for one configured target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileValue {
    /// The percentile target, in percent (e.g., `90.0`).
    pub target: f64,
    /// The estimated value at that percentile.
    pub value: f64,
}

/// The running statistics of a distribution metric.
///
/// Tracks sum, count, min, and max of all observed samples plus the fixed
/// set of percentile targets configured at first use. Estimated percentile
/// values are never stored; they are recomputed from the merged statistics
/// by [`DistributionData::percentiles`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionData {
    /// Sum of all observed samples.
    pub sum: i64,
    /// Number of observed samples.
    pub count: i64,
    /// Smallest observed sample, `i64::MAX` when empty.
    pub min: i64,
    /// Largest observed sample, `i64::MIN` when empty.
    pub max: i64,
    /// Percentile targets in percent, sorted ascending, deduplicated.
    pub percentile_targets: Vec<f64>,
}

impl DistributionData {
    /// The identity element: no samples, no targets.
    pub fn identity() -> Self {
        Self {
            sum: 0,
            count: 0,
            min: i64::MAX,
            max: i64::MIN,
            percentile_targets: Vec::new(),
        }
    }

    /// An empty distribution carrying the given percentile targets.
    pub fn with_targets(targets: &[f64]) -> Self {
        let mut data = Self::identity();
        data.merge_targets(targets);
        data
    }

    /// Returns `true` when no sample has been observed.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Folds a single observed sample into the statistics.
    pub fn update(&mut self, sample: i64) {
        self.sum = self.sum.saturating_add(sample);
        self.count += 1;
        self.min = self.min.min(sample);
        self.max = self.max.max(sample);
    }

    /// Merges another distribution into this one.
    ///
    /// Elementwise: sum-of-sums, sum-of-counts, min-of-mins, max-of-maxes.
    /// Percentile target sets merge by set union. Commutative and
    /// associative over the tracked statistics.
    pub fn combine(&mut self, other: &DistributionData) {
        debug_assert!(other.count >= 0, "negative distribution count");
        self.sum = self.sum.saturating_add(other.sum);
        self.count += other.count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.merge_targets(&other.percentile_targets);
    }

    /// Adds percentile targets, keeping the set sorted and deduplicated.
    pub fn merge_targets(&mut self, targets: &[f64]) {
        for &target in targets {
            debug_assert!(
                target.is_finite() && target > 0.0 && target <= 100.0,
                "percentile target out of range: {target}"
            );
            if !self.percentile_targets.contains(&target) {
                self.percentile_targets.push(target);
            }
        }
        self.percentile_targets.sort_by(f64::total_cmp);
    }

    /// The mean of the observed samples, or `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum as f64 / self.count as f64)
        }
    }

    /// Estimates a value for every configured percentile target.
    ///
    /// The estimator is nearest-rank over an assumed uniform spacing of
    /// `count` samples across `[min, max]`: for a target `q` the rank is
    /// `ceil(q/100 * count)` and the estimate is
    /// `min + (max - min) * (rank - 1) / (count - 1)`.
    ///
    /// Deterministic given the merged statistics, but approximate: the true
    /// sample positions are not retained across merges, so arbitrary
    /// histograms are not reproduced exactly. An empty distribution yields
    /// no values.
    pub fn percentiles(&self) -> Vec<PercentileValue> {
        debug_assert!(self.count >= 0, "negative distribution count");
        if self.count <= 0 || self.percentile_targets.is_empty() {
            return Vec::new();
        }
        let count = self.count as f64;
        let span = (self.max as f64) - (self.min as f64);
        self.percentile_targets
            .iter()
            .map(|&target| {
                let rank = (target / 100.0 * count).ceil().max(1.0);
                let value = if self.count == 1 {
                    self.min as f64
                } else {
                    self.min as f64 + span * (rank - 1.0) / (count - 1.0)
                };
                PercentileValue { target, value }
            })
            .collect()
    }
}

impl Default for DistributionData {
    fn default() -> Self {
        Self::identity()
    }
}

/// The latest observed value of a gauge, with its wall-clock timestamp.
///
/// Timestamps are epoch milliseconds so observations from different workers
/// order consistently and serialize directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaugeData {
    /// The observed value.
    pub value: i64,
    /// Wall-clock time of the observation, in milliseconds since the epoch.
    pub timestamp_ms: i64,
}

impl GaugeData {
    /// Creates a gauge observation.
    pub fn new(value: i64, timestamp_ms: i64) -> Self {
        Self {
            value,
            timestamp_ms,
        }
    }

    /// Combines the current gauge state with a newly applied operand.
    ///
    /// The operand with the later timestamp wins. On an exact timestamp tie
    /// the newly applied operand (`update`) wins, so the result depends on
    /// merge order. This combine is intentionally neither commutative nor
    /// associative; the identity is the empty state (`None`).
    pub fn combine(current: Option<GaugeData>, update: GaugeData) -> GaugeData {
        match current {
            Some(cur) if cur.timestamp_ms > update.timestamp_ms => cur,
            _ => update,
        }
    }
}
