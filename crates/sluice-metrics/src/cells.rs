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

//! Concurrent single-metric cells.
//!
//! A cell holds one metric's running value and is safe to update from many
//! worker threads without external locking. Every operation touches exactly
//! one cell, so there is no cross-cell lock ordering anywhere in the system.

use sluice_core::metrics::data::{DistributionData, GaugeData};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// A counter cell: an `i64` running sum.
#[derive(Debug, Default)]
pub struct CounterCell {
    value: AtomicI64,
}

impl CounterCell {
    pub(crate) fn new() -> Self {
        Self {
            value: AtomicI64::new(0),
        }
    }

    /// Adds `delta` to the running sum.
    pub fn inc(&self, delta: i64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    /// Subtracts `delta` from the running sum.
    pub fn dec(&self, delta: i64) {
        self.inc(-delta);
    }

    /// The current sum.
    pub fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    pub(crate) fn merge_value(&self, value: i64) {
        self.value.fetch_add(value, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

/// A distribution cell: merged sample statistics plus the percentile
/// targets configured at first use.
#[derive(Debug)]
pub struct DistributionCell {
    data: Mutex<DistributionData>,
}

impl DistributionCell {
    pub(crate) fn new(targets: &[f64]) -> Self {
        Self {
            data: Mutex::new(DistributionData::with_targets(targets)),
        }
    }

    /// Records one observed sample.
    pub fn update(&self, sample: i64) {
        self.data.lock().unwrap().update(sample);
    }

    /// A point-in-time copy of the statistics.
    pub fn snapshot(&self) -> DistributionData {
        self.data.lock().unwrap().clone()
    }

    pub(crate) fn merge(&self, other: &DistributionData) {
        self.data.lock().unwrap().combine(other);
    }

    pub(crate) fn merge_targets(&self, targets: &[f64]) {
        self.data.lock().unwrap().merge_targets(targets);
    }

    /// Resets the statistics to identity. The configured percentile targets
    /// are cell configuration, not data, and survive the reset.
    pub(crate) fn reset(&self) {
        let mut data = self.data.lock().unwrap();
        let targets = std::mem::take(&mut data.percentile_targets);
        *data = DistributionData::identity();
        data.percentile_targets = targets;
    }
}

/// A gauge cell: the latest observed value, or empty before the first
/// observation.
#[derive(Debug, Default)]
pub struct GaugeCell {
    data: Mutex<Option<GaugeData>>,
}

impl GaugeCell {
    pub(crate) fn new() -> Self {
        Self {
            data: Mutex::new(None),
        }
    }

    /// Records an observation stamped with the current wall-clock time.
    pub fn set(&self, value: i64) {
        self.set_at(value, now_ms());
    }

    /// Records an observation with an explicit wall-clock timestamp.
    pub fn set_at(&self, value: i64, timestamp_ms: i64) {
        *self.data.lock().unwrap() = Some(GaugeData::new(value, timestamp_ms));
    }

    /// The latest observation, or `None` when never set.
    pub fn snapshot(&self) -> Option<GaugeData> {
        *self.data.lock().unwrap()
    }

    pub(crate) fn merge(&self, update: GaugeData) {
        let mut data = self.data.lock().unwrap();
        *data = Some(GaugeData::combine(*data, update));
    }

    pub(crate) fn reset(&self) {
        *self.data.lock().unwrap() = None;
    }
}

fn now_ms() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_millis() as i64,
        Err(_) => 0,
    }
}
