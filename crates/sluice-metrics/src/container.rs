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

//! Per-scope metric accumulators.

use crate::cells::{CounterCell, DistributionCell, GaugeCell};
use sluice_core::metrics::data::{DistributionData, GaugeData};
use sluice_core::metrics::descriptor::{
    self, DescriptorLabels, DescriptorValue, MetricDescriptor,
};
use sluice_core::metrics::name::MetricName;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A mutable accumulator for all metrics of one scope.
///
/// A container is scoped either to a named pipeline step or to the reserved
/// unbound scope. It holds one cell per distinct metric name, separately per
/// kind, created lazily on first access and never removed. A container is
/// typically owned by exactly one worker while it executes and folded into a
/// [`crate::StepMetricsRegistry`] at completion or checkpoint time.
///
/// Cell-level updates are safe under concurrent invocation; whole-container
/// operations (`update`, `reset`, `snapshot`) proceed cell by cell, so a
/// concurrent reader may observe a partially applied state. Metrics
/// reporting is best-effort and this relaxation is accepted.
#[derive(Debug)]
pub struct MetricsContainer {
    step: Option<String>,
    counters: RwLock<HashMap<MetricName, Arc<CounterCell>>>,
    distributions: RwLock<HashMap<MetricName, Arc<DistributionCell>>>,
    gauges: RwLock<HashMap<MetricName, Arc<GaugeCell>>>,
}

/// An immutable point-in-time copy of a container, safe to read while the
/// source keeps changing.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSnapshot {
    /// The scope the container belongs to.
    pub step: Option<String>,
    /// Counter sums by name.
    pub counters: HashMap<MetricName, i64>,
    /// Distribution statistics by name.
    pub distributions: HashMap<MetricName, DistributionData>,
    /// Latest gauge observations by name; `None` for tracked-but-unset.
    pub gauges: HashMap<MetricName, Option<GaugeData>>,
}

impl MetricsContainer {
    /// Creates a container scoped to a named pipeline step.
    pub fn bound(step: impl Into<String>) -> Self {
        Self::with_step(Some(step.into()))
    }

    /// Creates a container for the unbound scope.
    pub fn unbound() -> Self {
        Self::with_step(None)
    }

    fn with_step(step: Option<String>) -> Self {
        Self {
            step,
            counters: RwLock::new(HashMap::new()),
            distributions: RwLock::new(HashMap::new()),
            gauges: RwLock::new(HashMap::new()),
        }
    }

    /// The step this container is scoped to, or `None` for the unbound
    /// scope.
    pub fn step(&self) -> Option<&str> {
        self.step.as_deref()
    }

    /// Gets or creates the counter cell for `name`. Idempotent.
    pub fn counter(&self, name: &MetricName) -> Arc<CounterCell> {
        if let Some(cell) = self.counters.read().unwrap().get(name) {
            return cell.clone();
        }
        let mut counters = self.counters.write().unwrap();
        counters
            .entry(name.clone())
            .or_insert_with(|| {
                log::trace!("creating counter cell {name}");
                Arc::new(CounterCell::new())
            })
            .clone()
    }

    /// Gets or creates the distribution cell for `name`.
    ///
    /// The percentile targets are fixed at first use; re-requesting the same
    /// name with a different target set unions the sets.
    pub fn distribution(&self, name: &MetricName, targets: &[f64]) -> Arc<DistributionCell> {
        if let Some(cell) = self.distributions.read().unwrap().get(name) {
            cell.merge_targets(targets);
            return cell.clone();
        }
        let mut distributions = self.distributions.write().unwrap();
        distributions
            .entry(name.clone())
            .or_insert_with(|| {
                log::trace!("creating distribution cell {name}");
                Arc::new(DistributionCell::new(targets))
            })
            .clone()
    }

    /// Gets or creates the gauge cell for `name`. Idempotent.
    pub fn gauge(&self, name: &MetricName) -> Arc<GaugeCell> {
        if let Some(cell) = self.gauges.read().unwrap().get(name) {
            return cell.clone();
        }
        let mut gauges = self.gauges.write().unwrap();
        gauges
            .entry(name.clone())
            .or_insert_with(|| {
                log::trace!("creating gauge cell {name}");
                Arc::new(GaugeCell::new())
            })
            .clone()
    }

    /// Merges every cell of `source` into the matching cell of `self`,
    /// creating cells for names not yet present.
    ///
    /// The caller retains ownership of `source`; merging the same container
    /// repeatedly accumulates its values each time.
    pub fn update(&self, source: &MetricsContainer) {
        self.update_from_snapshot(&source.snapshot());
    }

    pub(crate) fn update_from_snapshot(&self, source: &ContainerSnapshot) {
        for (name, value) in &source.counters {
            self.counter(name).merge_value(*value);
        }
        for (name, data) in &source.distributions {
            self.distribution(name, &data.percentile_targets).merge(data);
        }
        for (name, update) in &source.gauges {
            let cell = self.gauge(name);
            if let Some(update) = update {
                cell.merge(*update);
            }
        }
    }

    /// Resets every owned cell to its identity element. No cell is removed.
    pub fn reset(&self) {
        for cell in self.counters.read().unwrap().values() {
            cell.reset();
        }
        for cell in self.distributions.read().unwrap().values() {
            cell.reset();
        }
        for cell in self.gauges.read().unwrap().values() {
            cell.reset();
        }
    }

    /// Captures an immutable point-in-time copy of every cell.
    pub fn snapshot(&self) -> ContainerSnapshot {
        let counters = self
            .counters
            .read()
            .unwrap()
            .iter()
            .map(|(name, cell)| (name.clone(), cell.value()))
            .collect();
        let distributions = self
            .distributions
            .read()
            .unwrap()
            .iter()
            .map(|(name, cell)| (name.clone(), cell.snapshot()))
            .collect();
        let gauges = self
            .gauges
            .read()
            .unwrap()
            .iter()
            .map(|(name, cell)| (name.clone(), cell.snapshot()))
            .collect();
        ContainerSnapshot {
            step: self.step.clone(),
            counters,
            distributions,
            gauges,
        }
    }

    /// Emits descriptor records for this container's cells.
    ///
    /// Bound containers describe every tracked cell. The unbound container
    /// only describes system-reserved metric names, without a step label;
    /// all other unbound metrics are dropped from descriptor output. A gauge
    /// that was tracked but never observed emits nothing.
    pub fn descriptors(&self) -> Vec<MetricDescriptor> {
        self.snapshot().descriptors()
    }
}

impl PartialEq for MetricsContainer {
    /// Structural equality over the snapshot. Presence matters: a cell
    /// created but still at its identity value distinguishes a container
    /// from one that never tracked the name.
    fn eq(&self, other: &Self) -> bool {
        self.snapshot() == other.snapshot()
    }
}

impl ContainerSnapshot {
    /// Descriptor records for this snapshot; see
    /// [`MetricsContainer::descriptors`].
    pub fn descriptors(&self) -> Vec<MetricDescriptor> {
        let step = self.step.as_deref();
        let reportable = |name: &MetricName| step.is_some() || descriptor::is_reserved(name);
        let mut records = Vec::new();

        for (name, value) in &self.counters {
            if !reportable(name) {
                continue;
            }
            records.push(MetricDescriptor {
                labels: DescriptorLabels::new(name, step),
                value: DescriptorValue::CounterSum { value: *value },
            });
        }
        for (name, data) in &self.distributions {
            if !reportable(name) {
                continue;
            }
            records.push(MetricDescriptor {
                labels: DescriptorLabels::new(name, step),
                value: DescriptorValue::Distribution {
                    sum: data.sum,
                    count: data.count,
                    min: if data.is_empty() { 0 } else { data.min },
                    max: if data.is_empty() { 0 } else { data.max },
                    percentiles: data.percentiles(),
                },
            });
        }
        for (name, observation) in &self.gauges {
            if !reportable(name) {
                continue;
            }
            if let Some(data) = observation {
                records.push(MetricDescriptor {
                    labels: DescriptorLabels::new(name, step),
                    value: DescriptorValue::GaugeLatest {
                        value: data.value,
                        timestamp_ms: data.timestamp_ms,
                    },
                });
            }
        }
        records
    }
}
