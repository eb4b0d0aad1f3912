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

//! Query views over one or two registries.

use crate::step_map::StepMetricsRegistry;
use sluice_core::metrics::data::{DistributionData, GaugeData, COUNTER_IDENTITY};
use sluice_core::metrics::error::{MetricsError, MetricsResult};
use sluice_core::metrics::name::MetricKey;
use sluice_core::metrics::query::{MetricQueryResults, MetricResult, MetricsFilter};
use std::collections::HashMap;
use std::sync::Arc;

/// Options describing what the execution backend can report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryViewOptions {
    /// Whether the backend reports durably committed results in addition to
    /// attempted ones.
    pub supports_committed: bool,
}

/// A query view over aggregated metrics.
///
/// A closed set of two variants, so every consumer handles both cases
/// exhaustively: a backend either reports attempted values only, or
/// attempted and committed values side by side. Queries read the underlying
/// registries at call time; results are point-in-time and best-effort.
#[derive(Debug)]
pub enum MetricResults {
    /// Results built from a single registry of attempted values. Committed
    /// reads on any returned metric fail with
    /// [`MetricsError::CommittedUnsupported`].
    AttemptedOnly {
        /// Aggregate over every execution attempt, including retries.
        attempted: Arc<StepMetricsRegistry>,
    },
    /// Results carrying both views, each aggregated from its own registry
    /// by the same per-kind combine rules.
    AttemptedAndCommitted {
        /// Aggregate over every execution attempt, including retries.
        attempted: Arc<StepMetricsRegistry>,
        /// Aggregate over durably completed executions only.
        committed: Arc<StepMetricsRegistry>,
    },
}

impl MetricResults {
    /// A view for backends that only report attempted values.
    pub fn attempted_only(attempted: Arc<StepMetricsRegistry>) -> Self {
        Self::AttemptedOnly { attempted }
    }

    /// A view for backends that report both attempted and committed values.
    pub fn attempted_and_committed(
        attempted: Arc<StepMetricsRegistry>,
        committed: Arc<StepMetricsRegistry>,
    ) -> Self {
        Self::AttemptedAndCommitted {
            attempted,
            committed,
        }
    }

    /// Builds the view matching the backend's declared capabilities.
    ///
    /// Fails fast with [`MetricsError::MissingConfiguration`] when the
    /// options declare committed support but no committed registry was
    /// supplied; a silent fallback to attempted-only would misreport every
    /// committed read.
    pub fn from_options(
        options: &QueryViewOptions,
        attempted: Arc<StepMetricsRegistry>,
        committed: Option<Arc<StepMetricsRegistry>>,
    ) -> MetricsResult<Self> {
        if options.supports_committed {
            let committed =
                committed.ok_or(MetricsError::MissingConfiguration("committed registry"))?;
            Ok(Self::attempted_and_committed(attempted, committed))
        } else {
            Ok(Self::attempted_only(attempted))
        }
    }

    /// Queries every metric matching `filter`.
    ///
    /// An unknown step or name simply matches nothing; the result buckets
    /// are unordered sets with at most one entry per (namespace, name, step)
    /// triple.
    pub fn query_metrics(&self, filter: &MetricsFilter) -> MetricQueryResults {
        match self {
            Self::AttemptedOnly { attempted } => {
                let values = KeyedValues::collect(attempted, filter);
                MetricQueryResults {
                    counters: attempted_only_results(values.counters),
                    distributions: attempted_only_results(values.distributions),
                    gauges: attempted_only_results(values.gauges),
                }
            }
            Self::AttemptedAndCommitted {
                attempted,
                committed,
            } => {
                let attempted = KeyedValues::collect(attempted, filter);
                let committed = KeyedValues::collect(committed, filter);
                MetricQueryResults {
                    counters: union_results(attempted.counters, committed.counters, |_| {
                        COUNTER_IDENTITY
                    }),
                    distributions: union_results(
                        attempted.distributions,
                        committed.distributions,
                        |other| DistributionData::with_targets(&other.percentile_targets),
                    ),
                    gauges: union_results(attempted.gauges, committed.gauges, |_| None),
                }
            }
        }
    }

    /// Queries every metric of every step, bound and unbound.
    pub fn all_metrics(&self) -> MetricQueryResults {
        self.query_metrics(&MetricsFilter::all())
    }
}

/// Filtered per-kind values of one registry, keyed for the uniqueness
/// invariant: within a registry a (namespace, name, step) triple maps to
/// exactly one cell.
struct KeyedValues {
    counters: HashMap<MetricKey, i64>,
    distributions: HashMap<MetricKey, DistributionData>,
    gauges: HashMap<MetricKey, Option<GaugeData>>,
}

impl KeyedValues {
    fn collect(registry: &StepMetricsRegistry, filter: &MetricsFilter) -> Self {
        let mut counters = HashMap::new();
        let mut distributions = HashMap::new();
        let mut gauges = HashMap::new();
        for snapshot in registry.snapshots() {
            let step = snapshot.step.clone();
            for (name, value) in snapshot.counters {
                let key = MetricKey {
                    name,
                    step: step.clone(),
                };
                if filter.matches(&key) {
                    counters.insert(key, value);
                }
            }
            for (name, data) in snapshot.distributions {
                let key = MetricKey {
                    name,
                    step: step.clone(),
                };
                if filter.matches(&key) {
                    distributions.insert(key, data);
                }
            }
            for (name, observation) in snapshot.gauges {
                let key = MetricKey {
                    name,
                    step: step.clone(),
                };
                if filter.matches(&key) {
                    gauges.insert(key, observation);
                }
            }
        }
        Self {
            counters,
            distributions,
            gauges,
        }
    }
}

fn attempted_only_results<T>(values: HashMap<MetricKey, T>) -> Vec<MetricResult<T>> {
    values
        .into_iter()
        .map(|(key, attempted)| MetricResult::attempted_only(key, attempted))
        .collect()
}

/// Joins the two views on the union of their keys. A key present in only
/// one registry gets the identity element on the other side, derived from
/// the present value so distribution results keep their percentile targets.
fn union_results<T>(
    attempted: HashMap<MetricKey, T>,
    mut committed: HashMap<MetricKey, T>,
    identity: impl Fn(&T) -> T,
) -> Vec<MetricResult<T>> {
    let mut results = Vec::with_capacity(attempted.len());
    for (key, attempted_value) in attempted {
        let committed_value = committed
            .remove(&key)
            .unwrap_or_else(|| identity(&attempted_value));
        results.push(MetricResult::with_committed(
            key,
            attempted_value,
            committed_value,
        ));
    }
    for (key, committed_value) in committed {
        let attempted_value = identity(&committed_value);
        results.push(MetricResult::with_committed(
            key,
            attempted_value,
            committed_value,
        ));
    }
    results
}
