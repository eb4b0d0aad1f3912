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

//! Query contracts: filters and per-metric results.

use crate::metrics::data::{DistributionData, GaugeData};
use crate::metrics::error::{MetricsError, MetricsResult};
use crate::metrics::name::MetricKey;

/// The queried state of a gauge: its latest observation, or `None` when the
/// gauge was tracked but never set.
pub type GaugeResult = Option<GaugeData>;

/// A filter narrowing a metrics query.
///
/// Every field left unset matches everything. A filter that matches nothing
/// yields an empty result set; referencing an unknown step or name is not an
/// error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsFilter {
    /// Restrict results to this step. Unbound metrics never match a set
    /// step filter.
    pub step: Option<String>,
    /// Restrict results to this metric namespace.
    pub namespace: Option<String>,
    /// Restrict results to this metric name.
    pub name: Option<String>,
}

impl MetricsFilter {
    /// A filter matching every metric.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts the filter to one step, returning the updated filter.
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    /// Restricts the filter to one namespace, returning the updated filter.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Restricts the filter to one metric name, returning the updated filter.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns `true` when `key` satisfies every set field.
    pub fn matches(&self, key: &MetricKey) -> bool {
        if let Some(step) = &self.step {
            if key.step.as_deref() != Some(step.as_str()) {
                return false;
            }
        }
        if let Some(namespace) = &self.namespace {
            if key.name.namespace != *namespace {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if key.name.name != *name {
                return false;
            }
        }
        true
    }
}

/// One queried metric: its key, the attempted value, and the committed value
/// when the execution backend can supply one.
///
/// The committed side is an explicit capability outcome rather than a thrown
/// error: callers branch on [`MetricResult::committed`] instead of catching.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricResult<T> {
    key: MetricKey,
    attempted: T,
    committed: Option<T>,
}

impl<T> MetricResult<T> {
    /// A result from an attempted-only view; committed reads will fail.
    pub fn attempted_only(key: MetricKey, attempted: T) -> Self {
        Self {
            key,
            attempted,
            committed: None,
        }
    }

    /// A result carrying both views of the value.
    pub fn with_committed(key: MetricKey, attempted: T, committed: T) -> Self {
        Self {
            key,
            attempted,
            committed: Some(committed),
        }
    }

    /// The (namespace, name, step) key this result is for.
    pub fn key(&self) -> &MetricKey {
        &self.key
    }

    /// The attempted value: best-effort, reflects every execution attempt
    /// including retries, and may overcount.
    pub fn attempted(&self) -> &T {
        &self.attempted
    }

    /// The committed value: reflects only durably completed executions.
    ///
    /// Fails with [`MetricsError::CommittedUnsupported`] when the view was
    /// built from an execution backend that cannot report committed values.
    /// The failure is structural; callers must not retry.
    pub fn committed(&self) -> MetricsResult<&T> {
        self.committed
            .as_ref()
            .ok_or(MetricsError::CommittedUnsupported)
    }
}

/// The unordered outcome of one metrics query.
///
/// Results are grouped per kind. No ordering is guaranteed; consumers must
/// treat each bucket as a set. At most one result exists per
/// (namespace, name, step) triple within a bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricQueryResults {
    /// Counter results.
    pub counters: Vec<MetricResult<i64>>,
    /// Distribution results.
    pub distributions: Vec<MetricResult<DistributionData>>,
    /// Gauge results.
    pub gauges: Vec<MetricResult<GaugeResult>>,
}

impl MetricQueryResults {
    /// Returns `true` when the query matched nothing of any kind.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.distributions.is_empty() && self.gauges.is_empty()
    }
}
