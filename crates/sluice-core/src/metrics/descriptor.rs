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

//! Wire-level descriptor records for the control plane.
//!
//! A descriptor describes one metric's current value as a (type, labels,
//! value) record suitable for transmission. Emission order is unspecified;
//! consumers must treat a batch of descriptors as a set.

use crate::metrics::data::PercentileValue;
use crate::metrics::name::MetricName;
use serde::{Deserialize, Serialize};

/// Namespace reserved for system-maintained metrics.
pub const RESERVED_NAMESPACE: &str = "sluice.system";

/// Reserved metric counting elements flowing through the pipeline.
pub const ELEMENT_COUNT: &str = "element_count";

/// Reserved metric tracking sampled encoded element sizes.
pub const SAMPLED_BYTE_SIZE: &str = "sampled_byte_size";

/// The name of the reserved element-count metric.
pub fn element_count_name() -> MetricName {
    MetricName::new(RESERVED_NAMESPACE, ELEMENT_COUNT)
}

/// The name of the reserved sampled-byte-size metric.
pub fn sampled_byte_size_name() -> MetricName {
    MetricName::new(RESERVED_NAMESPACE, SAMPLED_BYTE_SIZE)
}

/// Returns `true` for system-reserved metric names.
///
/// Reserved metrics are the only ones reported from the unbound scope; user
/// metrics recorded without a step attribution are dropped from descriptor
/// output.
pub fn is_reserved(name: &MetricName) -> bool {
    name.namespace == RESERVED_NAMESPACE
        && (name.name == ELEMENT_COUNT || name.name == SAMPLED_BYTE_SIZE)
}

/// The label set identifying one described metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorLabels {
    /// The metric's namespace.
    pub namespace: String,
    /// The metric's name.
    pub name: String,
    /// The step the metric is scoped to. Absent for reserved metrics
    /// reported from the unbound scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
}

impl DescriptorLabels {
    /// Builds the label set for a metric in the given scope.
    pub fn new(name: &MetricName, step: Option<&str>) -> Self {
        Self {
            namespace: name.namespace.clone(),
            name: name.name.clone(),
            step: step.map(String::from),
        }
    }
}

/// The typed value of a described metric.
///
/// The serde tag doubles as the wire-level type indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DescriptorValue {
    /// A counter's running sum.
    CounterSum {
        /// The current sum.
        value: i64,
    },
    /// A distribution's merged statistics and estimated percentiles.
    Distribution {
        /// Sum of all observed samples.
        sum: i64,
        /// Number of observed samples.
        count: i64,
        /// Smallest observed sample, `0` when empty.
        min: i64,
        /// Largest observed sample, `0` when empty.
        max: i64,
        /// Estimated values for the configured percentile targets.
        percentiles: Vec<PercentileValue>,
    },
    /// A gauge's latest observation.
    GaugeLatest {
        /// The observed value.
        value: i64,
        /// Wall-clock time of the observation, epoch milliseconds.
        timestamp_ms: i64,
    },
}

/// One wire-level descriptor record: labels plus the typed current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDescriptor {
    /// The label set identifying the metric.
    pub labels: DescriptorLabels,
    /// The metric's typed current value.
    pub value: DescriptorValue,
}
