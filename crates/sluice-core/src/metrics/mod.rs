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

//! The "common language" of sluice metrics.
//!
//! This module defines the data model every other part of the system speaks:
//! metric names and keys, the per-kind values with their identity elements
//! and combine operators, the query-result contracts, and the wire-level
//! descriptor records handed to the control plane.
//!
//! The abstract "what" lives here; `sluice-metrics` provides the concurrent
//! cells, containers, and registries that aggregate it.

pub mod data;
pub mod descriptor;
pub mod error;
pub mod name;
pub mod query;

pub use self::data::{DistributionData, GaugeData, PercentileValue};
pub use self::descriptor::{DescriptorLabels, DescriptorValue, MetricDescriptor};
pub use self::error::{MetricsError, MetricsResult};
pub use self::name::{MetricKey, MetricName};
pub use self::query::{GaugeResult, MetricQueryResults, MetricResult, MetricsFilter};
