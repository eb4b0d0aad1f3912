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

//! # Sluice Core
//!
//! Foundational crate containing the metric data model, the pure combine
//! semantics for each metric kind, and the wire-level contracts shared by
//! the sluice aggregation runtime.

#![warn(missing_docs)]

pub mod metrics;

pub use metrics::{
    DistributionData, GaugeData, MetricKey, MetricName, MetricsError, MetricsResult,
};
