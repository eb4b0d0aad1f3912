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

//! # Sluice Metrics
//!
//! Step-scoped aggregation of metrics emitted by concurrently executing
//! pipeline workers.
//!
//! The runtime hands each worker a [`MetricsContainer`]; on completion or
//! checkpoint it folds the container into a [`StepMetricsRegistry`], one
//! container per pipeline step plus a reserved unbound scope. Reporting
//! tools query the aggregate through [`MetricResults`], and the control
//! plane polls descriptor records off the registry.
//!
//! All state is process memory scoped to one job attempt; nothing here
//! persists or suspends.

#![warn(missing_docs)]

pub mod cells;
pub mod container;
pub mod query;
pub mod step_map;

pub use cells::{CounterCell, DistributionCell, GaugeCell};
pub use container::{ContainerSnapshot, MetricsContainer};
pub use query::{MetricResults, QueryViewOptions};
pub use step_map::StepMetricsRegistry;
