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

//! Identifiers for metrics and their step attribution.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A unique, structured identifier for a metric within one scope.
///
/// A `MetricName` is composed of a namespace and a name, allowing callers to
/// group related metrics (e.g., everything a connector emits) and query them
/// together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MetricName {
    /// The broad category of the metric (e.g., "io", "shuffle").
    pub namespace: String,
    /// The specific name of the metric (e.g., "records_read").
    pub name: String,
}

impl MetricName {
    /// Creates a new `MetricName` from a namespace and a name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl Display for MetricName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

/// A [`MetricName`] together with the pipeline step it is attributed to.
///
/// A key with no step denotes an unbound metric: an update that could not be
/// attributed to any step of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricKey {
    /// The metric's name.
    pub name: MetricName,
    /// The step the metric is scoped to, or `None` for the unbound scope.
    pub step: Option<String>,
}

impl MetricKey {
    /// Creates a key scoped to a named pipeline step.
    pub fn bound(name: MetricName, step: impl Into<String>) -> Self {
        Self {
            name,
            step: Some(step.into()),
        }
    }

    /// Creates a key for the unbound scope.
    pub fn unbound(name: MetricName) -> Self {
        Self { name, step: None }
    }

    /// Returns `true` when the key carries no step attribution.
    pub fn is_unbound(&self) -> bool {
        self.step.is_none()
    }
}

impl Display for MetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.step {
            Some(step) => write!(f, "{}@{}", self.name, step),
            None => write!(f, "{}@<unbound>", self.name),
        }
    }
}
