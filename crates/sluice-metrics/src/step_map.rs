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

//! The step-to-container registry.

use crate::container::{ContainerSnapshot, MetricsContainer};
use sluice_core::metrics::descriptor::MetricDescriptor;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Maps each pipeline step to its [`MetricsContainer`], plus one reserved
/// container for unbound metrics.
///
/// Workers fold their containers in through [`update`](Self::update); whole
/// attempt-scoped registries fold into a job-scoped one through
/// [`update_all`](Self::update_all). The registry may be read and written
/// concurrently by multiple reporting and merging callers without external
/// synchronization; whole-registry operations are not atomic across cells,
/// so readers may observe partially merged state.
///
/// The registry lives and dies with one job attempt; nothing persists.
#[derive(Debug)]
pub struct StepMetricsRegistry {
    containers: RwLock<HashMap<Option<String>, Arc<MetricsContainer>>>,
}

impl StepMetricsRegistry {
    /// Creates a registry holding only the reserved unbound container.
    pub fn new() -> Self {
        let mut containers = HashMap::new();
        containers.insert(None, Arc::new(MetricsContainer::unbound()));
        Self {
            containers: RwLock::new(containers),
        }
    }

    /// Gets or creates the container for `step`; `None` addresses the single
    /// reserved unbound container.
    pub fn container(&self, step: Option<&str>) -> Arc<MetricsContainer> {
        let key = step.map(String::from);
        if let Some(container) = self.containers.read().unwrap().get(&key) {
            return container.clone();
        }
        let mut containers = self.containers.write().unwrap();
        containers
            .entry(key)
            .or_insert_with(|| {
                log::trace!("creating metrics container for step {step:?}");
                match step {
                    Some(step) => Arc::new(MetricsContainer::bound(step)),
                    None => Arc::new(MetricsContainer::unbound()),
                }
            })
            .clone()
    }

    /// The reserved container for metrics not attributable to any step.
    pub fn unbound_container(&self) -> Arc<MetricsContainer> {
        self.container(None)
    }

    /// Merges `source` into the container for `step`.
    ///
    /// The caller retains ownership of `source` and may reuse or discard it;
    /// merging the same container repeatedly accumulates each time.
    pub fn update(&self, step: Option<&str>, source: &MetricsContainer) {
        self.container(step).update(source);
    }

    /// Folds every scope of `other`, bound and unbound, into the matching
    /// container of `self`, creating containers as needed.
    pub fn update_all(&self, other: &StepMetricsRegistry) {
        log::debug!("folding {} metric scopes into registry", other.len());
        for snapshot in other.snapshots() {
            self.container(snapshot.step.as_deref())
                .update_from_snapshot(&snapshot);
        }
    }

    /// Resets every container, bound and unbound, to identity. Containers
    /// themselves are never removed.
    pub fn reset(&self) {
        log::debug!("resetting {} metric scopes", self.len());
        for container in self.containers.read().unwrap().values() {
            container.reset();
        }
    }

    /// Point-in-time snapshots of every container, in no particular order.
    pub fn snapshots(&self) -> Vec<ContainerSnapshot> {
        self.containers
            .read()
            .unwrap()
            .values()
            .map(|container| container.snapshot())
            .collect()
    }

    /// Descriptor records for every bound-step container. Unbound metrics
    /// are dropped unless their name is system-reserved, in which case they
    /// are reported without a step label.
    pub fn descriptors(&self) -> Vec<MetricDescriptor> {
        self.snapshots()
            .iter()
            .flat_map(ContainerSnapshot::descriptors)
            .collect()
    }

    fn len(&self) -> usize {
        self.containers.read().unwrap().len()
    }
}

impl Default for StepMetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for StepMetricsRegistry {
    /// Structural equality over the full step-to-container mapping,
    /// including the unbound entry. Creating a container, or touching a
    /// previously absent cell in any container, breaks equality with an
    /// untouched registry.
    fn eq(&self, other: &Self) -> bool {
        let mine: HashMap<Option<String>, ContainerSnapshot> = self
            .snapshots()
            .into_iter()
            .map(|snapshot| (snapshot.step.clone(), snapshot))
            .collect();
        let theirs: HashMap<Option<String>, ContainerSnapshot> = other
            .snapshots()
            .into_iter()
            .map(|snapshot| (snapshot.step.clone(), snapshot))
            .collect();
        mine == theirs
    }
}
