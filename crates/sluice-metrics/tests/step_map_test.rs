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

//! Integration tests for the registry, query views, and descriptor output.
//!
//! These tests exercise the full worker flow: record into a container, fold
//! it into registries per attempt, then read the aggregate back through
//! query views and descriptor records.

use approx::assert_relative_eq;
use sluice_core::metrics::data::{DistributionData, GaugeData};
use sluice_core::metrics::descriptor::{element_count_name, DescriptorValue};
use sluice_core::metrics::error::MetricsError;
use sluice_core::metrics::name::MetricName;
use sluice_core::metrics::query::{MetricQueryResults, MetricResult, MetricsFilter};
use sluice_metrics::{MetricResults, MetricsContainer, StepMetricsRegistry};
use std::sync::Arc;

const STEP1: &str = "myStep1";
const STEP2: &str = "myStep2";
const VALUE: i64 = 100;
const GAUGE_TS: i64 = 1_700_000_000_000;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn counter_name() -> MetricName {
    MetricName::new("io", "myCounter")
}

fn distribution1_name() -> MetricName {
    MetricName::new("io", "myDistribution1")
}

fn distribution2_name() -> MetricName {
    MetricName::new("io", "myDistribution2")
}

fn gauge_name() -> MetricName {
    MetricName::new("io", "myGauge")
}

/// Helper: one worker's container, as the runtime would hand it out.
///
/// Holds a +100 counter, two distributions over samples {100, 200, 300}
/// (one without percentile targets, one with {90, 99}), and a gauge.
fn worker_container() -> MetricsContainer {
    let container = MetricsContainer::bound(STEP1);
    container.counter(&counter_name()).inc(VALUE);
    let d1 = container.distribution(&distribution1_name(), &[]);
    d1.update(VALUE);
    d1.update(VALUE * 2);
    d1.update(VALUE * 3);
    let d2 = container.distribution(&distribution2_name(), &[90.0, 99.0]);
    d2.update(VALUE);
    d2.update(VALUE * 2);
    d2.update(VALUE * 3);
    container.gauge(&gauge_name()).set_at(VALUE, GAUGE_TS);
    container
}

fn counter_result<'a>(
    results: &'a MetricQueryResults,
    name: &MetricName,
    step: Option<&str>,
) -> &'a MetricResult<i64> {
    results
        .counters
        .iter()
        .find(|result| result.key().name == *name && result.key().step.as_deref() == step)
        .expect("counter result missing")
}

fn distribution_result<'a>(
    results: &'a MetricQueryResults,
    name: &MetricName,
    step: Option<&str>,
) -> &'a MetricResult<DistributionData> {
    results
        .distributions
        .iter()
        .find(|result| result.key().name == *name && result.key().step.as_deref() == step)
        .expect("distribution result missing")
}

fn gauge_result<'a>(
    results: &'a MetricQueryResults,
    name: &MetricName,
    step: Option<&str>,
) -> &'a MetricResult<Option<GaugeData>> {
    results
        .gauges
        .iter()
        .find(|result| result.key().name == *name && result.key().step.as_deref() == step)
        .expect("gauge result missing")
}

fn assert_distribution_stats(data: &DistributionData, sum: i64, count: i64, min: i64, max: i64) {
    assert_eq!(data.sum, sum);
    assert_eq!(data.count, count);
    assert_eq!(data.min, min);
    assert_eq!(data.max, max);
}

// ─────────────────────────────────────────────────────────────────────────────
// Attempted-only view
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_attempted_accumulated_metric_results() {
    init_logging();
    let worker = worker_container();
    let attempted = Arc::new(StepMetricsRegistry::new());
    attempted.update(Some(STEP1), &worker);
    attempted.update(Some(STEP2), &worker);
    attempted.update(Some(STEP2), &worker);

    let view = MetricResults::attempted_only(attempted);

    let step1 = view.query_metrics(&MetricsFilter::all().with_step(STEP1));
    assert_eq!(step1.counters.len(), 1);
    assert_eq!(step1.distributions.len(), 2);
    assert_eq!(step1.gauges.len(), 1);

    assert_eq!(
        *counter_result(&step1, &counter_name(), Some(STEP1)).attempted(),
        VALUE
    );
    let d1 = distribution_result(&step1, &distribution1_name(), Some(STEP1)).attempted();
    assert_distribution_stats(d1, VALUE * 6, 3, VALUE, VALUE * 3);
    assert!(d1.percentiles().is_empty());

    let d2 = distribution_result(&step1, &distribution2_name(), Some(STEP1)).attempted();
    assert_distribution_stats(d2, VALUE * 6, 3, VALUE, VALUE * 3);
    let percentiles = d2.percentiles();
    assert_eq!(percentiles.len(), 2);
    assert_relative_eq!(percentiles[0].value, 300.0);
    assert_relative_eq!(percentiles[1].value, 300.0);

    assert_eq!(
        *gauge_result(&step1, &gauge_name(), Some(STEP1)).attempted(),
        Some(GaugeData::new(VALUE, GAUGE_TS))
    );

    // Two merges into STEP2 double every accumulated statistic.
    let step2 = view.query_metrics(&MetricsFilter::all().with_step(STEP2));
    assert_eq!(
        *counter_result(&step2, &counter_name(), Some(STEP2)).attempted(),
        VALUE * 2
    );
    let d1 = distribution_result(&step2, &distribution1_name(), Some(STEP2)).attempted();
    assert_distribution_stats(d1, VALUE * 12, 6, VALUE, VALUE * 3);
    let d2 = distribution_result(&step2, &distribution2_name(), Some(STEP2)).attempted();
    assert_distribution_stats(d2, VALUE * 12, 6, VALUE, VALUE * 3);
    let percentiles = d2.percentiles();
    assert_relative_eq!(percentiles[0].value, 300.0);
    assert_relative_eq!(percentiles[1].value, 300.0);
    assert_eq!(
        *gauge_result(&step2, &gauge_name(), Some(STEP2)).attempted(),
        Some(GaugeData::new(VALUE, GAUGE_TS))
    );

    let all = view.all_metrics();
    assert_eq!(all.counters.len(), 2);
    assert_eq!(all.distributions.len(), 4);
    assert_eq!(all.gauges.len(), 2);
}

#[test]
fn test_committed_unsupported_for_every_kind() {
    let attempted = Arc::new(StepMetricsRegistry::new());
    attempted.update(Some(STEP1), &worker_container());
    let view = MetricResults::attempted_only(attempted);
    let results = view.query_metrics(&MetricsFilter::all().with_step(STEP1));

    let expected = "committed metrics are not supported by this execution backend";

    let counter_err = counter_result(&results, &counter_name(), Some(STEP1))
        .committed()
        .unwrap_err();
    assert_eq!(counter_err, MetricsError::CommittedUnsupported);
    assert_eq!(counter_err.to_string(), expected);

    let distribution_err = distribution_result(&results, &distribution1_name(), Some(STEP1))
        .committed()
        .unwrap_err();
    assert_eq!(distribution_err.to_string(), expected);

    let gauge_err = gauge_result(&results, &gauge_name(), Some(STEP1))
        .committed()
        .unwrap_err();
    assert_eq!(gauge_err.to_string(), expected);
}

// ─────────────────────────────────────────────────────────────────────────────
// Attempted + committed view
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_attempted_and_committed_accumulated_metric_results() {
    init_logging();
    let worker = worker_container();

    let attempted = Arc::new(StepMetricsRegistry::new());
    attempted.update(Some(STEP1), &worker);
    attempted.update(Some(STEP1), &worker);
    attempted.update(Some(STEP2), &worker);
    attempted.update(Some(STEP2), &worker);
    attempted.update(Some(STEP2), &worker);

    let committed = Arc::new(StepMetricsRegistry::new());
    committed.update(Some(STEP1), &worker);
    committed.update(Some(STEP2), &worker);
    committed.update(Some(STEP2), &worker);

    let view = MetricResults::attempted_and_committed(attempted, committed);

    let step1 = view.query_metrics(&MetricsFilter::all().with_step(STEP1));
    let counter = counter_result(&step1, &counter_name(), Some(STEP1));
    assert_eq!(*counter.attempted(), VALUE * 2);
    assert_eq!(counter.committed(), Ok(&VALUE));

    let d1 = distribution_result(&step1, &distribution1_name(), Some(STEP1));
    assert_distribution_stats(d1.attempted(), VALUE * 12, 6, VALUE, VALUE * 3);
    assert_distribution_stats(d1.committed().unwrap(), VALUE * 6, 3, VALUE, VALUE * 3);

    let gauge = gauge_result(&step1, &gauge_name(), Some(STEP1));
    assert_eq!(*gauge.attempted(), Some(GaugeData::new(VALUE, GAUGE_TS)));
    assert_eq!(
        gauge.committed(),
        Ok(&Some(GaugeData::new(VALUE, GAUGE_TS)))
    );

    let step2 = view.query_metrics(&MetricsFilter::all().with_step(STEP2));
    let counter = counter_result(&step2, &counter_name(), Some(STEP2));
    assert_eq!(*counter.attempted(), VALUE * 3);
    assert_eq!(counter.committed(), Ok(&(VALUE * 2)));

    let d2 = distribution_result(&step2, &distribution2_name(), Some(STEP2));
    assert_distribution_stats(d2.attempted(), VALUE * 18, 9, VALUE, VALUE * 3);
    assert_distribution_stats(d2.committed().unwrap(), VALUE * 12, 6, VALUE, VALUE * 3);

    let all = view.all_metrics();
    assert_eq!(all.counters.len(), 2);
    assert_eq!(all.distributions.len(), 4);
    assert_eq!(all.gauges.len(), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Descriptor emission
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_user_metric_dropped_on_unbound() {
    let registry = StepMetricsRegistry::new();
    registry
        .unbound_container()
        .counter(&MetricName::new("ns", "name1"))
        .inc(5);

    assert!(registry.descriptors().is_empty());
}

#[test]
fn test_update_all_folds_unbound_and_bound_containers() {
    init_logging();
    let base = StepMetricsRegistry::new();
    base.container(Some(STEP1))
        .counter(&MetricName::new("ns", "name1"))
        .inc(7);
    base.unbound_container()
        .counter(&element_count_name())
        .inc(14);

    let folded = StepMetricsRegistry::new();
    folded.update_all(&base);

    let mut descriptors = folded.descriptors();
    assert_eq!(descriptors.len(), 2);
    descriptors.sort_by(|a, b| a.labels.name.cmp(&b.labels.name));

    // The reserved element count survives from the unbound scope, without a
    // step label.
    assert_eq!(descriptors[0].labels.name, "element_count");
    assert_eq!(descriptors[0].labels.step, None);
    assert_eq!(
        descriptors[0].value,
        DescriptorValue::CounterSum { value: 14 }
    );

    assert_eq!(descriptors[1].labels.name, "name1");
    assert_eq!(descriptors[1].labels.step.as_deref(), Some(STEP1));
    assert_eq!(descriptors[1].value, DescriptorValue::CounterSum { value: 7 });
}

#[test]
fn test_descriptors_serialize_for_the_wire() {
    let registry = StepMetricsRegistry::new();
    registry.update(Some(STEP1), &worker_container());

    let descriptors = registry.descriptors();
    let json = serde_json::to_string(&descriptors).expect("descriptors must serialize");
    assert!(json.contains("\"type\":\"counter_sum\""));
    assert!(json.contains("\"type\":\"distribution\""));
    assert!(json.contains("\"type\":\"gauge_latest\""));
}

// ─────────────────────────────────────────────────────────────────────────────
// Reset and equality
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_reset_returns_every_step_to_identity() {
    let attempted = Arc::new(StepMetricsRegistry::new());
    attempted.update(Some(STEP1), &worker_container());
    attempted.update(Some(STEP2), &worker_container());
    attempted.update(Some(STEP2), &worker_container());

    attempted.reset();

    let view = MetricResults::attempted_only(attempted);
    let all = view.all_metrics();
    for step in [STEP1, STEP2] {
        assert_eq!(*counter_result(&all, &counter_name(), Some(step)).attempted(), 0);
        assert!(distribution_result(&all, &distribution1_name(), Some(step))
            .attempted()
            .is_empty());
        assert_eq!(*gauge_result(&all, &gauge_name(), Some(step)).attempted(), None);
    }
}

#[test]
fn test_concurrent_workers_fold_without_external_locking() {
    init_logging();
    let registry = Arc::new(StepMetricsRegistry::new());

    let handles: Vec<_> = (0..8)
        .map(|worker_index| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                let step = if worker_index % 2 == 0 { STEP1 } else { STEP2 };
                for _ in 0..50 {
                    let worker = MetricsContainer::bound(step);
                    worker.counter(&counter_name()).inc(1);
                    registry.update(Some(step), &worker);
                    // Readers are allowed to observe partially merged state;
                    // they must never fail.
                    let _ = MetricResults::attempted_only(registry.clone()).all_metrics();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let view = MetricResults::attempted_only(registry);
    let all = view.all_metrics();
    let step1_total = *counter_result(&all, &counter_name(), Some(STEP1)).attempted();
    let step2_total = *counter_result(&all, &counter_name(), Some(STEP2)).attempted();
    assert_eq!(step1_total, 200);
    assert_eq!(step2_total, 200);
}

#[test]
fn test_registry_equality() {
    assert_eq!(StepMetricsRegistry::new(), StepMetricsRegistry::new());

    let with_step = StepMetricsRegistry::new();
    with_step.container(Some("stepName"));
    assert_ne!(with_step, StepMetricsRegistry::new());

    let with_unbound_cell = StepMetricsRegistry::new();
    with_unbound_cell
        .container(None)
        .counter(&MetricName::new("namespace", "name"));
    assert_ne!(with_unbound_cell, StepMetricsRegistry::new());

    // Equal content, independently built.
    let a = StepMetricsRegistry::new();
    a.update(Some(STEP1), &worker_container());
    let b = StepMetricsRegistry::new();
    b.update(Some(STEP1), &worker_container());
    assert_eq!(a, b);
}
