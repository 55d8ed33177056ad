//! Tests for aggregating increment records.

use std::thread;

use proptest::prelude::*;
use serde_json::json;

use cdm_metrics::{
    CounterBlock, Fragment, IncrementRecord, MapstreamKey, Metrics, MetricsError, SourceFile,
    fragment,
};

const KEY: &str = "demographics.person.Person.age";

fn person_record(table: &str, before: u64, after: u64) -> IncrementRecord {
    IncrementRecord::new("Person")
        .with_required_field("age", fragment([("before", before), ("after", after)]))
        .with_source_file("age", SourceFile::new(table))
}

fn apply_all(fragments: &[Fragment]) -> CounterBlock {
    let mut metrics = Metrics::new();
    for fragment in fragments {
        metrics.add_counts(KEY, fragment).unwrap();
    }
    metrics.get(KEY).cloned().unwrap_or_default()
}

fn label_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["before", "after", "after_formatting", "input_count"])
}

fn fragments_strategy() -> impl Strategy<Value = Vec<Fragment>> {
    prop::collection::vec(
        prop::collection::btree_map(label_strategy(), 0u32..10_000, 0..4),
        0..12,
    )
    .prop_map(|maps| {
        maps.into_iter()
            .map(|map| fragment(map.into_iter().map(|(label, value)| (label, u64::from(value)))))
            .collect()
    })
}

proptest! {
    #[test]
    fn merge_order_does_not_matter(
        (ordered, shuffled) in fragments_strategy()
            .prop_flat_map(|fragments| (Just(fragments.clone()), Just(fragments).prop_shuffle()))
    ) {
        prop_assert_eq!(apply_all(&ordered), apply_all(&shuffled));
    }

    #[test]
    fn merge_sums_every_label(fragments in fragments_strategy()) {
        let block = apply_all(&fragments);
        for label in ["before", "after", "after_formatting", "input_count"] {
            let expected: u64 = fragments
                .iter()
                .filter_map(|fragment| fragment.get(label))
                .map(|value| value.to_count(label).unwrap())
                .sum();
            let seen = fragments.iter().any(|fragment| fragment.contains_key(label));
            prop_assert_eq!(block.get(label), seen.then_some(expected));
        }
    }
}

#[test]
fn repeated_fragments_accumulate() {
    let mut metrics = Metrics::new();
    metrics.add_counts(KEY, &fragment([("before", 5u64)])).unwrap();
    assert_eq!(metrics.get(KEY).unwrap().get("before"), Some(5));
    metrics.add_counts(KEY, &fragment([("before", 3u64)])).unwrap();
    assert_eq!(metrics.get(KEY).unwrap().get("before"), Some(8));
}

#[test]
fn prefix_comes_from_source_table() {
    let mut metrics = Metrics::new();
    metrics
        .ingest("person", &person_record("demographics.csv", 10, 8))
        .unwrap();
    let expected = CounterBlock::try_from_counts([("before", 10), ("after", 8)]).unwrap();
    assert_eq!(metrics.data_summary().len(), 1);
    assert_eq!(metrics.get(KEY), Some(&expected));
}

#[test]
fn untraceable_fields_are_dropped() {
    let mut metrics = Metrics::new();
    metrics
        .ingest("person", &person_record("demographics.csv", 10, 8))
        .unwrap();
    let before = metrics.len();

    let without_sources = IncrementRecord::new("Person")
        .with_required_field("age", fragment([("before", 1u64), ("after", 1u64)]));
    metrics.ingest("person", &without_sources).unwrap();

    let other_field_only = IncrementRecord::new("Person")
        .with_required_field("dob", fragment([("before", 1u64), ("after", 1u64)]))
        .with_source_file("age", SourceFile::new("demographics.csv"));
    metrics.ingest("person", &other_field_only).unwrap();

    assert_eq!(metrics.len(), before);
    assert_eq!(metrics.get(KEY).unwrap().get("before"), Some(10));
}

#[test]
fn json_records_with_string_counts() {
    let record = IncrementRecord::from_json(json!({
        "name": "Observation",
        "person_id": {"before": "12", "after": "11"},
        "required_fields": {"value": {"before": "12", "after": "9", "after_formatting": "7"}},
        "source_files": {"value": {"table": "labs.2021.csv"}}
    }))
    .unwrap();
    let mut metrics = Metrics::new();
    metrics.ingest("observation", &record).unwrap();

    let block = metrics.get("labs.observation.Observation.value").unwrap();
    assert_eq!(block.get("after_formatting"), Some(7));
    let person = metrics.get("NA.observation.Observation.person_id").unwrap();
    assert_eq!(person.get("after"), Some(11));
}

#[test]
fn non_numeric_counts_fail_ingest() {
    let record = IncrementRecord::from_json(json!({
        "name": "Person",
        "required_fields": {"age": {"before": "ten"}},
        "source_files": {"age": {"table": "demographics.csv"}}
    }))
    .unwrap();
    let mut metrics = Metrics::new();
    let err = metrics.ingest("person", &record).unwrap_err();
    assert!(matches!(err, MetricsError::InvalidCount { .. }));
    assert!(metrics.is_empty());
}

#[test]
fn float_counts_are_truncated_on_ingest() {
    let record = IncrementRecord::from_json(json!({
        "name": "Person",
        "required_fields": {"age": {"before": 10.0, "after": 8.6}},
        "source_files": {"age": {"table": "demographics.csv"}}
    }))
    .unwrap();
    let mut metrics = Metrics::new();
    metrics.ingest("person", &record).unwrap();
    let block = metrics.get(KEY).unwrap();
    assert_eq!(block.get("before"), Some(10));
    assert_eq!(block.get("after"), Some(8));
}

#[test]
fn counts_past_u64_max_are_rejected() {
    let mut metrics = Metrics::new();
    metrics
        .add_counts(KEY, &fragment([("before", "18446744073709551615")]))
        .unwrap();
    let err = metrics
        .add_counts(KEY, &fragment([("before", 1u64)]))
        .unwrap_err();
    assert!(matches!(err, MetricsError::CountOverflow { .. }));
    assert_eq!(metrics.get(KEY).unwrap().get("before"), Some(u64::MAX));
}

#[test]
fn partial_summaries_match_sequential_ingest() {
    let tables = ["demographics.csv", "visits.csv", "labs.csv", "demographics.csv"];

    let mut sequential = Metrics::new();
    for (index, table) in tables.iter().enumerate() {
        let count = index as u64 + 1;
        sequential
            .ingest("person", &person_record(table, count * 10, count * 7))
            .unwrap();
        sequential
            .increment(&format!("{table}~age~person"), "input_count")
            .unwrap();
    }

    let handles: Vec<_> = tables
        .iter()
        .enumerate()
        .map(|(index, table)| {
            let table = (*table).to_string();
            thread::spawn(move || {
                let count = index as u64 + 1;
                let mut partial = Metrics::new();
                partial
                    .ingest("person", &person_record(&table, count * 10, count * 7))
                    .unwrap();
                partial
                    .increment(&format!("{table}~age~person"), "input_count")
                    .unwrap();
                partial
            })
        })
        .collect();
    let partials = handles.into_iter().map(|handle| handle.join().unwrap());
    let combined = Metrics::combine(partials).unwrap();

    assert_eq!(combined, sequential);
    assert_eq!(
        combined.get("demographics.person.Person.age").unwrap().get("before"),
        Some(50)
    );
}

#[test]
fn mapstream_events_count_one_at_a_time() {
    let key = MapstreamKey::new("demographics.csv", "age", "person");
    let mut metrics = Metrics::new();
    metrics.start_mapstream(&key);
    for _ in 0..3 {
        metrics.increment(&key.to_string(), "input_count").unwrap();
    }
    metrics.increment(&key.to_string(), "invalid_person_ids").unwrap();
    metrics.increment(&key.to_string(), "output_count").unwrap();
    metrics.increment(&key.to_string(), "output_count").unwrap();

    let block = metrics.get("demographics.csv~age~person").unwrap();
    assert_eq!(block.get("input_count"), Some(3));
    assert_eq!(block.get("invalid_person_ids"), Some(1));
    assert_eq!(block.get("invalid_date_fields"), Some(0));
    assert_eq!(block.get("output_count"), Some(2));
}
