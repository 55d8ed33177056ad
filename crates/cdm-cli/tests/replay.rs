//! Integration tests for replaying increment logs.

use std::fs;
use std::path::PathBuf;

use cdm_cli::replay::{replay_file, replay_files};

fn write_log(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

const PERSON_LOG: &str = r#"{"table": "person", "increment": {"name": "Person", "valid_person_id": {"before": 20, "after": 18}, "required_fields": {"age": {"before": 20, "after": 18}, "gender": {"before": 20, "after": 20}}, "source_files": {"age": {"table": "demographics.csv"}}}}
{"key": "demographics.csv~age~person", "counter": "input_count"}
"#;

#[test]
fn replay_file_applies_every_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(&dir, "person.jsonl", PERSON_LOG);
    let metrics = replay_file(&path).unwrap();

    assert_eq!(metrics.len(), 3);
    assert_eq!(
        metrics.get("NA.person.Person.valid_person_id").unwrap().get("after"),
        Some(18)
    );
    assert_eq!(
        metrics.get("demographics.person.Person.age").unwrap().get("before"),
        Some(20)
    );
    assert!(metrics.get("demographics.person.Person.gender").is_none());
    assert_eq!(
        metrics.get("demographics.csv~age~person").unwrap().get("input_count"),
        Some(1)
    );
}

#[test]
fn replay_files_sums_across_logs() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![
        write_log(&dir, "first.jsonl", PERSON_LOG),
        write_log(&dir, "second.jsonl", PERSON_LOG),
        write_log(&dir, "third.jsonl", PERSON_LOG),
    ];
    let metrics = replay_files(&paths).unwrap();

    let age = metrics.get("demographics.person.Person.age").unwrap();
    assert_eq!(age.get("before"), Some(60));
    assert_eq!(age.get("after"), Some(54));
    assert_eq!(
        metrics.get("demographics.csv~age~person").unwrap().get("input_count"),
        Some(3)
    );
}

#[test]
fn record_without_name_points_at_the_line() {
    let dir = tempfile::tempdir().unwrap();
    let log = format!(
        "{PERSON_LOG}{}\n",
        r#"{"table": "person", "increment": {"required_fields": {}}}"#
    );
    let path = write_log(&dir, "broken.jsonl", &log);
    let err = replay_files(&[path]).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("broken.jsonl line 3"), "{message}");
    assert!(message.contains("name"), "{message}");
}
