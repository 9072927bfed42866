use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn bin() -> Command {
    let path = assert_cmd::cargo::cargo_bin!("vqa-curate");
    Command::new(path)
}

fn write_fixture(dir: &Path) {
    let results = dir.join("results");
    fs::create_dir_all(&results).unwrap();
    fs::write(
        results.join("train_to_discard.json"),
        r#"[{"id": "T1", "question": "Thanks", "evaluation": {"is_relevant": false, "reason": "thanks", "method": "model_based"}}]"#,
    )
    .unwrap();
    fs::write(results.join("validation_to_discard.json"), r#"[{"id": 2}]"#).unwrap();
    fs::write(
        dir.join("eval.jsonl"),
        concat!(
            r#"{"validation_id": 1, "similar_images": [{"id": "T1"}, {"id": "T2"}]}"#,
            "\n",
            r#"{"validation_id": 2, "similar_images": [{"id": "T2"}]}"#,
            "\n",
            r#"{"validation_id": 3, "similar_images": []}"#,
            "\n",
        ),
    )
    .unwrap();
}

#[test]
fn clean_writes_timestamped_file_and_json_summary() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let assert = bin()
        .current_dir(dir.path())
        .args([
            "--output",
            "json",
            "clean",
            "--input",
            "eval.jsonl",
            "--results-dir",
            "results",
            "--output-dir",
            "cleaned",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"eliminated\""));

    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let json: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["stats"]["seen"], 3);
    assert_eq!(json["stats"]["eliminated"], 1);
    assert_eq!(json["stats"]["retained"], 2);
    assert_eq!(json["training_discard_ids"], 1);

    let cleaned: Vec<_> = fs::read_dir(dir.path().join("cleaned"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(cleaned.len(), 1);
    let name = cleaned[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("eval_cleaned_"), "{name}");

    let lines: Vec<Value> = fs::read_to_string(&cleaned[0])
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["similar_images"], serde_json::json!([{"id": "T2"}]));
    assert_eq!(lines[1]["validation_id"], 3);
}

#[test]
fn clean_without_discard_lists_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("eval.jsonl"), "{}\n").unwrap();

    bin()
        .current_dir(dir.path())
        .args(["clean", "--input", "eval.jsonl", "--results-dir", "results"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing discard artifact"));

    assert!(!dir.path().join("data").exists());
}

#[test]
fn collect_without_credentials_fails_before_scanning() {
    let dir = tempfile::tempdir().unwrap();

    bin()
        .current_dir(dir.path())
        .env_remove("GEMINI_API_KEY")
        .args(["collect", "--results-dir", "results"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY"));

    assert!(!dir.path().join("results").exists());
}

#[test]
fn unknown_output_format_is_rejected() {
    bin()
        .args(["--output", "xml", "clean"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown output format"));
}
