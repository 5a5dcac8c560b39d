use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn cmd(workdir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_outline_ranker")));
    cmd.current_dir(workdir)
        .env_remove("RANKER_EMBEDDER")
        .env_remove("RANKER_SEGMENT_MIN_TAIL")
        .env("RUST_LOG", "warn");
    cmd
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// -- outline --

#[test]
fn outline_writes_one_json_per_dump() {
    let out = TempDir::new().unwrap();

    cmd(out.path())
        .args(["outline", "-i", &fixture_path("input"), "-o"])
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 outlines"));

    let guide = read_json(&out.path().join("guide.json"));
    assert_eq!(guide["title"], "Field Guide to Coastal Trips");
    assert_eq!(guide["outline"][0], json!({ "level": "H1", "text": "Field Guide to Coastal Trips", "page": 1 }));
    assert_eq!(guide["outline"][3]["text"], "Local Food");
    assert_eq!(guide["outline"][3]["page"], 2);

    let food = read_json(&out.path().join("food.json"));
    assert_eq!(food["title"], "Regional Cooking Notes");
    assert!(!out.path().join("config.json").exists());
}

#[test]
fn outline_of_missing_directory_fails() {
    let out = TempDir::new().unwrap();

    cmd(out.path())
        .args(["outline", "-i", "no-such-dir", "-o", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no-such-dir"));
}

// -- rank --

#[test]
fn rank_fixture_skips_missing_document() {
    let out = TempDir::new().unwrap();
    let report = out.path().join("nested/output.json");

    cmd(out.path())
        .args(["rank", "-i", &fixture_path("input"), "-o"])
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("Ranking 3 documents"));

    let value = read_json(&report);
    assert_eq!(
        value["metadata"]["input_documents"],
        json!(["guide.pdf", "food.pdf", "missing.pdf"])
    );
    assert_eq!(value["metadata"]["persona"], "Travel Planner");

    let sections = value["extracted_sections"].as_array().unwrap();
    assert!(!sections.is_empty() && sections.len() <= 5);
    for (i, section) in sections.iter().enumerate() {
        assert_eq!(section["importance_rank"], i as u64 + 1);
        assert_ne!(section["document"], "missing.pdf");
    }
    assert!(value["subsection_analysis"].as_array().unwrap().len() <= 5);
}

#[test]
fn long_paragraphs_are_cut_with_ellipsis() {
    let dir = TempDir::new().unwrap();
    let body = "the harbour market opens at dusk and sells grilled fish ".repeat(12);
    let layout = json!({
        "pages": [{
            "width": 600,
            "text": format!("Evening Market Visits\n{}", body.trim()),
            "spans": []
        }]
    });
    fs::write(dir.path().join("market.layout.json"), layout.to_string()).unwrap();
    fs::write(
        dir.path().join("config.json"),
        json!({
            "documents": [{ "filename": "market.pdf" }],
            "persona": { "role": "Food Critic" },
            "job_to_be_done": { "task": "Find evening food markets" }
        })
        .to_string(),
    )
    .unwrap();

    cmd(dir.path())
        .args(["rank", "-i", ".", "-o", "ranked.json"])
        .assert()
        .success();

    let value = read_json(&dir.path().join("ranked.json"));
    assert_eq!(value["extracted_sections"][0]["section_title"], "Evening Market Visits");
    let refined = value["subsection_analysis"][0]["refined_text"].as_str().unwrap();
    assert_eq!(refined.chars().count(), 503);
    assert!(refined.ends_with("..."));
    assert!(value.get("challenge_info").is_none());
}

#[test]
fn rank_without_config_fails() {
    let dir = TempDir::new().unwrap();

    cmd(dir.path())
        .args(["rank", "-i", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config.json"));

    assert!(!dir.path().join("output/output.json").exists());
}

#[test]
fn unknown_embedder_is_rejected() {
    let dir = TempDir::new().unwrap();

    cmd(dir.path())
        .env("RANKER_EMBEDDER", "word2vec")
        .args(["rank", "-i", &fixture_path("input")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid settings"));
}

// -- stats --

#[test]
fn stats_lists_documents() {
    let dir = TempDir::new().unwrap();

    cmd(dir.path())
        .args(["stats", "-i", &fixture_path("input")])
        .assert()
        .success()
        .stdout(predicate::str::contains("guide"))
        .stdout(predicate::str::contains("food"))
        .stdout(predicate::str::contains("2 documents"));
}

#[test]
fn stats_on_empty_directory() {
    let dir = TempDir::new().unwrap();

    cmd(dir.path())
        .args(["stats", "-i", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("No layout dumps"));
}
