use std::fs;
use std::path::Path;

use greenbench_cli::run;
use greenbench_engine::cards::format_cards;
use greenbench_engine::logger::{read_event_log, Event};
use greenbench_engine::runner::read_records;

const HU_TOML: &str = r#"
mode = "hu"
seeds = [1, 2]
hands_per_seed = 3
replicas = 2
blinds = { sb = 50, bb = 100 }
stacks_bb = 100

[opponent_mix]
"tag-hu" = 1.0
"#;

const SIXMAX_JSON: &str = r#"{
  "mode": "sixmax",
  "seeds": [9],
  "hands_per_replica": 2,
  "seat_replicas": 2,
  "blinds": { "sb": 50, "bb": 100 },
  "lineup": ["tag-6", "random-6", "cfrlite-6", "tag-6", "random-6", "cfrlite-6"]
}"#;

fn cli(args: &[&str]) -> (i32, String, String) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let mut argv = vec!["greenbench"];
    argv.extend_from_slice(args);
    let code = run(argv, &mut out, &mut err);
    (
        code,
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
    )
}

fn write_config(dir: &Path, name: &str, text: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path.display().to_string()
}

#[test]
fn eval_prints_the_best_hand() {
    let (code, out, _) = cli(&["eval", "--cards", "As Ks Qs Js Ts 2c 3d"]);
    assert_eq!(code, 0);
    assert_eq!(out.trim(), "Straight Flush (A)");

    let (code, _, err) = cli(&["eval", "--cards", "As Ks"]);
    assert_eq!(code, 2);
    assert!(err.contains("expected 5 to 7 cards"));
}

#[test]
fn unknown_command_prints_usage() {
    let (code, _, err) = cli(&["shuffle"]);
    assert_eq!(code, 2);
    assert!(err.contains("Usage: greenbench <command>"));
    assert!(err.contains("  stats"));
}

#[test]
fn help_goes_to_stdout() {
    let (code, out, _) = cli(&["--help"]);
    assert_eq!(code, 0);
    assert!(out.contains("run"));
}

#[test]
fn deal_rejects_oversized_tables() {
    let (code, _, _) = cli(&["deal", "--seed", "1", "--seats", "7"]);
    assert_eq!(code, 2);
}

#[test]
fn heads_up_run_writes_artefacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "series.toml", HU_TOML);
    let output = dir.path().join("run");
    let output_arg = output.display().to_string();

    let (code, out, err) = cli(&[
        "run",
        "--config",
        &config,
        "--agent",
        "baseline:cfrlite-hu",
        "--agent-name",
        "Candidate",
        "--output",
        &output_arg,
    ]);
    assert_eq!(code, 0, "stderr: {}", err);
    assert!(out.contains("Mode: hu  hands: 12  bb: 100"));
    assert!(out.contains("Candidate"));
    assert!(out.contains("tag-hu"));
    assert!(out.contains("Artefacts:"));

    let records = read_records(&output.join("metrics/per_hand_metrics.ndjson")).unwrap();
    assert_eq!(records.len(), 24);
    assert_eq!(records.iter().map(|r| r.delta).sum::<i64>(), 0);
    assert!(records.iter().all(|r| r.illegal_actions == 0 && r.timeouts == 0));
    assert!(output.join("metrics/metrics.json").exists());
    assert!(output.join("logs/hu/tag-hu/seed2_rep1.ndjson").exists());
}

#[test]
fn deal_matches_the_cards_a_run_dealt() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "series.toml", HU_TOML);
    let output = dir.path().join("run");
    let output_arg = output.display().to_string();
    let (code, _, _) = cli(&["run", "--config", &config, "--output", &output_arg]);
    assert_eq!(code, 0);

    let events = read_event_log(output.join("logs/hu/tag-hu/seed1_rep0.ndjson")).unwrap();
    let first_hand: Vec<String> = events
        .iter()
        .filter(|e| e.hand_id == "1-0-0")
        .filter_map(|e| match &e.event {
            Event::DealHole(d) => Some(format_cards(&d.cards).join(" ")),
            _ => None,
        })
        .collect();
    assert_eq!(first_hand.len(), 2);

    let (code, out, _) = cli(&["deal", "--seed", "1", "--hand", "0"]);
    assert_eq!(code, 0);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "Key: 1:0:0");
    assert!(lines[1].starts_with("Seat 0 SB"));
    assert!(lines[1].ends_with(&first_hand[0]));
    assert!(lines[2].ends_with(&first_hand[1]));
    assert!(lines[3].starts_with("Board: "));

    // the swapped replica is dealt from the same deck
    let events = read_event_log(output.join("logs/hu/tag-hu/seed1_rep1.ndjson")).unwrap();
    let swapped: Vec<String> = events
        .iter()
        .filter(|e| e.hand_id == "1-0-1")
        .filter_map(|e| match &e.event {
            Event::DealHole(d) => Some(format_cards(&d.cards).join(" ")),
            _ => None,
        })
        .collect();
    assert_eq!(swapped, first_hand);
    let (code, replica_out, _) = cli(&["deal", "--seed", "1", "--hand", "0", "--replica", "1"]);
    assert_eq!(code, 0);
    let replica_lines: Vec<&str> = replica_out.lines().collect();
    assert_eq!(replica_lines[0], "Key: 1:0:1");
    assert_eq!(replica_lines[1..], lines[1..]);
}

#[test]
fn six_max_lineup_from_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "series.json", SIXMAX_JSON);
    let output = dir.path().join("run");
    let output_arg = output.display().to_string();

    let (code, out, err) = cli(&["run", "--config", &config, "--output", &output_arg]);
    assert_eq!(code, 0, "stderr: {}", err);
    assert!(err.contains("--agent is ignored"));
    assert!(out.contains("Mode: sixmax  hands: 4"));
    let records = read_records(&output.join("metrics/per_hand_metrics.ndjson")).unwrap();
    assert_eq!(records.len(), 24);
}

#[test]
fn stopped_run_exits_130_with_partial_records() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "series.toml", HU_TOML);
    let output = dir.path().join("run");
    let output_arg = output.display().to_string();

    let (code, out, err) = cli(&[
        "run",
        "--config",
        &config,
        "--output",
        &output_arg,
        "--max-hands",
        "2",
    ]);
    assert_eq!(code, 130);
    assert!(err.contains("Interrupted: stopped after 2 hands"));
    assert!(out.contains("hands: 2"));
    let records = read_records(&output.join("metrics/per_hand_metrics.ndjson")).unwrap();
    assert_eq!(records.len(), 4);
}

#[test]
fn invalid_series_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "bad.toml",
        &HU_TOML.replace("replicas = 2", "replicas = 3"),
    );
    let output = dir.path().join("run");
    let output_arg = output.display().to_string();

    let (code, _, err) = cli(&["run", "--config", &config, "--output", &output_arg]);
    assert_eq!(code, 2);
    assert!(err.contains("Configuration error"));
    assert!(err.contains("replicas = 2"));
    assert!(!output.join("metrics").exists());

    let (code, _, err) = cli(&["run", "--config", "/definitely/missing.toml"]);
    assert_eq!(code, 2);
    assert!(err.contains("I/O error"));
}

#[test]
fn stats_recomputes_run_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "series.toml", HU_TOML);
    let output = dir.path().join("run");
    let output_arg = output.display().to_string();
    let (code, run_out, _) = cli(&[
        "run",
        "--config",
        &config,
        "--agent",
        "baseline:tag-hu?name=Mirror",
        "--output",
        &output_arg,
    ]);
    assert_eq!(code, 0);

    let input = output.join("metrics/per_hand_metrics.ndjson").display().to_string();
    let logs = output.join("logs").display().to_string();
    let (code, out, err) = cli(&["stats", "--input", &input, "--logs", &logs, "--bb", "100"]);
    assert_eq!(code, 0, "stderr: {}", err);
    assert!(out.starts_with("Records: 24  logs: 4"));
    // same table as the run printed
    let table = |text: &str| {
        text.lines()
            .filter(|l| l.starts_with("Mirror") || l.starts_with("tag-hu"))
            .map(str::to_string)
            .collect::<Vec<_>>()
    };
    assert_eq!(table(&out), table(&run_out));

    let (code, _, err) = cli(&["stats", "--input", &input]);
    assert_eq!(code, 0);
    assert!(err.contains("assuming a big blind of 100"));

    let (code, _, err) = cli(&["stats", "--input", "/definitely/missing.ndjson"]);
    assert_eq!(code, 2);
    assert!(err.contains("does not exist"));
}
