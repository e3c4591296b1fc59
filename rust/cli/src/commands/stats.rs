//! `stats`: recompute metrics offline from run artefacts.
//!
//! Records come from a `per_hand_metrics.ndjson` file. Behavior stats need
//! the event logs: either every `.ndjson` file under `--logs`, or the log
//! paths the records themselves point at. Missing logs only drop the
//! behavior columns.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use greenbench_engine::metrics::aggregate_run_metrics;
use greenbench_engine::runner::read_records;
use tracing::debug;

use crate::error::CliError;
use crate::ui;

pub const DEFAULT_BIG_BLIND: u32 = 100;

/// Every `.ndjson` file under `dir`, sorted for a stable read order.
fn collect_logs(dir: &Path, found: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_logs(&path, found)?;
        } else if path.extension().is_some_and(|e| e == "ndjson") {
            found.push(path);
        }
    }
    Ok(())
}

pub fn handle_stats_command(
    input: &Path,
    logs: Option<&Path>,
    big_blind: Option<u32>,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::InvalidInput(format!(
            "{} does not exist",
            input.display()
        )));
    }
    let records = read_records(input)?;
    if records.is_empty() {
        ui::display_warning(err, &format!("{} holds no records", input.display()))?;
    }

    let big_blind = match big_blind {
        Some(0) => return Err(CliError::InvalidInput("--bb must be >= 1".into())),
        Some(bb) => bb,
        None => {
            ui::display_warning(
                err,
                &format!("--bb not given, assuming a big blind of {}", DEFAULT_BIG_BLIND),
            )?;
            DEFAULT_BIG_BLIND
        }
    };

    let log_paths: Vec<PathBuf> = match logs {
        Some(dir) => {
            let mut found = Vec::new();
            collect_logs(dir, &mut found)?;
            found.sort();
            found
        }
        None => records
            .iter()
            .map(|r| PathBuf::from(&r.log_path))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
    };
    let missing = log_paths.iter().filter(|p| !p.exists()).count();
    if missing > 0 {
        ui::display_warning(
            err,
            &format!("{} event log(s) not found; behavior stats are partial", missing),
        )?;
    }
    debug!(records = records.len(), logs = log_paths.len(), "aggregating");

    let metrics = aggregate_run_metrics(&records, &log_paths, big_blind)?;
    writeln!(out, "Records: {}  logs: {}", records.len(), log_paths.len() - missing)?;
    ui::write_summary(out, &metrics)?;
    Ok(())
}
