//! `run`: play a configured series and summarize it.

use std::io::Write;
use std::path::PathBuf;

use greenbench_engine::agent::AgentSpec;
use greenbench_engine::runner::{CancelToken, Progress, Runner};
use tracing::info;

use crate::config;
use crate::error::CliError;
use crate::ui;

#[derive(Debug, Clone)]
pub struct RunArgs {
    pub config: PathBuf,
    pub agent: String,
    pub agent_name: Option<String>,
    pub output: PathBuf,
    /// Stop after this many hands, keeping partial artefacts
    pub max_hands: Option<u64>,
}

pub fn handle_run_command(
    args: &RunArgs,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    let resolved = config::load_with_sources(&args.config)?;
    info!(
        config = %args.config.display(),
        seeds = ?resolved.sources.seeds,
        decision_ms = ?resolved.sources.decision_ms,
        "series config loaded"
    );
    let series = resolved.config;
    let big_blind = series.blinds.bb;
    let seat_count = series.mode.seat_count();
    let mode = series.mode;

    let mut spec = AgentSpec::parse(&args.agent)?;
    if let Some(name) = &args.agent_name {
        spec.display_name = Some(name.clone());
    }
    if !series.needs_candidate() {
        ui::display_warning(err, "config seats a full lineup; --agent is ignored")?;
    }

    let registry = greenbench_ai::default_registry();
    let token = CancelToken::new();
    let mut runner = Runner::new(series, args.output.clone(), &registry)?
        .with_cancel_token(token.clone());
    if let Some(limit) = args.max_hands {
        let mut played = 0u64;
        runner = runner.on_progress(move |p| {
            if let Progress::HandResult { .. } = p {
                played += 1;
                if played >= limit {
                    token.cancel();
                }
            }
        });
    }
    let result = runner.run(Some(&spec))?;

    let hands = result.records.len() / seat_count;
    writeln!(out, "Mode: {}  hands: {}  bb: {}", mode, hands, big_blind)?;
    ui::write_summary(out, &result.metrics)?;
    writeln!(out, "Artefacts: {}", args.output.display())?;

    if result.cancelled {
        return Err(CliError::Interrupted(format!(
            "stopped after {} hands; partial artefacts in {}",
            hands,
            args.output.display()
        )));
    }
    Ok(())
}
