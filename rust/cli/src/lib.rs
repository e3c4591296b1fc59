//! # greenbench CLI Library
//!
//! Command-line front end for the benchmark. The binary is a thin wrapper
//! over [`run`], which parses arguments, dispatches to a command and maps
//! the outcome to an exit code.
//!
//! ## Subcommands
//!
//! - `run`: play a configured series and write logs and metrics
//! - `deal`: print the cards a `(seed, hand, replica)` key deals
//! - `eval`: evaluate five to seven cards
//! - `stats`: recompute metrics from run artefacts
//!
//! ## Example
//!
//! ```
//! let mut out = Vec::new();
//! let mut err = Vec::new();
//! let code = greenbench_cli::run(
//!     ["greenbench", "eval", "--cards", "Ah Ad Kc Kd 2s"],
//!     &mut out,
//!     &mut err,
//! );
//! assert_eq!(code, 0);
//! assert_eq!(String::from_utf8(out).unwrap().trim(), "Two Pair (A-K-2)");
//! ```

use std::io::Write;

use clap::Parser;

pub mod cli;
mod commands;
pub mod config;
mod error;
pub mod exit_code;
pub mod logging;
pub mod ui;

use cli::{Commands, GreenbenchCli};
use commands::{
    RunArgs, handle_deal_command, handle_eval_command, handle_run_command, handle_stats_command,
};

pub use error::CliError;
pub use logging::init_logging;

const COMMANDS: &[&str] = &["run", "deal", "eval", "stats"];

fn usage(err: &mut dyn Write) -> std::io::Result<()> {
    writeln!(err)?;
    writeln!(err, "greenbench: NLHE agent benchmark")?;
    writeln!(err, "Usage: greenbench <command> [options]\n")?;
    writeln!(err, "Commands:")?;
    for c in COMMANDS {
        writeln!(err, "  {}", c)?;
    }
    writeln!(err, "\nFor full help, run: greenbench --help")
}

/// Parses `args` (program name first), runs the command and returns the
/// process exit code: `0` on success, `2` on any error, `130` when a run
/// stopped early.
pub fn run<I, S>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let argv: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

    let cli = match GreenbenchCli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(e) => {
            use clap::error::ErrorKind;

            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    if write!(out, "{}", e).is_err() {
                        return exit_code::ERROR;
                    }
                    exit_code::SUCCESS
                }
                _ => {
                    let _ = write!(err, "{}", e).and_then(|_| usage(err));
                    exit_code::ERROR
                }
            };
        }
    };

    let result = match cli.cmd {
        Commands::Run {
            config,
            agent,
            agent_name,
            output,
            max_hands,
        } => {
            let args = RunArgs {
                config,
                agent,
                agent_name,
                output,
                max_hands,
            };
            handle_run_command(&args, out, err)
        }
        Commands::Deal {
            seed,
            hand,
            replica,
            seats,
        } => handle_deal_command(seed, hand, replica, usize::from(seats), out),
        Commands::Eval { cards } => handle_eval_command(&cards, out),
        Commands::Stats { input, logs, bb } => {
            handle_stats_command(&input, logs.as_deref(), bb, out, err)
        }
    };

    match result {
        Ok(()) => exit_code::SUCCESS,
        Err(e) => {
            let _ = ui::write_error(err, &e.to_string());
            match e {
                CliError::Interrupted(_) => exit_code::INTERRUPTED,
                _ => exit_code::ERROR,
            }
        }
    }
}
