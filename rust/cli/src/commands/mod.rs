//! Command handlers for the `greenbench` CLI.
//!
//! Each command lives in its own module and exposes one
//! `handle_<name>_command` function that writes to injected streams and
//! returns `Result<(), CliError>`.

pub mod deal;
pub mod eval;
pub mod run;
pub mod stats;

pub use deal::handle_deal_command;
pub use eval::handle_eval_command;
pub use run::{handle_run_command, RunArgs};
pub use stats::handle_stats_command;
