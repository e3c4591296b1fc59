//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "greenbench",
    version,
    about = "Deterministic No-Limit Hold'em agent benchmark"
)]
pub struct GreenbenchCli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a benchmark series from a TOML or JSON config
    Run {
        #[arg(long)]
        config: PathBuf,
        /// Agent under test, e.g. `baseline:tag-hu?name=Mine`
        #[arg(long, default_value = "baseline:random-hu")]
        agent: String,
        /// Label for the agent in records and metrics
        #[arg(long)]
        agent_name: Option<String>,
        #[arg(long, default_value = "artifacts/latest_run")]
        output: PathBuf,
        /// Stop after N hands and keep the partial artefacts
        #[arg(long, hide = true, value_parser = clap::value_parser!(u64).range(1..))]
        max_hands: Option<u64>,
    },
    /// Print the deterministic deal for a key
    Deal {
        #[arg(long)]
        seed: u64,
        #[arg(long, default_value_t = 0)]
        hand: u64,
        #[arg(long, default_value_t = 0)]
        replica: u32,
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(2..=6))]
        seats: u8,
    },
    /// Evaluate the best hand from 5 to 7 cards
    Eval {
        /// Cards such as "As Ks Qs Js Ts 2c 3d"
        #[arg(long)]
        cards: String,
    },
    /// Recompute metrics from a per-hand records file
    Stats {
        #[arg(long)]
        input: PathBuf,
        /// Directory of event logs for behavior stats
        #[arg(long)]
        logs: Option<PathBuf>,
        /// Big blind used for bb/100
        #[arg(long)]
        bb: Option<u32>,
    },
}
