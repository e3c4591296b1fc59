//! Series orchestration: seeds, duplicate replicas, seat rotation, and the
//! artefacts a run leaves behind.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::agent::{Agent, AgentRegistry, AgentSpec};
use crate::deck::{DealKey, Deck};
use crate::engine::{Engine, EngineConfig, HandContext, HandOutcome};
use crate::errors::{ConfigError, RunError};
use crate::game::TableLayout;
use crate::logger::{Blinds, HandRecord, NdjsonSink};
use crate::metrics::{aggregate_run_metrics, RunMetrics};

pub const HEADS_UP_SEATS: usize = 2;
pub const SIX_MAX_SEATS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Hu,
    Sixmax,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Hu => "hu",
            Mode::Sixmax => "sixmax",
        }
    }

    pub fn seat_count(self) -> usize {
        match self {
            Mode::Hu => HEADS_UP_SEATS,
            Mode::Sixmax => SIX_MAX_SEATS,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hu" => Ok(Mode::Hu),
            "sixmax" | "6max" => Ok(Mode::Sixmax),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

fn default_stacks_bb() -> u32 {
    100
}

fn default_decision_ms() -> u64 {
    60_000
}

/// Everything needed to reproduce a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    pub mode: Mode,
    pub blinds: Blinds,
    #[serde(default = "default_stacks_bb")]
    pub stacks_bb: u32,
    pub seeds: Vec<u64>,
    #[serde(default)]
    pub hands_per_seed: Option<u64>,
    #[serde(default)]
    pub replicas: Option<u32>,
    #[serde(default)]
    pub opponent_mix: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub hands_per_replica: Option<u64>,
    #[serde(default)]
    pub seat_replicas: Option<u32>,
    #[serde(default)]
    pub opponent_pool: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub opponent_lineup: Option<Vec<String>>,
    #[serde(default)]
    pub lineup: Option<Vec<String>>,
    #[serde(default = "default_decision_ms")]
    pub decision_ms: u64,
}

impl SeriesConfig {
    pub fn starting_stack(&self) -> u32 {
        self.stacks_bb.saturating_mul(self.blinds.bb)
    }

    fn has_lineup(&self) -> bool {
        self.lineup.as_ref().is_some_and(|l| !l.is_empty())
    }

    /// A full lineup seats every agent from the config; otherwise the run
    /// needs a candidate agent.
    pub fn needs_candidate(&self) -> bool {
        !self.has_lineup()
    }

    /// Structural checks. Every failure is fatal before any hand is played.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blinds.sb == 0 || self.blinds.sb > self.blinds.bb {
            return Err(ConfigError::InvalidBlinds {
                sb: self.blinds.sb,
                bb: self.blinds.bb,
            });
        }
        if self.stacks_bb == 0 {
            return Err(ConfigError::NonPositive("stacks_bb"));
        }
        let table_chips = u64::from(self.stacks_bb)
            * u64::from(self.blinds.bb)
            * self.mode.seat_count() as u64;
        if table_chips > u64::from(u32::MAX) {
            return Err(ConfigError::StackTooLarge(table_chips));
        }
        if self.decision_ms == 0 {
            return Err(ConfigError::NonPositive("decision_ms"));
        }
        if self.seeds.is_empty() {
            return Err(ConfigError::Missing("seeds must contain at least one seed"));
        }

        match self.mode {
            Mode::Hu => {
                let hands = self
                    .hands_per_seed
                    .ok_or(ConfigError::Missing("hu mode requires hands_per_seed"))?;
                if hands == 0 {
                    return Err(ConfigError::NonPositive("hands_per_seed"));
                }
                let replicas = self
                    .replicas
                    .ok_or(ConfigError::Missing("hu mode requires replicas"))?;
                if replicas != 2 {
                    return Err(ConfigError::HeadsUpReplicas(replicas));
                }
                if let Some(lineup) = self.lineup.as_ref().filter(|l| !l.is_empty()) {
                    check_len("hu lineup", lineup, HEADS_UP_SEATS)?;
                } else {
                    let mix = self.opponent_mix.as_ref().ok_or(ConfigError::Missing(
                        "hu mode requires opponent_mix or lineup",
                    ))?;
                    assignment_cycle(mix)?;
                }
            }
            Mode::Sixmax => {
                let hands = self
                    .hands_per_replica
                    .ok_or(ConfigError::Missing("sixmax mode requires hands_per_replica"))?;
                if hands == 0 {
                    return Err(ConfigError::NonPositive("hands_per_replica"));
                }
                let replicas = self
                    .seat_replicas
                    .ok_or(ConfigError::Missing("sixmax mode requires seat_replicas"))?;
                if replicas == 0 {
                    return Err(ConfigError::NonPositive("seat_replicas"));
                }
                if let Some(lineup) = self.lineup.as_ref().filter(|l| !l.is_empty()) {
                    check_len("sixmax lineup", lineup, SIX_MAX_SEATS)?;
                } else if let Some(opponents) = &self.opponent_lineup {
                    check_len("sixmax opponent_lineup", opponents, SIX_MAX_SEATS - 1)?;
                } else {
                    let pool = self.opponent_pool.as_ref().ok_or(ConfigError::Missing(
                        "sixmax mode requires opponent_pool, opponent_lineup or lineup",
                    ))?;
                    assignment_cycle(pool)?;
                }
            }
        }
        Ok(())
    }

    /// Every agent spec the config can seat.
    pub fn agent_specs(&self) -> Vec<&str> {
        let mut specs: Vec<&str> = Vec::new();
        for list in [&self.lineup, &self.opponent_lineup].into_iter().flatten() {
            specs.extend(list.iter().map(String::as_str));
        }
        for mix in [&self.opponent_mix, &self.opponent_pool].into_iter().flatten() {
            specs.extend(
                mix.iter()
                    .filter(|(_, &w)| w > 0.0)
                    .map(|(name, _)| name.as_str()),
            );
        }
        specs
    }

    /// Resolves every configured agent against `registry`.
    pub fn check_agents(&self, registry: &AgentRegistry) -> Result<(), ConfigError> {
        for spec in self.agent_specs() {
            let parsed = AgentSpec::parse(spec)?;
            if !registry.contains(&parsed.id) {
                return Err(ConfigError::UnknownAgent(parsed.id));
            }
        }
        Ok(())
    }
}

fn check_len(what: &'static str, list: &[String], expected: usize) -> Result<(), ConfigError> {
    if list.len() != expected {
        return Err(ConfigError::LineupSize {
            mode: what,
            expected,
            actual: list.len(),
        });
    }
    Ok(())
}

/// Expands weights into a repeating cycle: heaviest entries first (ties in
/// name order), each repeated `max(floor(weight * 10), 1)` times.
/// Non-positive weights drop out.
pub fn assignment_cycle(weights: &BTreeMap<String, f64>) -> Result<Vec<String>, ConfigError> {
    let mut entries: Vec<(&String, f64)> = weights
        .iter()
        .map(|(name, &weight)| (name, weight))
        .filter(|&(_, weight)| !weight.is_nan() && weight > 0.0)
        .collect();
    if entries.is_empty() {
        return Err(ConfigError::EmptyMix);
    }
    // stable sort keeps name order among equal weights
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    let mut cycle = Vec::new();
    for (name, weight) in entries {
        let copies = ((weight * 10.0).floor() as usize).max(1);
        cycle.extend(std::iter::repeat(name.clone()).take(copies));
    }
    Ok(cycle)
}

/// Rotates a seat assignment right by `replica` seats.
pub fn rotate_assignment<T: Clone>(assignment: &[T], replica: u32) -> Vec<T> {
    let mut rotated = assignment.to_vec();
    if !rotated.is_empty() {
        let shift = replica as usize % rotated.len();
        rotated.rotate_right(shift);
    }
    rotated
}

/// Five pool opponents for the seed at `seed_index`, read from the cycle
/// starting at `5 * seed_index`.
pub fn pool_lineup(cycle: &[String], seed_index: usize) -> Vec<String> {
    let n = SIX_MAX_SEATS - 1;
    if cycle.is_empty() {
        return Vec::new();
    }
    (0..n)
        .map(|i| cycle[(seed_index * n + i) % cycle.len()].clone())
        .collect()
}

/// Shared flag that stops a run between hands.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Coarse progress notifications for front ends.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    SeedStart {
        mode: Mode,
        seed: u64,
        seed_index: usize,
    },
    TableStart {
        seed: u64,
        replica_id: u32,
        seats: Vec<String>,
    },
    HandResult {
        hand_id: String,
        deltas: Vec<i64>,
    },
}

#[derive(Debug)]
pub struct RunResult {
    pub records: Vec<HandRecord>,
    pub log_paths: Vec<PathBuf>,
    pub per_hand_metrics_path: PathBuf,
    pub metrics_path: PathBuf,
    pub metrics: RunMetrics,
    pub cancelled: bool,
}

/// Seats built for one table: specs, labels and live agents by seat.
struct Table {
    labels: Vec<String>,
    agents: Vec<Box<dyn Agent>>,
    sink: NdjsonSink,
}

pub struct Runner<'r> {
    config: SeriesConfig,
    output_dir: PathBuf,
    registry: &'r AgentRegistry,
    cancel: CancelToken,
    progress: Option<Box<dyn FnMut(&Progress) + 'r>>,
}

impl<'r> Runner<'r> {
    /// Validates `config` against `registry` before anything runs.
    pub fn new(
        config: SeriesConfig,
        output_dir: impl Into<PathBuf>,
        registry: &'r AgentRegistry,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        config.check_agents(registry)?;
        Ok(Self {
            config,
            output_dir: output_dir.into(),
            registry,
            cancel: CancelToken::new(),
            progress: None,
        })
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Progress) + 'r,
    {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn config(&self) -> &SeriesConfig {
        &self.config
    }

    fn notify(&mut self, event: Progress) {
        if let Some(cb) = self.progress.as_mut() {
            cb(&event);
        }
    }

    /// Plays the whole series and writes logs, per-hand records and metrics.
    ///
    /// `candidate` is the agent under test. It is required unless the config
    /// seats a full lineup, and ignored when it does.
    pub fn run(&mut self, candidate: Option<&AgentSpec>) -> Result<RunResult, RunError> {
        let candidate = match (self.config.needs_candidate(), candidate) {
            (true, None) => {
                return Err(ConfigError::Missing(
                    "an agent is required unless the config provides a full lineup",
                )
                .into())
            }
            (true, Some(spec)) => {
                if !self.registry.contains(&spec.id) {
                    return Err(ConfigError::UnknownAgent(spec.id.clone()).into());
                }
                Some(spec.clone())
            }
            (false, _) => None,
        };
        info!(
            mode = %self.config.mode,
            seeds = self.config.seeds.len(),
            candidate = candidate.as_ref().map(AgentSpec::label).unwrap_or("lineup"),
            "starting run"
        );

        let mut records = Vec::new();
        let mut log_paths = Vec::new();
        let cancelled = match self.config.mode {
            Mode::Hu => self.run_heads_up(candidate.as_ref(), &mut records, &mut log_paths)?,
            Mode::Sixmax => self.run_six_max(candidate.as_ref(), &mut records, &mut log_paths)?,
        };
        if cancelled {
            warn!(hands = records.len(), "run cancelled, writing partial artefacts");
        }

        let metrics_dir = self.output_dir.join("metrics");
        create_dir_all(&metrics_dir)?;
        let per_hand_metrics_path = metrics_dir.join("per_hand_metrics.ndjson");
        write_records(&per_hand_metrics_path, &records)?;
        let metrics = aggregate_run_metrics(&records, &log_paths, self.config.blinds.bb)?;
        let metrics_path = metrics_dir.join("metrics.json");
        std::fs::write(&metrics_path, serde_json::to_string_pretty(&metrics)?)?;
        info!(path = %metrics_path.display(), players = metrics.len(), "metrics written");

        Ok(RunResult {
            records,
            log_paths,
            per_hand_metrics_path,
            metrics_path,
            metrics,
            cancelled,
        })
    }

    fn engine(&self) -> Result<Engine, RunError> {
        let mode = self.config.mode;
        Ok(Engine::new(EngineConfig {
            table_id: format!("greenbench-{}", mode),
            seat_count: mode.seat_count(),
            blinds: self.config.blinds,
            starting_stack: self.config.starting_stack(),
            decision_ms: self.config.decision_ms,
        })?)
    }

    fn open_table(&self, specs: &[AgentSpec], log_path: &Path) -> Result<Table, RunError> {
        let agents = specs
            .iter()
            .map(|spec| self.registry.create(spec))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Table {
            labels: agents.iter().map(|a| a.name().to_string()).collect(),
            agents,
            sink: NdjsonSink::create(log_path)?,
        })
    }

    fn play(
        &self,
        engine: &Engine,
        table: &mut Table,
        ctx: HandContext,
    ) -> Result<HandOutcome, RunError> {
        // every replica and rotation of a seed/hand sees the same cards
        let deck = Deck::for_key(DealKey::new(ctx.seed, ctx.hand_index, 0));
        Ok(engine.play_hand(ctx, &deck, &mut table.agents, &mut table.sink)?)
    }

    fn run_heads_up(
        &mut self,
        candidate: Option<&AgentSpec>,
        records: &mut Vec<HandRecord>,
        log_paths: &mut Vec<PathBuf>,
    ) -> Result<bool, RunError> {
        let engine = self.engine()?;
        let hands = self.config.hands_per_seed.unwrap_or(0);
        let lineup = parse_specs(self.config.lineup.as_deref().unwrap_or_default())?;
        let cycle = match &self.config.opponent_mix {
            Some(mix) if lineup.is_empty() => assignment_cycle(mix)?,
            _ => Vec::new(),
        };
        let seeds = self.config.seeds.clone();

        for (seed_index, &seed) in seeds.iter().enumerate() {
            let pair: Vec<AgentSpec> = match candidate {
                Some(c) if lineup.is_empty() => {
                    vec![c.clone(), AgentSpec::parse(&cycle[seed_index % cycle.len()])?]
                }
                _ => rotate_assignment(&lineup, seed_index as u32),
            };
            self.notify(Progress::SeedStart {
                mode: Mode::Hu,
                seed,
                seed_index,
            });
            info!(seed, a = pair[0].label(), b = pair[1].label(), "heads-up seed");

            for replica_id in 0..2u32 {
                // replica 1 swaps seats; the button stays on seat 0
                let by_seat: Vec<AgentSpec> = if replica_id == 0 {
                    pair.clone()
                } else {
                    vec![pair[1].clone(), pair[0].clone()]
                };
                let log_path = self
                    .output_dir
                    .join("logs")
                    .join("hu")
                    .join(path_label(pair[1].label()))
                    .join(format!("seed{}_rep{}.ndjson", seed, replica_id));
                let mut table = self.open_table(&by_seat, &log_path)?;
                log_paths.push(log_path.clone());
                self.notify(Progress::TableStart {
                    seed,
                    replica_id,
                    seats: table.labels.clone(),
                });

                for hand_index in 0..hands {
                    if self.cancel.is_cancelled() {
                        return Ok(true);
                    }
                    let layout = TableLayout::for_hand(HEADS_UP_SEATS, seed, hand_index)?;
                    let ctx = HandContext {
                        seed,
                        hand_index,
                        replica_id,
                        button: layout.button(),
                    };
                    let outcome = self.play(&engine, &mut table, ctx)?;
                    for seat in 0..HEADS_UP_SEATS {
                        records.push(hand_record(
                            &table.labels[seat],
                            &table.labels[1 - seat],
                            Mode::Hu,
                            &ctx,
                            seat,
                            layout.position_of(seat).label(),
                            &outcome,
                            &log_path,
                        ));
                    }
                    debug!(hand_id = %outcome.hand_id, deltas = ?outcome.deltas, "hand recorded");
                    self.notify(Progress::HandResult {
                        hand_id: outcome.hand_id,
                        deltas: outcome.deltas,
                    });
                }
            }
        }
        Ok(false)
    }

    fn run_six_max(
        &mut self,
        candidate: Option<&AgentSpec>,
        records: &mut Vec<HandRecord>,
        log_paths: &mut Vec<PathBuf>,
    ) -> Result<bool, RunError> {
        let engine = self.engine()?;
        let hands = self.config.hands_per_replica.unwrap_or(0);
        let seat_replicas = self.config.seat_replicas.unwrap_or(0);
        let lineup = parse_specs(self.config.lineup.as_deref().unwrap_or_default())?;
        let fixed_opponents =
            parse_specs(self.config.opponent_lineup.as_deref().unwrap_or_default())?;
        let cycle = match &self.config.opponent_pool {
            Some(pool) if lineup.is_empty() && fixed_opponents.is_empty() => {
                assignment_cycle(pool)?
            }
            _ => Vec::new(),
        };
        let seeds = self.config.seeds.clone();

        for (seed_index, &seed) in seeds.iter().enumerate() {
            // index 0 of the base assignment is the candidate, if any
            let base: Vec<AgentSpec> = match candidate {
                Some(c) if lineup.is_empty() => {
                    let opponents = if fixed_opponents.is_empty() {
                        parse_specs(&pool_lineup(&cycle, seed_index))?
                    } else {
                        fixed_opponents.clone()
                    };
                    std::iter::once(c.clone()).chain(opponents).collect()
                }
                _ => lineup.clone(),
            };
            let has_candidate = candidate.is_some() && lineup.is_empty();
            self.notify(Progress::SeedStart {
                mode: Mode::Sixmax,
                seed,
                seed_index,
            });
            info!(seed, "six-max seed");

            for replica_id in 0..seat_replicas {
                let rotated = rotate_assignment(&base, replica_id);
                let candidate_seat = has_candidate
                    .then(|| replica_id as usize % SIX_MAX_SEATS);
                let log_path = self
                    .output_dir
                    .join("logs")
                    .join("sixmax")
                    .join(format!("seed{}_rep{}.ndjson", seed, replica_id));
                let mut table = self.open_table(&rotated, &log_path)?;
                log_paths.push(log_path.clone());
                self.notify(Progress::TableStart {
                    seed,
                    replica_id,
                    seats: table.labels.clone(),
                });

                for hand_index in 0..hands {
                    if self.cancel.is_cancelled() {
                        return Ok(true);
                    }
                    let layout = TableLayout::for_hand(SIX_MAX_SEATS, seed, hand_index)?;
                    let ctx = HandContext {
                        seed,
                        hand_index,
                        replica_id,
                        button: layout.button(),
                    };
                    let outcome = self.play(&engine, &mut table, ctx)?;
                    for seat in 0..SIX_MAX_SEATS {
                        let opponent = match candidate_seat {
                            None => "table".to_string(),
                            Some(c) if c == seat => "mix".to_string(),
                            Some(c) => table.labels[c].clone(),
                        };
                        records.push(hand_record(
                            &table.labels[seat],
                            &opponent,
                            Mode::Sixmax,
                            &ctx,
                            seat,
                            layout.position_of(seat).label(),
                            &outcome,
                            &log_path,
                        ));
                    }
                    debug!(hand_id = %outcome.hand_id, "hand recorded");
                    self.notify(Progress::HandResult {
                        hand_id: outcome.hand_id,
                        deltas: outcome.deltas,
                    });
                }
            }
        }
        Ok(false)
    }
}

fn parse_specs(specs: &[String]) -> Result<Vec<AgentSpec>, ConfigError> {
    specs.iter().map(|s| AgentSpec::parse(s)).collect()
}

#[allow(clippy::too_many_arguments)]
fn hand_record(
    player: &str,
    opponent: &str,
    mode: Mode,
    ctx: &HandContext,
    seat: usize,
    position: &str,
    outcome: &HandOutcome,
    log_path: &Path,
) -> HandRecord {
    HandRecord {
        player: player.to_string(),
        opponent: opponent.to_string(),
        mode: mode.as_str().to_string(),
        seed: ctx.seed,
        hand_index: ctx.hand_index,
        replica_id: ctx.replica_id,
        seat,
        position: position.to_string(),
        delta: outcome.deltas[seat],
        timeouts: outcome.timeouts[seat],
        illegal_actions: outcome.illegal_actions[seat],
        log_path: log_path.display().to_string(),
    }
}

/// Directory-safe form of an agent label.
fn path_label(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Writes one JSON record per line.
pub fn write_records(path: &Path, records: &[HandRecord]) -> Result<(), RunError> {
    let mut w = BufWriter::new(File::create(path)?);
    for r in records {
        serde_json::to_writer(&mut w, r)?;
        w.write_all(b"\n")?;
    }
    w.flush()?;
    Ok(())
}

/// Reads a file written by [`write_records`]. Blank lines are skipped.
pub fn read_records(path: &Path) -> Result<Vec<HandRecord>, RunError> {
    let text = std::fs::read_to_string(path)?;
    let mut out = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        out.push(serde_json::from_str(line)?);
    }
    Ok(out)
}
