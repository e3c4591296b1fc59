//! Append-only hand event log and the per-hand summary record.
//!
//! The engine writes [`EventLogEntry`] values into an [`EventSink`]; the
//! metrics aggregator reads them back. [`NdjsonSink`] writes one JSON object
//! per line (LF only) and flushes after every record so a crashed run still
//! leaves a readable prefix.

use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::errors::EngineError;
use crate::player::ActionKind;

/// Represents a betting street in Texas Hold'em poker.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Street {
    /// Before flop (hole cards dealt)
    Preflop,
    /// After flop (3 community cards)
    Flop,
    /// After turn (4th community card)
    Turn,
    /// After river (5th community card)
    River,
}

impl Street {
    /// Community cards on the table once this street is dealt.
    pub fn board_len(self) -> usize {
        match self {
            Street::Preflop => 0,
            Street::Flop => 3,
            Street::Turn => 4,
            Street::River => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Blinds {
    pub sb: u32,
    pub bb: u32,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlindKind {
    Small,
    Big,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyKind {
    Timeout,
    IllegalAction,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeatInfo {
    pub seat: usize,
    pub name: String,
    pub stack: u32,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct HandStart {
    pub table_id: String,
    pub seed: u64,
    pub hand_index: u64,
    pub replica_id: u32,
    pub button_seat: usize,
    pub blinds: Blinds,
    pub seats: Vec<SeatInfo>,
    pub rng_tag: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct DealHole {
    pub seat: usize,
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct BlindPosted {
    pub seat: usize,
    pub blind: BlindKind,
    pub amount: u32,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ActionTaken {
    pub seat: usize,
    pub street: Street,
    pub action: ActionKind,
    #[serde(default)]
    pub amount: Option<u32>,
    pub to_call: u32,
    pub min_raise_to: u32,
    pub elapsed_ms: u64,
    pub stack_after: u32,
    pub bet: u32,
    pub pot_delta: u32,
    pub pot: u32,
}

/// The response an agent actually sent, kept verbatim for audit.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct AttemptedAction {
    pub action: String,
    #[serde(default)]
    pub amount: Option<u32>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Penalty {
    pub seat: usize,
    pub street: Street,
    pub kind: PenaltyKind,
    #[serde(default)]
    pub attempted: Option<AttemptedAction>,
    pub reason: String,
    pub elapsed_ms: u64,
    pub fallback: ActionKind,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct BoardDeal {
    pub street: Street,
    pub cards: Vec<Card>,
    pub board: Vec<Card>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ShownHand {
    pub seat: usize,
    pub cards: Vec<Card>,
    pub strength: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PotAward {
    pub amount: u32,
    pub eligible: Vec<usize>,
    pub winners: Vec<usize>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct UncalledReturn {
    pub seat: usize,
    pub amount: u32,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Showdown {
    pub board: Vec<Card>,
    pub hands: Vec<ShownHand>,
    pub pots: Vec<PotAward>,
    #[serde(default)]
    pub uncalled: Option<UncalledReturn>,
    #[serde(default)]
    pub last_aggressor: Option<usize>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct HandEnd {
    /// Indexed by seat
    pub contributions: Vec<u32>,
    pub payouts: Vec<u32>,
    pub deltas: Vec<i64>,
    #[serde(default)]
    pub uncalled: Option<UncalledReturn>,
    pub went_to_showdown: bool,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    HandStart(HandStart),
    DealHole(DealHole),
    Blind(BlindPosted),
    Action(ActionTaken),
    Penalty(Penalty),
    BoardDeal(BoardDeal),
    Showdown(Showdown),
    HandEnd(HandEnd),
}

/// One line of the event log.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    /// RFC3339 UTC timestamp
    pub ts: String,
    /// `seed-handIndex-replicaId`
    pub hand_id: String,
    #[serde(flatten)]
    pub event: Event,
}

impl EventLogEntry {
    pub fn now(hand_id: &str, event: Event) -> Self {
        Self {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            hand_id: hand_id.to_string(),
            event,
        }
    }
}

pub fn format_hand_id(seed: u64, hand_index: u64, replica_id: u32) -> String {
    format!("{}-{}-{}", seed, hand_index, replica_id)
}

pub fn format_rng_tag(seed: u64, hand_index: u64, replica_id: u32) -> String {
    format!("{}:{}:{}", seed, hand_index, replica_id)
}

/// Destination for engine events.
pub trait EventSink {
    fn record(&mut self, entry: EventLogEntry) -> Result<(), EngineError>;
}

/// Keeps events in memory. Handy for tests and for in-process metrics.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    entries: Vec<EventLogEntry>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[EventLogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<EventLogEntry> {
        self.entries
    }
}

impl EventSink for MemorySink {
    fn record(&mut self, entry: EventLogEntry) -> Result<(), EngineError> {
        self.entries.push(entry);
        Ok(())
    }
}

/// Writes newline-delimited JSON to a file.
pub struct NdjsonSink {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl NdjsonSink {
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        let f = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(f),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for NdjsonSink {
    fn record(&mut self, entry: EventLogEntry) -> Result<(), EngineError> {
        let line = serde_json::to_string(&entry)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Reads an NDJSON event log written by [`NdjsonSink`]. Blank lines are skipped.
pub fn read_event_log<P: AsRef<Path>>(path: P) -> Result<Vec<EventLogEntry>, EngineError> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}

/// Post-hand summary for one seat, produced by the runner.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct HandRecord {
    pub player: String,
    pub opponent: String,
    pub mode: String,
    pub seed: u64,
    pub hand_index: u64,
    pub replica_id: u32,
    pub seat: usize,
    pub position: String,
    pub delta: i64,
    pub timeouts: u32,
    pub illegal_actions: u32,
    pub log_path: String,
}
