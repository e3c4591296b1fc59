use thiserror::Error;

use crate::player::ActionKind;

/// Legality failures for a single decision. These never escape the engine:
/// the governance layer turns them into penalties and substitutes an action.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid raise amount: {amount}, minimum: {minimum}")]
    InvalidRaiseAmount { amount: u32, minimum: u32 },
    #[error("Raise to {amount} exceeds available chips (max {maximum})")]
    RaiseAboveStack { amount: u32, maximum: u32 },
    #[error("Short all-in raise must commit the whole stack ({maximum}), got {amount}")]
    ShortAllInMismatch { amount: u32, maximum: u32 },
    #[error("raise_to requires an amount")]
    MissingAmount,
    #[error("Unknown action tag: {0:?}")]
    UnknownAction(String),
    #[error("Action {0} is not legal at this decision point")]
    ActionNotLegal(ActionKind),
    #[error("Invalid card token: {0:?}")]
    InvalidCard(String),
}

/// Errors reported by an agent call. Absorbed by the governance layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentError {
    #[error("agent did not answer within the decision budget")]
    Timeout,
    #[error("agent failed: {0}")]
    Failed(String),
}

/// Fatal per-hand failures. An invariant violation means the core itself is
/// wrong and the run must stop before writing metrics.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invariant violated in hand {hand_id}: {message}")]
    Invariant { hand_id: String, message: String },
    #[error("Table needs between 2 and 6 seats, got {0}")]
    InvalidTable(usize),
    #[error("Deck exhausted while dealing hand {0}")]
    DeckExhausted(String),
    #[error("Event log I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Event serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Series configuration errors, detected before any hand is played.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("mode must be 'hu' or 'sixmax', got {0:?}")]
    UnknownMode(String),
    #[error("{0}")]
    Missing(&'static str),
    #[error("heads-up duplicate replication requires replicas = 2, got {0}")]
    HeadsUpReplicas(u32),
    #[error("{mode} lineup must contain exactly {expected} entries, got {actual}")]
    LineupSize {
        mode: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("blinds must satisfy 0 < sb <= bb, got sb={sb} bb={bb}")]
    InvalidBlinds { sb: u32, bb: u32 },
    #[error("{0} must be >= 1")]
    NonPositive(&'static str),
    #[error("table would hold {0} chips, more than a u32 can count")]
    StackTooLarge(u64),
    #[error("unknown agent {0:?}")]
    UnknownAgent(String),
    #[error("opponent weights must contain at least one positive entry")]
    EmptyMix,
    #[error("invalid agent spec {spec:?}: {reason}")]
    InvalidAgentSpec { spec: String, reason: String },
}

/// Errors surfaced by a benchmark run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Artefact I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Artefact serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
