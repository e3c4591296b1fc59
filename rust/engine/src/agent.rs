//! The decision contract between the engine and pluggable agents.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::errors::{AgentError, ConfigError};
use crate::game::TableLayout;
use crate::logger::{Blinds, Street};
use crate::player::ActionKind;

/// Table parameters handed to [`Agent::reset`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub table_id: String,
    pub seat_count: usize,
    pub blinds: Blinds,
    pub starting_stack: u32,
    /// Display names indexed by seat
    pub seat_names: Vec<String>,
}

/// One earlier decision in the current hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub seat_id: usize,
    pub action: ActionKind,
    #[serde(default)]
    pub amount: Option<u32>,
    pub street: Street,
    pub to_call: u32,
    pub min_raise_to: u32,
}

/// Snapshot sent to an agent for a single decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub seat_count: usize,
    pub table_id: String,
    pub hand_id: String,
    pub seat_id: usize,
    pub button_seat: usize,
    pub blinds: Blinds,
    /// Chips behind, indexed by seat
    pub stacks: Vec<u32>,
    pub pot: u32,
    pub to_call: u32,
    pub min_raise_to: u32,
    pub hole_cards: Vec<Card>,
    pub board: Vec<Card>,
    pub action_history: Vec<HistoryEntry>,
    pub legal_actions: Vec<ActionKind>,
    pub timebank_ms: u64,
    pub rng_tag: String,
}

impl ActionRequest {
    pub fn street(&self) -> Street {
        match self.board.len() {
            0..=2 => Street::Preflop,
            3 => Street::Flop,
            4 => Street::Turn,
            _ => Street::River,
        }
    }

    pub fn is_legal(&self, kind: ActionKind) -> bool {
        self.legal_actions.contains(&kind)
    }

    /// Chips the acting seat still has behind.
    pub fn own_stack(&self) -> u32 {
        self.stacks.get(self.seat_id).copied().unwrap_or(0)
    }

    /// Chips the acting seat already has in front of it this street,
    /// rebuilt from its blind and its own history entries.
    pub fn own_street_bet(&self) -> u32 {
        let street = self.street();
        let mut bet = 0;
        if street == Street::Preflop {
            if let Ok(layout) = TableLayout::new(self.seat_count, self.button_seat) {
                if self.seat_id == layout.small_blind_seat() {
                    bet = self.blinds.sb;
                } else if self.seat_id == layout.big_blind_seat() {
                    bet = self.blinds.bb;
                }
            }
        }
        for entry in &self.action_history {
            if entry.seat_id != self.seat_id || entry.street != street {
                continue;
            }
            match (entry.action, entry.amount) {
                (ActionKind::Call, _) => bet += entry.to_call,
                (ActionKind::RaiseTo, Some(total)) => bet = total,
                _ => {}
            }
        }
        bet
    }

    /// Largest legal raise target: everything behind plus the street bet.
    pub fn max_raise_to(&self) -> u32 {
        self.own_street_bet() + self.own_stack()
    }

    /// Clamps a desired raise target into `[min_raise_to, max_raise_to]`.
    /// A stack that cannot reach the minimum goes all-in instead.
    pub fn raise_target(&self, desired: u32) -> u32 {
        desired.max(self.min_raise_to).min(self.max_raise_to())
    }
}

/// An agent's answer. `action` stays a raw tag so that malformed answers can
/// be logged verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub action: String,
    /// Total street bet to raise to; required iff `action` is `raise_to`.
    #[serde(default)]
    pub amount: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// Time spent waiting on something outside the agent's control
    /// (rate limits, queues). Deducted from the measured decision time.
    #[serde(default)]
    pub wait_time_ms: u64,
}

impl ActionResponse {
    pub fn new(action: ActionKind, amount: Option<u32>) -> Self {
        Self {
            action: action.as_str().to_string(),
            amount,
            metadata: None,
            wait_time_ms: 0,
        }
    }

    pub fn fold() -> Self {
        Self::new(ActionKind::Fold, None)
    }

    pub fn check() -> Self {
        Self::new(ActionKind::Check, None)
    }

    pub fn call() -> Self {
        Self::new(ActionKind::Call, None)
    }

    pub fn raise_to(amount: u32) -> Self {
        Self::new(ActionKind::RaiseTo, Some(amount))
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A decision maker seated at the table.
pub trait Agent: Send {
    fn name(&self) -> &str;

    /// Called before every hand with the agent's seat.
    fn reset(&mut self, _seat_id: usize, _table: &TableConfig) {}

    fn act(&mut self, request: &ActionRequest) -> Result<ActionResponse, AgentError>;
}

impl<A: Agent + ?Sized> Agent for Box<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn reset(&mut self, seat_id: usize, table: &TableConfig) {
        (**self).reset(seat_id, table)
    }

    fn act(&mut self, request: &ActionRequest) -> Result<ActionResponse, AgentError> {
        (**self).act(request)
    }
}

pub type AgentParams = BTreeMap<String, String>;

/// A parsed agent reference: `name` or `baseline:name?key=value&name=Label`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSpec {
    pub id: String,
    pub params: AgentParams,
    pub display_name: Option<String>,
}

impl AgentSpec {
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidAgentSpec {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };
        let trimmed = spec.trim();
        let body = trimmed.strip_prefix("baseline:").unwrap_or(trimmed);
        let (id, query) = match body.split_once('?') {
            Some((id, query)) => (id, Some(query)),
            None => (body, None),
        };
        if id.is_empty() {
            return Err(invalid("empty agent name"));
        }

        let mut params = AgentParams::new();
        let mut display_name = None;
        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| invalid("expected key=value"))?;
            if key.is_empty() {
                return Err(invalid("empty parameter name"));
            }
            if key == "name" {
                display_name = Some(value.to_string());
            } else {
                params.insert(key.to_string(), value.to_string());
            }
        }
        Ok(Self {
            id: id.to_string(),
            params,
            display_name,
        })
    }

    /// Name used in records and metrics.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

impl fmt::Display for AgentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)?;
        let mut sep = '?';
        for (k, v) in &self.params {
            write!(f, "{}{}={}", sep, k, v)?;
            sep = '&';
        }
        if let Some(name) = &self.display_name {
            write!(f, "{}name={}", sep, name)?;
        }
        Ok(())
    }
}

type Factory = Box<dyn Fn(&AgentParams) -> Box<dyn Agent> + Send + Sync>;

/// String-keyed agent factories. Built once, then only read.
#[derive(Default)]
pub struct AgentRegistry {
    factories: BTreeMap<String, Factory>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn(&AgentParams) -> Box<dyn Agent> + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Box::new(factory));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    pub fn create(&self, spec: &AgentSpec) -> Result<Box<dyn Agent>, ConfigError> {
        let factory = self
            .factories
            .get(&spec.id)
            .ok_or_else(|| ConfigError::UnknownAgent(spec.id.clone()))?;
        let agent = factory(&spec.params);
        Ok(match &spec.display_name {
            Some(name) => Box::new(Renamed {
                inner: agent,
                name: name.clone(),
            }),
            None => agent,
        })
    }

    pub fn create_from_str(&self, spec: &str) -> Result<Box<dyn Agent>, ConfigError> {
        self.create(&AgentSpec::parse(spec)?)
    }
}

impl fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("ids", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

struct Renamed {
    inner: Box<dyn Agent>,
    name: String,
}

impl Agent for Renamed {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self, seat_id: usize, table: &TableConfig) {
        self.inner.reset(seat_id, table)
    }

    fn act(&mut self, request: &ActionRequest) -> Result<ActionResponse, AgentError> {
        self.inner.act(request)
    }
}
