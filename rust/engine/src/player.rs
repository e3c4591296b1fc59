use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::errors::GameError;

/// Table position label. Heads-up the button is the small blind.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "BTN")]
    Button,
    #[serde(rename = "SB")]
    SmallBlind,
    #[serde(rename = "BB")]
    BigBlind,
    #[serde(rename = "UTG")]
    UnderTheGun,
    #[serde(rename = "HJ")]
    Hijack,
    #[serde(rename = "CO")]
    Cutoff,
}

impl Position {
    pub fn label(self) -> &'static str {
        match self {
            Position::Button => "BTN",
            Position::SmallBlind => "SB",
            Position::BigBlind => "BB",
            Position::UnderTheGun => "UTG",
            Position::Hijack => "HJ",
            Position::Cutoff => "CO",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The four decisions an agent can make. `RaiseTo` carries its target
/// separately on the wire (`amount`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    RaiseTo,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Fold => "fold",
            ActionKind::Check => "check",
            ActionKind::Call => "call",
            ActionKind::RaiseTo => "raise_to",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fold" => Ok(ActionKind::Fold),
            "check" => Ok(ActionKind::Check),
            "call" => Ok(ActionKind::Call),
            "raise_to" => Ok(ActionKind::RaiseTo),
            other => Err(GameError::UnknownAction(other.to_string())),
        }
    }
}

/// Per-hand runtime state of one seat. Owned by the engine while a hand is
/// in progress and reset at the start of every hand.
#[derive(Debug, Clone)]
pub struct PlayerRuntimeState {
    seat_id: usize,
    name: String,
    /// Chips behind (not yet committed)
    stack: u32,
    /// Hole cards (0 or 2)
    hole: Vec<Card>,
    /// Chips committed on the current street
    street_bet: u32,
    /// Chips committed over the whole hand
    contributed: u32,
    folded: bool,
    all_in: bool,
    illegal_action_count: u32,
    timeout_count: u32,
}

impl PlayerRuntimeState {
    pub fn new(seat_id: usize, name: impl Into<String>, stack: u32) -> Self {
        Self {
            seat_id,
            name: name.into(),
            stack,
            hole: Vec::with_capacity(2),
            street_bet: 0,
            contributed: 0,
            folded: false,
            all_in: false,
            illegal_action_count: 0,
            timeout_count: 0,
        }
    }

    pub fn reset_for_hand(&mut self, starting_stack: u32) {
        self.stack = starting_stack;
        self.hole.clear();
        self.street_bet = 0;
        self.contributed = 0;
        self.folded = false;
        self.all_in = false;
        self.illegal_action_count = 0;
        self.timeout_count = 0;
    }

    pub fn seat_id(&self) -> usize {
        self.seat_id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn stack(&self) -> u32 {
        self.stack
    }
    pub fn hole_cards(&self) -> &[Card] {
        &self.hole
    }
    pub fn street_bet(&self) -> u32 {
        self.street_bet
    }
    pub fn contributed(&self) -> u32 {
        self.contributed
    }
    pub fn is_folded(&self) -> bool {
        self.folded
    }
    pub fn is_all_in(&self) -> bool {
        self.all_in
    }
    pub fn illegal_action_count(&self) -> u32 {
        self.illegal_action_count
    }
    pub fn timeout_count(&self) -> u32 {
        self.timeout_count
    }

    /// Not folded and not all-in: still able to make decisions.
    pub fn can_act(&self) -> bool {
        !self.folded && !self.all_in
    }

    pub fn to_call(&self, current_bet: u32) -> u32 {
        current_bet.saturating_sub(self.street_bet)
    }

    pub(crate) fn give_card(&mut self, c: Card) {
        debug_assert!(self.hole.len() < 2, "hole cards already full");
        self.hole.push(c);
    }

    /// Moves up to `amount` chips from the stack into the pot and returns
    /// the chips actually committed. Emptying the stack marks the seat all-in.
    pub(crate) fn commit(&mut self, amount: u32) -> u32 {
        let added = amount.min(self.stack);
        self.stack -= added;
        self.street_bet += added;
        self.contributed += added;
        if self.stack == 0 {
            self.all_in = true;
        }
        added
    }

    /// Returns uncalled chips to the stack.
    pub(crate) fn refund(&mut self, amount: u32) {
        let amount = amount.min(self.contributed);
        self.contributed -= amount;
        self.street_bet = self.street_bet.saturating_sub(amount);
        self.stack += amount;
        if self.stack > 0 {
            self.all_in = false;
        }
    }

    pub(crate) fn award(&mut self, amount: u32) {
        self.stack = self.stack.saturating_add(amount);
    }

    pub(crate) fn fold(&mut self) {
        self.folded = true;
    }

    pub(crate) fn reset_street(&mut self) {
        self.street_bet = 0;
    }

    pub(crate) fn record_timeout(&mut self) {
        self.timeout_count += 1;
    }

    pub(crate) fn record_illegal_action(&mut self) {
        self.illegal_action_count += 1;
    }
}
