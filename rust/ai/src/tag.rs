//! Tight-aggressive rule-based agent.
//!
//! Plays few hands and plays them fast. Preflop decisions use the hole-card
//! table in [`crate::strength`]; after the flop the made hand is scored on
//! the same 0-10 scale and weighed against the price of a call.

use greenbench_engine::agent::{ActionRequest, ActionResponse, Agent};
use greenbench_engine::errors::AgentError;
use greenbench_engine::player::ActionKind;

use crate::strength::{hole_pair, postflop_strength, preflop_strength, required_equity};

/// Strength cut-offs for one table size.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Style {
    /// Raise or reraise at or above this score
    raise: u8,
    /// Call any sane price at or above this score
    call: u8,
    /// Call up to `loose_call_bb` big blinds at or above this score
    loose_call: u8,
    loose_call_bb: u32,
    /// Preflop open/raise size as a multiple of the pot
    open_growth: f64,
    reraise_growth: f64,
}

const HEADS_UP: Style = Style {
    raise: 7,
    call: 5,
    loose_call: 4,
    loose_call_bb: 3,
    open_growth: 2.5,
    reraise_growth: 2.0,
};

const RING: Style = Style {
    raise: 8,
    call: 6,
    loose_call: 5,
    loose_call_bb: 2,
    open_growth: 3.5,
    reraise_growth: 3.0,
};

#[derive(Debug, Clone)]
pub struct TagAgent {
    name: String,
}

impl TagAgent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn style(seat_count: usize) -> Style {
        if seat_count == 2 { HEADS_UP } else { RING }
    }

    fn raise(request: &ActionRequest, growth: f64) -> ActionResponse {
        let desired = (f64::from(request.pot) * growth) as u32;
        ActionResponse::raise_to(request.raise_target(desired))
    }

    fn preflop(request: &ActionRequest, strength: u8, style: Style) -> ActionResponse {
        let bb = request.blinds.bb;
        let can_raise = request.is_legal(ActionKind::RaiseTo);
        if request.to_call == 0 {
            if strength >= style.raise && can_raise {
                return Self::raise(request, style.open_growth);
            }
            return ActionResponse::check();
        }
        if strength >= style.raise && can_raise {
            return Self::raise(request, style.reraise_growth);
        }
        if strength >= style.call
            || (strength >= style.loose_call && request.to_call <= style.loose_call_bb * bb)
            || request.to_call <= bb
        {
            return ActionResponse::call();
        }
        ActionResponse::fold()
    }

    fn postflop(request: &ActionRequest, strength: u8) -> ActionResponse {
        let can_raise = request.is_legal(ActionKind::RaiseTo);
        if request.to_call == 0 {
            return match strength {
                9..=10 if can_raise => Self::raise(request, 2.0 / 3.0),
                7..=8 if can_raise => Self::raise(request, 0.5),
                _ => ActionResponse::check(),
            };
        }
        let price = required_equity(request.pot, request.to_call);
        match strength {
            9..=10 if can_raise => Self::raise(request, 1.0),
            7..=10 => ActionResponse::call(),
            5..=6 if price <= 0.3 => ActionResponse::call(),
            3..=4 if price <= 0.2 => ActionResponse::call(),
            _ => ActionResponse::fold(),
        }
    }
}

impl Agent for TagAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn act(&mut self, request: &ActionRequest) -> Result<ActionResponse, AgentError> {
        let Some(hole) = hole_pair(&request.hole_cards) else {
            return Err(AgentError::Failed(format!(
                "expected two hole cards, got {}",
                request.hole_cards.len()
            )));
        };
        let style = Self::style(request.seat_count);
        Ok(match postflop_strength(hole, &request.board) {
            Some(strength) => Self::postflop(request, strength),
            None => Self::preflop(request, preflop_strength(hole), style),
        })
    }
}
