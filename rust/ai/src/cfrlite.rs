//! Equity-threshold agent in the spirit of a tiny CFR abstraction.
//!
//! Preflop it buckets hole cards by hand class. After the flop it scores its
//! made hand against every two-card holding an opponent could have on the
//! current board and acts on that showdown share.

use greenbench_engine::agent::{ActionRequest, ActionResponse, Agent};
use greenbench_engine::cards::{full_deck, Card};
use greenbench_engine::errors::AgentError;
use greenbench_engine::hand::evaluate_hand;
use greenbench_engine::player::ActionKind;

use crate::strength::hole_pair;

const VALUE_THRESHOLD: f64 = 0.75;
const CALL_THRESHOLD: f64 = 0.45;

#[derive(Debug, Clone)]
pub struct CfrLiteAgent {
    name: String,
}

/// Share of opponent holdings the hero beats on this board, ties counting
/// half. Only the cards already out are used; nothing is rolled forward.
pub fn board_equity(hole: [Card; 2], board: &[Card]) -> f64 {
    let mut mine = Vec::with_capacity(7);
    mine.extend_from_slice(&hole);
    mine.extend_from_slice(board);
    let hero = evaluate_hand(&mine);

    let live: Vec<Card> = full_deck()
        .into_iter()
        .filter(|c| !mine.contains(c))
        .collect();
    let mut theirs = Vec::with_capacity(7);
    let mut score = 0.0;
    let mut holdings = 0u32;
    for i in 0..live.len() {
        for j in (i + 1)..live.len() {
            theirs.clear();
            theirs.push(live[i]);
            theirs.push(live[j]);
            theirs.extend_from_slice(board);
            let villain = evaluate_hand(&theirs);
            holdings += 1;
            score += match hero.cmp(&villain) {
                std::cmp::Ordering::Greater => 1.0,
                std::cmp::Ordering::Equal => 0.5,
                std::cmp::Ordering::Less => 0.0,
            };
        }
    }
    if holdings == 0 {
        return 0.0;
    }
    score / f64::from(holdings)
}

impl CfrLiteAgent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn raise(request: &ActionRequest, factor: f64) -> ActionResponse {
        let desired = (f64::from(request.pot) * factor) as u32;
        ActionResponse::raise_to(request.raise_target(desired))
    }

    fn preflop(request: &ActionRequest, hole: [Card; 2]) -> ActionResponse {
        let (high, low) = {
            let a = hole[0].rank.value();
            let b = hole[1].rank.value();
            (a.max(b), a.min(b))
        };
        let pocket = high == low;
        let premium = pocket && high >= 10;
        let strong = pocket && high >= 7;
        let high_broadway = high >= 13 && low >= 12;
        let can_raise = request.is_legal(ActionKind::RaiseTo);
        let bb = request.blinds.bb;

        if request.to_call == 0 {
            if can_raise && premium {
                return Self::raise(request, 3.5);
            }
            if can_raise && (strong || high_broadway) {
                return Self::raise(request, 3.0);
            }
            return ActionResponse::check();
        }
        if premium && can_raise {
            return Self::raise(request, 3.0);
        }
        if strong || high_broadway {
            if request.to_call <= 3 * bb || !can_raise {
                return ActionResponse::call();
            }
            return Self::raise(request, 2.5);
        }
        if request.to_call <= bb || premium {
            return ActionResponse::call();
        }
        ActionResponse::fold()
    }

    fn postflop(request: &ActionRequest, equity: f64) -> ActionResponse {
        let can_raise = request.is_legal(ActionKind::RaiseTo);
        if request.to_call == 0 {
            if equity >= VALUE_THRESHOLD && can_raise {
                return Self::raise(request, 2.5);
            }
            return ActionResponse::check();
        }
        if equity >= VALUE_THRESHOLD && can_raise {
            return Self::raise(request, 2.2);
        }
        if equity >= CALL_THRESHOLD || request.to_call <= request.blinds.bb {
            return ActionResponse::call();
        }
        ActionResponse::fold()
    }
}

impl Agent for CfrLiteAgent {
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
        if request.board.len() < 3 {
            return Ok(Self::preflop(request, hole));
        }
        let equity = board_equity(hole, &request.board);
        Ok(Self::postflop(request, equity)
            .with_metadata(serde_json::json!({ "equity": equity })))
    }
}
