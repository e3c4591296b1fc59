//! Uniform choice among the legal actions.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use greenbench_engine::agent::{ActionRequest, ActionResponse, Agent, TableConfig};
use greenbench_engine::errors::AgentError;
use greenbench_engine::player::ActionKind;

/// Picks a legal action uniformly at random and raises the minimum.
///
/// The generator is reseeded from `(seed, rng_tag)` at the start of every
/// hand, so a replayed hand draws the same choices no matter which hands
/// ran before it.
#[derive(Debug, Clone)]
pub struct RandomAgent {
    name: String,
    seed: u64,
    hand_tag: String,
    rng: ChaCha8Rng,
}

impl RandomAgent {
    pub fn new(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            seed,
            hand_tag: String::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn reseed_for(&mut self, rng_tag: &str) {
        if self.hand_tag != rng_tag {
            self.hand_tag = rng_tag.to_string();
            self.rng = ChaCha8Rng::seed_from_u64(self.seed ^ fnv1a(rng_tag.as_bytes()));
        }
    }
}

/// 64-bit FNV-1a; stable across platforms and releases.
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self, _seat_id: usize, _table: &TableConfig) {
        self.hand_tag.clear();
    }

    fn act(&mut self, request: &ActionRequest) -> Result<ActionResponse, AgentError> {
        self.reseed_for(&request.rng_tag);
        if request.legal_actions.is_empty() {
            return Err(AgentError::Failed("no legal actions offered".into()));
        }
        let pick = self.rng.random_range(0..request.legal_actions.len());
        Ok(match request.legal_actions[pick] {
            ActionKind::RaiseTo => {
                ActionResponse::raise_to(request.raise_target(request.min_raise_to))
            }
            other => ActionResponse::new(other, None),
        })
    }
}
