//! # greenbench-ai: Baseline Agents
//!
//! Reference opponents for the benchmark. None of them is meant to be
//! strong; they give candidate agents stable, interpretable yardsticks.
//!
//! - [`random::RandomAgent`] - uniform over legal actions, seeded per hand
//! - [`tag::TagAgent`] - tight-aggressive rules over a hand-strength table
//! - [`cfrlite::CfrLiteAgent`] - showdown-share thresholds after the flop
//!
//! ## Quick Start
//!
//! ```rust
//! use greenbench_ai::default_registry;
//!
//! let registry = default_registry();
//! let agent = registry.create_from_str("baseline:tag-hu?name=Tight").unwrap();
//! assert_eq!(agent.name(), "Tight");
//! assert!(registry.contains("cfrlite-6"));
//! ```

use greenbench_engine::agent::{Agent, AgentParams, AgentRegistry};
use tracing::warn;

pub mod cfrlite;
pub mod random;
pub mod strength;
pub mod tag;

/// Ids of the shipped baselines. Each is also registered with `-hu` and
/// `-6` suffixes.
pub const BASELINES: [&str; 3] = ["random", "tag", "cfrlite"];

const SUFFIXES: [&str; 3] = ["", "-hu", "-6"];

fn seed_param(id: &str, params: &AgentParams) -> u64 {
    match params.get("seed") {
        None => 0,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(agent = id, seed = %raw, "ignoring unparsable seed, using 0");
            0
        }),
    }
}

/// Registers every baseline on `registry`. The registered id becomes the
/// agent's name.
pub fn register_baselines(registry: &mut AgentRegistry) {
    for base in BASELINES {
        for suffix in SUFFIXES {
            let id = format!("{}{}", base, suffix);
            let name = id.clone();
            match base {
                "random" => registry.register(id, move |params: &AgentParams| {
                    Box::new(random::RandomAgent::new(
                        name.clone(),
                        seed_param(&name, params),
                    )) as Box<dyn Agent>
                }),
                "tag" => registry.register(id, move |_: &AgentParams| {
                    Box::new(tag::TagAgent::new(name.clone())) as Box<dyn Agent>
                }),
                _ => registry.register(id, move |_: &AgentParams| {
                    Box::new(cfrlite::CfrLiteAgent::new(name.clone())) as Box<dyn Agent>
                }),
            }
        }
    }
}

/// A registry holding every shipped baseline.
pub fn default_registry() -> AgentRegistry {
    let mut registry = AgentRegistry::new();
    register_baselines(&mut registry);
    registry
}
