//! # greenbench-engine: Deterministic NLHE Benchmark Core
//!
//! A reproducible No-Limit Texas Hold'em engine for evaluating poker agents
//! heads-up and six-max. Every deal is a pure function of
//! `(seed, hand_index, replica_id)`, so the same series can be replayed
//! exactly and mirrored with seats swapped to cancel positional luck.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card representation (Suit, Rank, Card) and text parsing
//! - [`deck`] - Keyed ChaCha20 deck construction and front-to-back dealing
//! - [`hand`] - Best-of-seven hand evaluation and strength comparison
//! - [`player`] - Per-hand seat state and action tags
//! - [`game`] - Seat geometry: blinds, positions, action order
//! - [`rules`] - Legal actions, minimum raises and response validation
//! - [`pot`] - Side pots, odd chips and uncalled bets
//! - [`agent`] - Agent trait, request/response contract and registry
//! - [`governance`] - Timeout and legality enforcement with safe fallbacks
//! - [`engine`] - The betting state machine for one hand
//! - [`logger`] - Append-only event log and per-hand records
//! - [`runner`] - Series orchestration and artefact output
//! - [`metrics`] - bb/100, confidence intervals and behavior statistics
//! - [`errors`] - Error types
//!
//! ## Quick Start
//!
//! ```rust
//! use greenbench_engine::cards::parse_cards;
//! use greenbench_engine::hand::{evaluate_hand, Category};
//!
//! let cards = parse_cards("Ah Kh Qh Jh Th 2c 3d").unwrap();
//! let strength = evaluate_hand(&cards);
//! assert_eq!(strength.category, Category::StraightFlush);
//! ```
//!
//! ## Deterministic Dealing
//!
//! ```rust
//! use greenbench_engine::deck::{DealKey, Deck};
//!
//! let key = DealKey::new(42, 0, 0);
//! assert_eq!(Deck::for_key(key), Deck::for_key(key));
//! ```
//!
//! ## Action Validation
//!
//! ```rust
//! use greenbench_engine::rules::{fallback_action, validate_response, Decision, ValidatedAction};
//!
//! let decision = Decision {
//!     stack: 1_000,
//!     street_bet: 100,
//!     to_call: 200,
//!     min_raise_to: 500,
//!     raise_open: true,
//! };
//! assert!(validate_response(&decision, "raise_to", Some(400)).is_err());
//! assert_eq!(fallback_action(&decision), ValidatedAction::Call(200));
//! ```

pub mod agent;
pub mod cards;
pub mod deck;
pub mod engine;
pub mod errors;
pub mod game;
pub mod governance;
pub mod hand;
pub mod logger;
pub mod metrics;
pub mod player;
pub mod pot;
pub mod rules;
pub mod runner;
