use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::cards::{full_deck, Card};

const DOMAIN_TAG: &[u8; 12] = b"greenbench:1";

/// Identifies one deal. The deck order is a pure function of this key.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct DealKey {
    pub seed: u64,
    pub hand_index: u64,
    pub replica_id: u32,
}

impl DealKey {
    pub fn new(seed: u64, hand_index: u64, replica_id: u32) -> Self {
        Self {
            seed,
            hand_index,
            replica_id,
        }
    }

    fn rng_seed(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&self.seed.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.hand_index.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.replica_id.to_le_bytes());
        bytes[20..].copy_from_slice(DOMAIN_TAG);
        bytes
    }
}

/// A fully ordered 52-card deck. Built once and never reordered; dealing
/// happens through a [`Dealer`] cursor so the same deck can be replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    key: Option<DealKey>,
    cards: Vec<Card>,
}

impl Deck {
    /// Shuffles a fresh deck with a ChaCha20 stream seeded from `key`.
    pub fn for_key(key: DealKey) -> Self {
        let mut rng = ChaCha20Rng::from_seed(key.rng_seed());
        let mut cards = full_deck();
        cards.shuffle(&mut rng);
        Self {
            key: Some(key),
            cards,
        }
    }

    /// Builds a deck whose first cards are `top` (in order) followed by the
    /// remaining cards in unshuffled order. Used to pin exact deals.
    ///
    /// Panics if `top` contains a duplicate card.
    pub fn stacked(top: &[Card]) -> Self {
        let mut cards = Vec::with_capacity(52);
        for &c in top {
            assert!(!cards.contains(&c), "duplicate card {} in stacked deck", c);
            cards.push(c);
        }
        for c in full_deck() {
            if !cards.contains(&c) {
                cards.push(c);
            }
        }
        Self { key: None, cards }
    }

    pub fn key(&self) -> Option<DealKey> {
        self.key
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn dealer(&self) -> Dealer<'_> {
        Dealer {
            cards: &self.cards,
            position: 0,
        }
    }
}

/// Front-to-back cursor over a [`Deck`].
#[derive(Debug)]
pub struct Dealer<'a> {
    cards: &'a [Card],
    position: usize,
}

impl Dealer<'_> {
    pub fn deal_card(&mut self) -> Option<Card> {
        let c = self.cards.get(self.position).copied()?;
        self.position += 1;
        Some(c)
    }

    pub fn remaining(&self) -> usize {
        self.cards.len().saturating_sub(self.position)
    }
}
