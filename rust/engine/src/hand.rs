use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cards::{rank_symbol, Card};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Category {
    HighCard = 0,
    OnePair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::HighCard => "High Card",
            Category::OnePair => "One Pair",
            Category::TwoPair => "Two Pair",
            Category::ThreeOfAKind => "Three of a Kind",
            Category::Straight => "Straight",
            Category::Flush => "Flush",
            Category::FullHouse => "Full House",
            Category::FourOfAKind => "Four of a Kind",
            Category::StraightFlush => "Straight Flush",
        }
    }
}

/// Totally ordered strength of a five-card hand. The derived ordering is
/// lexicographic over `(category, kickers)`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct HandStrength {
    pub category: Category,
    // kickers: ordered high -> low for tiebreaks, zero-padded
    pub kickers: [u8; 5],
}

impl fmt::Display for HandStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ranks: Vec<String> = self
            .kickers
            .iter()
            .filter(|&&k| k != 0)
            .map(|&k| rank_symbol(k).to_string())
            .collect();
        write!(f, "{} ({})", self.category.label(), ranks.join("-"))
    }
}

/// Best five-card strength among all five-card subsets of `cards`.
///
/// Accepts 5 to 7 cards. Anything else, or duplicate cards, is a caller bug
/// and panics.
pub fn evaluate_hand(cards: &[Card]) -> HandStrength {
    let n = cards.len();
    assert!(
        (5..=7).contains(&n),
        "hand evaluation needs 5 to 7 cards, got {}",
        n
    );
    for i in 0..n {
        for j in (i + 1)..n {
            assert!(cards[i] != cards[j], "duplicate card {} in hand", cards[i]);
        }
    }

    let mut best: Option<HandStrength> = None;
    for a in 0..n {
        for b in (a + 1)..n {
            for c in (b + 1)..n {
                for d in (c + 1)..n {
                    for e in (d + 1)..n {
                        let five = [cards[a], cards[b], cards[c], cards[d], cards[e]];
                        let strength = evaluate_five(&five);
                        match best {
                            Some(current) if current >= strength => {}
                            _ => best = Some(strength),
                        }
                    }
                }
            }
        }
    }
    // n >= 5 guarantees at least one subset
    best.unwrap_or(HandStrength {
        category: Category::HighCard,
        kickers: [0; 5],
    })
}

pub fn compare_hands(a: &HandStrength, b: &HandStrength) -> Ordering {
    a.cmp(b)
}

/// Strength of exactly five cards.
pub fn evaluate_five(cards: &[Card; 5]) -> HandStrength {
    let mut rank_counts = [0u8; 15]; // 2..14 used
    let mut rank_mask: u16 = 0;
    let first_suit = cards[0].suit;
    let mut flush = true;
    for c in cards {
        let r = c.rank.value();
        rank_counts[r as usize] += 1;
        rank_mask |= 1 << r;
        if c.suit != first_suit {
            flush = false;
        }
    }

    let straight = straight_high_from_mask(rank_mask);
    if flush {
        if let Some(high) = straight {
            return strength(Category::StraightFlush, &[high]);
        }
    }

    let groups = group_by_count(&rank_counts);
    let shape: Vec<u8> = groups.iter().map(|&(count, _)| count).collect();
    let ranks: Vec<u8> = groups.iter().map(|&(_, rank)| rank).collect();

    match shape.as_slice() {
        [4, 1] => return strength(Category::FourOfAKind, &ranks),
        [3, 2] => return strength(Category::FullHouse, &ranks),
        _ => {}
    }
    if flush {
        return strength(Category::Flush, &ranks);
    }
    if let Some(high) = straight {
        return strength(Category::Straight, &[high]);
    }
    let category = match shape.as_slice() {
        [3, 1, 1] => Category::ThreeOfAKind,
        [2, 2, 1] => Category::TwoPair,
        [2, 1, 1, 1] => Category::OnePair,
        _ => Category::HighCard,
    };
    strength(category, &ranks)
}

fn strength(category: Category, ranks: &[u8]) -> HandStrength {
    let mut kickers = [0u8; 5];
    for (slot, &r) in kickers.iter_mut().zip(ranks) {
        *slot = r;
    }
    HandStrength { category, kickers }
}

/// `(count, rank)` pairs sorted by count, then rank, both descending.
fn group_by_count(rank_counts: &[u8; 15]) -> Vec<(u8, u8)> {
    let mut groups: Vec<(u8, u8)> = (2..=14u8)
        .filter(|&r| rank_counts[r as usize] > 0)
        .map(|r| (rank_counts[r as usize], r))
        .collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));
    groups
}

fn straight_high_from_mask(mask: u16) -> Option<u8> {
    // Treat Ace as 14 and additionally as 1
    let mut m = mask;
    if (m & (1 << 14)) != 0 {
        m |= 1 << 1;
    }
    // Sliding 5-bit window from Ace(14) down to 5
    for high in (5..=14u8).rev() {
        let window = 0b1_1111u16 << (high - 4);
        if (m & window) == window {
            return Some(high);
        }
    }
    None
}
