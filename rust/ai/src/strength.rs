//! Hand strength heuristics shared by the rule-based agents.

use greenbench_engine::cards::Card;
use greenbench_engine::hand::{evaluate_hand, Category};

/// Preflop strength of two hole cards on a 0-10 scale.
///
/// - 9-10: premium (AA-JJ, AKs)
/// - 7-8: strong (TT-99, AK, AQ, KQs)
/// - 5-6: medium (88-77, AJ, suited broadways and connectors)
/// - 3-4: marginal (66-22, Ax, loose broadways)
/// - 0-2: weak offsuit holdings
pub fn preflop_strength(hole: [Card; 2]) -> u8 {
    let r1 = hole[0].rank.value();
    let r2 = hole[1].rank.value();
    let (high, low) = if r1 >= r2 { (r1, r2) } else { (r2, r1) };
    let suited = hole[0].suit == hole[1].suit;

    if high == low {
        return match high {
            13..=14 => 10,
            11..=12 => 9,
            10 => 8,
            9 => 7,
            8 => 6,
            7 => 5,
            _ => 4,
        };
    }

    let (suited_score, offsuit_score) = match (high, low) {
        (14, 13) => (10, 8),
        (14, 12) => (8, 7),
        (14, 11) => (7, 6),
        (14, 10) => (6, 5),
        (14, _) => (5, 4),
        (13, 12) => (7, 6),
        (13, 11) => (6, 5),
        (13, 10) => (5, 4),
        (12, 11) => (6, 5),
        (12, 10) => (5, 4),
        _ => {
            return if suited && high - low <= 2 {
                if high >= 9 { 5 } else { 4 }
            } else if high >= 11 && low >= 9 {
                4
            } else {
                2
            };
        }
    };
    if suited { suited_score } else { offsuit_score }
}

/// Made-hand strength on the same 0-10 scale, from hole cards plus a board
/// of three to five cards. `None` before the flop.
pub fn postflop_strength(hole: [Card; 2], board: &[Card]) -> Option<u8> {
    if !(3..=5).contains(&board.len()) {
        return None;
    }
    let mut cards = Vec::with_capacity(7);
    cards.extend_from_slice(&hole);
    cards.extend_from_slice(board);
    let strength = evaluate_hand(&cards);

    let base = match strength.category {
        Category::HighCard => 1,
        Category::OnePair => 3,
        Category::TwoPair => 5,
        Category::ThreeOfAKind => 6,
        Category::Straight => 7,
        Category::Flush => 8,
        Category::FullHouse => 9,
        Category::FourOfAKind | Category::StraightFlush => 10,
    };
    // queen-or-better top rank nudges the score up within a category
    let kicker = u8::from(strength.kickers[0] >= 12);
    Some((base + kicker).min(10))
}

/// Share of the final pot a call has to win to break even.
pub fn required_equity(pot: u32, to_call: u32) -> f64 {
    if to_call == 0 {
        return 0.0;
    }
    f64::from(to_call) / (f64::from(pot) + f64::from(to_call))
}

/// The two hole cards, or `None` when the request carries anything else.
pub fn hole_pair(cards: &[Card]) -> Option<[Card; 2]> {
    match cards {
        [a, b] => Some([*a, *b]),
        _ => None,
    }
}
