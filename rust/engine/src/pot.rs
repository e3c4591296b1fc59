//! Side-pot construction and showdown distribution.

use serde::{Deserialize, Serialize};

use crate::hand::HandStrength;

/// One pot slice and the seats that can win it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pot {
    pub amount: u32,
    pub eligible: Vec<usize>,
}

/// Splits hand contributions (indexed by seat) into a main pot and side pots.
///
/// Each distinct positive contribution level closes a slice that every seat
/// contributing at least that level paid into. Folded seats pay in but are
/// never eligible. A slice nobody can win is folded into the previous
/// winnable pot, or the next one when none precedes it.
pub fn build_side_pots(contributions: &[u32], folded: &[bool]) -> Vec<Pot> {
    let mut levels: Vec<u32> = contributions.iter().copied().filter(|&c| c > 0).collect();
    levels.sort_unstable();
    levels.dedup();

    let mut slices: Vec<Pot> = Vec::with_capacity(levels.len());
    let mut previous = 0u32;
    for level in levels {
        let contributors: Vec<usize> = contributions
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c >= level)
            .map(|(seat, _)| seat)
            .collect();
        let amount = (level - previous) * contributors.len() as u32;
        let eligible = contributors
            .into_iter()
            .filter(|&seat| !folded.get(seat).copied().unwrap_or(false))
            .collect();
        slices.push(Pot { amount, eligible });
        previous = level;
    }

    let mut pots: Vec<Pot> = Vec::with_capacity(slices.len());
    let mut orphaned = 0u32;
    for slice in slices {
        if slice.eligible.is_empty() {
            match pots.last_mut() {
                Some(prev) => prev.amount += slice.amount,
                None => orphaned += slice.amount,
            }
        } else {
            let mut pot = slice;
            pot.amount += std::mem::take(&mut orphaned);
            pots.push(pot);
        }
    }
    if orphaned > 0 {
        // nobody eligible anywhere; only reachable with every seat folded
        pots.push(Pot {
            amount: orphaned,
            eligible: Vec::new(),
        });
    }
    pots
}

/// The part of the largest contribution nobody matched, as `(seat, amount)`.
pub fn uncalled_excess(contributions: &[u32]) -> Option<(usize, u32)> {
    let (top_seat, &top) = contributions
        .iter()
        .enumerate()
        .max_by_key(|&(seat, &c)| (c, std::cmp::Reverse(seat)))?;
    let second = contributions
        .iter()
        .enumerate()
        .filter(|&(seat, _)| seat != top_seat)
        .map(|(_, &c)| c)
        .max()
        .unwrap_or(0);
    (top > second).then(|| (top_seat, top - second))
}

/// Result of awarding one pot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Award {
    pub amount: u32,
    pub eligible: Vec<usize>,
    pub winners: Vec<usize>,
}

/// Awards every pot to its best eligible hand(s).
///
/// `strengths` is indexed by seat; seats without a strength are treated as
/// not contesting. Ties split evenly and the remainder goes one chip at a
/// time to tied winners in `odd_chip_order`. Returns payouts indexed by seat
/// and the per-pot awards.
pub fn distribute(
    pots: &[Pot],
    strengths: &[Option<HandStrength>],
    odd_chip_order: &[usize],
) -> (Vec<u32>, Vec<Award>) {
    let mut payouts = vec![0u32; strengths.len()];
    let mut awards = Vec::with_capacity(pots.len());
    for pot in pots {
        let best = pot
            .eligible
            .iter()
            .filter_map(|&seat| strengths.get(seat).copied().flatten())
            .max();
        let winners: Vec<usize> = match best {
            Some(best) => pot
                .eligible
                .iter()
                .copied()
                .filter(|&seat| strengths.get(seat).copied().flatten() == Some(best))
                .collect(),
            None => pot.eligible.clone(),
        };
        if !winners.is_empty() {
            let share = pot.amount / winners.len() as u32;
            let mut remainder = pot.amount % winners.len() as u32;
            for &seat in &winners {
                payouts[seat] += share;
            }
            for &seat in odd_chip_order {
                if remainder == 0 {
                    break;
                }
                if winners.contains(&seat) {
                    payouts[seat] += 1;
                    remainder -= 1;
                }
            }
        }
        awards.push(Award {
            amount: pot.amount,
            eligible: pot.eligible.clone(),
            winners,
        });
    }
    (payouts, awards)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_contributions_make_one_pot() {
        let pots = build_side_pots(&[200, 200, 200], &[false, false, false]);
        assert_eq!(
            pots,
            vec![Pot {
                amount: 600,
                eligible: vec![0, 1, 2]
            }]
        );
    }

    #[test]
    fn folded_only_slice_merges_backwards() {
        // seat 2 folded after putting in the most
        let pots = build_side_pots(&[100, 100, 300], &[false, false, true]);
        assert_eq!(pots.len(), 1);
        assert_eq!(pots[0].amount, 500);
        assert_eq!(pots[0].eligible, vec![0, 1]);
    }

    #[test]
    fn uncalled_excess_needs_a_unique_top() {
        assert_eq!(uncalled_excess(&[500, 200, 0]), Some((0, 300)));
        assert_eq!(uncalled_excess(&[200, 200]), None);
        assert_eq!(uncalled_excess(&[]), None);
    }
}
