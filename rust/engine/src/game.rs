use crate::errors::EngineError;
use crate::logger::Street;
use crate::player::Position;

pub const MIN_SEATS: usize = 2;
pub const MAX_SEATS: usize = 6;

pub fn seat_after(seat: usize, seat_count: usize) -> usize {
    (seat + 1) % seat_count
}

/// Seat geometry for one hand: who holds the button, who posts the blinds,
/// and in which order seats are asked to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    seat_count: usize,
    button: usize,
}

impl TableLayout {
    pub fn new(seat_count: usize, button: usize) -> Result<Self, EngineError> {
        if !(MIN_SEATS..=MAX_SEATS).contains(&seat_count) {
            return Err(EngineError::InvalidTable(seat_count));
        }
        Ok(Self {
            seat_count,
            button: button % seat_count,
        })
    }

    /// Layout for hand `hand_index` of a series seeded with `seed`.
    ///
    /// Heads-up the button stays on seat 0 and duplicate replicas swap the
    /// agents instead. Larger tables move it one seat per hand, starting
    /// from `seed mod seat_count`.
    pub fn for_hand(seat_count: usize, seed: u64, hand_index: u64) -> Result<Self, EngineError> {
        let n = seat_count.max(1) as u64;
        let button = if seat_count == MIN_SEATS {
            0
        } else {
            ((seed % n + hand_index % n) % n) as usize
        };
        Self::new(seat_count, button)
    }

    pub fn seat_count(&self) -> usize {
        self.seat_count
    }

    pub fn button(&self) -> usize {
        self.button
    }

    pub fn heads_up(&self) -> bool {
        self.seat_count == 2
    }

    /// Heads-up the button posts the small blind.
    pub fn small_blind_seat(&self) -> usize {
        if self.heads_up() {
            self.button
        } else {
            seat_after(self.button, self.seat_count)
        }
    }

    pub fn big_blind_seat(&self) -> usize {
        seat_after(self.small_blind_seat(), self.seat_count)
    }

    /// Every seat once, starting with the first to act on `street`.
    pub fn action_order(&self, street: Street) -> Vec<usize> {
        let first = match street {
            Street::Preflop if self.heads_up() => self.button,
            Street::Preflop => seat_after(self.big_blind_seat(), self.seat_count),
            _ => seat_after(self.button, self.seat_count),
        };
        self.clockwise_from(first)
    }

    /// Every seat once, starting left of the button. Used for dealing and
    /// for handing out odd chips.
    pub fn left_of_button(&self) -> Vec<usize> {
        self.clockwise_from(seat_after(self.button, self.seat_count))
    }

    pub fn position_of(&self, seat: usize) -> Position {
        if self.heads_up() {
            return if seat == self.button {
                Position::SmallBlind
            } else {
                Position::BigBlind
            };
        }
        const LABELS: [Position; MAX_SEATS] = [
            Position::Button,
            Position::SmallBlind,
            Position::BigBlind,
            Position::UnderTheGun,
            Position::Hijack,
            Position::Cutoff,
        ];
        let offset = (seat + self.seat_count - self.button) % self.seat_count;
        LABELS[offset]
    }

    fn clockwise_from(&self, first: usize) -> Vec<usize> {
        (0..self.seat_count)
            .map(|i| (first + i) % self.seat_count)
            .collect()
    }
}
