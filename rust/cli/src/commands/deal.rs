//! `deal`: show the cards a deal key produces.

use std::io::Write;

use greenbench_engine::cards::{format_cards, Card};
use greenbench_engine::deck::{DealKey, Deck};
use greenbench_engine::game::TableLayout;

use crate::error::CliError;

const BOARD_CARDS: usize = 5;

/// Prints the hole cards and board of one series hand.
///
/// Both replicas of a hand share one deck, so `replica` only labels the
/// output.
pub fn handle_deal_command(
    seed: u64,
    hand: u64,
    replica: u32,
    seats: usize,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let layout = TableLayout::for_hand(seats, seed, hand)?;
    let deck = Deck::for_key(DealKey::new(seed, hand, 0));
    let mut dealer = deck.dealer();
    let mut draw = || {
        dealer
            .deal_card()
            .ok_or_else(|| CliError::Engine("deck exhausted".into()))
    };

    let mut holes: Vec<Vec<Card>> = vec![Vec::with_capacity(2); seats];
    for _ in 0..2 {
        for &seat in &layout.left_of_button() {
            holes[seat].push(draw()?);
        }
    }
    let board = (0..BOARD_CARDS).map(|_| draw()).collect::<Result<Vec<_>, _>>()?;

    writeln!(out, "Key: {}:{}:{}", seed, hand, replica)?;
    for (seat, cards) in holes.iter().enumerate() {
        writeln!(
            out,
            "Seat {} {:<3} {}",
            seat,
            layout.position_of(seat).label(),
            format_cards(cards).join(" ")
        )?;
    }
    writeln!(out, "Board: {}", format_cards(&board).join(" "))?;
    Ok(())
}
