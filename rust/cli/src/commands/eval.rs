//! `eval`: best five-card hand from five to seven cards.

use std::collections::HashSet;
use std::io::Write;

use greenbench_engine::cards::parse_cards;
use greenbench_engine::hand::evaluate_hand;

use crate::error::CliError;

pub fn handle_eval_command(cards: &str, out: &mut dyn Write) -> Result<(), CliError> {
    let parsed = parse_cards(cards)?;
    if !(5..=7).contains(&parsed.len()) {
        return Err(CliError::InvalidInput(format!(
            "expected 5 to 7 cards, got {}",
            parsed.len()
        )));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = parsed.iter().find(|c| !seen.insert(**c)) {
        return Err(CliError::InvalidInput(format!("duplicate card {}", dup)));
    }

    let strength = evaluate_hand(&parsed);
    writeln!(out, "{}", strength)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(cards: &str) -> Result<String, CliError> {
        let mut out = Vec::new();
        handle_eval_command(cards, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn prints_category_and_kickers() {
        assert_eq!(eval("As Ks Qs Js Ts 2c 3d").unwrap().trim(), "Straight Flush (A)");
    }

    #[test]
    fn rejects_short_and_duplicate_input() {
        assert!(matches!(eval("As Ks"), Err(CliError::InvalidInput(_))));
        assert!(matches!(eval("As As Qs Js Ts"), Err(CliError::InvalidInput(_))));
        assert!(matches!(eval("As Ks Qs Js Zz"), Err(CliError::InvalidInput(_))));
    }
}
