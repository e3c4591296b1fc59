use crate::errors::GameError;
use crate::player::ActionKind;

/// What a seat is facing at one decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Chips behind
    pub stack: u32,
    /// Chips already committed this street
    pub street_bet: u32,
    pub to_call: u32,
    pub min_raise_to: u32,
    /// False once the seat has acted and nobody made a full raise since.
    pub raise_open: bool,
}

impl Decision {
    /// Largest street total the seat can reach (all-in).
    pub fn max_raise_to(&self) -> u32 {
        self.street_bet + self.stack
    }

    pub fn can_raise(&self) -> bool {
        self.raise_open && self.stack > self.to_call
    }

    /// Fold is always offered, even with nothing to call.
    pub fn legal_actions(&self) -> Vec<ActionKind> {
        let mut legal = vec![ActionKind::Fold];
        if self.to_call > 0 {
            if self.stack > 0 {
                legal.push(ActionKind::Call);
            }
        } else {
            legal.push(ActionKind::Check);
        }
        if self.can_raise() {
            legal.push(ActionKind::RaiseTo);
        }
        legal
    }

    pub fn is_legal(&self, kind: ActionKind) -> bool {
        self.legal_actions().contains(&kind)
    }
}

/// A decision after legality checks, ready to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatedAction {
    Fold,
    Check,
    /// Chips added; less than `to_call` when the call is all-in.
    Call(u32),
    /// New street total for the seat.
    RaiseTo(u32),
}

impl ValidatedAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            ValidatedAction::Fold => ActionKind::Fold,
            ValidatedAction::Check => ActionKind::Check,
            ValidatedAction::Call(_) => ActionKind::Call,
            ValidatedAction::RaiseTo(_) => ActionKind::RaiseTo,
        }
    }

    /// Amount recorded on the wire: the raise target, otherwise nothing.
    pub fn amount(&self) -> Option<u32> {
        match self {
            ValidatedAction::RaiseTo(total) => Some(*total),
            _ => None,
        }
    }
}

/// Smallest legal raise target for the street.
///
/// With no bet yet this street it is the big blind; otherwise the current
/// bet plus the last full raise increment, never less than one big blind.
pub fn min_raise_to(current_bet: u32, last_full_raise: u32, big_blind: u32) -> u32 {
    if current_bet == 0 {
        return big_blind.max(1);
    }
    current_bet + last_full_raise.max(big_blind)
}

/// Checks an agent's answer against the decision it was given.
///
/// # Errors
///
/// - [`GameError::UnknownAction`] for a tag outside `fold|check|call|raise_to`
/// - [`GameError::ActionNotLegal`] for a known tag not legal here
/// - [`GameError::MissingAmount`] for `raise_to` without an amount
/// - [`GameError::RaiseAboveStack`] when the target exceeds the seat's chips
/// - [`GameError::InvalidRaiseAmount`] / [`GameError::ShortAllInMismatch`]
///   when the target is below the minimum raise
///
/// # Examples
///
/// ```
/// use greenbench_engine::rules::{validate_response, Decision, ValidatedAction};
///
/// let d = Decision { stack: 1_000, street_bet: 0, to_call: 100, min_raise_to: 200, raise_open: true };
/// assert_eq!(validate_response(&d, "call", None), Ok(ValidatedAction::Call(100)));
/// assert!(validate_response(&d, "raise_to", Some(150)).is_err());
/// ```
pub fn validate_response(
    decision: &Decision,
    action: &str,
    amount: Option<u32>,
) -> Result<ValidatedAction, GameError> {
    let kind: ActionKind = action.trim().parse()?;
    if !decision.is_legal(kind) {
        return Err(GameError::ActionNotLegal(kind));
    }
    match kind {
        ActionKind::Fold => Ok(ValidatedAction::Fold),
        ActionKind::Check => Ok(ValidatedAction::Check),
        ActionKind::Call => Ok(ValidatedAction::Call(decision.to_call.min(decision.stack))),
        ActionKind::RaiseTo => {
            let target = amount.ok_or(GameError::MissingAmount)?;
            let maximum = decision.max_raise_to();
            if target > maximum {
                return Err(GameError::RaiseAboveStack {
                    amount: target,
                    maximum,
                });
            }
            let call_total = decision.street_bet + decision.to_call;
            if target <= call_total {
                return Err(GameError::InvalidRaiseAmount {
                    amount: target,
                    minimum: decision.min_raise_to.min(maximum),
                });
            }
            if target < decision.min_raise_to {
                // short all-in is the only way under the minimum
                if maximum >= decision.min_raise_to {
                    return Err(GameError::InvalidRaiseAmount {
                        amount: target,
                        minimum: decision.min_raise_to,
                    });
                }
                if target != maximum {
                    return Err(GameError::ShortAllInMismatch {
                        amount: target,
                        maximum,
                    });
                }
            }
            Ok(ValidatedAction::RaiseTo(target))
        }
    }
}

/// Substitute for a timed-out or illegal decision: check if possible,
/// otherwise call when the stack covers it, otherwise fold.
pub fn fallback_action(decision: &Decision) -> ValidatedAction {
    if decision.to_call == 0 {
        ValidatedAction::Check
    } else if decision.stack >= decision.to_call {
        ValidatedAction::Call(decision.to_call)
    } else {
        ValidatedAction::Fold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facing(to_call: u32, stack: u32) -> Decision {
        Decision {
            stack,
            street_bet: 0,
            to_call,
            min_raise_to: to_call * 2,
            raise_open: true,
        }
    }

    #[test]
    fn min_raise_defaults_to_big_blind() {
        assert_eq!(min_raise_to(0, 0, 100), 100);
        assert_eq!(min_raise_to(100, 100, 100), 200);
        assert_eq!(min_raise_to(300, 200, 100), 500);
        assert_eq!(min_raise_to(130, 30, 100), 230);
    }

    #[test]
    fn fold_is_offered_with_nothing_to_call() {
        let d = facing(0, 500);
        assert_eq!(
            d.legal_actions(),
            vec![ActionKind::Fold, ActionKind::Check, ActionKind::RaiseTo]
        );
        assert!(d.is_legal(ActionKind::Fold));
        assert!(!d.is_legal(ActionKind::Call));
    }

    #[test]
    fn closed_raise_right_drops_raise() {
        let mut d = facing(50, 500);
        d.raise_open = false;
        assert_eq!(d.legal_actions(), vec![ActionKind::Fold, ActionKind::Call]);
    }

    #[test]
    fn fallback_prefers_check_then_covered_call() {
        assert_eq!(fallback_action(&facing(0, 10)), ValidatedAction::Check);
        assert_eq!(fallback_action(&facing(40, 40)), ValidatedAction::Call(40));
        assert_eq!(fallback_action(&facing(40, 39)), ValidatedAction::Fold);
    }
}
