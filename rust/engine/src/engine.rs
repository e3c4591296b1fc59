use tracing::{debug, error, trace};

use crate::agent::{ActionRequest, Agent, HistoryEntry, TableConfig};
use crate::cards::Card;
use crate::deck::{Dealer, Deck};
use crate::errors::EngineError;
use crate::game::TableLayout;
use crate::governance::{release_workers, seat_workers, Governor, SeatWorker};
use crate::hand::evaluate_hand;
use crate::logger::{
    format_hand_id, format_rng_tag, ActionTaken, BlindKind, BlindPosted, Blinds, BoardDeal,
    DealHole, Event, EventLogEntry, EventSink, HandEnd, HandStart, Penalty, PenaltyKind, PotAward,
    SeatInfo, ShownHand, Showdown, Street, UncalledReturn,
};
use crate::player::{ActionKind, PlayerRuntimeState};
use crate::pot::{build_side_pots, distribute, uncalled_excess};
use crate::rules::{min_raise_to, Decision, ValidatedAction};

/// Fixed table parameters shared by every hand an [`Engine`] plays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub table_id: String,
    pub seat_count: usize,
    pub blinds: Blinds,
    /// Every hand starts from this stack
    pub starting_stack: u32,
    /// Per-decision time budget
    pub decision_ms: u64,
}

/// Identifies one hand and fixes the button for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandContext {
    pub seed: u64,
    pub hand_index: u64,
    pub replica_id: u32,
    pub button: usize,
}

impl HandContext {
    pub fn hand_id(&self) -> String {
        format_hand_id(self.seed, self.hand_index, self.replica_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Betting(Street),
    Showdown,
    HandEnd,
}

/// Result of one hand. All vectors are indexed by seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandOutcome {
    pub hand_id: String,
    pub deltas: Vec<i64>,
    pub payouts: Vec<u32>,
    /// Net of any uncalled chips returned
    pub contributions: Vec<u32>,
    pub timeouts: Vec<u32>,
    pub illegal_actions: Vec<u32>,
    pub board: Vec<Card>,
    pub went_to_showdown: bool,
    pub uncalled: Option<UncalledReturn>,
}

/// Plays single NLHE hands between seated agents.
///
/// # Examples
///
/// ```
/// use greenbench_engine::agent::{ActionRequest, ActionResponse, Agent};
/// use greenbench_engine::deck::{DealKey, Deck};
/// use greenbench_engine::engine::{Engine, EngineConfig, HandContext};
/// use greenbench_engine::errors::AgentError;
/// use greenbench_engine::logger::{Blinds, MemorySink};
///
/// struct Passive;
/// impl Agent for Passive {
///     fn name(&self) -> &str { "passive" }
///     fn act(&mut self, req: &ActionRequest) -> Result<ActionResponse, AgentError> {
///         Ok(if req.to_call == 0 { ActionResponse::check() } else { ActionResponse::call() })
///     }
/// }
///
/// let engine = Engine::new(EngineConfig {
///     table_id: "demo".into(),
///     seat_count: 2,
///     blinds: Blinds { sb: 50, bb: 100 },
///     starting_stack: 20_000,
///     decision_ms: 60_000,
/// }).unwrap();
/// let mut agents: Vec<Box<dyn Agent>> = vec![Box::new(Passive), Box::new(Passive)];
/// let mut sink = MemorySink::new();
/// let ctx = HandContext { seed: 7, hand_index: 0, replica_id: 0, button: 0 };
/// let deck = Deck::for_key(DealKey::new(7, 0, 0));
/// let outcome = engine.play_hand(ctx, &deck, &mut agents, &mut sink).unwrap();
/// assert_eq!(outcome.deltas.iter().sum::<i64>(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    governor: Governor,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        TableLayout::new(config.seat_count, 0)?;
        let governor = Governor::new(config.decision_ms);
        Ok(Self { config, governor })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Plays one hand to completion and returns the per-seat result.
    ///
    /// Agent misbehavior never fails a hand. Errors are limited to sink I/O,
    /// a short deck, a wrong agent count, and broken chip accounting.
    pub fn play_hand(
        &self,
        ctx: HandContext,
        deck: &Deck,
        agents: &mut [Box<dyn Agent>],
        sink: &mut dyn EventSink,
    ) -> Result<HandOutcome, EngineError> {
        if agents.len() != self.config.seat_count {
            return Err(EngineError::InvalidTable(agents.len()));
        }
        let layout = TableLayout::new(self.config.seat_count, ctx.button)?;
        let table = TableConfig {
            table_id: self.config.table_id.clone(),
            seat_count: self.config.seat_count,
            blinds: self.config.blinds,
            starting_stack: self.config.starting_stack,
            seat_names: agents.iter().map(|a| a.name().to_string()).collect(),
        };
        let mut seats = seat_workers(agents, &table)?;
        let result = self.run_hand(ctx, deck, layout, &table, &mut seats, sink);
        release_workers(seats, agents);
        result
    }

    fn run_hand(
        &self,
        ctx: HandContext,
        deck: &Deck,
        layout: TableLayout,
        table: &TableConfig,
        seats: &mut [SeatWorker],
        sink: &mut dyn EventSink,
    ) -> Result<HandOutcome, EngineError> {
        let mut hand = HandState::new(&self.config, ctx, layout, &table.seat_names);
        debug!(hand_id = %hand.hand_id, button = layout.button(), "hand start");
        hand.emit(
            sink,
            Event::HandStart(HandStart {
                table_id: self.config.table_id.clone(),
                seed: ctx.seed,
                hand_index: ctx.hand_index,
                replica_id: ctx.replica_id,
                button_seat: layout.button(),
                blinds: self.config.blinds,
                seats: hand
                    .players
                    .iter()
                    .map(|p| SeatInfo {
                        seat: p.seat_id(),
                        name: p.name().to_string(),
                        stack: p.stack(),
                    })
                    .collect(),
                rng_tag: hand.rng_tag.clone(),
            }),
        )?;

        let mut dealer = deck.dealer();
        hand.deal_hole_cards(&mut dealer, sink)?;
        hand.post_blinds(self.config.blinds, sink)?;

        for street in [Street::Preflop, Street::Flop, Street::Turn, Street::River] {
            if hand.players_in_hand() < 2 {
                break;
            }
            if street != Street::Preflop {
                hand.deal_board(street, &mut dealer, sink)?;
            }
            hand.phase = Phase::Betting(street);
            hand.betting_round(street, &self.governor, seats, sink)?;
        }

        let outcome = hand.settle(self.config.starting_stack, sink)?;
        debug!(
            hand_id = %outcome.hand_id,
            showdown = outcome.went_to_showdown,
            deltas = ?outcome.deltas,
            "hand end"
        );
        Ok(outcome)
    }
}

/// Mutable state of the hand in progress. Lives for one `play_hand` call.
struct HandState {
    hand_id: String,
    rng_tag: String,
    table_id: String,
    blinds: Blinds,
    layout: TableLayout,
    players: Vec<PlayerRuntimeState>,
    board: Vec<Card>,
    pot: u32,
    current_bet: u32,
    last_full_raise: u32,
    phase: Phase,
    to_act: Option<usize>,
    last_aggressor: Option<usize>,
    legal_actions: Vec<ActionKind>,
    history: Vec<HistoryEntry>,
}

impl HandState {
    fn new(config: &EngineConfig, ctx: HandContext, layout: TableLayout, names: &[String]) -> Self {
        let players = names
            .iter()
            .enumerate()
            .map(|(seat, name)| {
                let mut p = PlayerRuntimeState::new(seat, name.clone(), config.starting_stack);
                p.reset_for_hand(config.starting_stack);
                p
            })
            .collect();
        Self {
            hand_id: ctx.hand_id(),
            rng_tag: format_rng_tag(ctx.seed, ctx.hand_index, ctx.replica_id),
            table_id: config.table_id.clone(),
            blinds: config.blinds,
            layout,
            players,
            board: Vec::with_capacity(5),
            pot: 0,
            current_bet: 0,
            last_full_raise: 0,
            phase: Phase::Betting(Street::Preflop),
            to_act: None,
            last_aggressor: None,
            legal_actions: Vec::new(),
            history: Vec::new(),
        }
    }

    fn emit(&self, sink: &mut dyn EventSink, event: Event) -> Result<(), EngineError> {
        sink.record(EventLogEntry::now(&self.hand_id, event))
    }

    fn draw(&self, dealer: &mut Dealer<'_>) -> Result<Card, EngineError> {
        dealer
            .deal_card()
            .ok_or_else(|| EngineError::DeckExhausted(self.hand_id.clone()))
    }

    fn players_in_hand(&self) -> usize {
        self.players.iter().filter(|p| !p.is_folded()).count()
    }

    fn players_able_to_act(&self) -> usize {
        self.players.iter().filter(|p| p.can_act()).count()
    }

    /// Two rounds, one card at a time, starting left of the button.
    fn deal_hole_cards(
        &mut self,
        dealer: &mut Dealer<'_>,
        sink: &mut dyn EventSink,
    ) -> Result<(), EngineError> {
        let order = self.layout.left_of_button();
        for _ in 0..2 {
            for &seat in &order {
                let card = self.draw(dealer)?;
                self.players[seat].give_card(card);
            }
        }
        for p in &self.players {
            self.emit(
                sink,
                Event::DealHole(DealHole {
                    seat: p.seat_id(),
                    cards: p.hole_cards().to_vec(),
                }),
            )?;
        }
        Ok(())
    }

    fn post_blinds(&mut self, blinds: Blinds, sink: &mut dyn EventSink) -> Result<(), EngineError> {
        let posts = [
            (self.layout.small_blind_seat(), BlindKind::Small, blinds.sb),
            (self.layout.big_blind_seat(), BlindKind::Big, blinds.bb),
        ];
        for (seat, blind, amount) in posts {
            let posted = self.players[seat].commit(amount);
            self.pot += posted;
            if posted > 0 {
                self.emit(
                    sink,
                    Event::Blind(BlindPosted {
                        seat,
                        blind,
                        amount: posted,
                    }),
                )?;
            }
        }
        self.current_bet = self.players.iter().map(|p| p.street_bet()).max().unwrap_or(0);
        self.last_full_raise = blinds.bb;
        Ok(())
    }

    fn deal_board(
        &mut self,
        street: Street,
        dealer: &mut Dealer<'_>,
        sink: &mut dyn EventSink,
    ) -> Result<(), EngineError> {
        let mut cards = Vec::with_capacity(3);
        while self.board.len() + cards.len() < street.board_len() {
            cards.push(self.draw(dealer)?);
        }
        self.board.extend_from_slice(&cards);
        for p in &mut self.players {
            p.reset_street();
        }
        self.current_bet = 0;
        self.last_full_raise = 0;
        self.emit(
            sink,
            Event::BoardDeal(BoardDeal {
                street,
                cards,
                board: self.board.clone(),
            }),
        )
    }

    fn needs_action(&self, seat: usize, acted: &[bool], able: usize) -> bool {
        let p = &self.players[seat];
        if !p.can_act() {
            return false;
        }
        // a lone seat with nothing to call has nobody left to bet against
        p.to_call(self.current_bet) > 0 || (!acted[seat] && able >= 2)
    }

    fn betting_round(
        &mut self,
        street: Street,
        governor: &Governor,
        seats: &mut [SeatWorker],
        sink: &mut dyn EventSink,
    ) -> Result<(), EngineError> {
        let order = self.layout.action_order(street);
        let n = order.len();
        let mut acted = vec![false; n];
        let mut cursor = 0usize;
        let mut round_aggressor = None;
        let mut any_decision = false;

        while self.players_in_hand() > 1 {
            let able = self.players_able_to_act();
            let next = (0..n)
                .map(|i| (cursor + i) % n)
                .find(|&i| self.needs_action(order[i], &acted, able));
            let Some(idx) = next else { break };
            let seat = order[idx];
            cursor = (idx + 1) % n;
            self.to_act = Some(seat);
            any_decision = true;

            let decision = {
                let p = &self.players[seat];
                Decision {
                    stack: p.stack(),
                    street_bet: p.street_bet(),
                    to_call: p.to_call(self.current_bet),
                    min_raise_to: min_raise_to(
                        self.current_bet,
                        self.last_full_raise,
                        self.blinds.bb,
                    ),
                    raise_open: !acted[seat],
                }
            };
            self.legal_actions = decision.legal_actions();
            let request = self.request_for(seat, &decision, governor.budget_ms());
            let ruling = governor.decide(&mut seats[seat], &request, &decision);

            if let Some(note) = ruling.penalty {
                match note.kind {
                    PenaltyKind::Timeout => self.players[seat].record_timeout(),
                    PenaltyKind::IllegalAction => {
                        self.players[seat].record_illegal_action()
                    }
                }
                self.emit(
                    sink,
                    Event::Penalty(Penalty {
                        seat,
                        street,
                        kind: note.kind,
                        attempted: note.attempted,
                        reason: note.reason,
                        elapsed_ms: ruling.elapsed_ms,
                        fallback: ruling.action.kind(),
                    }),
                )?;
            }

            let pot_delta = match ruling.action {
                ValidatedAction::Fold => {
                    self.players[seat].fold();
                    0
                }
                ValidatedAction::Check => 0,
                ValidatedAction::Call(amount) => self.players[seat].commit(amount),
                ValidatedAction::RaiseTo(total) => {
                    let target = min_raise_to(self.current_bet, self.last_full_raise, self.blinds.bb);
                    let street_bet = self.players[seat].street_bet();
                    let added = self.players[seat].commit(total - street_bet);
                    if total >= target {
                        self.last_full_raise = total - self.current_bet;
                        acted.iter_mut().for_each(|a| *a = false);
                    }
                    self.current_bet = self.current_bet.max(total);
                    round_aggressor = Some(seat);
                    added
                }
            };
            acted[seat] = true;
            self.pot += pot_delta;

            let p = &self.players[seat];
            self.history.push(HistoryEntry {
                seat_id: seat,
                action: ruling.action.kind(),
                amount: ruling.action.amount(),
                street,
                to_call: decision.to_call,
                min_raise_to: decision.min_raise_to,
            });
            trace!(hand_id = %self.hand_id, seat, action = %ruling.action.kind(), pot = self.pot, "action");
            self.emit(
                sink,
                Event::Action(ActionTaken {
                    seat,
                    street,
                    action: ruling.action.kind(),
                    amount: ruling.action.amount(),
                    to_call: decision.to_call,
                    min_raise_to: decision.min_raise_to,
                    elapsed_ms: ruling.elapsed_ms,
                    stack_after: p.stack(),
                    bet: p.street_bet(),
                    pot_delta,
                    pot: self.pot,
                }),
            )?;
        }

        self.to_act = None;
        if any_decision {
            self.last_aggressor = round_aggressor;
        }
        Ok(())
    }

    fn request_for(&self, seat: usize, decision: &Decision, timebank_ms: u64) -> ActionRequest {
        debug_assert_eq!(self.to_act, Some(seat));
        ActionRequest {
            seat_count: self.layout.seat_count(),
            table_id: self.table_id.clone(),
            hand_id: self.hand_id.clone(),
            seat_id: seat,
            button_seat: self.layout.button(),
            blinds: self.blinds,
            stacks: self.players.iter().map(|p| p.stack()).collect(),
            pot: self.pot,
            to_call: decision.to_call,
            min_raise_to: decision.min_raise_to,
            hole_cards: self.players[seat].hole_cards().to_vec(),
            board: self.board.clone(),
            action_history: self.history.clone(),
            legal_actions: self.legal_actions.clone(),
            timebank_ms,
            rng_tag: self.rng_tag.clone(),
        }
    }

    /// Returns uncalled chips, awards the pot and checks chip conservation.
    fn settle(
        &mut self,
        starting_stack: u32,
        sink: &mut dyn EventSink,
    ) -> Result<HandOutcome, EngineError> {
        let seat_count = self.players.len();
        let contributed: Vec<u32> = self.players.iter().map(|p| p.contributed()).collect();
        let uncalled = uncalled_excess(&contributed).map(|(seat, amount)| {
            self.players[seat].refund(amount);
            self.pot -= amount;
            UncalledReturn { seat, amount }
        });
        let contributions: Vec<u32> = self.players.iter().map(|p| p.contributed()).collect();
        let folded: Vec<bool> = self.players.iter().map(|p| p.is_folded()).collect();

        let went_to_showdown = self.players_in_hand() > 1;
        let payouts = if went_to_showdown {
            self.phase = Phase::Showdown;
            let strengths: Vec<_> = self
                .players
                .iter()
                .map(|p| {
                    (!p.is_folded()).then(|| {
                        let mut cards = p.hole_cards().to_vec();
                        cards.extend_from_slice(&self.board);
                        evaluate_hand(&cards)
                    })
                })
                .collect();
            let pots = build_side_pots(&contributions, &folded);
            let (payouts, awards) = distribute(&pots, &strengths, &self.layout.left_of_button());
            let hands = self
                .players
                .iter()
                .zip(&strengths)
                .filter_map(|(p, s)| {
                    s.map(|s| ShownHand {
                        seat: p.seat_id(),
                        cards: p.hole_cards().to_vec(),
                        strength: s.to_string(),
                    })
                })
                .collect();
            self.emit(
                sink,
                Event::Showdown(Showdown {
                    board: self.board.clone(),
                    hands,
                    pots: awards
                        .into_iter()
                        .map(|a| PotAward {
                            amount: a.amount,
                            eligible: a.eligible,
                            winners: a.winners,
                        })
                        .collect(),
                    uncalled,
                    last_aggressor: self.last_aggressor,
                }),
            )?;
            payouts
        } else {
            let mut payouts = vec![0u32; seat_count];
            if let Some(winner) = folded.iter().position(|&f| !f) {
                payouts[winner] = self.pot;
            }
            payouts
        };

        let paid: u64 = payouts.iter().map(|&c| u64::from(c)).sum();
        if paid != u64::from(self.pot) {
            return Err(self.invariant(format!(
                "payouts {} do not match collected pot {}",
                paid, self.pot
            )));
        }
        for (p, &won) in self.players.iter_mut().zip(&payouts) {
            p.award(won);
        }
        let deltas: Vec<i64> = payouts
            .iter()
            .zip(&contributions)
            .map(|(&won, &spent)| i64::from(won) - i64::from(spent))
            .collect();
        if deltas.iter().sum::<i64>() != 0 {
            return Err(self.invariant(format!("chip deltas {:?} do not sum to zero", deltas)));
        }
        for (p, &delta) in self.players.iter().zip(&deltas) {
            if i64::from(p.stack()) != i64::from(starting_stack) + delta {
                return Err(self.invariant(format!(
                    "seat {} ends with {} chips, expected {}",
                    p.seat_id(),
                    p.stack(),
                    i64::from(starting_stack) + delta
                )));
            }
        }

        self.phase = Phase::HandEnd;
        self.emit(
            sink,
            Event::HandEnd(HandEnd {
                contributions: contributions.clone(),
                payouts: payouts.clone(),
                deltas: deltas.clone(),
                uncalled,
                went_to_showdown,
            }),
        )?;
        trace!(hand_id = %self.hand_id, phase = ?self.phase, "settled");

        Ok(HandOutcome {
            hand_id: self.hand_id.clone(),
            deltas,
            payouts,
            contributions,
            timeouts: self.players.iter().map(|p| p.timeout_count()).collect(),
            illegal_actions: self
                .players
                .iter()
                .map(|p| p.illegal_action_count())
                .collect(),
            board: self.board.clone(),
            went_to_showdown,
            uncalled,
        })
    }

    fn invariant(&self, message: String) -> EngineError {
        error!(hand_id = %self.hand_id, %message, "invariant violated");
        EngineError::Invariant {
            hand_id: self.hand_id.clone(),
            message,
        }
    }
}
