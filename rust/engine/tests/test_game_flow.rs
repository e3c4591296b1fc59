use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread::sleep;
use std::time::{Duration, Instant};

use greenbench_engine::agent::{ActionRequest, ActionResponse, Agent};
use greenbench_engine::cards::parse_cards;
use greenbench_engine::deck::{DealKey, Deck};
use greenbench_engine::engine::{Engine, EngineConfig, HandContext};
use greenbench_engine::errors::AgentError;
use greenbench_engine::logger::{Blinds, Event, MemorySink, PenaltyKind, Street, UncalledReturn};
use greenbench_engine::player::ActionKind;

/// Checks when it can, calls otherwise.
struct Passive(&'static str);

impl Agent for Passive {
    fn name(&self) -> &str {
        self.0
    }

    fn act(&mut self, req: &ActionRequest) -> Result<ActionResponse, AgentError> {
        Ok(if req.to_call == 0 {
            ActionResponse::check()
        } else {
            ActionResponse::call()
        })
    }
}

/// Plays queued responses, then falls back to passive play.
struct Scripted {
    name: &'static str,
    script: VecDeque<ActionResponse>,
}

impl Scripted {
    fn new(name: &'static str, script: Vec<ActionResponse>) -> Self {
        Self {
            name,
            script: script.into(),
        }
    }
}

impl Agent for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    fn act(&mut self, req: &ActionRequest) -> Result<ActionResponse, AgentError> {
        if let Some(next) = self.script.pop_front() {
            return Ok(next);
        }
        Passive(self.name).act(req)
    }
}

struct Folder;

impl Agent for Folder {
    fn name(&self) -> &str {
        "folder"
    }

    fn act(&mut self, req: &ActionRequest) -> Result<ActionResponse, AgentError> {
        Ok(if req.to_call == 0 {
            ActionResponse::check()
        } else {
            ActionResponse::fold()
        })
    }
}

struct AlwaysTimesOut;

impl Agent for AlwaysTimesOut {
    fn name(&self) -> &str {
        "sleepy"
    }

    fn act(&mut self, _req: &ActionRequest) -> Result<ActionResponse, AgentError> {
        Err(AgentError::Timeout)
    }
}

/// Answers passively, but only long after any sane budget.
struct Hung;

impl Agent for Hung {
    fn name(&self) -> &str {
        "hung"
    }

    fn act(&mut self, req: &ActionRequest) -> Result<ActionResponse, AgentError> {
        sleep(Duration::from_millis(1_500));
        Passive("hung").act(req)
    }
}

fn engine(seats: usize) -> Engine {
    Engine::new(EngineConfig {
        table_id: "flow".into(),
        seat_count: seats,
        blinds: Blinds { sb: 50, bb: 100 },
        starting_stack: 20_000,
        decision_ms: 60_000,
    })
    .unwrap()
}

fn ctx(button: usize) -> HandContext {
    HandContext {
        seed: 11,
        hand_index: 0,
        replica_id: 0,
        button,
    }
}

/// Seat 1 gets Qc 7h, seat 0 gets Ks 9d, board Kh 9c 4s 2d Qd.
fn two_pair_deck() -> Deck {
    Deck::stacked(&parse_cards("Qc Ks 7h 9d Kh 9c 4s 2d Qd").unwrap())
}

#[test]
fn heads_up_check_down_goes_to_showdown() {
    let mut agents: Vec<Box<dyn Agent>> = vec![Box::new(Passive("a")), Box::new(Passive("b"))];
    let mut sink = MemorySink::new();
    let outcome = engine(2)
        .play_hand(ctx(0), &two_pair_deck(), &mut agents, &mut sink)
        .unwrap();

    assert_eq!(outcome.hand_id, "11-0-0");
    assert!(outcome.went_to_showdown);
    assert_eq!(outcome.deltas, vec![100, -100]);
    assert_eq!(outcome.payouts, vec![200, 0]);
    assert_eq!(outcome.board, parse_cards("Kh 9c 4s 2d Qd").unwrap());

    let entries = sink.entries();
    assert!(matches!(entries.first().map(|e| &e.event), Some(Event::HandStart(_))));
    assert!(matches!(entries.last().map(|e| &e.event), Some(Event::HandEnd(_))));
    assert!(entries.iter().all(|e| e.hand_id == "11-0-0"));

    let holes: Vec<_> = entries
        .iter()
        .filter_map(|e| match &e.event {
            Event::DealHole(d) => Some((d.seat, d.cards.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        holes,
        vec![
            (0, parse_cards("Ks 9d").unwrap()),
            (1, parse_cards("Qc 7h").unwrap())
        ]
    );

    let showdown = entries
        .iter()
        .find_map(|e| match &e.event {
            Event::Showdown(s) => Some(s.clone()),
            _ => None,
        })
        .expect("showdown event");
    assert_eq!(showdown.pots.len(), 1);
    assert_eq!(showdown.pots[0].winners, vec![0]);
    assert_eq!(showdown.hands[0].strength, "Two Pair (K-9-Q)");
}

#[test]
fn heads_up_button_acts_first_preflop_and_last_after() {
    let mut agents: Vec<Box<dyn Agent>> = vec![Box::new(Passive("a")), Box::new(Passive("b"))];
    let mut sink = MemorySink::new();
    engine(2)
        .play_hand(ctx(0), &two_pair_deck(), &mut agents, &mut sink)
        .unwrap();

    let actions: Vec<(Street, usize, ActionKind)> = sink
        .entries()
        .iter()
        .filter_map(|e| match &e.event {
            Event::Action(a) => Some((a.street, a.seat, a.action)),
            _ => None,
        })
        .collect();
    assert_eq!(actions[0], (Street::Preflop, 0, ActionKind::Call));
    assert_eq!(actions[1], (Street::Preflop, 1, ActionKind::Check));
    assert_eq!(actions[2], (Street::Flop, 1, ActionKind::Check));
    assert_eq!(actions[3], (Street::Flop, 0, ActionKind::Check));
    assert_eq!(actions.len(), 8);
}

#[test]
fn uncalled_reraise_is_returned_on_fold() {
    let mut agents: Vec<Box<dyn Agent>> = vec![
        Box::new(Scripted::new(
            "opener",
            vec![ActionResponse::raise_to(300), ActionResponse::fold()],
        )),
        Box::new(Scripted::new("threebet", vec![ActionResponse::raise_to(900)])),
    ];
    let mut sink = MemorySink::new();
    let outcome = engine(2)
        .play_hand(ctx(0), &two_pair_deck(), &mut agents, &mut sink)
        .unwrap();

    assert!(!outcome.went_to_showdown);
    assert_eq!(outcome.uncalled, Some(UncalledReturn { seat: 1, amount: 600 }));
    assert_eq!(outcome.contributions, vec![300, 300]);
    assert_eq!(outcome.deltas, vec![-300, 300]);
    assert!(outcome.board.is_empty());
    assert!(!sink
        .entries()
        .iter()
        .any(|e| matches!(e.event, Event::Showdown(_) | Event::BoardDeal(_))));
}

#[test]
fn raise_below_minimum_is_penalised_and_called() {
    let mut agents: Vec<Box<dyn Agent>> = vec![
        Box::new(Scripted::new("short", vec![ActionResponse::raise_to(150)])),
        Box::new(Passive("b")),
    ];
    let mut sink = MemorySink::new();
    let outcome = engine(2)
        .play_hand(ctx(0), &two_pair_deck(), &mut agents, &mut sink)
        .unwrap();

    assert_eq!(outcome.illegal_actions, vec![1, 0]);
    assert_eq!(outcome.timeouts, vec![0, 0]);
    let penalty = sink
        .entries()
        .iter()
        .find_map(|e| match &e.event {
            Event::Penalty(p) => Some(p.clone()),
            _ => None,
        })
        .expect("penalty event");
    assert_eq!(penalty.seat, 0);
    assert_eq!(penalty.kind, PenaltyKind::IllegalAction);
    assert_eq!(penalty.fallback, ActionKind::Call);
    let attempted = penalty.attempted.expect("attempted action");
    assert_eq!(attempted.action, "raise_to");
    assert_eq!(attempted.amount, Some(150));
    // the hand carries on from the substituted call
    assert_eq!(outcome.deltas, vec![100, -100]);
}

#[test]
fn timeouts_fall_back_and_are_counted() {
    let mut agents: Vec<Box<dyn Agent>> = vec![Box::new(AlwaysTimesOut), Box::new(Passive("b"))];
    let mut sink = MemorySink::new();
    let outcome = engine(2)
        .play_hand(ctx(0), &two_pair_deck(), &mut agents, &mut sink)
        .unwrap();

    // call preflop, then a check on each later street
    assert_eq!(outcome.timeouts, vec![4, 0]);
    assert_eq!(outcome.illegal_actions, vec![0, 0]);
    assert!(outcome.went_to_showdown);
    assert_eq!(outcome.deltas.iter().sum::<i64>(), 0);
}

#[test]
fn preflop_all_in_runs_the_board_out() {
    let mut agents: Vec<Box<dyn Agent>> = vec![
        Box::new(Scripted::new("shover", vec![ActionResponse::raise_to(20_000)])),
        Box::new(Passive("caller")),
    ];
    let mut sink = MemorySink::new();
    let outcome = engine(2)
        .play_hand(ctx(0), &two_pair_deck(), &mut agents, &mut sink)
        .unwrap();

    assert!(outcome.went_to_showdown);
    assert_eq!(outcome.board.len(), 5);
    assert_eq!(outcome.deltas, vec![20_000, -20_000]);
    let actions = sink
        .entries()
        .iter()
        .filter(|e| matches!(e.event, Event::Action(_)))
        .count();
    assert_eq!(actions, 2);
}

#[test]
fn six_max_preflop_opens_under_the_gun() {
    let mut agents: Vec<Box<dyn Agent>> = (0..6)
        .map(|_| Box::new(Passive("p")) as Box<dyn Agent>)
        .collect();
    let mut sink = MemorySink::new();
    let outcome = engine(6)
        .play_hand(ctx(0), &Deck::for_key(DealKey::new(11, 0, 0)), &mut agents, &mut sink)
        .unwrap();

    let first = sink
        .entries()
        .iter()
        .find_map(|e| match &e.event {
            Event::Action(a) => Some(a.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(first.seat, 3);
    assert_eq!(first.to_call, 100);
    assert_eq!(outcome.deltas.iter().sum::<i64>(), 0);
    assert_eq!(outcome.contributions, vec![100; 6]);
}

#[test]
fn blinds_fold_around_to_big_blind() {
    let mut agents: Vec<Box<dyn Agent>> = (0..6)
        .map(|_| Box::new(Folder) as Box<dyn Agent>)
        .collect();
    let mut sink = MemorySink::new();
    let outcome = engine(6)
        .play_hand(ctx(0), &Deck::for_key(DealKey::new(3, 1, 0)), &mut agents, &mut sink)
        .unwrap();

    assert!(!outcome.went_to_showdown);
    assert_eq!(outcome.deltas, vec![0, -50, 50, 0, 0, 0]);
    assert_eq!(outcome.uncalled, Some(UncalledReturn { seat: 2, amount: 50 }));
    // the big blind is never asked once everyone else has folded
    let big_blind_acted = sink
        .entries()
        .iter()
        .any(|e| matches!(&e.event, Event::Action(a) if a.seat == 2));
    assert!(!big_blind_acted);
}

#[test]
fn requests_carry_own_cards_and_big_blind_option() {
    struct Inspector {
        seen: Arc<Mutex<Vec<ActionRequest>>>,
    }
    impl Agent for Inspector {
        fn name(&self) -> &str {
            "inspector"
        }
        fn act(&mut self, req: &ActionRequest) -> Result<ActionResponse, AgentError> {
            self.seen.lock().unwrap().push(req.clone());
            Passive("inspector").act(req)
        }
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut agents: Vec<Box<dyn Agent>> = vec![
        Box::new(Passive("a")),
        Box::new(Inspector { seen: Arc::clone(&seen) }),
    ];
    let mut sink = MemorySink::new();
    engine(2)
        .play_hand(ctx(0), &two_pair_deck(), &mut agents, &mut sink)
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 4);
    let first = &seen[0];
    assert_eq!(first.seat_id, 1);
    assert_eq!(first.hole_cards, parse_cards("Qc 7h").unwrap());
    assert!(first.board.is_empty());
    assert_eq!(first.to_call, 0);
    assert_eq!(first.min_raise_to, 200);
    assert_eq!(
        first.legal_actions,
        vec![ActionKind::Fold, ActionKind::Check, ActionKind::RaiseTo]
    );
    assert_eq!(first.stacks, vec![19_900, 19_900]);
    assert_eq!(first.pot, 200);
    assert_eq!(first.rng_tag, "11:0:0");
    assert_eq!(first.action_history.len(), 1);
    assert_eq!(first.own_street_bet(), 100);
    assert_eq!(first.max_raise_to(), 20_000);
    assert_eq!(first.raise_target(50), 200);
    assert_eq!(first.raise_target(90_000), 20_000);
    assert_eq!(seen[3].board.len(), 5);
}

#[test]
fn wrong_agent_count_is_rejected() {
    let mut agents: Vec<Box<dyn Agent>> = vec![Box::new(Passive("a"))];
    let mut sink = MemorySink::new();
    let err = engine(2)
        .play_hand(ctx(0), &two_pair_deck(), &mut agents, &mut sink)
        .unwrap_err();
    assert!(err.to_string().contains("between 2 and 6 seats"));
}

#[test]
fn big_blind_may_fold_with_nothing_to_call() {
    let mut agents: Vec<Box<dyn Agent>> = vec![
        Box::new(Passive("limper")),
        Box::new(Scripted::new("quitter", vec![ActionResponse::fold()])),
    ];
    let mut sink = MemorySink::new();
    let outcome = engine(2)
        .play_hand(ctx(0), &two_pair_deck(), &mut agents, &mut sink)
        .unwrap();

    assert_eq!(outcome.illegal_actions, vec![0, 0]);
    assert_eq!(outcome.deltas, vec![100, -100]);
    assert!(!outcome.went_to_showdown);
    assert!(!sink
        .entries()
        .iter()
        .any(|e| matches!(e.event, Event::Penalty(_))));
}

#[test]
fn hung_agent_cannot_stall_the_hand() {
    let engine = Engine::new(EngineConfig {
        table_id: "flow".into(),
        seat_count: 2,
        blinds: Blinds { sb: 50, bb: 100 },
        starting_stack: 20_000,
        decision_ms: 50,
    })
    .unwrap();
    let mut agents: Vec<Box<dyn Agent>> = vec![Box::new(Hung), Box::new(Passive("b"))];
    let mut sink = MemorySink::new();

    let started = Instant::now();
    let outcome = engine
        .play_hand(ctx(0), &two_pair_deck(), &mut agents, &mut sink)
        .unwrap();
    let wall = started.elapsed();

    // four decisions at 50 ms each, nowhere near one 1500 ms answer
    assert!(wall < Duration::from_millis(1_000), "hand took {:?}", wall);
    assert_eq!(outcome.timeouts, vec![4, 0]);
    assert!(outcome.went_to_showdown);
    assert_eq!(outcome.deltas.iter().sum::<i64>(), 0);
    assert_eq!(agents[0].name(), "hung");
}
