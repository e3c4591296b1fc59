use std::collections::VecDeque;
use std::thread::sleep;
use std::time::{Duration, Instant};

use greenbench_engine::agent::{ActionRequest, ActionResponse, Agent, TableConfig};
use greenbench_engine::errors::AgentError;
use greenbench_engine::governance::{Governor, SeatWorker};
use greenbench_engine::logger::{Blinds, PenaltyKind};
use greenbench_engine::player::ActionKind;
use greenbench_engine::rules::{Decision, ValidatedAction};

/// Plays back `(delay_ms, result)` pairs, repeating the last one.
struct Reply {
    script: VecDeque<(u64, Result<ActionResponse, AgentError>)>,
}

impl Agent for Reply {
    fn name(&self) -> &str {
        "reply"
    }

    fn act(&mut self, _req: &ActionRequest) -> Result<ActionResponse, AgentError> {
        let (delay_ms, result) = if self.script.len() > 1 {
            self.script.pop_front().unwrap()
        } else {
            self.script.front().cloned().unwrap()
        };
        if delay_ms > 0 {
            sleep(Duration::from_millis(delay_ms));
        }
        result
    }
}

fn table() -> TableConfig {
    TableConfig {
        table_id: "gov".into(),
        seat_count: 2,
        blinds: Blinds { sb: 50, bb: 100 },
        starting_stack: 10_000,
        seat_names: vec!["other".into(), "reply".into()],
    }
}

fn seat(script: Vec<(u64, Result<ActionResponse, AgentError>)>) -> SeatWorker {
    let agent = Reply {
        script: script.into(),
    };
    SeatWorker::spawn(Box::new(agent), 1, &table()).unwrap()
}

fn answering(result: Result<ActionResponse, AgentError>) -> SeatWorker {
    seat(vec![(0, result)])
}

fn decision() -> Decision {
    Decision {
        stack: 9_900,
        street_bet: 100,
        to_call: 0,
        min_raise_to: 200,
        raise_open: true,
    }
}

fn request(d: &Decision) -> ActionRequest {
    ActionRequest {
        seat_count: 2,
        table_id: "gov".into(),
        hand_id: "1-0-0".into(),
        seat_id: 1,
        button_seat: 0,
        blinds: Blinds { sb: 50, bb: 100 },
        stacks: vec![9_900, 9_900],
        pot: 200,
        to_call: d.to_call,
        min_raise_to: d.min_raise_to,
        hole_cards: Vec::new(),
        board: Vec::new(),
        action_history: Vec::new(),
        legal_actions: d.legal_actions(),
        timebank_ms: 1_000,
        rng_tag: "1:0:0".into(),
    }
}

#[test]
fn legal_answer_passes_through() {
    let d = decision();
    let mut worker = answering(Ok(ActionResponse::raise_to(300)));
    let ruling = Governor::new(1_000).decide(&mut worker, &request(&d), &d);
    assert_eq!(ruling.action, ValidatedAction::RaiseTo(300));
    assert!(ruling.penalty.is_none());
    assert_eq!(worker.finish().name(), "reply");
}

#[test]
fn illegal_answer_falls_back_to_check() {
    let d = decision();
    let mut worker = answering(Ok(ActionResponse::call()));
    let ruling = Governor::new(1_000).decide(&mut worker, &request(&d), &d);
    assert_eq!(ruling.action, ValidatedAction::Check);
    let note = ruling.penalty.expect("penalty");
    assert_eq!(note.kind, PenaltyKind::IllegalAction);
    assert_eq!(note.attempted.map(|a| a.action), Some("call".to_string()));
}

#[test]
fn fold_with_nothing_to_call_is_accepted() {
    let d = decision();
    let mut worker = answering(Ok(ActionResponse::fold()));
    let ruling = Governor::new(1_000).decide(&mut worker, &request(&d), &d);
    assert_eq!(ruling.action, ValidatedAction::Fold);
    assert!(ruling.penalty.is_none());
}

#[test]
fn agent_timeout_error_is_a_timeout() {
    let d = decision();
    let mut worker = answering(Err(AgentError::Timeout));
    let ruling = Governor::new(1_000).decide(&mut worker, &request(&d), &d);
    assert_eq!(ruling.action, ValidatedAction::Check);
    let note = ruling.penalty.expect("penalty");
    assert_eq!(note.kind, PenaltyKind::Timeout);
    assert!(note.attempted.is_none());
}

#[test]
fn agent_failure_is_an_illegal_action() {
    let d = decision();
    let mut worker = answering(Err(AgentError::Failed("socket closed".into())));
    let ruling = Governor::new(1_000).decide(&mut worker, &request(&d), &d);
    let note = ruling.penalty.expect("penalty");
    assert_eq!(note.kind, PenaltyKind::IllegalAction);
    assert!(note.reason.contains("socket closed"));
}

#[test]
fn hung_agent_is_cut_off_at_the_budget() {
    let d = decision();
    let mut worker = seat(vec![(1_500, Ok(ActionResponse::raise_to(300)))]);
    let governor = Governor::new(50);

    let started = Instant::now();
    let ruling = governor.decide(&mut worker, &request(&d), &d);
    let wall = started.elapsed();

    assert!(wall < Duration::from_millis(500), "decide took {:?}", wall);
    assert_eq!(ruling.action, ValidatedAction::Check);
    let note = ruling.penalty.expect("penalty");
    assert_eq!(note.kind, PenaltyKind::Timeout);
    assert!(note.attempted.is_none());

    // still busy: the next decision times out too, and handing the agent
    // back does not wait for it
    let ruling = governor.decide(&mut worker, &request(&d), &d);
    assert_eq!(ruling.penalty.map(|n| n.kind), Some(PenaltyKind::Timeout));
    let agent = worker.finish();
    assert!(started.elapsed() < Duration::from_millis(1_000));
    assert_eq!(agent.name(), "reply");
}

#[test]
fn late_reply_is_discarded() {
    let d = decision();
    let mut worker = seat(vec![
        (300, Ok(ActionResponse::call())),
        (0, Ok(ActionResponse::raise_to(400))),
    ]);
    let governor = Governor::new(50);

    let first = governor.decide(&mut worker, &request(&d), &d);
    assert_eq!(first.penalty.map(|n| n.kind), Some(PenaltyKind::Timeout));

    // let the abandoned call land in the reply channel first
    sleep(Duration::from_millis(500));
    let second = governor.decide(&mut worker, &request(&d), &d);
    assert_eq!(second.action, ValidatedAction::RaiseTo(400));
    assert!(second.penalty.is_none());
}

#[test]
fn reported_wait_time_is_not_charged() {
    let d = decision();
    let mut worker = seat(vec![(
        40,
        Ok(ActionResponse {
            wait_time_ms: 10_000,
            ..ActionResponse::check()
        }),
    )]);
    let ruling = Governor::new(1_000).decide(&mut worker, &request(&d), &d);
    assert_eq!(ruling.action, ValidatedAction::Check);
    assert_eq!(ruling.elapsed_ms, 0);
    assert!(ruling.penalty.is_none());
}

#[test]
fn panicking_agent_is_an_illegal_action() {
    struct Boom;
    impl Agent for Boom {
        fn name(&self) -> &str {
            "boom"
        }
        fn act(&mut self, _req: &ActionRequest) -> Result<ActionResponse, AgentError> {
            panic!("agent bug")
        }
    }

    let d = decision();
    let mut worker = SeatWorker::spawn(Box::new(Boom), 1, &table()).unwrap();
    let ruling = Governor::new(1_000).decide(&mut worker, &request(&d), &d);
    assert_eq!(ruling.action, ValidatedAction::Check);
    assert_eq!(
        ruling.penalty.map(|n| n.kind),
        Some(PenaltyKind::IllegalAction)
    );

    let mut agent = worker.finish();
    assert_eq!(agent.name(), "boom");
    assert!(agent.act(&request(&d)).is_err());
}

#[test]
fn fallback_folds_when_call_is_not_affordable() {
    let d = Decision {
        stack: 30,
        street_bet: 0,
        to_call: 100,
        min_raise_to: 200,
        raise_open: true,
    };
    let mut worker = answering(Ok(ActionResponse::check()));
    let ruling = Governor::new(1_000).decide(&mut worker, &request(&d), &d);
    assert_eq!(ruling.action.kind(), ActionKind::Fold);
}
