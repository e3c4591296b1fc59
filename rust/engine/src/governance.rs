//! Timeout and legality enforcement around every agent call.
//!
//! Agents never break a hand. A late answer, an agent error, or an illegal
//! answer is replaced with [`fallback_action`] and reported as a penalty.
//!
//! Each seated agent runs on its own [`SeatWorker`] thread for the length of
//! a hand, so the decision budget is a hard deadline: the governor stops
//! waiting when it expires and discards whatever the agent answers later.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::agent::{ActionRequest, ActionResponse, Agent, TableConfig};
use crate::errors::AgentError;
use crate::logger::{AttemptedAction, PenaltyKind};
use crate::rules::{fallback_action, validate_response, Decision, ValidatedAction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenaltyNote {
    pub kind: PenaltyKind,
    pub attempted: Option<AttemptedAction>,
    pub reason: String,
}

/// Outcome of one governed decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ruling {
    pub action: ValidatedAction,
    /// Decision time net of the agent's reported external wait
    pub elapsed_ms: u64,
    pub penalty: Option<PenaltyNote>,
}

enum Command {
    Reset(usize, TableConfig),
    Act(ActionRequest),
}

enum Reply {
    Ready,
    Answer(Result<ActionResponse, AgentError>),
}

/// What came back from a seat within the budget.
enum Outcome {
    Answered(Result<ActionResponse, AgentError>),
    Late,
    Stopped,
}

/// An agent moved onto a dedicated thread.
///
/// Commands are processed in order. `outstanding` counts commands whose reply
/// has not been read yet; replies to requests that already timed out are
/// drained and dropped before the current one is read.
pub struct SeatWorker {
    name: String,
    commands: Sender<Command>,
    replies: Receiver<Reply>,
    handle: JoinHandle<Box<dyn Agent>>,
    outstanding: usize,
}

impl SeatWorker {
    /// Starts a thread owning `agent` and queues its [`Agent::reset`].
    ///
    /// The agent is lost only if the OS refuses to start the thread.
    pub fn spawn(
        agent: Box<dyn Agent>,
        seat: usize,
        table: &TableConfig,
    ) -> std::io::Result<Self> {
        let name = agent.name().to_string();
        let (commands, command_rx) = mpsc::channel::<Command>();
        let (reply_tx, replies) = mpsc::channel::<Reply>();

        let handle = thread::Builder::new()
            .name(format!("seat-{}", seat))
            .spawn(move || {
                let mut agent = agent;
                for command in command_rx {
                    let reply = match command {
                        Command::Reset(seat, table) => {
                            agent.reset(seat, &table);
                            Reply::Ready
                        }
                        Command::Act(request) => Reply::Answer(agent.act(&request)),
                    };
                    // the governor may have stopped listening
                    let _ = reply_tx.send(reply);
                }
                agent
            })?;

        let mut worker = Self {
            name,
            commands,
            replies,
            handle,
            outstanding: 0,
        };
        worker.send(Command::Reset(seat, table.clone()));
        Ok(worker)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn send(&mut self, command: Command) {
        if self.commands.send(command).is_ok() {
            self.outstanding += 1;
        }
    }

    fn ask(&mut self, request: &ActionRequest, budget: Duration) -> Outcome {
        let deadline = Instant::now() + budget;
        let before = self.outstanding;
        self.send(Command::Act(request.clone()));
        if self.outstanding == before {
            return Outcome::Stopped;
        }
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.replies.recv_timeout(remaining) {
                Ok(reply) => {
                    self.outstanding -= 1;
                    match reply {
                        Reply::Answer(result) if self.outstanding == 0 => {
                            return Outcome::Answered(result)
                        }
                        // a reset or an answer to an abandoned request
                        _ => continue,
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Outcome::Late,
                Err(RecvTimeoutError::Disconnected) => {
                    // the thread is gone and owes nothing
                    self.outstanding = 0;
                    return Outcome::Stopped;
                }
            }
        }
    }

    /// Stops the thread and hands the agent back.
    ///
    /// Never blocks on a busy agent: if replies are still owed, the returned
    /// agent joins the thread the first time it is used.
    pub fn finish(mut self) -> Box<dyn Agent> {
        while self.outstanding > 0 && self.replies.try_recv().is_ok() {
            self.outstanding -= 1;
        }
        let SeatWorker {
            name,
            commands,
            handle,
            outstanding,
            ..
        } = self;
        drop(commands);

        let mut detached = Detached {
            name,
            handle: Some(handle),
            agent: None,
        };
        if outstanding > 0 {
            debug!(agent = %detached.name, outstanding, "agent still busy at hand end");
            return Box::new(detached);
        }
        detached.resolve();
        match detached.agent.take() {
            Some(agent) => agent,
            None => Box::new(detached),
        }
    }
}

/// An agent whose thread may not have returned it yet.
///
/// A panicked agent stays here with no inner agent and fails every call.
struct Detached {
    name: String,
    handle: Option<JoinHandle<Box<dyn Agent>>>,
    agent: Option<Box<dyn Agent>>,
}

impl Detached {
    /// Placeholder held in a seat while its agent is on a worker thread.
    fn vacant(name: String) -> Self {
        Self {
            name,
            handle: None,
            agent: None,
        }
    }

    fn resolve(&mut self) -> Option<&mut Box<dyn Agent>> {
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(agent) => self.agent = Some(agent),
                Err(_) => warn!(agent = %self.name, "agent thread panicked"),
            }
        }
        self.agent.as_mut()
    }
}

impl Agent for Detached {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self, seat_id: usize, table: &TableConfig) {
        if let Some(agent) = self.resolve() {
            agent.reset(seat_id, table);
        }
    }

    fn act(&mut self, request: &ActionRequest) -> Result<ActionResponse, AgentError> {
        match self.resolve() {
            Some(agent) => agent.act(request),
            None => Err(AgentError::Failed("agent thread stopped".into())),
        }
    }
}

/// Moves every agent onto its own worker, leaving placeholders behind.
///
/// On a spawn failure the agents already moved are put back before the
/// error is returned.
pub fn seat_workers(
    agents: &mut [Box<dyn Agent>],
    table: &TableConfig,
) -> std::io::Result<Vec<SeatWorker>> {
    let mut workers = Vec::with_capacity(agents.len());
    for seat in 0..agents.len() {
        let vacant: Box<dyn Agent> = Box::new(Detached::vacant(agents[seat].name().to_string()));
        let agent = std::mem::replace(&mut agents[seat], vacant);
        match SeatWorker::spawn(agent, seat, table) {
            Ok(worker) => workers.push(worker),
            Err(err) => {
                release_workers(workers, agents);
                return Err(err);
            }
        }
    }
    Ok(workers)
}

/// Returns each worker's agent to its seat.
pub fn release_workers(workers: Vec<SeatWorker>, agents: &mut [Box<dyn Agent>]) {
    for (slot, worker) in agents.iter_mut().zip(workers) {
        *slot = worker.finish();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Governor {
    budget_ms: u64,
}

impl Governor {
    pub fn new(budget_ms: u64) -> Self {
        Self { budget_ms }
    }

    pub fn budget_ms(&self) -> u64 {
        self.budget_ms
    }

    /// Asks the seat for a decision and returns the action to apply.
    ///
    /// Returns within the budget whatever the agent does. The substituted
    /// action is applied directly and never sent back to the agent, so one
    /// decision yields at most one penalty.
    pub fn decide(
        &self,
        seat: &mut SeatWorker,
        request: &ActionRequest,
        decision: &Decision,
    ) -> Ruling {
        let started = Instant::now();
        let outcome = seat.ask(request, Duration::from_millis(self.budget_ms));
        let measured = started.elapsed().as_millis() as u64;

        let (elapsed_ms, note) = match outcome {
            Outcome::Late => (
                measured,
                Some(PenaltyNote {
                    kind: PenaltyKind::Timeout,
                    attempted: None,
                    reason: format!("no answer within {} ms", self.budget_ms),
                }),
            ),
            Outcome::Stopped => (
                measured,
                Some(PenaltyNote {
                    kind: PenaltyKind::IllegalAction,
                    attempted: None,
                    reason: "agent thread stopped".to_string(),
                }),
            ),
            Outcome::Answered(Err(AgentError::Timeout)) => (
                measured,
                Some(PenaltyNote {
                    kind: PenaltyKind::Timeout,
                    attempted: None,
                    reason: AgentError::Timeout.to_string(),
                }),
            ),
            Outcome::Answered(Err(err)) => (
                measured,
                Some(PenaltyNote {
                    kind: PenaltyKind::IllegalAction,
                    attempted: None,
                    reason: err.to_string(),
                }),
            ),
            Outcome::Answered(Ok(response)) => {
                let elapsed = measured.saturating_sub(response.wait_time_ms);
                let attempted = AttemptedAction {
                    action: response.action.clone(),
                    amount: response.amount,
                };
                // the channel wakes up a little after the deadline at worst
                if elapsed > self.budget_ms {
                    let reason = format!(
                        "answered after {} ms, budget is {} ms",
                        elapsed, self.budget_ms
                    );
                    (
                        elapsed,
                        Some(PenaltyNote {
                            kind: PenaltyKind::Timeout,
                            attempted: Some(attempted),
                            reason,
                        }),
                    )
                } else {
                    match validate_response(decision, &response.action, response.amount) {
                        Ok(action) => {
                            return Ruling {
                                action,
                                elapsed_ms: elapsed,
                                penalty: None,
                            }
                        }
                        Err(err) => (
                            elapsed,
                            Some(PenaltyNote {
                                kind: PenaltyKind::IllegalAction,
                                attempted: Some(attempted),
                                reason: err.to_string(),
                            }),
                        ),
                    }
                }
            }
        };

        let action = fallback_action(decision);
        if let Some(note) = &note {
            warn!(
                hand_id = %request.hand_id,
                seat = request.seat_id,
                agent = seat.name(),
                kind = ?note.kind,
                reason = %note.reason,
                fallback = %action.kind(),
                "agent decision replaced"
            );
        }
        Ruling {
            action,
            elapsed_ms,
            penalty: note,
        }
    }
}
