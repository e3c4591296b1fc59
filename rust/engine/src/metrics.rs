//! Per-player profitability and behavior statistics.
//!
//! Read-only over runner output: hand records supply chip deltas and penalty
//! counts, event logs are replayed for VPIP / PFR / AF / WTSD and decision
//! times.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;
use crate::logger::{read_event_log, Event, EventLogEntry, HandRecord, Street};
use crate::player::ActionKind;

/// z-score for a two-sided 95% interval
const Z_95: f64 = 1.96;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Incidents {
    pub count: u64,
    pub per_hand: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frequency {
    pub count: u64,
    pub rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostflopCounts {
    pub raises: u64,
    pub calls: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionTime {
    pub mean: f64,
    pub samples: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSummary {
    pub vpip: Frequency,
    pub pfr: Frequency,
    /// Post-flop raises per call; raw raise count when there are no calls
    pub af: f64,
    /// Showdowns reached per flop seen
    pub wt_sd: Frequency,
    pub postflop: PostflopCounts,
    pub decision_time_ms: DecisionTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMetrics {
    pub hands: u64,
    pub total_delta_chips: i64,
    pub bb_per_100: f64,
    /// 95% interval from per-seed rates; the point estimate with one seed
    pub bb_per_100_ci: [f64; 2],
    /// +1 when the interval is above zero, -1 when below, else 0
    pub match_points: i32,
    pub timeouts: Incidents,
    pub illegal_actions: Incidents,
    pub behavior: BehaviorSummary,
}

/// Metrics keyed by player label.
pub type RunMetrics = BTreeMap<String, PlayerMetrics>;

/// Raw behavior counters for one player, summed over hands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BehaviorCounts {
    pub hands: u64,
    pub vpip: u64,
    pub pfr: u64,
    pub saw_flop: u64,
    pub went_to_showdown: u64,
    pub postflop_raises: u64,
    pub postflop_calls: u64,
    pub decision_times_ms: Vec<u64>,
}

#[derive(Debug, Clone, Default)]
struct SeatHand {
    player: String,
    vpip: bool,
    pfr: bool,
    saw_flop: bool,
    went_to_showdown: bool,
    folded: bool,
    postflop_raises: u64,
    postflop_calls: u64,
    decision_times_ms: Vec<u64>,
}

impl SeatHand {
    fn fold_into(self, totals: &mut BehaviorCounts) {
        totals.vpip += u64::from(self.vpip);
        totals.pfr += u64::from(self.pfr);
        totals.saw_flop += u64::from(self.saw_flop);
        totals.went_to_showdown += u64::from(self.went_to_showdown);
        totals.postflop_raises += self.postflop_raises;
        totals.postflop_calls += self.postflop_calls;
        totals.decision_times_ms.extend(self.decision_times_ms);
    }
}

/// Replays action events into per-player behavior counters.
///
/// Events of different hands may interleave; hands without a `hand_end`
/// (a truncated log) still count.
pub fn replay_behavior<'a, I>(events: I) -> BTreeMap<String, BehaviorCounts>
where
    I: IntoIterator<Item = &'a EventLogEntry>,
{
    let mut totals: BTreeMap<String, BehaviorCounts> = BTreeMap::new();
    let mut open: HashMap<String, BTreeMap<usize, SeatHand>> = HashMap::new();

    for entry in events {
        match &entry.event {
            Event::HandStart(start) => {
                let seats = start
                    .seats
                    .iter()
                    .map(|s| {
                        totals.entry(s.name.clone()).or_default().hands += 1;
                        (
                            s.seat,
                            SeatHand {
                                player: s.name.clone(),
                                ..SeatHand::default()
                            },
                        )
                    })
                    .collect();
                open.insert(entry.hand_id.clone(), seats);
            }
            Event::BoardDeal(deal) if deal.street == Street::Flop => {
                if let Some(seats) = open.get_mut(&entry.hand_id) {
                    for s in seats.values_mut().filter(|s| !s.folded) {
                        s.saw_flop = true;
                    }
                }
            }
            Event::Action(action) => {
                let Some(s) = open
                    .get_mut(&entry.hand_id)
                    .and_then(|seats| seats.get_mut(&action.seat))
                else {
                    continue;
                };
                s.decision_times_ms.push(action.elapsed_ms);
                match (action.street, action.action) {
                    (Street::Preflop, ActionKind::RaiseTo) => {
                        s.vpip = true;
                        s.pfr = true;
                    }
                    (Street::Preflop, ActionKind::Call) if action.to_call > 0 => s.vpip = true,
                    (_, ActionKind::RaiseTo) if action.street != Street::Preflop => {
                        s.postflop_raises += 1
                    }
                    (_, ActionKind::Call) if action.street != Street::Preflop => {
                        s.postflop_calls += 1
                    }
                    _ => {}
                }
                if action.action == ActionKind::Fold {
                    s.folded = true;
                }
            }
            Event::Showdown(_) => {
                if let Some(seats) = open.get_mut(&entry.hand_id) {
                    for s in seats.values_mut().filter(|s| !s.folded) {
                        s.went_to_showdown = true;
                    }
                }
            }
            Event::HandEnd(_) => {
                if let Some(seats) = open.remove(&entry.hand_id) {
                    for s in seats.into_values() {
                        let t = totals.entry(s.player.clone()).or_default();
                        s.fold_into(t);
                    }
                }
            }
            _ => {}
        }
    }

    for seats in open.into_values() {
        for s in seats.into_values() {
            let t = totals.entry(s.player.clone()).or_default();
            s.fold_into(t);
        }
    }
    totals
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn summarize_behavior(b: &BehaviorCounts, total_hands: u64) -> BehaviorSummary {
    let hands = if b.hands == 0 { total_hands } else { b.hands };
    let af = if b.postflop_calls == 0 {
        b.postflop_raises as f64
    } else {
        ratio(b.postflop_raises, b.postflop_calls)
    };
    let samples = b.decision_times_ms.len() as u64;
    let mean = ratio(b.decision_times_ms.iter().sum(), samples);
    BehaviorSummary {
        vpip: Frequency {
            count: b.vpip,
            rate: ratio(b.vpip, hands),
        },
        pfr: Frequency {
            count: b.pfr,
            rate: ratio(b.pfr, hands),
        },
        af,
        wt_sd: Frequency {
            count: b.went_to_showdown,
            rate: ratio(b.went_to_showdown, b.saw_flop),
        },
        postflop: PostflopCounts {
            raises: b.postflop_raises,
            calls: b.postflop_calls,
        },
        decision_time_ms: DecisionTime { mean, samples },
    }
}

fn bb_per_100(delta: i64, hands: u64, big_blind: u32) -> f64 {
    if hands == 0 || big_blind == 0 {
        return 0.0;
    }
    (delta as f64 / f64::from(big_blind)) / hands as f64 * 100.0
}

/// Sample standard deviation; `None` below two samples.
fn sample_stdev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}

fn player_metrics(
    records: &[&HandRecord],
    big_blind: u32,
    behavior: Option<&BehaviorCounts>,
) -> PlayerMetrics {
    let hands = records.len() as u64;
    let total_delta: i64 = records.iter().map(|r| r.delta).sum();
    let rate = bb_per_100(total_delta, hands, big_blind);

    let mut per_seed: BTreeMap<u64, (i64, u64)> = BTreeMap::new();
    for r in records {
        let e = per_seed.entry(r.seed).or_default();
        e.0 += r.delta;
        e.1 += 1;
    }
    let seed_rates: Vec<f64> = per_seed
        .values()
        .map(|&(delta, n)| bb_per_100(delta, n, big_blind))
        .collect();
    let ci = match sample_stdev(&seed_rates) {
        Some(sd) => {
            let half = Z_95 * sd / (seed_rates.len() as f64).sqrt();
            [rate - half, rate + half]
        }
        None => [rate, rate],
    };
    let match_points = if ci[0] > 0.0 {
        1
    } else if ci[1] < 0.0 {
        -1
    } else {
        0
    };

    let timeouts: u64 = records.iter().map(|r| u64::from(r.timeouts)).sum();
    let illegal: u64 = records.iter().map(|r| u64::from(r.illegal_actions)).sum();
    let empty = BehaviorCounts::default();

    PlayerMetrics {
        hands,
        total_delta_chips: total_delta,
        bb_per_100: rate,
        bb_per_100_ci: ci,
        match_points,
        timeouts: Incidents {
            count: timeouts,
            per_hand: ratio(timeouts, hands),
        },
        illegal_actions: Incidents {
            count: illegal,
            per_hand: ratio(illegal, hands),
        },
        behavior: summarize_behavior(behavior.unwrap_or(&empty), hands),
    }
}

/// Aggregates records and already-loaded events.
pub fn aggregate_metrics<'a, I>(records: &[HandRecord], events: I, big_blind: u32) -> RunMetrics
where
    I: IntoIterator<Item = &'a EventLogEntry>,
{
    let behavior = replay_behavior(events);
    let mut grouped: BTreeMap<&str, Vec<&HandRecord>> = BTreeMap::new();
    for r in records {
        grouped.entry(r.player.as_str()).or_default().push(r);
    }
    grouped
        .into_iter()
        .map(|(player, recs)| {
            (
                player.to_string(),
                player_metrics(&recs, big_blind, behavior.get(player)),
            )
        })
        .collect()
}

/// Aggregates records and the event logs at `log_paths`. Missing log files
/// are skipped.
pub fn aggregate_run_metrics<P: AsRef<Path>>(
    records: &[HandRecord],
    log_paths: &[P],
    big_blind: u32,
) -> Result<RunMetrics, EngineError> {
    let mut events = Vec::new();
    for path in log_paths {
        let path = path.as_ref();
        if !path.exists() {
            continue;
        }
        events.extend(read_event_log(path)?);
    }
    Ok(aggregate_metrics(records, &events, big_blind))
}
