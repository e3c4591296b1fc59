//! Terminal output helpers shared by the commands.

use std::io::Write;

use greenbench_engine::metrics::{PlayerMetrics, RunMetrics};

pub fn write_error(err: &mut dyn Write, msg: &str) -> std::io::Result<()> {
    writeln!(err, "Error: {}", msg)
}

/// Display a warning message to stderr with "WARNING:" prefix
pub fn display_warning(err: &mut dyn Write, message: &str) -> std::io::Result<()> {
    writeln!(err, "WARNING: {}", message)
}

fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

fn summary_row(name: &str, m: &PlayerMetrics) -> String {
    format!(
        "{:<16} {:>7} {:>9.2} [{:>8.2}, {:>8.2}] {:>3} {:>5} {:>5} {:>6} {:>6} {:>5.2} {:>6} {:>8.1}",
        name,
        m.hands,
        m.bb_per_100,
        m.bb_per_100_ci[0],
        m.bb_per_100_ci[1],
        m.match_points,
        m.timeouts.count,
        m.illegal_actions.count,
        percent(m.behavior.vpip.rate),
        percent(m.behavior.pfr.rate),
        m.behavior.af,
        percent(m.behavior.wt_sd.rate),
        m.behavior.decision_time_ms.mean,
    )
}

/// Writes one line per player, sorted by name.
pub fn write_summary(out: &mut dyn Write, metrics: &RunMetrics) -> std::io::Result<()> {
    writeln!(
        out,
        "{:<16} {:>7} {:>9} {:>20} {:>3} {:>5} {:>5} {:>6} {:>6} {:>5} {:>6} {:>8}",
        "player", "hands", "bb/100", "95% CI", "mp", "t/o", "ill", "vpip", "pfr", "af", "wtsd",
        "ms/dec"
    )?;
    for (name, m) in metrics {
        writeln!(out, "{}", summary_row(name, m))?;
    }
    Ok(())
}
