//! Sinks for conflict reports produced while building a table.

use crate::{automaton::StateId, grammar::Grammar, table::Resolution};

/// Receives the conflicts that were resolved by a default rule.
///
/// The table keeps every resolution regardless of the sink, so a sink only
/// decides how conflicts are surfaced.
pub trait Diagnostics {
    fn conflict(&mut self, g: &Grammar, resolution: &Resolution);

    /// Called once after the table is complete.
    fn finish(&mut self, g: &Grammar, conflicted_states: &[StateId]) {
        let _ = (g, conflicted_states);
    }
}

/// Reports conflicts as `tracing` warnings.
#[derive(Debug, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn conflict(&mut self, g: &Grammar, resolution: &Resolution) {
        tracing::warn!(
            "Conflict in grammar: multiple actions possible when lookahead token is {} in state {}\n- {}\n- {}",
            g.symbol(resolution.token),
            resolution.state.into_raw(),
            resolution.reduce.display(g),
            resolution.existing.display(g),
        );
    }

    fn finish(&mut self, _: &Grammar, conflicted_states: &[StateId]) {
        if !conflicted_states.is_empty() {
            tracing::warn!(
                "States with conflicts: {:?}",
                conflicted_states.iter().map(|s| s.into_raw()).collect::<Vec<_>>()
            );
        }
    }
}

/// Discards conflict reports.
#[derive(Debug, Default)]
pub struct Quiet;

impl Diagnostics for Quiet {
    fn conflict(&mut self, _: &Grammar, _: &Resolution) {}
}

impl Diagnostics for Vec<Resolution> {
    fn conflict(&mut self, _: &Grammar, resolution: &Resolution) {
        self.push(resolution.clone());
    }
}

impl<D: Diagnostics + ?Sized> Diagnostics for &mut D {
    fn conflict(&mut self, g: &Grammar, resolution: &Resolution) {
        (**self).conflict(g, resolution)
    }

    fn finish(&mut self, g: &Grammar, conflicted_states: &[StateId]) {
        (**self).finish(g, conflicted_states)
    }
}
