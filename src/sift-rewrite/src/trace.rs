//! Firing diagnostics.

use std::time::Duration;

use common_display::indent;
use sift_expr::ExprKind;

/// One successful rule application.
#[derive(Debug, Clone)]
pub struct FireEvent {
    /// Position of the phase in the pipeline.
    pub phase: usize,
    /// Name of the phase.
    pub phase_name: String,
    /// Name of the rule that fired.
    pub rule: &'static str,
    /// Kind of the node the rule fired on.
    pub node_kind: ExprKind,
    /// Time spent dispatching the node, up to and including the firing.
    pub elapsed: Duration,
    /// Number of rules offered the node, including the one that fired.
    pub tried_before_fire: usize,
    /// Decompiled tree right after the firing, when snapshots are requested.
    pub snapshot: Option<String>,
}

/// Ordered record of the firings of one engine run.
#[derive(Debug, Clone, Default)]
pub struct RewriteTrace {
    events: Vec<FireEvent>,
}

impl RewriteTrace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&mut self, event: FireEvent) {
        self.events.push(event);
    }

    /// Get the recorded events in firing order.
    pub fn events(&self) -> &[FireEvent] {
        &self.events
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Names of the rules that fired, in order.
    pub fn fired_rules(&self) -> Vec<&'static str> {
        self.events.iter().map(|event| event.rule).collect()
    }

    /// Format the trace as a human-readable string.
    pub fn format(&self) -> String {
        let mut output = format!("{} firings\n", self.events.len());
        for (i, event) in self.events.iter().enumerate() {
            output.push_str(&format!(
                "{:>4}. [{}:{}] {} on {} ({:?}, {} tried)\n",
                i + 1,
                event.phase,
                event.phase_name,
                event.rule,
                event.node_kind,
                event.elapsed,
                event.tried_before_fire
            ));
            if let Some(snapshot) = &event.snapshot {
                output.push_str(&indent(snapshot, "      "));
                output.push('\n');
            }
        }
        output
    }
}
