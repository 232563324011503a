//! Configuration management for sift.
//!
//! Provides the switches that control the query rewrite stage: the global
//! enable flag, tracing verbosity, post-firing validation, and per-phase
//! firing budgets.

use std::collections::BTreeMap;

use common_error::{SiftError, SiftResult};
use serde::{Deserialize, Serialize};

/// Global sift configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    /// Rewrite (optimization) configuration.
    pub rewrite: RewriteConfig,
}

impl SiftConfig {
    /// Parse a configuration from JSON text. Missing fields take their defaults.
    pub fn from_json(text: &str) -> SiftResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.rewrite.check()?;
        Ok(config)
    }

    /// Serialize this configuration as pretty-printed JSON.
    pub fn to_json(&self) -> SiftResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// How much the rewrite engine reports about each firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceLevel {
    /// No per-firing events are recorded.
    #[default]
    Off,
    /// Record one event per firing.
    Fire,
    /// Record one event per firing plus a text snapshot of the whole tree.
    Explain,
}

impl TraceLevel {
    /// Returns true if firing events are recorded at all.
    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::Off)
    }

    /// Returns true if tree snapshots are recorded.
    pub fn wants_snapshot(self) -> bool {
        matches!(self, Self::Explain)
    }
}

/// Traversal order used by a rewrite phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkOrder {
    /// Parents before children.
    PreOrder,
    /// Children before parents.
    #[default]
    PostOrder,
    /// Only the root of the walk is visited.
    RootOnly,
}

/// Rewrite stage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// When false the parsed tree is handed to the evaluator unmodified.
    pub enabled: bool,
    /// Per-firing diagnostics.
    pub trace: TraceLevel,
    /// Validate the whole tree after every firing.
    pub validate: bool,
    /// Optional cap on node visits within a single phase run.
    pub max_visits: Option<u64>,
    /// Per-phase `max_fire` overrides keyed by phase name. Values <= 0 disable the phase.
    pub phase_budgets: BTreeMap<String, i64>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trace: TraceLevel::Off,
            validate: cfg!(debug_assertions),
            max_visits: None,
            phase_budgets: BTreeMap::new(),
        }
    }
}

impl RewriteConfig {
    /// A configuration with the rewrite stage switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Set the trace level.
    #[must_use]
    pub fn with_trace(mut self, trace: TraceLevel) -> Self {
        self.trace = trace;
        self
    }

    /// Enable or disable post-firing validation.
    #[must_use]
    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Override the firing budget of the named phase.
    #[must_use]
    pub fn with_phase_budget(mut self, phase: impl Into<String>, max_fire: i64) -> Self {
        self.phase_budgets.insert(phase.into(), max_fire);
        self
    }

    /// Cap the number of node visits per phase run.
    #[must_use]
    pub fn with_max_visits(mut self, max_visits: u64) -> Self {
        self.max_visits = Some(max_visits);
        self
    }

    /// The budget override for `phase`, if any.
    pub fn phase_budget(&self, phase: &str) -> Option<i64> {
        self.phase_budgets.get(phase).copied()
    }

    fn check(&self) -> SiftResult<()> {
        if self.max_visits == Some(0) {
            return Err(SiftError::config("max_visits must be positive when set"));
        }
        if let Some(name) = self.phase_budgets.keys().find(|name| name.trim().is_empty()) {
            return Err(SiftError::config(format!(
                "phase budget key {name:?} is not a phase name"
            )));
        }
        Ok(())
    }
}
