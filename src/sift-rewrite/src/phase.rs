//! Bounded rewrite passes.
//!
//! A phase walks the tree, offers each visited node to the rules registered
//! for its kind and for every ancestor kind, and restarts the walk from the
//! root after each firing. It stops when a full walk fires nothing, when its
//! firing budget is spent, or when the optional visit cap is hit.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use common_config::{RewriteConfig, WalkOrder};
use common_error::{SiftError, SiftResult};
use log::{debug, trace, warn};
use sift_expr::{ExprId, ExprKind};

use crate::context::RewriteContext;
use crate::rules::RewriteRule;
use crate::trace::{FireEvent, RewriteTrace};
use crate::walker::walker_for;

/// Why a phase stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The budget was zero or negative; nothing was visited.
    Disabled,
    /// A full walk completed without a firing.
    Fixpoint,
    /// The phase fired as many times as its budget allows.
    BudgetExhausted,
    /// The configured node-visit cap was reached.
    VisitCapReached,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::Disabled => "disabled",
            StopReason::Fixpoint => "fixpoint",
            StopReason::BudgetExhausted => "budget exhausted",
            StopReason::VisitCapReached => "visit cap reached",
        };
        write!(f, "{text}")
    }
}

/// Outcome of one phase run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseStats {
    /// Name of the phase.
    pub name: String,
    /// Number of firings.
    pub fired: usize,
    /// Number of nodes offered to the rules, counting re-visits after restarts.
    pub visited: u64,
    /// Why the phase stopped.
    pub stop: StopReason,
}

/// A named, bounded pass over the tree with its own rule registry.
///
/// Rules are looked up by the visited node's kind and then by each of its
/// ancestor kinds, nearest first. Within one kind, rules are tried in
/// registration order. The first rule that fires ends the dispatch of that
/// node.
pub struct RewritePhase {
    name: String,
    order: WalkOrder,
    max_fire: i64,
    registry: HashMap<ExprKind, Vec<Arc<dyn RewriteRule>>>,
}

impl RewritePhase {
    /// Create an empty phase that fires at most `max_fire` times per run.
    ///
    /// A budget of zero or less disables the phase.
    pub fn new(name: impl Into<String>, max_fire: i64) -> Self {
        Self {
            name: name.into(),
            order: WalkOrder::default(),
            max_fire,
            registry: HashMap::new(),
        }
    }

    /// Set the traversal order.
    pub fn with_order(mut self, order: WalkOrder) -> Self {
        self.order = order;
        self
    }

    /// Register a rule for every kind it declares in [`RewriteRule::fire_on`].
    pub fn with_rule(mut self, rule: Arc<dyn RewriteRule>) -> Self {
        self.add_rule(rule);
        self
    }

    /// Register several rules, in order.
    pub fn with_rules(mut self, rules: impl IntoIterator<Item = Arc<dyn RewriteRule>>) -> Self {
        for rule in rules {
            self.add_rule(rule);
        }
        self
    }

    /// Register a rule for every kind it declares in [`RewriteRule::fire_on`].
    pub fn add_rule(&mut self, rule: Arc<dyn RewriteRule>) {
        for kind in rule.fire_on() {
            self.register_on(*kind, Arc::clone(&rule));
        }
    }

    /// Register a rule for one kind, regardless of what it declares.
    pub fn register_on(&mut self, kind: ExprKind, rule: Arc<dyn RewriteRule>) {
        self.registry.entry(kind).or_default().push(rule);
    }

    /// Get the phase name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the traversal order.
    pub fn order(&self) -> WalkOrder {
        self.order
    }

    /// Get the firing budget.
    pub fn max_fire(&self) -> i64 {
        self.max_fire
    }

    /// Rules registered directly on `kind`.
    pub fn rules_for(&self, kind: ExprKind) -> &[Arc<dyn RewriteRule>] {
        self.registry.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rules offered a node of `kind`, in dispatch order.
    pub fn candidates(&self, kind: ExprKind) -> impl Iterator<Item = &Arc<dyn RewriteRule>> + '_ {
        kind.lineage()
            .iter()
            .flat_map(move |k| self.rules_for(*k).iter())
    }

    /// Run the phase over the tree rooted at `root`.
    ///
    /// `root` must stay in place for the whole run: rules may replace any
    /// node below it but never `root` itself. `index` is the position of the
    /// phase in its pipeline and is only used for diagnostics.
    pub fn run(
        &self,
        index: usize,
        ctx: &mut RewriteContext<'_>,
        root: ExprId,
        config: &RewriteConfig,
        fire_trace: &mut RewriteTrace,
    ) -> SiftResult<PhaseStats> {
        let budget = config.phase_budget(&self.name).unwrap_or(self.max_fire);
        let mut stats = PhaseStats {
            name: self.name.clone(),
            fired: 0,
            visited: 0,
            stop: StopReason::Disabled,
        };
        if budget <= 0 {
            debug!("Phase '{}' is disabled (max_fire {})", self.name, budget);
            return Ok(stats);
        }
        let budget = usize::try_from(budget).unwrap_or(usize::MAX);

        debug!(
            "Phase '{}' starting ({:?}, max_fire {})",
            self.name, self.order, budget
        );
        let mut walker = walker_for(self.order);
        walker.reset(ctx.tree, root);

        stats.stop = loop {
            let Some(node) = walker.next(ctx.tree) else {
                break StopReason::Fixpoint;
            };
            // a walk that ends exactly at the cap is still a fixpoint
            if config.max_visits.is_some_and(|cap| stats.visited >= cap) {
                warn!(
                    "Phase '{}' stopped after visiting {} nodes",
                    self.name, stats.visited
                );
                break StopReason::VisitCapReached;
            }
            stats.visited += 1;

            let started = Instant::now();
            let kind = ctx.tree.kind(node);
            let mut tried = 0;
            let mut fired_rule = None;
            for rule in self.candidates(kind) {
                tried += 1;
                trace!("Trying '{}' on {} ({})", rule.name(), node, kind);
                if rule.rewrite(ctx, node)? {
                    fired_rule = Some(rule);
                    break;
                }
            }
            let Some(rule) = fired_rule else {
                continue;
            };

            if config.validate {
                ctx.tree.validate(root).map_err(|err| match err {
                    SiftError::InvariantViolation(msg) => SiftError::invariant(format!(
                        "after '{}' fired on {} in phase '{}': {}",
                        rule.name(),
                        kind,
                        self.name,
                        msg
                    )),
                    other => other,
                })?;
            }
            stats.fired += 1;
            debug!(
                "Rule '{}' fired on {} in phase '{}' ({} of {})",
                rule.name(),
                kind,
                self.name,
                stats.fired,
                budget
            );
            if config.trace.is_enabled() {
                fire_trace.push(FireEvent {
                    phase: index,
                    phase_name: self.name.clone(),
                    rule: rule.name(),
                    node_kind: kind,
                    elapsed: started.elapsed(),
                    tried_before_fire: tried,
                    snapshot: config
                        .trace
                        .wants_snapshot()
                        .then(|| ctx.tree.decompile(root)),
                });
            }

            if stats.fired >= budget {
                debug!("Phase '{}' exhausted its budget", self.name);
                break StopReason::BudgetExhausted;
            }
            walker.restart(ctx.tree);
        };

        debug!(
            "Phase '{}' finished: {} firings, {} visits, {}",
            self.name, stats.fired, stats.visited, stats.stop
        );
        Ok(stats)
    }
}

impl fmt::Debug for RewritePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.registry.keys().copied().collect();
        kinds.sort();
        f.debug_struct("RewritePhase")
            .field("name", &self.name)
            .field("order", &self.order)
            .field("max_fire", &self.max_fire)
            .field("kinds", &kinds)
            .finish()
    }
}
