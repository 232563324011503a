//! The rewrite engine: an ordered pipeline of phases.
//!
//! The engine is built once and reused for every query of a session. Each
//! call to [`RewriteEngine::run`] opens a fresh [`RewriteContext`], so no
//! scratch state survives from one query to the next.

use std::sync::Arc;

use common_config::RewriteConfig;
use common_error::{ensure, SiftError, SiftResult};
use log::debug;
use sift_expr::{ExprId, ExprTree};

use crate::context::RewriteContext;
use crate::environment::Environment;
use crate::phase::{PhaseStats, RewritePhase};
use crate::rules::{
    ConjunctSplit, ConstEval, ConstantPredicateFilter, EmptyInputElimination, FilterMerge,
    InjectAggregate, LetInline, RewriteRule, TrivialTransformElimination,
};
use crate::trace::RewriteTrace;

/// Firing budget of the default phases.
pub const DEFAULT_MAX_FIRE: i64 = 10_000;

/// Result of an engine run with its diagnostics.
#[derive(Debug, Clone)]
pub struct RewriteReport {
    /// Root of the rewritten tree.
    pub root: ExprId,
    /// One entry per phase, in pipeline order. Empty when rewriting is disabled.
    pub phases: Vec<PhaseStats>,
    /// Firing events, when tracing is enabled.
    pub trace: RewriteTrace,
}

impl RewriteReport {
    /// Total number of firings across all phases.
    pub fn total_fired(&self) -> usize {
        self.phases.iter().map(|p| p.fired).sum()
    }

    /// Stats of the first phase called `name`.
    pub fn phase(&self, name: &str) -> Option<&PhaseStats> {
        self.phases.iter().find(|p| p.name == name)
    }

    /// Format the phase summary and the firing trace.
    pub fn format_trace(&self) -> String {
        let mut output = String::from("=== Rewrite Trace ===\n");
        for (i, stats) in self.phases.iter().enumerate() {
            output.push_str(&format!(
                "Phase {} '{}': {} fired, {} visited, {}\n",
                i, stats.name, stats.fired, stats.visited, stats.stop
            ));
        }
        output.push_str(&self.trace.format());
        output
    }
}

/// Runs a pipeline of [`RewritePhase`]s over an expression tree.
///
/// # Stable root
///
/// Any node may be replaced by a firing, including the root handed to
/// [`RewriteEngine::run`]. For the duration of a run the engine hangs the
/// query under a `Query` holder node that no rule replaces, and reads the new
/// root back from it at the end.
///
/// # Failures
///
/// An error from a rule aborts the whole run. The tree keeps the changes
/// made so far; there is no rollback.
#[derive(Debug)]
pub struct RewriteEngine {
    phases: Vec<RewritePhase>,
    config: RewriteConfig,
}

impl RewriteEngine {
    /// Create an engine with no phases.
    pub fn new() -> Self {
        Self {
            phases: Vec::new(),
            config: RewriteConfig::default(),
        }
    }

    /// Create the default pipeline with a custom config.
    pub fn with_config(config: RewriteConfig) -> Self {
        Self {
            phases: default_phases(),
            config,
        }
    }

    /// Append a phase to the pipeline.
    pub fn add_phase(&mut self, phase: RewritePhase) {
        self.phases.push(phase);
    }

    /// Append a phase to the pipeline.
    pub fn with_phase(mut self, phase: RewritePhase) -> Self {
        self.add_phase(phase);
        self
    }

    /// Replace the config.
    pub fn set_config(&mut self, config: RewriteConfig) {
        self.config = config;
    }

    /// Get the phases in pipeline order.
    pub fn phases(&self) -> &[RewritePhase] {
        &self.phases
    }

    /// Get the config.
    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    /// Rewrite the query rooted at `root` and return its new root.
    pub fn run(
        &self,
        env: &mut dyn Environment,
        tree: &mut ExprTree,
        root: ExprId,
    ) -> SiftResult<ExprId> {
        Ok(self.run_with_report(env, tree, root)?.root)
    }

    /// Rewrite the query rooted at `root`, reporting what each phase did.
    ///
    /// `root` must not have a parent.
    pub fn run_with_report(
        &self,
        env: &mut dyn Environment,
        tree: &mut ExprTree,
        root: ExprId,
    ) -> SiftResult<RewriteReport> {
        ensure!(tree.contains(root), InvalidParameter: "unknown root {}", root);
        ensure!(
            tree.parent(root).is_none(),
            InvalidParameter: "root {} ({}) is attached to {:?}", root, tree.kind(root), tree.parent(root)
        );

        let mut report = RewriteReport {
            root,
            phases: Vec::new(),
            trace: RewriteTrace::new(),
        };
        if !self.config.enabled {
            debug!("Rewriting disabled, returning the input tree");
            return Ok(report);
        }

        let holder = tree.query(root)?;
        let outcome = self.run_phases(env, tree, holder, &mut report);
        let new_root = unwrap_holder(tree, holder);
        outcome?;
        report.root = new_root?;

        debug!(
            "Rewrite finished: {} firings in {} phases",
            report.total_fired(),
            report.phases.len()
        );
        Ok(report)
    }

    fn run_phases(
        &self,
        env: &mut dyn Environment,
        tree: &mut ExprTree,
        holder: ExprId,
        report: &mut RewriteReport,
    ) -> SiftResult<()> {
        let mut ctx = RewriteContext::new(tree, env);
        for (index, phase) in self.phases.iter().enumerate() {
            let stats = phase.run(index, &mut ctx, holder, &self.config, &mut report.trace)?;
            report.phases.push(stats);
        }
        Ok(())
    }
}

impl Default for RewriteEngine {
    fn default() -> Self {
        Self::with_config(RewriteConfig::default())
    }
}

fn unwrap_holder(tree: &mut ExprTree, holder: ExprId) -> SiftResult<ExprId> {
    let root = tree.child(holder, 0);
    tree.take_children(holder);
    root.ok_or_else(|| SiftError::internal("a rule removed the query root"))
}

/// The standard pipeline: simplify, evaluate constants, inject aggregates,
/// then simplify again.
pub fn default_phases() -> Vec<RewritePhase> {
    let simplify: Vec<Arc<dyn RewriteRule>> = vec![
        Arc::new(LetInline),
        Arc::new(TrivialTransformElimination),
        Arc::new(ConjunctSplit),
        Arc::new(ConstantPredicateFilter),
        Arc::new(FilterMerge),
        Arc::new(EmptyInputElimination),
    ];
    vec![
        RewritePhase::new("simplify", DEFAULT_MAX_FIRE).with_rules(simplify.iter().cloned()),
        RewritePhase::new("const-eval", DEFAULT_MAX_FIRE).with_rule(Arc::new(ConstEval)),
        RewritePhase::new("aggregate", DEFAULT_MAX_FIRE).with_rule(Arc::new(InjectAggregate)),
        RewritePhase::new("cleanup", DEFAULT_MAX_FIRE).with_rules(simplify),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::DefaultEnvironment;

    #[test]
    fn test_default_pipeline_shape() {
        let engine = RewriteEngine::default();
        let names: Vec<_> = engine.phases().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["simplify", "const-eval", "aggregate", "cleanup"]);
        assert!(engine.phases().iter().all(|p| p.max_fire() == DEFAULT_MAX_FIRE));
    }

    #[test]
    fn test_disabled_engine_returns_input() {
        let mut tree = ExprTree::new();
        let true_ = tree.constant(true);
        let not = tree.not(true_).unwrap();
        let engine = RewriteEngine::with_config(RewriteConfig::disabled());
        let mut env = DefaultEnvironment;

        let report = engine.run_with_report(&mut env, &mut tree, not).unwrap();
        assert_eq!(report.root, not);
        assert!(report.phases.is_empty());
        assert_eq!(tree.decompile(not), "not true");
    }

    #[test]
    fn test_root_replacement() {
        let mut tree = ExprTree::new();
        let true_ = tree.constant(true);
        let not = tree.not(true_).unwrap();
        let mut env = DefaultEnvironment;

        let root = RewriteEngine::default().run(&mut env, &mut tree, not).unwrap();
        assert_ne!(root, not);
        assert_eq!(tree.decompile(root), "false");
        assert_eq!(tree.parent(root), None);
    }

    #[test]
    fn test_attached_root_is_rejected() {
        let mut tree = ExprTree::new();
        let one = tree.constant(1);
        let _holder = tree.query(one).unwrap();
        let mut env = DefaultEnvironment;

        let err = RewriteEngine::default().run(&mut env, &mut tree, one).unwrap_err();
        assert!(!err.is_internal());
    }
}
