//! Rule-based rewriting of sift expression trees.
//!
//! The [`RewriteEngine`] runs an ordered pipeline of [`RewritePhase`]s. Each
//! phase walks the tree and offers every visited node to the rules
//! registered for its kind or one of its ancestor kinds; a rule that fires
//! mutates the tree in place and the phase starts its walk over. A phase
//! ends at a fixpoint or when its firing budget runs out.
//!
//! ```text
//! RewriteEngine
//!   └─ RewritePhase ("simplify", post-order, max_fire)
//!        ├─ TreeWalker
//!        └─ kind -> [RewriteRule]
//! ```
//!
//! Rules receive a [`RewriteContext`] giving them the tree, the
//! [`Environment`] (compile-time evaluation and variable naming) and per-run
//! scratch state.

mod context;
mod engine;
mod environment;
mod phase;
pub mod rules;
mod trace;
pub mod walker;

pub use context::RewriteContext;
pub use engine::{default_phases, RewriteEngine, RewriteReport, DEFAULT_MAX_FIRE};
pub use environment::{evaluate, DefaultEnvironment, Environment};
pub use phase::{PhaseStats, RewritePhase, StopReason};
pub use rules::RewriteRule;
pub use trace::{FireEvent, RewriteTrace};
pub use walker::{walker_for, TreeWalker};

use common_error::SiftResult;
use sift_expr::{ExprId, ExprTree};

/// Rewrite a query with the default engine and environment.
pub fn rewrite(tree: &mut ExprTree, root: ExprId) -> SiftResult<ExprId> {
    RewriteEngine::default().run(&mut DefaultEnvironment, tree, root)
}
