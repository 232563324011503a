//! Rewrite rule trait.

use common_error::SiftResult;
use sift_expr::{ExprId, ExprKind};

use crate::context::RewriteContext;

/// A local, pattern-triggered transformation of an expression tree.
///
/// One rule instance is shared by every phase it is registered in and by
/// every query the engine rewrites, so implementations hold no per-node or
/// per-tree state. Anything a rule needs across calls comes from the
/// [`RewriteContext`].
///
/// # Contract
///
/// `rewrite` returns `Ok(true)` if and only if it changed the tree, and in
/// that case leaves the tree structurally valid. Every firing should strictly
/// reduce some measure of remaining work so that phases reach a fixpoint
/// before exhausting their budget.
pub trait RewriteRule: Send + Sync {
    /// Get the name of this rule.
    fn name(&self) -> &'static str;

    /// Get a description of what this rule does.
    fn description(&self) -> &'static str {
        "No description available"
    }

    /// Kinds this rule is registered for. Abstract kinds match every descendant.
    fn fire_on(&self) -> &'static [ExprKind];

    /// Try to rewrite `node`, returning whether the tree changed.
    fn rewrite(&self, ctx: &mut RewriteContext<'_>, node: ExprId) -> SiftResult<bool>;
}
