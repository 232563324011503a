//! Identity transform elimination.

use common_error::SiftResult;
use sift_expr::{ExprId, ExprKind};

use super::rule::RewriteRule;
use crate::context::RewriteContext;

/// Replace `e -> transform each $x $x` with `e`.
///
/// Only fires when `e` is known to be an array: a transform of `null` yields
/// `[]`, so dropping it would change the result.
pub struct TrivialTransformElimination;

impl RewriteRule for TrivialTransformElimination {
    fn name(&self) -> &'static str {
        "TrivialTransformElimination"
    }

    fn description(&self) -> &'static str {
        "Remove transforms that project each item to itself"
    }

    fn fire_on(&self) -> &'static [ExprKind] {
        &[ExprKind::Transform]
    }

    fn rewrite(&self, ctx: &mut RewriteContext<'_>, node: ExprId) -> SiftResult<bool> {
        let tree = &mut *ctx.tree;
        let (Some(var), Some(projection), Some(input)) = (
            tree.iteration_var(node),
            tree.child(node, 1),
            tree.iteration_input(node),
        ) else {
            return Ok(false);
        };
        if tree.op(projection).var_ref() != Some(var) || !tree.schema(input).is_array() {
            return Ok(false);
        }
        tree.replace_in_parent(node, input)?;
        Ok(true)
    }
}
