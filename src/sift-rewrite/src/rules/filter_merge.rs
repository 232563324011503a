//! Merge stacked filters.

use common_error::SiftResult;
use sift_expr::{ExprId, ExprKind};

use super::rule::RewriteRule;
use crate::context::RewriteContext;

/// Fuse a filter whose input is another filter.
///
/// `(e -> filter each $x p) -> filter each $y q` becomes
/// `e -> filter each $x p and q[$y := $x]`. The inner conjuncts keep their
/// position ahead of the outer ones.
pub struct FilterMerge;

impl RewriteRule for FilterMerge {
    fn name(&self) -> &'static str {
        "FilterMerge"
    }

    fn description(&self) -> &'static str {
        "Merge a filter over a filter into a single filter"
    }

    fn fire_on(&self) -> &'static [ExprKind] {
        &[ExprKind::Filter]
    }

    fn rewrite(&self, ctx: &mut RewriteContext<'_>, node: ExprId) -> SiftResult<bool> {
        let tree = &mut *ctx.tree;
        let Some(inner) = tree.iteration_input(node) else {
            return Ok(false);
        };
        if tree.kind(inner) != ExprKind::Filter {
            return Ok(false);
        }
        let (Some(outer_var), Some(inner_var)) = (tree.iteration_var(node), tree.iteration_var(inner))
        else {
            return Ok(false);
        };

        let conjuncts: Vec<ExprId> = tree.children(node).skip(1).collect();
        for conjunct in conjuncts {
            tree.detach(conjunct)?;
            tree.replace_var(conjunct, outer_var, inner_var);
            tree.push_child(inner, conjunct)?;
        }
        tree.replace_in_parent(node, inner)?;
        Ok(true)
    }
}
