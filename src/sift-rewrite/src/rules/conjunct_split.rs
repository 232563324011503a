//! Conjunct normalization for filters.

use common_error::SiftResult;
use sift_expr::{ExprId, ExprKind};

use super::rule::RewriteRule;
use crate::context::RewriteContext;

/// Split an `and` predicate of a filter into separate conjuncts.
///
/// `e -> filter each $x (a and b) and (c)` becomes
/// `e -> filter each $x (a) and (b) and (c)`. The operands take the place of
/// the `and` they came from. One `and` is split per call; nested ones are
/// reached on later visits.
pub struct ConjunctSplit;

impl RewriteRule for ConjunctSplit {
    fn name(&self) -> &'static str {
        "ConjunctSplit"
    }

    fn description(&self) -> &'static str {
        "Turn an and predicate of a filter into separate conjuncts"
    }

    fn fire_on(&self) -> &'static [ExprKind] {
        &[ExprKind::Filter]
    }

    fn rewrite(&self, ctx: &mut RewriteContext<'_>, node: ExprId) -> SiftResult<bool> {
        let tree = &mut *ctx.tree;
        let conjuncts: Vec<ExprId> = tree.children(node).skip(1).collect();
        let Some(split) = conjuncts
            .iter()
            .copied()
            .find(|c| tree.kind(*c) == ExprKind::And)
        else {
            return Ok(false);
        };

        for conjunct in &conjuncts {
            tree.detach(*conjunct)?;
        }
        for conjunct in conjuncts {
            if conjunct == split {
                for operand in tree.take_children(split).into_iter().flatten() {
                    tree.push_child(node, operand)?;
                }
            } else {
                tree.push_child(node, conjunct)?;
            }
        }
        Ok(true)
    }
}
