//! Inlining of `Do` bindings.

use common_error::SiftResult;
use sift_expr::{ExprId, ExprKind, ExprOp, ExprTree};

use super::rule::RewriteRule;
use crate::context::RewriteContext;

/// Simplify `( $v = e, ..., result )` blocks.
///
/// One change per call, in this order:
///
/// 1. the first binding whose variable is never referenced is dropped
/// 2. the first binding whose value is a literal or a variable reference is
///    substituted into every reference and dropped
/// 3. a block holding only its result is replaced by the result
pub struct LetInline;

impl RewriteRule for LetInline {
    fn name(&self) -> &'static str {
        "LetInline"
    }

    fn description(&self) -> &'static str {
        "Drop unused bindings and inline trivial ones"
    }

    fn fire_on(&self) -> &'static [ExprKind] {
        &[ExprKind::Do]
    }

    fn rewrite(&self, ctx: &mut RewriteContext<'_>, node: ExprId) -> SiftResult<bool> {
        let tree = &mut *ctx.tree;
        let children: Vec<ExprId> = tree.children(node).collect();
        let Some((&result, stmts)) = children.split_last() else {
            return Ok(false);
        };

        if stmts.is_empty() {
            tree.replace_in_parent(node, result)?;
            return Ok(true);
        }

        let bindings: Vec<(usize, ExprId)> = stmts
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, stmt)| tree.kind(*stmt) == ExprKind::Binding)
            .collect();

        for &(pos, binding) in &bindings {
            if scope_uses(tree, &children[pos + 1..], binding).is_empty() {
                tree.detach(binding)?;
                return Ok(true);
            }
        }

        for &(pos, binding) in &bindings {
            let Some(value) = tree.child(binding, 0) else {
                continue;
            };
            let replacement = match tree.op(value) {
                ExprOp::Const(v) => ExprOp::Const(v.clone()),
                ExprOp::VarRef(v) => ExprOp::VarRef(*v),
                _ => continue,
            };
            for use_site in scope_uses(tree, &children[pos + 1..], binding) {
                let copy = tree.add(replacement.clone(), Vec::new())?;
                tree.replace_in_parent(use_site, copy)?;
            }
            tree.detach(binding)?;
            return Ok(true);
        }
        Ok(false)
    }
}

/// References to the variable of `binding` among the statements after it.
fn scope_uses(tree: &ExprTree, scope: &[ExprId], binding: ExprId) -> Vec<ExprId> {
    let Some(var) = tree.op(binding).bound_var() else {
        return Vec::new();
    };
    scope
        .iter()
        .flat_map(|stmt| tree.var_uses(*stmt, var))
        .collect()
}
