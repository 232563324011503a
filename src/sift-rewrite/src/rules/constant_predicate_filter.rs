//! Constant predicate simplification for filters.

use common_error::{internal_err, SiftResult};
use sift_core::Value;
use sift_expr::{ExprId, ExprKind, ExprTree};

use super::rule::RewriteRule;
use crate::context::RewriteContext;

/// Simplify filters whose conjuncts include literals.
///
/// - a `false` or `null` conjunct makes the whole filter (input included)
///   the empty array
/// - a `true` conjunct is removed
/// - a filter whose last conjunct is removed becomes its input
///
/// Fires at most once per call.
pub struct ConstantPredicateFilter;

fn literal(tree: &ExprTree, id: ExprId) -> Option<&Value> {
    tree.op(id).as_const()
}

impl RewriteRule for ConstantPredicateFilter {
    fn name(&self) -> &'static str {
        "ConstantPredicateFilter"
    }

    fn description(&self) -> &'static str {
        "Remove true conjuncts and empty filters with false or null conjuncts"
    }

    fn fire_on(&self) -> &'static [ExprKind] {
        &[ExprKind::Filter]
    }

    fn rewrite(&self, ctx: &mut RewriteContext<'_>, node: ExprId) -> SiftResult<bool> {
        let tree = &mut *ctx.tree;
        let conjuncts: Vec<ExprId> = tree.children(node).skip(1).collect();

        let never = conjuncts.iter().any(|c| {
            literal(tree, *c).is_some_and(|value| value.is_false() || value.is_null())
        });
        if never {
            let empty = tree.empty_array();
            tree.replace_in_parent(node, empty)?;
            return Ok(true);
        }

        let Some(satisfied) = conjuncts
            .iter()
            .copied()
            .find(|c| literal(tree, *c).is_some_and(Value::is_true))
        else {
            return Ok(false);
        };

        tree.detach(satisfied)?;
        if conjuncts.len() == 1 {
            let Some(input) = tree.iteration_input(node) else {
                internal_err!("filter {} has no input", node);
            };
            tree.replace_in_parent(node, input)?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::DefaultEnvironment;

    fn fire(tree: &mut ExprTree, node: ExprId) -> bool {
        let mut env = DefaultEnvironment;
        let mut ctx = RewriteContext::new(tree, &mut env);
        ConstantPredicateFilter.rewrite(&mut ctx, node).unwrap()
    }

    #[test]
    fn test_no_literal_conjunct() {
        let mut tree = ExprTree::new();
        let x = tree.fresh_var("x");
        let input = tree.call("read", vec![]).unwrap();
        let pred = tree.var_ref(x);
        let filter = tree.filter(x, input, vec![pred]).unwrap();
        let _root = tree.query(filter).unwrap();
        assert!(!fire(&mut tree, filter));
    }

    #[test]
    fn test_null_conjunct_empties() {
        let mut tree = ExprTree::new();
        let x = tree.fresh_var("x");
        let input = tree.call("read", vec![]).unwrap();
        let pred = tree.constant(Value::Null);
        let filter = tree.filter(x, input, vec![pred]).unwrap();
        let root = tree.query(filter).unwrap();
        assert!(fire(&mut tree, filter));
        assert_eq!(tree.decompile(root), "[]");
        tree.validate(root).unwrap();
    }

    #[test]
    fn test_removes_only_first_true() {
        let mut tree = ExprTree::new();
        let x = tree.fresh_var("x");
        let input = tree.call("read", vec![]).unwrap();
        let t1 = tree.constant(true);
        let t2 = tree.constant(true);
        let filter = tree.filter(x, input, vec![t1, t2]).unwrap();
        let root = tree.query(filter).unwrap();
        assert!(fire(&mut tree, filter));
        assert_eq!(tree.decompile(root), "read() -> filter each $x (true)");
        assert_eq!(tree.parent(t1), None);
        tree.validate(root).unwrap();
    }
}
