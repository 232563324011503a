//! Empty input elimination for iterations.

use common_error::SiftResult;
use sift_expr::{ExprId, ExprKind};

use super::rule::RewriteRule;
use crate::context::RewriteContext;

/// Replace an iteration over an input that is always `[]` with `[]`.
///
/// Relies on the input's schema, so it also catches inputs that only become
/// empty after other rewrites, such as a filter that was emptied below.
pub struct EmptyInputElimination;

impl RewriteRule for EmptyInputElimination {
    fn name(&self) -> &'static str {
        "EmptyInputElimination"
    }

    fn description(&self) -> &'static str {
        "Replace iterations over an always-empty input with []"
    }

    fn fire_on(&self) -> &'static [ExprKind] {
        &[ExprKind::Iteration]
    }

    fn rewrite(&self, ctx: &mut RewriteContext<'_>, node: ExprId) -> SiftResult<bool> {
        let tree = &mut *ctx.tree;
        let Some(input) = tree.iteration_input(node) else {
            return Ok(false);
        };
        if !tree.schema(input).is_always_empty() {
            return Ok(false);
        }
        let empty = tree.empty_array();
        tree.replace_in_parent(node, empty)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use sift_expr::ExprTree;

    use super::*;
    use crate::environment::DefaultEnvironment;

    #[test]
    fn test_transform_over_empty() {
        let mut tree = ExprTree::new();
        let x = tree.fresh_var("x");
        let none = tree.array(vec![]).unwrap();
        let input = tree.as_array(none).unwrap();
        let body = tree.call("expensive", vec![]).unwrap();
        let transform = tree.transform(x, input, body).unwrap();
        let root = tree.query(transform).unwrap();

        let mut env = DefaultEnvironment;
        let mut ctx = RewriteContext::new(&mut tree, &mut env);
        assert!(EmptyInputElimination.rewrite(&mut ctx, transform).unwrap());
        assert_eq!(tree.decompile(root), "[]");
    }

    #[test]
    fn test_unknown_input_is_kept() {
        let mut tree = ExprTree::new();
        let x = tree.fresh_var("x");
        let input = tree.call("read", vec![]).unwrap();
        let body = tree.var_ref(x);
        let transform = tree.transform(x, input, body).unwrap();
        let _root = tree.query(transform).unwrap();

        let mut env = DefaultEnvironment;
        let mut ctx = RewriteContext::new(&mut tree, &mut env);
        assert!(!EmptyInputElimination.rewrite(&mut ctx, transform).unwrap());
    }
}
