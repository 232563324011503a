//! Compile-time evaluation of constant operators.

use common_error::SiftResult;
use sift_expr::{ExprId, ExprKind};

use super::rule::RewriteRule;
use crate::context::RewriteContext;

/// Evaluate operators and constructors whose operands are all literals.
///
/// Evaluation goes through the session's environment; an evaluation error
/// (division by zero, adding a string to a number, ...) aborts the run as a
/// compile error.
pub struct ConstEval;

impl RewriteRule for ConstEval {
    fn name(&self) -> &'static str {
        "ConstEval"
    }

    fn description(&self) -> &'static str {
        "Evaluate operators over literal operands at compile time"
    }

    fn fire_on(&self) -> &'static [ExprKind] {
        &[ExprKind::Operator, ExprKind::Constructor]
    }

    fn rewrite(&self, ctx: &mut RewriteContext<'_>, node: ExprId) -> SiftResult<bool> {
        let tree = &*ctx.tree;
        let all_literal = tree
            .slots(node)
            .iter()
            .all(|slot| slot.is_some_and(|child| tree.kind(child) == ExprKind::Const));
        if !all_literal {
            return Ok(false);
        }

        let value = ctx.eval_const(node)?;
        let folded = ctx.tree.constant(value);
        ctx.tree.replace_in_parent(node, folded)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use sift_core::Value;
    use sift_expr::{ArithOp, CompareOp, ExprTree};

    use super::*;
    use crate::environment::DefaultEnvironment;

    #[test]
    fn test_fold_comparison() {
        let mut tree = ExprTree::new();
        let one = tree.constant(1);
        let two = tree.constant(2);
        let lt = tree.compare(CompareOp::Lt, one, two).unwrap();
        let root = tree.query(lt).unwrap();

        let mut env = DefaultEnvironment;
        let mut ctx = RewriteContext::new(&mut tree, &mut env);
        assert!(ConstEval.rewrite(&mut ctx, lt).unwrap());
        assert_eq!(tree.op(tree.child(root, 0).unwrap()).as_const(), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_non_literal_operand() {
        let mut tree = ExprTree::new();
        let x = tree.fresh_var("x");
        let one = tree.constant(1);
        let var = tree.var_ref(x);
        let sum = tree.arith(ArithOp::Add, one, var).unwrap();
        let _root = tree.query(sum).unwrap();

        let mut env = DefaultEnvironment;
        let mut ctx = RewriteContext::new(&mut tree, &mut env);
        assert!(!ConstEval.rewrite(&mut ctx, sum).unwrap());
    }

    #[test]
    fn test_evaluation_error_propagates() {
        let mut tree = ExprTree::new();
        let one = tree.constant(1);
        let zero = tree.constant(0);
        let div = tree.arith(ArithOp::Divide, one, zero).unwrap();
        let _root = tree.query(div).unwrap();

        let mut env = DefaultEnvironment;
        let mut ctx = RewriteContext::new(&mut tree, &mut env);
        let err = ConstEval.rewrite(&mut ctx, div).unwrap_err();
        assert!(!err.is_internal());
    }
}
