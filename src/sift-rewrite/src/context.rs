//! Per-run rewrite session.

use common_error::SiftResult;
use sift_core::Value;
use sift_expr::{ExprId, ExprTree, VarId, VarMap};

use crate::environment::Environment;

/// Everything a rule may touch while it runs.
///
/// A context is created at the start of every [`crate::RewriteEngine`] run
/// and dropped at its end, so nothing a rule leaves here can leak into the
/// rewrite of an unrelated query.
pub struct RewriteContext<'a> {
    /// The tree being rewritten.
    pub tree: &'a mut ExprTree,
    env: &'a mut dyn Environment,
    scratch: VarMap,
    counter: u64,
}

impl<'a> RewriteContext<'a> {
    /// Start a session over `tree`.
    pub fn new(tree: &'a mut ExprTree, env: &'a mut dyn Environment) -> Self {
        Self {
            tree,
            env,
            scratch: VarMap::new(),
            counter: 0,
        }
    }

    /// Next value of the per-run counter.
    pub fn next_counter(&mut self) -> u64 {
        let n = self.counter;
        self.counter += 1;
        n
    }

    /// Mint a variable named by the environment.
    pub fn fresh_var(&mut self, hint: &str) -> VarId {
        let n = self.next_counter();
        let name = self.env.fresh_var_name(hint, n);
        self.tree.fresh_var(name)
    }

    /// Evaluate the constant subtree rooted at `id`.
    pub fn eval_const(&mut self, id: ExprId) -> SiftResult<Value> {
        self.env.eval_const(self.tree, id)
    }

    /// Copy a subtree with fresh variables, after redirecting `renames`.
    ///
    /// Uses the session's scratch mapping, which is cleared first.
    pub fn clone_fresh(&mut self, root: ExprId, renames: &[(VarId, VarId)]) -> ExprId {
        self.scratch.clear();
        for (from, to) in renames {
            self.scratch.insert(*from, *to);
        }
        self.tree.clone_with_fresh_vars(root, &mut self.scratch)
    }
}
