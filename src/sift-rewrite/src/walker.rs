//! Deterministic traversals over an expression tree.
//!
//! Walkers are lazy: each call to [`TreeWalker::next`] reads the tree as it is
//! now. A phase only keeps walking while nothing has changed, and after any
//! firing it calls [`TreeWalker::restart`] so that no stale position is ever
//! resumed.

use common_config::WalkOrder;
use sift_expr::{ExprId, ExprTree};

/// A restartable traversal.
pub trait TreeWalker {
    /// Begin a fresh traversal from `root`.
    fn reset(&mut self, tree: &ExprTree, root: ExprId);

    /// Begin again from the root given to the last [`TreeWalker::reset`].
    fn restart(&mut self, tree: &ExprTree);

    /// Advance to the next unvisited node.
    fn next(&mut self, tree: &ExprTree) -> Option<ExprId>;
}

/// Build the walker for a traversal order.
pub fn walker_for(order: WalkOrder) -> Box<dyn TreeWalker> {
    match order {
        WalkOrder::PreOrder => Box::<PreOrderWalker>::default(),
        WalkOrder::PostOrder => Box::<PostOrderWalker>::default(),
        WalkOrder::RootOnly => Box::<RootOnlyWalker>::default(),
    }
}

/// Visits parents before their children, children in slot order.
#[derive(Debug, Default)]
pub struct PreOrderWalker {
    root: Option<ExprId>,
    stack: Vec<ExprId>,
}

impl TreeWalker for PreOrderWalker {
    fn reset(&mut self, _tree: &ExprTree, root: ExprId) {
        self.root = Some(root);
        self.stack.clear();
        self.stack.push(root);
    }

    fn restart(&mut self, tree: &ExprTree) {
        if let Some(root) = self.root {
            self.reset(tree, root);
        }
    }

    fn next(&mut self, tree: &ExprTree) -> Option<ExprId> {
        let id = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(tree.children(id));
        self.stack[start..].reverse();
        Some(id)
    }
}

/// Visits children before their parents, children in slot order.
///
/// This is the default order for rule phases: by the time a node is offered
/// to the rules, its subtrees have already been simplified.
#[derive(Debug, Default)]
pub struct PostOrderWalker {
    root: Option<ExprId>,
    // (node, children already pushed)
    stack: Vec<(ExprId, bool)>,
}

impl TreeWalker for PostOrderWalker {
    fn reset(&mut self, _tree: &ExprTree, root: ExprId) {
        self.root = Some(root);
        self.stack.clear();
        self.stack.push((root, false));
    }

    fn restart(&mut self, tree: &ExprTree) {
        if let Some(root) = self.root {
            self.reset(tree, root);
        }
    }

    fn next(&mut self, tree: &ExprTree) -> Option<ExprId> {
        while let Some((id, expanded)) = self.stack.pop() {
            if expanded {
                return Some(id);
            }
            self.stack.push((id, true));
            let start = self.stack.len();
            self.stack
                .extend(tree.children(id).map(|child| (child, false)));
            self.stack[start..].reverse();
        }
        None
    }
}

/// Yields only the root, for phases whose rules look at the whole query.
#[derive(Debug, Default)]
pub struct RootOnlyWalker {
    root: Option<ExprId>,
    done: bool,
}

impl TreeWalker for RootOnlyWalker {
    fn reset(&mut self, _tree: &ExprTree, root: ExprId) {
        self.root = Some(root);
        self.done = false;
    }

    fn restart(&mut self, _tree: &ExprTree) {
        self.done = false;
    }

    fn next(&mut self, _tree: &ExprTree) -> Option<ExprId> {
        if self.done {
            return None;
        }
        self.done = true;
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (ExprTree, Vec<ExprId>) {
        // [[1, 2], 3]
        let mut tree = ExprTree::new();
        let one = tree.constant(1);
        let two = tree.constant(2);
        let inner = tree.array(vec![one, two]).unwrap();
        let three = tree.constant(3);
        let outer = tree.array(vec![inner, three]).unwrap();
        (tree, vec![outer, inner, one, two, three])
    }

    fn drain(walker: &mut dyn TreeWalker, tree: &ExprTree) -> Vec<ExprId> {
        std::iter::from_fn(|| walker.next(tree)).collect()
    }

    #[test]
    fn test_pre_order() {
        let (tree, ids) = sample();
        let mut walker = PreOrderWalker::default();
        walker.reset(&tree, ids[0]);
        assert_eq!(drain(&mut walker, &tree), ids);
    }

    #[test]
    fn test_post_order() {
        let (tree, ids) = sample();
        let (outer, inner, one, two, three) = (ids[0], ids[1], ids[2], ids[3], ids[4]);
        let mut walker = PostOrderWalker::default();
        walker.reset(&tree, outer);
        assert_eq!(
            drain(&mut walker, &tree),
            vec![one, two, inner, three, outer]
        );
    }

    #[test]
    fn test_restart_sees_mutation() {
        let (mut tree, ids) = sample();
        let root = tree.query(ids[0]).unwrap();
        let mut walker = walker_for(WalkOrder::PreOrder);
        walker.reset(&tree, root);
        assert_eq!(walker.next(&tree), Some(root));

        let replacement = tree.constant(0);
        tree.replace_in_parent(ids[1], replacement).unwrap();
        walker.restart(&tree);
        assert_eq!(
            drain(walker.as_mut(), &tree),
            vec![root, ids[0], replacement, ids[4]]
        );
    }

    #[test]
    fn test_root_only() {
        let (tree, ids) = sample();
        let mut walker = walker_for(WalkOrder::RootOnly);
        walker.reset(&tree, ids[0]);
        assert_eq!(drain(walker.as_mut(), &tree), vec![ids[0]]);
        walker.restart(&tree);
        assert_eq!(walker.next(&tree), Some(ids[0]));
    }
}
