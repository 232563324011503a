//! Arena-backed expression tree.
//!
//! Nodes live in a single `Vec` owned by [`ExprTree`] and are addressed by
//! [`ExprId`] handles. Each node stores its children as handles together with
//! a back-reference to its parent and the slot it occupies there. All parent
//! and slot bookkeeping is done by the mutation methods on this type; nothing
//! else writes those fields.
//!
//! Removed subtrees are not reclaimed. They stay in the arena as unreachable
//! garbage until the tree is dropped, which keeps every handle stable for the
//! duration of a rewrite run.

use std::cell::OnceCell;
use std::collections::HashSet;
use std::fmt;

use common_error::{ensure, internal_err, SiftResult};
use sift_core::Schema;

use crate::kind::ExprKind;
use crate::op::ExprOp;
use crate::var::{VarId, VarMap, VarTable};

/// Handle to a node in an [`ExprTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    /// Get the arena index of this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct ExprNode {
    op: ExprOp,
    children: Vec<Option<ExprId>>,
    parent: Option<ExprId>,
    slot: usize,
    schema: OnceCell<Schema>,
}

/// A mutable expression tree.
///
/// Methods taking an [`ExprId`] panic if the handle was not produced by this
/// tree.
#[derive(Debug, Clone, Default)]
pub struct ExprTree {
    nodes: Vec<ExprNode>,
    vars: VarTable,
}

/// Present children of a node, in slot order.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    slots: std::slice::Iter<'a, Option<ExprId>>,
}

impl Iterator for Children<'_> {
    type Item = ExprId;

    fn next(&mut self) -> Option<ExprId> {
        self.slots.find_map(|slot| *slot)
    }
}

impl ExprTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes ever allocated, including detached ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no node was allocated.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if `id` belongs to this tree.
    pub fn contains(&self, id: ExprId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Get the variable table.
    pub fn vars(&self) -> &VarTable {
        &self.vars
    }

    /// Mint a new variable.
    pub fn fresh_var(&mut self, name: impl Into<String>) -> VarId {
        self.vars.fresh(name)
    }

    fn node(&self, id: ExprId) -> &ExprNode {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: ExprId) -> &mut ExprNode {
        &mut self.nodes[id.index()]
    }

    // ---------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------

    /// Add a node whose slots are all present.
    ///
    /// Every child must be detached (have no parent) and appear only once.
    pub fn add(&mut self, op: ExprOp, children: Vec<ExprId>) -> SiftResult<ExprId> {
        self.add_slots(op, children.into_iter().map(Some).collect())
    }

    /// Add a node with possibly absent slots.
    pub fn add_slots(&mut self, op: ExprOp, slots: Vec<Option<ExprId>>) -> SiftResult<ExprId> {
        let arity = op.arity();
        ensure!(
            arity.accepts(slots.len()),
            InternalError: "{} cannot have {} child slots ({:?})",
            op.kind(),
            slots.len(),
            arity
        );
        for (i, slot) in slots.iter().enumerate() {
            match slot {
                Some(child) => {
                    ensure!(self.contains(*child), InternalError: "unknown node {}", child);
                    ensure!(
                        self.parent(*child).is_none(),
                        InternalError: "{} ({}) is already attached", child, self.kind(*child)
                    );
                    ensure!(
                        !slots[..i].contains(slot),
                        InternalError: "{} appears twice among the children of {}", child, op.kind()
                    );
                }
                None => ensure!(
                    arity.is_optional_slot(i),
                    InternalError: "slot {} of {} is required", i, op.kind()
                ),
            }
        }
        Ok(self.alloc(op, slots))
    }

    pub(crate) fn alloc(&mut self, op: ExprOp, slots: Vec<Option<ExprId>>) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        for (i, child) in slots.iter().enumerate() {
            if let Some(child) = child {
                let node = self.node_mut(*child);
                node.parent = Some(id);
                node.slot = i;
            }
        }
        self.nodes.push(ExprNode {
            op,
            children: slots,
            parent: None,
            slot: 0,
            schema: OnceCell::new(),
        });
        id
    }

    // ---------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------

    /// Get the payload of a node.
    pub fn op(&self, id: ExprId) -> &ExprOp {
        &self.node(id).op
    }

    /// Get the concrete kind of a node.
    pub fn kind(&self, id: ExprId) -> ExprKind {
        self.node(id).op.kind()
    }

    /// Get the parent of a node, if attached.
    pub fn parent(&self, id: ExprId) -> Option<ExprId> {
        self.node(id).parent
    }

    /// Get the slot a node occupies in its parent.
    pub fn slot(&self, id: ExprId) -> usize {
        self.node(id).slot
    }

    /// Get all child slots of a node, including absent ones.
    pub fn slots(&self, id: ExprId) -> &[Option<ExprId>] {
        &self.node(id).children
    }

    /// Get the child in `slot`, if present.
    pub fn child(&self, id: ExprId, slot: usize) -> Option<ExprId> {
        self.node(id).children.get(slot).copied().flatten()
    }

    /// Iterate over the present children of a node, in slot order.
    ///
    /// The iterator is lazy and cheap to clone; call again to restart.
    pub fn children(&self, id: ExprId) -> Children<'_> {
        Children {
            slots: self.node(id).children.iter(),
        }
    }

    /// Get the last present child of a node.
    pub fn last_child(&self, id: ExprId) -> Option<ExprId> {
        self.node(id).children.iter().rev().find_map(|slot| *slot)
    }

    /// Returns true if `ancestor` is `id` or lies on the path from `id` to its root.
    pub fn is_ancestor(&self, ancestor: ExprId, id: ExprId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Iterate from `id` up to its root, starting with `id` itself.
    pub fn ancestors(&self, id: ExprId) -> impl Iterator<Item = ExprId> + '_ {
        let limit = self.nodes.len();
        std::iter::successors(Some(id), move |cur| self.parent(*cur)).take(limit)
    }

    /// Get the topmost ancestor of a node.
    pub fn root_of(&self, id: ExprId) -> ExprId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Collect the subtree rooted at `root` in pre-order.
    pub fn subtree(&self, root: ExprId) -> Vec<ExprId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if out.len() > self.nodes.len() {
                break;
            }
            out.push(id);
            let start = stack.len();
            stack.extend(self.children(id));
            stack[start..].reverse();
        }
        out
    }

    /// The input expression of an iteration (the value of its slot 0 binding).
    pub fn iteration_input(&self, id: ExprId) -> Option<ExprId> {
        if !self.op(id).has_input_binding() {
            return None;
        }
        self.child(id, 0).and_then(|binding| self.child(binding, 0))
    }

    /// The per-item variable of an iteration.
    pub fn iteration_var(&self, id: ExprId) -> Option<VarId> {
        if !self.op(id).has_input_binding() {
            return None;
        }
        self.child(id, 0).and_then(|binding| self.op(binding).bound_var())
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Replace the payload of a node, keeping its children.
    pub fn set_op(&mut self, id: ExprId, op: ExprOp) -> SiftResult<()> {
        ensure!(
            op.arity().accepts(self.slots(id).len()),
            InternalError: "{} cannot take over the {} slots of {}",
            op.kind(),
            self.slots(id).len(),
            self.kind(id)
        );
        self.node_mut(id).op = op;
        self.invalidate(id);
        Ok(())
    }

    /// Splice `replacement` into the slot currently held by `target`.
    ///
    /// `target` becomes a detached subtree. If `replacement` is attached
    /// elsewhere (typically inside `target`), it is moved and its old slot is
    /// left absent; the caller is expected to discard or refill that parent.
    pub fn replace_in_parent(&mut self, target: ExprId, replacement: ExprId) -> SiftResult<()> {
        ensure!(target != replacement, InternalError: "cannot replace {} with itself", target);
        let Some(parent) = self.parent(target) else {
            internal_err!(
                "{} ({}) has no parent; wrap the tree in a Query node",
                target,
                self.kind(target)
            );
        };
        ensure!(
            !self.is_ancestor(replacement, parent),
            InternalError: "replacing {} with its ancestor {} would create a cycle", target, replacement
        );

        let slot = self.slot(target);
        if self.parent(replacement).is_some() {
            self.unlink(replacement);
        }
        self.node_mut(parent).children[slot] = Some(replacement);
        let node = self.node_mut(replacement);
        node.parent = Some(parent);
        node.slot = slot;
        let node = self.node_mut(target);
        node.parent = None;
        node.slot = 0;
        self.invalidate(parent);
        Ok(())
    }

    /// Remove a node from its parent.
    ///
    /// On a variadic parent the slot is removed and later siblings shift down.
    /// On an optional slot the slot is left absent. Required slots cannot be
    /// detached; use [`ExprTree::replace_in_parent`] instead. A parent left
    /// with too few children is the caller's to fix.
    pub fn detach(&mut self, id: ExprId) -> SiftResult<()> {
        let Some(parent) = self.parent(id) else {
            internal_err!("{} ({}) is not attached", id, self.kind(id));
        };
        let slot = self.slot(id);
        let arity = self.op(parent).arity();
        if arity.is_variadic() {
            self.node_mut(parent).children.remove(slot);
            self.renumber(parent, slot);
        } else if arity.is_optional_slot(slot) {
            self.node_mut(parent).children[slot] = None;
        } else {
            internal_err!(
                "cannot detach required slot {} of {}; use replace_in_parent",
                slot,
                self.kind(parent)
            );
        }
        let node = self.node_mut(id);
        node.parent = None;
        node.slot = 0;
        self.invalidate(parent);
        Ok(())
    }

    /// Put a detached node (or nothing) into an existing slot.
    ///
    /// Returns the previous occupant, now detached.
    pub fn set_child(
        &mut self,
        parent: ExprId,
        slot: usize,
        child: Option<ExprId>,
    ) -> SiftResult<Option<ExprId>> {
        let len = self.slots(parent).len();
        ensure!(
            slot < len,
            InternalError: "{} has no slot {} (only {})", self.kind(parent), slot, len
        );
        match child {
            Some(child) => self.check_attachable(parent, child)?,
            None => ensure!(
                self.op(parent).arity().is_optional_slot(slot),
                InternalError: "slot {} of {} is required", slot, self.kind(parent)
            ),
        }

        let previous = self.node(parent).children[slot];
        if let Some(previous) = previous {
            let node = self.node_mut(previous);
            node.parent = None;
            node.slot = 0;
        }
        self.node_mut(parent).children[slot] = child;
        if let Some(child) = child {
            let node = self.node_mut(child);
            node.parent = Some(parent);
            node.slot = slot;
        }
        self.invalidate(parent);
        Ok(previous)
    }

    /// Append a detached node to a variadic parent, returning its slot.
    pub fn push_child(&mut self, parent: ExprId, child: ExprId) -> SiftResult<usize> {
        ensure!(
            self.op(parent).arity().is_variadic(),
            InternalError: "{} has a fixed number of children", self.kind(parent)
        );
        self.check_attachable(parent, child)?;
        let slot = self.slots(parent).len();
        self.node_mut(parent).children.push(Some(child));
        let node = self.node_mut(child);
        node.parent = Some(parent);
        node.slot = slot;
        self.invalidate(parent);
        Ok(slot)
    }

    /// Detach every child of a node and return them in slot order.
    ///
    /// The node is left with no slots, which its kind does not accept, so it
    /// must be replaced or discarded before the tree is validated.
    pub fn take_children(&mut self, id: ExprId) -> Vec<Option<ExprId>> {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in children.iter().flatten() {
            let node = self.node_mut(*child);
            node.parent = None;
            node.slot = 0;
        }
        self.invalidate(id);
        children
    }

    fn check_attachable(&self, parent: ExprId, child: ExprId) -> SiftResult<()> {
        ensure!(self.contains(child), InternalError: "unknown node {}", child);
        ensure!(
            self.parent(child).is_none(),
            InternalError: "{} ({}) is already attached", child, self.kind(child)
        );
        ensure!(
            !self.is_ancestor(child, parent),
            InternalError: "attaching {} under its descendant {} would create a cycle", child, parent
        );
        Ok(())
    }

    fn unlink(&mut self, id: ExprId) {
        if let Some(parent) = self.parent(id) {
            let slot = self.slot(id);
            self.node_mut(parent).children[slot] = None;
            let node = self.node_mut(id);
            node.parent = None;
            node.slot = 0;
            self.invalidate(parent);
        }
    }

    fn renumber(&mut self, parent: ExprId, from: usize) {
        let shifted: Vec<(usize, ExprId)> = self.node(parent).children[from..]
            .iter()
            .enumerate()
            .filter_map(|(i, child)| child.map(|c| (from + i, c)))
            .collect();
        for (slot, child) in shifted {
            self.node_mut(child).slot = slot;
        }
    }

    fn invalidate(&mut self, from: ExprId) {
        let path: Vec<ExprId> = self.ancestors(from).collect();
        for id in path {
            self.node_mut(id).schema.take();
        }
    }

    // ---------------------------------------------------------------
    // Variables
    // ---------------------------------------------------------------

    /// Find every reference to `var` in the subtree rooted at `root`.
    pub fn var_uses(&self, root: ExprId, var: VarId) -> Vec<ExprId> {
        self.subtree(root)
            .into_iter()
            .filter(|id| self.op(*id).var_ref() == Some(var))
            .collect()
    }

    /// Count references to `var` in the subtree rooted at `root`.
    pub fn count_var_uses(&self, root: ExprId, var: VarId) -> usize {
        self.var_uses(root, var).len()
    }

    /// Rename every reference to `old` under `root` into `new`.
    ///
    /// Binders are left alone. Returns the number of references renamed.
    pub fn replace_var(&mut self, root: ExprId, old: VarId, new: VarId) -> usize {
        let uses = self.var_uses(root, old);
        for id in &uses {
            self.node_mut(*id).op = ExprOp::VarRef(new);
            self.invalidate(*id);
        }
        uses.len()
    }

    /// Variables introduced by binders in the subtree, in pre-order.
    pub fn bound_vars(&self, root: ExprId) -> Vec<VarId> {
        self.subtree(root)
            .into_iter()
            .filter_map(|id| self.op(id).bound_var())
            .collect()
    }

    /// Variables referenced in the subtree but not bound inside it.
    pub fn free_vars(&self, root: ExprId) -> HashSet<VarId> {
        let bound: HashSet<VarId> = self.bound_vars(root).into_iter().collect();
        self.subtree(root)
            .into_iter()
            .filter_map(|id| self.op(id).var_ref())
            .filter(|var| !bound.contains(var))
            .collect()
    }

    /// Deep-copy a subtree, giving every variable bound inside it a fresh variable.
    ///
    /// Entries already in `map` are honoured: a pre-mapped binder keeps its
    /// target, and pre-mapped free variables are redirected. The returned
    /// copy is detached.
    pub fn clone_with_fresh_vars(&mut self, root: ExprId, map: &mut VarMap) -> ExprId {
        for var in self.bound_vars(root) {
            if !map.contains(var) {
                let name = self.vars.name(var).to_string();
                let fresh = self.vars.fresh(name);
                map.insert(var, fresh);
            }
        }
        self.copy_subtree(root, map)
    }

    fn copy_subtree(&mut self, id: ExprId, map: &VarMap) -> ExprId {
        let op = self.op(id).remap_vars(|var| map.resolve(var));
        let slots = self.slots(id).to_vec();
        let copied = slots
            .into_iter()
            .map(|slot| slot.map(|child| self.copy_subtree(child, map)))
            .collect();
        self.alloc(op, copied)
    }

    // ---------------------------------------------------------------
    // Schema
    // ---------------------------------------------------------------

    /// Get the schema of a node, computing and caching it on first use.
    pub fn schema(&self, id: ExprId) -> Schema {
        self.node(id)
            .schema
            .get_or_init(|| self.infer_schema(id))
            .clone()
    }

    fn child_schema(&self, id: ExprId, slot: usize) -> Schema {
        self.child(id, slot)
            .map_or(Schema::Any, |child| self.schema(child))
    }

    fn infer_schema(&self, id: ExprId) -> Schema {
        match self.op(id) {
            ExprOp::Const(value) => Schema::of_value(value),
            ExprOp::Query | ExprOp::Binding(_) => self.child_schema(id, 0),
            ExprOp::Do => self
                .last_child(id)
                .map_or(Schema::Any, |result| self.schema(result)),
            ExprOp::Filter | ExprOp::Transform | ExprOp::For => {
                let input = self
                    .iteration_input(id)
                    .map_or(Schema::Any, |input| self.schema(input));
                if input.is_always_empty() {
                    Schema::EmptyArray
                } else {
                    match self.op(id) {
                        ExprOp::Filter if input.is_array() => input,
                        ExprOp::Transform => Schema::Array(Box::new(self.child_schema(id, 1))),
                        _ => Schema::any_array(),
                    }
                }
            }
            ExprOp::GroupBy { .. } | ExprOp::GroupAggregate => {
                let input = self
                    .iteration_input(id)
                    .map_or(Schema::Any, |input| self.schema(input));
                if input.is_always_empty() {
                    Schema::EmptyArray
                } else {
                    Schema::any_array()
                }
            }
            ExprOp::Accumulate(func) | ExprOp::Aggregate(func) => func.result_schema(),
            ExprOp::And | ExprOp::Or | ExprOp::Not | ExprOp::Compare(_) => Schema::Boolean,
            ExprOp::Arith(_) => Schema::Number,
            ExprOp::If => {
                let else_branch = match self.child(id, 2) {
                    Some(child) => self.schema(child),
                    None => Schema::Null,
                };
                self.child_schema(id, 1).union(&else_branch)
            }
            ExprOp::ArrayCons => self
                .children(id)
                .map(|child| self.schema(child))
                .reduce(|a, b| a.union(&b))
                .map_or(Schema::EmptyArray, |element| Schema::Array(Box::new(element))),
            ExprOp::RecordCons(_) => Schema::Record,
            ExprOp::AsArray => match self.child_schema(id, 0) {
                Schema::Null => Schema::EmptyArray,
                inner if inner.is_array() => inner,
                _ => Schema::any_array(),
            },
            ExprOp::EmptyOnNull => match self.child_schema(id, 0) {
                Schema::Null => Schema::EmptyArray,
                // may be null, so may become `[]`
                Schema::Any | Schema::Boolean => Schema::Any,
                inner => inner,
            },
            ExprOp::VarRef(_) | ExprOp::Field(_) | ExprOp::Call(_) => Schema::Any,
        }
    }
}

#[cfg(test)]
mod tests {
    use sift_core::Value;

    use super::*;

    fn leaf(tree: &mut ExprTree, n: i64) -> ExprId {
        tree.add(ExprOp::Const(Value::Long(n)), vec![]).unwrap()
    }

    #[test]
    fn test_add_sets_parent_and_slot() {
        let mut tree = ExprTree::new();
        let a = leaf(&mut tree, 1);
        let b = leaf(&mut tree, 2);
        let arr = tree.add(ExprOp::ArrayCons, vec![a, b]).unwrap();
        assert_eq!(tree.parent(a), Some(arr));
        assert_eq!(tree.slot(b), 1);
        assert_eq!(tree.children(arr).collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn test_add_rejects_attached_child() {
        let mut tree = ExprTree::new();
        let a = leaf(&mut tree, 1);
        tree.add(ExprOp::ArrayCons, vec![a]).unwrap();
        let err = tree.add(ExprOp::Not, vec![a]).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_add_rejects_bad_arity() {
        let mut tree = ExprTree::new();
        let a = leaf(&mut tree, 1);
        assert!(tree.add(ExprOp::Not, vec![]).is_err());
        assert!(tree.add_slots(ExprOp::Not, vec![None]).is_err());
        let b = leaf(&mut tree, 2);
        let c = leaf(&mut tree, 3);
        assert!(tree.add_slots(ExprOp::If, vec![Some(a), Some(b), None]).is_ok());
        assert!(tree.add_slots(ExprOp::If, vec![Some(c), None, None]).is_err());
    }

    #[test]
    fn test_replace_in_parent() {
        let mut tree = ExprTree::new();
        let a = leaf(&mut tree, 1);
        let b = leaf(&mut tree, 2);
        let arr = tree.add(ExprOp::ArrayCons, vec![a, b]).unwrap();
        let c = leaf(&mut tree, 3);
        tree.replace_in_parent(a, c).unwrap();
        assert_eq!(tree.child(arr, 0), Some(c));
        assert_eq!(tree.parent(c), Some(arr));
        assert_eq!(tree.slot(c), 0);
        assert_eq!(tree.parent(a), None);
    }

    #[test]
    fn test_replace_with_descendant_moves_it() {
        let mut tree = ExprTree::new();
        let a = leaf(&mut tree, 1);
        let not = tree.add(ExprOp::Not, vec![a]).unwrap();
        let query = tree.add(ExprOp::Query, vec![not]).unwrap();
        tree.replace_in_parent(not, a).unwrap();
        assert_eq!(tree.child(query, 0), Some(a));
        assert_eq!(tree.slots(not), &[None]);
    }

    #[test]
    fn test_replace_root_fails() {
        let mut tree = ExprTree::new();
        let a = leaf(&mut tree, 1);
        let b = leaf(&mut tree, 2);
        let err = tree.replace_in_parent(a, b).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_replace_with_ancestor_fails() {
        let mut tree = ExprTree::new();
        let a = leaf(&mut tree, 1);
        let not = tree.add(ExprOp::Not, vec![a]).unwrap();
        let _query = tree.add(ExprOp::Query, vec![not]).unwrap();
        assert!(tree.replace_in_parent(a, not).is_err());
    }

    #[test]
    fn test_detach_variadic_shifts_slots() {
        let mut tree = ExprTree::new();
        let items: Vec<ExprId> = (0..3).map(|n| leaf(&mut tree, n)).collect();
        let arr = tree.add(ExprOp::ArrayCons, items.clone()).unwrap();
        tree.detach(items[0]).unwrap();
        assert_eq!(tree.slots(arr).len(), 2);
        assert_eq!(tree.slot(items[1]), 0);
        assert_eq!(tree.slot(items[2]), 1);
        assert_eq!(tree.parent(items[0]), None);
    }

    #[test]
    fn test_detach_optional_and_required() {
        let mut tree = ExprTree::new();
        let c = leaf(&mut tree, 0);
        let t = leaf(&mut tree, 1);
        let e = leaf(&mut tree, 2);
        let cond = tree.add(ExprOp::If, vec![c, t, e]).unwrap();
        tree.detach(e).unwrap();
        assert_eq!(tree.child(cond, 2), None);
        assert_eq!(tree.slots(cond).len(), 3);
        assert!(tree.detach(t).unwrap_err().is_internal());
        assert!(tree.detach(cond).is_err());
    }

    #[test]
    fn test_set_and_push_child() {
        let mut tree = ExprTree::new();
        let c = leaf(&mut tree, 0);
        let t = leaf(&mut tree, 1);
        let cond = tree.add_slots(ExprOp::If, vec![Some(c), Some(t), None]).unwrap();
        let e = leaf(&mut tree, 2);
        assert_eq!(tree.set_child(cond, 2, Some(e)).unwrap(), None);
        assert_eq!(tree.slot(e), 2);

        let arr = tree.add(ExprOp::ArrayCons, vec![]).unwrap();
        assert!(tree.push_child(arr, e).is_err());
        let x = leaf(&mut tree, 3);
        assert_eq!(tree.push_child(arr, x).unwrap(), 0);
        assert!(tree.push_child(cond, arr).is_err());
    }

    #[test]
    fn test_schema_cache_invalidated_on_mutation() {
        let mut tree = ExprTree::new();
        let arr = tree.add(ExprOp::ArrayCons, vec![]).unwrap();
        let wrapped = tree.add(ExprOp::AsArray, vec![arr]).unwrap();
        assert!(tree.schema(wrapped).is_always_empty());

        let x = leaf(&mut tree, 1);
        tree.push_child(arr, x).unwrap();
        assert_eq!(
            tree.schema(wrapped),
            Schema::Array(Box::new(Schema::Number))
        );
    }

    #[test]
    fn test_empty_on_null_passes_non_null_through() {
        let mut tree = ExprTree::new();
        let n = leaf(&mut tree, 7);
        let num = tree.add(ExprOp::EmptyOnNull, vec![n]).unwrap();
        assert_eq!(tree.schema(num), Schema::Number);
        assert!(!tree.schema(num).is_array());

        let null = tree.add(ExprOp::Const(Value::Null), vec![]).unwrap();
        let empty = tree.add(ExprOp::EmptyOnNull, vec![null]).unwrap();
        assert!(tree.schema(empty).is_always_empty());

        let flag = tree.add(ExprOp::Const(Value::Bool(true)), vec![]).unwrap();
        let maybe = tree.add(ExprOp::EmptyOnNull, vec![flag]).unwrap();
        assert_eq!(tree.schema(maybe), Schema::Any);

        let m = leaf(&mut tree, 7);
        let wrapped = tree.add(ExprOp::AsArray, vec![m]).unwrap();
        assert_eq!(tree.schema(wrapped), Schema::any_array());
    }

    #[test]
    fn test_clone_with_fresh_vars() {
        let mut tree = ExprTree::new();
        let x = tree.fresh_var("x");
        let outer = tree.fresh_var("outer");
        let input = tree.add(ExprOp::VarRef(outer), vec![]).unwrap();
        let binding = tree.add(ExprOp::Binding(x), vec![input]).unwrap();
        let body = tree.add(ExprOp::VarRef(x), vec![]).unwrap();
        let transform = tree.add(ExprOp::Transform, vec![binding, body]).unwrap();

        let mut map = VarMap::new();
        let copy = tree.clone_with_fresh_vars(transform, &mut map);
        let fresh = map.get(x).unwrap();
        assert_ne!(fresh, x);
        assert_eq!(tree.iteration_var(copy), Some(fresh));
        assert_eq!(tree.op(tree.child(copy, 1).unwrap()), &ExprOp::VarRef(fresh));
        let copied_input = tree.iteration_input(copy).unwrap();
        assert_eq!(tree.op(copied_input), &ExprOp::VarRef(outer));
        assert_eq!(tree.parent(copy), None);
    }

    #[test]
    fn test_replace_var_and_free_vars() {
        let mut tree = ExprTree::new();
        let a = tree.fresh_var("a");
        let b = tree.fresh_var("b");
        let r1 = tree.add(ExprOp::VarRef(a), vec![]).unwrap();
        let r2 = tree.add(ExprOp::VarRef(a), vec![]).unwrap();
        let arr = tree.add(ExprOp::ArrayCons, vec![r1, r2]).unwrap();
        assert_eq!(tree.replace_var(arr, a, b), 2);
        assert_eq!(tree.count_var_uses(arr, a), 0);
        assert!(tree.free_vars(arr).contains(&b));
    }

    #[test]
    fn test_take_children() {
        let mut tree = ExprTree::new();
        let a = leaf(&mut tree, 1);
        let not = tree.add(ExprOp::Not, vec![a]).unwrap();
        assert_eq!(tree.take_children(not), vec![Some(a)]);
        assert_eq!(tree.parent(a), None);
        assert!(tree.slots(not).is_empty());
    }
}
