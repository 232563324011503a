//! Structural validation of expression trees.

use std::collections::HashMap;

use common_error::{ensure, SiftError, SiftResult};

use crate::kind::ExprKind;
use crate::op::ExprOp;
use crate::tree::{ExprId, ExprTree};
use crate::var::VarId;

impl ExprTree {
    /// Check the structural invariants of the subtree rooted at `root`.
    ///
    /// - every present child at slot `i` of `n` records `n` as its parent and `i` as its slot
    /// - every node has a slot count its kind accepts, and no required slot is absent
    /// - no node is reachable twice, so the subtree is acyclic
    /// - iterations and groupings start with the bindings their shape requires
    /// - every referenced variable exists, and each variable has at most one binder
    ///
    /// Violations are reported as [`SiftError::InvariantViolation`].
    pub fn validate(&self, root: ExprId) -> SiftResult<()> {
        ensure!(
            self.contains(root),
            InvariantViolation: "root {} does not belong to this tree", root
        );
        let mut seen = vec![false; self.len()];
        let mut binders: HashMap<VarId, ExprId> = HashMap::new();
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            ensure!(
                !seen[id.index()],
                InvariantViolation: "{} ({}) is reachable more than once", id, self.kind(id)
            );
            seen[id.index()] = true;

            let op = self.op(id);
            let arity = op.arity();
            let slots = self.slots(id);
            ensure!(
                arity.accepts(slots.len()),
                InvariantViolation: "{} ({}) has {} child slots, expected {:?}",
                id,
                op.kind(),
                slots.len(),
                arity
            );

            for (i, slot) in slots.iter().enumerate() {
                let Some(child) = *slot else {
                    ensure!(
                        arity.is_optional_slot(i),
                        InvariantViolation: "required slot {} of {} ({}) is absent", i, id, op.kind()
                    );
                    continue;
                };
                ensure!(
                    self.contains(child),
                    InvariantViolation: "{} refers to unknown node {}", id, child
                );
                ensure!(
                    self.parent(child) == Some(id) && self.slot(child) == i,
                    InvariantViolation: "{} ({}) at slot {} of {} records parent {:?} slot {}",
                    child,
                    self.kind(child),
                    i,
                    id,
                    self.parent(child),
                    self.slot(child)
                );
                stack.push(child);
            }

            self.check_shape(id, op)?;

            if let Some(var) = op.var_ref() {
                ensure!(
                    self.vars().contains(var),
                    InvariantViolation: "{} references unknown variable {}", id, var
                );
            }
            if let Some(var) = op.bound_var() {
                if let Some(other) = binders.insert(var, id) {
                    return Err(SiftError::invariant(format!(
                        "{} is bound by both {} and {}",
                        self.vars().display(var),
                        other,
                        id
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_shape(&self, id: ExprId, op: &ExprOp) -> SiftResult<()> {
        let binding_slots = match op {
            ExprOp::Filter | ExprOp::Transform | ExprOp::For => 1,
            ExprOp::GroupBy { .. } => 2,
            ExprOp::GroupAggregate => self.slots(id).len().saturating_sub(1),
            _ => 0,
        };
        for slot in 0..binding_slots {
            let kind = self.child(id, slot).map(|child| self.kind(child));
            ensure!(
                kind == Some(ExprKind::Binding),
                InvariantViolation: "slot {} of {} ({}) must be a Binding, found {:?}",
                slot,
                id,
                op.kind(),
                kind
            );
        }
        if matches!(op, ExprOp::GroupAggregate) {
            for slot in 2..binding_slots {
                let value = self
                    .child(id, slot)
                    .and_then(|binding| self.child(binding, 0))
                    .map(|value| self.kind(value));
                ensure!(
                    value == Some(ExprKind::Accumulate),
                    InvariantViolation: "accumulator slot {} of {} holds {:?}", slot, id, value
                );
            }
        }
        Ok(())
    }
}
