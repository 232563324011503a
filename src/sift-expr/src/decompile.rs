//! Textual renderings of expression trees.
//!
//! [`ExprTree::decompile`] prints query-like text, used in trace snapshots and
//! test assertions. [`ExprTree::explain`] prints the node structure with one
//! node per line.

use std::fmt;

use common_display::{DisplayTree, TreeSource};

use crate::op::ExprOp;
use crate::tree::{ExprId, ExprTree};

impl ExprTree {
    /// Render the subtree rooted at `id` as query text.
    ///
    /// Absent required slots render as `<?>`.
    pub fn decompile(&self, id: ExprId) -> String {
        Decompiled { tree: self, id }.to_string()
    }

    /// Render the subtree rooted at `id` as an indented node tree.
    pub fn explain(&self, id: ExprId) -> String {
        DisplayTree::new(self, id).to_string()
    }
}

struct Decompiled<'a> {
    tree: &'a ExprTree,
    id: ExprId,
}

impl fmt::Display for Decompiled<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Writer { tree: self.tree }.expr(f, Some(self.id))
    }
}

struct Writer<'a> {
    tree: &'a ExprTree,
}

impl Writer<'_> {
    fn expr(&self, f: &mut fmt::Formatter<'_>, id: Option<ExprId>) -> fmt::Result {
        let Some(id) = id else {
            return write!(f, "<?>");
        };
        let tree = self.tree;
        let child = |slot: usize| tree.child(id, slot);

        match tree.op(id) {
            ExprOp::Query => self.expr(f, child(0)),
            ExprOp::Const(value) => write!(f, "{value}"),
            ExprOp::VarRef(var) => write!(f, "{}", tree.vars().display(*var)),
            ExprOp::Binding(var) => {
                write!(f, "{} = ", tree.vars().display(*var))?;
                self.expr(f, child(0))
            }
            ExprOp::Do => {
                write!(f, "(")?;
                self.list(f, id, 0)?;
                write!(f, ")")
            }
            ExprOp::Filter => {
                self.input(f, id)?;
                write!(f, " -> filter each {} ", self.iteration_var(id))?;
                let conjuncts: Vec<ExprId> = tree.children(id).skip(1).collect();
                if conjuncts.is_empty() {
                    return write!(f, "()");
                }
                for (i, conjunct) in conjuncts.into_iter().enumerate() {
                    if i > 0 {
                        write!(f, " and ")?;
                    }
                    write!(f, "(")?;
                    self.expr(f, Some(conjunct))?;
                    write!(f, ")")?;
                }
                Ok(())
            }
            ExprOp::Transform => {
                self.input(f, id)?;
                write!(f, " -> transform each {} ", self.iteration_var(id))?;
                self.expr(f, child(1))
            }
            ExprOp::For => {
                write!(f, "for ({} in ", self.iteration_var(id))?;
                self.input(f, id)?;
                write!(f, ") ")?;
                self.expr(f, child(1))
            }
            ExprOp::GroupBy { into } => {
                self.group_header(f, id)?;
                write!(f, " as {} into ", tree.vars().display(*into))?;
                self.expr(f, child(2))
            }
            ExprOp::GroupAggregate => {
                self.group_header(f, id)?;
                write!(f, " aggregate ")?;
                let slots = tree.slots(id).len();
                for slot in 2..slots.saturating_sub(1) {
                    if slot > 2 {
                        write!(f, ", ")?;
                    }
                    self.expr(f, child(slot))?;
                }
                write!(f, " into ")?;
                self.expr(f, tree.last_child(id))
            }
            ExprOp::Accumulate(func) | ExprOp::Aggregate(func) => {
                write!(f, "{}(", func.name())?;
                self.expr(f, child(0))?;
                write!(f, ")")
            }
            ExprOp::And | ExprOp::Or => {
                let word = if matches!(tree.op(id), ExprOp::And) {
                    " and "
                } else {
                    " or "
                };
                write!(f, "(")?;
                for (i, operand) in tree.slots(id).iter().enumerate() {
                    if i > 0 {
                        write!(f, "{word}")?;
                    }
                    self.expr(f, *operand)?;
                }
                write!(f, ")")
            }
            ExprOp::Not => {
                write!(f, "not ")?;
                self.expr(f, child(0))
            }
            ExprOp::Compare(op) => self.binary(f, id, op.symbol()),
            ExprOp::Arith(op) => self.binary(f, id, op.symbol()),
            ExprOp::If => {
                write!(f, "if (")?;
                self.expr(f, child(0))?;
                write!(f, ") ")?;
                self.expr(f, child(1))?;
                if let Some(else_branch) = child(2) {
                    write!(f, " else ")?;
                    self.expr(f, Some(else_branch))?;
                }
                Ok(())
            }
            ExprOp::ArrayCons => {
                write!(f, "[")?;
                self.list(f, id, 0)?;
                write!(f, "]")
            }
            ExprOp::RecordCons(names) => {
                if names.is_empty() {
                    return write!(f, "{{}}");
                }
                write!(f, "{{ ")?;
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: ")?;
                    self.expr(f, child(i))?;
                }
                write!(f, " }}")
            }
            ExprOp::Field(name) => {
                self.expr(f, child(0))?;
                write!(f, ".{name}")
            }
            ExprOp::AsArray => self.call(f, id, "asArray"),
            ExprOp::EmptyOnNull => self.call(f, id, "emptyOnNull"),
            ExprOp::Call(name) => self.call(f, id, name),
        }
    }

    fn list(&self, f: &mut fmt::Formatter<'_>, id: ExprId, from: usize) -> fmt::Result {
        for (i, slot) in self.tree.slots(id).iter().enumerate().skip(from) {
            if i > from {
                write!(f, ", ")?;
            }
            self.expr(f, *slot)?;
        }
        Ok(())
    }

    fn call(&self, f: &mut fmt::Formatter<'_>, id: ExprId, name: &str) -> fmt::Result {
        write!(f, "{name}(")?;
        self.list(f, id, 0)?;
        write!(f, ")")
    }

    fn binary(&self, f: &mut fmt::Formatter<'_>, id: ExprId, symbol: &str) -> fmt::Result {
        write!(f, "(")?;
        self.expr(f, self.tree.child(id, 0))?;
        write!(f, " {symbol} ")?;
        self.expr(f, self.tree.child(id, 1))?;
        write!(f, ")")
    }

    fn input(&self, f: &mut fmt::Formatter<'_>, id: ExprId) -> fmt::Result {
        self.expr(f, self.tree.iteration_input(id))
    }

    fn iteration_var(&self, id: ExprId) -> String {
        self.tree
            .iteration_var(id)
            .map_or_else(|| "$?".to_string(), |var| self.tree.vars().display(var))
    }

    fn group_header(&self, f: &mut fmt::Formatter<'_>, id: ExprId) -> fmt::Result {
        self.input(f, id)?;
        write!(f, " -> group each {} by ", self.iteration_var(id))?;
        self.expr(f, self.tree.child(id, 1))
    }
}

impl TreeSource for ExprTree {
    type Id = ExprId;

    fn label(&self, id: ExprId) -> String {
        self.kind(id).to_string()
    }

    fn children(&self, id: ExprId) -> Vec<ExprId> {
        ExprTree::children(self, id).collect()
    }

    fn details(&self, id: ExprId) -> Option<String> {
        let vars = self.vars();
        match self.op(id) {
            ExprOp::Const(value) => Some(common_display::truncate_string(&value.to_string(), 40)),
            ExprOp::VarRef(var) | ExprOp::Binding(var) => Some(vars.display(*var)),
            ExprOp::GroupBy { into } => Some(format!("into {}", vars.display(*into))),
            ExprOp::Accumulate(func) => Some(func.name().to_string()),
            ExprOp::Compare(op) => Some(op.symbol().to_string()),
            ExprOp::Arith(op) => Some(op.symbol().to_string()),
            ExprOp::RecordCons(names) => Some(names.join(", ")),
            ExprOp::Field(name) | ExprOp::Call(name) => Some(name.clone()),
            _ => None,
        }
    }
}
