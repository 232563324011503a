//! Node payloads.
//!
//! [`ExprOp`] is the kind-specific part of a node. The children of a node live
//! in the tree, not in the payload; the comment on each variant lists the
//! expected child slots.

use serde::{Deserialize, Serialize};
use sift_core::{Schema, Value};

use crate::kind::{Arity, ExprKind};
use crate::var::VarId;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    /// Equality (==)
    Eq,
    /// Inequality (!=)
    NotEq,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    LtEq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    GtEq,
}

impl CompareOp {
    /// Get the operator symbol for display.
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
        }
    }
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOp {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Subtract,
    /// Multiplication (*)
    Multiply,
    /// Division (/)
    Divide,
}

impl ArithOp {
    /// Get the operator symbol for display.
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }
}

/// Aggregate functions.
///
/// All of them can be computed incrementally, one item at a time, which is
/// what lets a grouping feed them from an accumulator instead of a
/// materialized per-group array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggFunc {
    /// Number of non-null items
    Count,
    /// Sum of items
    Sum,
    /// Minimum item
    Min,
    /// Maximum item
    Max,
    /// Average of items
    Avg,
}

impl AggFunc {
    /// Get the function name for display.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Avg => "avg",
        }
    }

    /// The node kind of a standalone call to this aggregate.
    pub const fn kind(&self) -> ExprKind {
        match self {
            Self::Count => ExprKind::Count,
            Self::Sum => ExprKind::Sum,
            Self::Min => ExprKind::Min,
            Self::Max => ExprKind::Max,
            Self::Avg => ExprKind::Avg,
        }
    }

    /// Schema of the aggregate result.
    pub fn result_schema(&self) -> Schema {
        match self {
            Self::Count | Self::Sum | Self::Avg => Schema::Number,
            Self::Min | Self::Max => Schema::Any,
        }
    }
}

/// Kind-specific payload of an expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprOp {
    /// `[root]`
    Query,
    /// `[]`
    Const(Value),
    /// `[]`
    VarRef(VarId),
    /// `[value]`: binds the variable to the value.
    Binding(VarId),
    /// `[stmt..., result]`: statements are usually bindings scoped over the rest.
    Do,
    /// `[Binding($v <- input), conjunct...]`
    Filter,
    /// `[Binding($v <- input), projection]`
    Transform,
    /// `[Binding($v <- input), body]`: body arrays are concatenated.
    For,
    /// `[Binding($i <- input), Binding($k <- key), collect]`; `into` is the
    /// per-group array of items, visible in `collect`.
    GroupBy {
        /// Variable bound to the items of one group.
        into: VarId,
    },
    /// `[Binding($i <- input), Binding($k <- key), Binding($a <- Accumulate)..., collect]`
    GroupAggregate,
    /// `[per-item value]`: evaluated once per item in the group.
    Accumulate(AggFunc),
    /// `[operand, operand...]`
    And,
    /// `[operand, operand...]`
    Or,
    /// `[operand]`
    Not,
    /// `[left, right]`
    Compare(CompareOp),
    /// `[left, right]`
    Arith(ArithOp),
    /// `[cond, then, else?]`
    If,
    /// `[item...]`
    ArrayCons,
    /// `[value...]`, one value per field name.
    RecordCons(Vec<String>),
    /// `[record]`
    Field(String),
    /// `[array]`
    Aggregate(AggFunc),
    /// `[value]`
    AsArray,
    /// `[value]`
    EmptyOnNull,
    /// `[arg...]`: an opaque builtin the rewriter does not interpret.
    Call(String),
}

impl ExprOp {
    /// Get the concrete kind of this payload.
    pub fn kind(&self) -> ExprKind {
        match self {
            Self::Query => ExprKind::Query,
            Self::Const(_) => ExprKind::Const,
            Self::VarRef(_) => ExprKind::VarRef,
            Self::Binding(_) => ExprKind::Binding,
            Self::Do => ExprKind::Do,
            Self::Filter => ExprKind::Filter,
            Self::Transform => ExprKind::Transform,
            Self::For => ExprKind::For,
            Self::GroupBy { .. } => ExprKind::GroupBy,
            Self::GroupAggregate => ExprKind::GroupAggregate,
            Self::Accumulate(_) => ExprKind::Accumulate,
            Self::And => ExprKind::And,
            Self::Or => ExprKind::Or,
            Self::Not => ExprKind::Not,
            Self::Compare(_) => ExprKind::Compare,
            Self::Arith(_) => ExprKind::Arith,
            Self::If => ExprKind::If,
            Self::ArrayCons => ExprKind::ArrayCons,
            Self::RecordCons(_) => ExprKind::RecordCons,
            Self::Field(_) => ExprKind::Field,
            Self::Aggregate(func) => func.kind(),
            Self::AsArray => ExprKind::AsArray,
            Self::EmptyOnNull => ExprKind::EmptyOnNull,
            Self::Call(_) => ExprKind::Call,
        }
    }

    /// Get the slot shape of this payload.
    pub fn arity(&self) -> Arity {
        match self {
            Self::Const(_) | Self::VarRef(_) => Arity::exactly(0),
            Self::Query
            | Self::Binding(_)
            | Self::Accumulate(_)
            | Self::Not
            | Self::Field(_)
            | Self::Aggregate(_)
            | Self::AsArray
            | Self::EmptyOnNull => Arity::exactly(1),
            Self::Transform | Self::For | Self::Compare(_) | Self::Arith(_) => Arity::exactly(2),
            Self::GroupBy { .. } => Arity::exactly(3),
            Self::If => Arity::Fixed {
                required: 2,
                optional: 1,
            },
            Self::RecordCons(names) => Arity::exactly(names.len()),
            Self::Do => Arity::Variadic { min: 1 },
            Self::Filter | Self::And | Self::Or => Arity::Variadic { min: 2 },
            Self::GroupAggregate => Arity::Variadic { min: 3 },
            Self::ArrayCons | Self::Call(_) => Arity::Variadic { min: 0 },
        }
    }

    /// The variable introduced by this node, if it is a binder.
    pub fn bound_var(&self) -> Option<VarId> {
        match self {
            Self::Binding(var) => Some(*var),
            Self::GroupBy { into } => Some(*into),
            _ => None,
        }
    }

    /// The variable referenced by this node, if it is a reference.
    pub fn var_ref(&self) -> Option<VarId> {
        match self {
            Self::VarRef(var) => Some(*var),
            _ => None,
        }
    }

    /// The literal value, if this is a constant.
    pub fn as_const(&self) -> Option<&Value> {
        match self {
            Self::Const(value) => Some(value),
            _ => None,
        }
    }

    /// Returns true if this is an iteration whose slot 0 binds the input.
    pub fn has_input_binding(&self) -> bool {
        self.kind().is_a(ExprKind::Iteration)
    }

    /// Copy the payload, redirecting variables through `remap`.
    pub(crate) fn remap_vars(&self, remap: impl Fn(VarId) -> VarId) -> Self {
        match self {
            Self::VarRef(var) => Self::VarRef(remap(*var)),
            Self::Binding(var) => Self::Binding(remap(*var)),
            Self::GroupBy { into } => Self::GroupBy { into: remap(*into) },
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(ExprOp::Aggregate(AggFunc::Sum).kind(), ExprKind::Sum);
        assert_eq!(ExprOp::Compare(CompareOp::Lt).kind(), ExprKind::Compare);
        assert!(ExprOp::Filter.has_input_binding());
        assert!(!ExprOp::Do.has_input_binding());
    }

    #[test]
    fn test_arity_shapes() {
        assert!(ExprOp::If.arity().is_optional_slot(2));
        assert_eq!(
            ExprOp::RecordCons(vec!["a".into(), "b".into()]).arity(),
            Arity::exactly(2)
        );
        assert!(ExprOp::Filter.arity().is_variadic());
        assert!(!ExprOp::Filter.arity().accepts(1));
    }

    #[test]
    fn test_symbols() {
        assert_eq!(CompareOp::GtEq.symbol(), ">=");
        assert_eq!(ArithOp::Divide.symbol(), "/");
        assert_eq!(AggFunc::Avg.name(), "avg");
    }
}
