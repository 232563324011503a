//! Expression kind tags and the kind hierarchy.
//!
//! Every node carries exactly one concrete [`ExprKind`]. Abstract kinds never
//! appear on nodes; they exist so that a rule can be registered once for a
//! whole family (for example every iteration, or every operator). The
//! hierarchy is a fixed table: [`ExprKind::lineage`] lists a kind followed by
//! its ancestors, nearest first, ending at [`ExprKind::Any`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discriminates expression node variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExprKind {
    // Abstract kinds.
    /// Root of the hierarchy; every kind is-a `Any`.
    Any,
    /// Iterations over an input array (filter, transform, for, grouping).
    Iteration,
    /// Scalar operators whose result depends only on their operands.
    Operator,
    /// Boolean connectives.
    Logical,
    /// Aggregate functions over an array.
    Aggregate,
    /// Array and record constructors.
    Constructor,
    /// Value-preserving coercions around an array.
    Wrapper,

    // Concrete kinds.
    /// Synthetic holder above the query root.
    Query,
    /// Literal value.
    Const,
    /// Reference to a variable.
    VarRef,
    /// Introduces a variable bound to its single child.
    Binding,
    /// Sequence of bindings/statements followed by a result expression.
    Do,
    /// `input -> filter each $v (p1) and (p2) ...`
    Filter,
    /// `input -> transform each $v projection`
    Transform,
    /// `for ($v in input) body`
    For,
    /// `input -> group each $i by $k = key as $g into collect`
    GroupBy,
    /// Grouping whose aggregates are computed incrementally per item.
    GroupAggregate,
    /// Per-item accumulator inside a `GroupAggregate`.
    Accumulate,
    /// Conjunction.
    And,
    /// Disjunction.
    Or,
    /// Negation.
    Not,
    /// Comparison.
    Compare,
    /// Arithmetic.
    Arith,
    /// Conditional with optional else branch.
    If,
    /// `[e1, e2, ...]`
    ArrayCons,
    /// `{ name: e, ... }`
    RecordCons,
    /// `e.name`
    Field,
    /// `count(array)`
    Count,
    /// `sum(array)`
    Sum,
    /// `min(array)`
    Min,
    /// `max(array)`
    Max,
    /// `avg(array)`
    Avg,
    /// `asArray(e)`: `null` becomes `[]`, arrays pass through.
    AsArray,
    /// `emptyOnNull(e)`: `null` becomes `[]`, anything else passes through.
    EmptyOnNull,
    /// Call of an opaque builtin function.
    Call,
}

use ExprKind::*;

impl ExprKind {
    /// All concrete kinds, in declaration order.
    pub const CONCRETE: &'static [ExprKind] = &[
        Query, Const, VarRef, Binding, Do, Filter, Transform, For, GroupBy, GroupAggregate,
        Accumulate, And, Or, Not, Compare, Arith, If, ArrayCons, RecordCons, Field, Count, Sum,
        Min, Max, Avg, AsArray, EmptyOnNull, Call,
    ];

    /// The kind itself followed by its ancestors, nearest first.
    pub const fn lineage(self) -> &'static [ExprKind] {
        match self {
            Any => &[Any],
            Iteration => &[Iteration, Any],
            Operator => &[Operator, Any],
            Logical => &[Logical, Operator, Any],
            Aggregate => &[Aggregate, Any],
            Constructor => &[Constructor, Any],
            Wrapper => &[Wrapper, Any],

            Query => &[Query, Any],
            Const => &[Const, Any],
            VarRef => &[VarRef, Any],
            Binding => &[Binding, Any],
            Do => &[Do, Any],
            Filter => &[Filter, Iteration, Any],
            Transform => &[Transform, Iteration, Any],
            For => &[For, Iteration, Any],
            GroupBy => &[GroupBy, Iteration, Any],
            GroupAggregate => &[GroupAggregate, Iteration, Any],
            Accumulate => &[Accumulate, Any],
            And => &[And, Logical, Operator, Any],
            Or => &[Or, Logical, Operator, Any],
            Not => &[Not, Logical, Operator, Any],
            Compare => &[Compare, Operator, Any],
            Arith => &[Arith, Operator, Any],
            If => &[If, Any],
            ArrayCons => &[ArrayCons, Constructor, Any],
            RecordCons => &[RecordCons, Constructor, Any],
            Field => &[Field, Operator, Any],
            Count => &[Count, Aggregate, Any],
            Sum => &[Sum, Aggregate, Any],
            Min => &[Min, Aggregate, Any],
            Max => &[Max, Aggregate, Any],
            Avg => &[Avg, Aggregate, Any],
            AsArray => &[AsArray, Wrapper, Any],
            EmptyOnNull => &[EmptyOnNull, Wrapper, Any],
            Call => &[Call, Any],
        }
    }

    /// The nearest ancestor kind, if any.
    pub fn parent(self) -> Option<ExprKind> {
        self.lineage().get(1).copied()
    }

    /// Returns true if `self` is `ancestor` or descends from it.
    pub fn is_a(self, ancestor: ExprKind) -> bool {
        self.lineage().contains(&ancestor)
    }

    /// Returns true for kinds that never appear on a node.
    pub const fn is_abstract(self) -> bool {
        matches!(
            self,
            Any | Iteration | Operator | Logical | Aggregate | Constructor | Wrapper
        )
    }

    /// Get the name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            Any => "Any",
            Iteration => "Iteration",
            Operator => "Operator",
            Logical => "Logical",
            Aggregate => "Aggregate",
            Constructor => "Constructor",
            Wrapper => "Wrapper",
            Query => "Query",
            Const => "Const",
            VarRef => "VarRef",
            Binding => "Binding",
            Do => "Do",
            Filter => "Filter",
            Transform => "Transform",
            For => "For",
            GroupBy => "GroupBy",
            GroupAggregate => "GroupAggregate",
            Accumulate => "Accumulate",
            And => "And",
            Or => "Or",
            Not => "Not",
            Compare => "Compare",
            Arith => "Arith",
            If => "If",
            ArrayCons => "ArrayCons",
            RecordCons => "RecordCons",
            Field => "Field",
            Count => "Count",
            Sum => "Sum",
            Min => "Min",
            Max => "Max",
            Avg => "Avg",
            AsArray => "AsArray",
            EmptyOnNull => "EmptyOnNull",
            Call => "Call",
        }
    }
}

impl fmt::Display for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape of a node's child slots.
///
/// Only fixed-arity kinds may have optional (absent) slots; the optional slots
/// are always the trailing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `required` slots that must be present, followed by `optional`
    /// slots that may be absent.
    Fixed {
        /// Number of leading slots that must hold a child.
        required: usize,
        /// Number of trailing slots that may be absent.
        optional: usize,
    },
    /// Any number of slots, at least `min`, all present.
    Variadic {
        /// Minimum number of children.
        min: usize,
    },
}

impl Arity {
    /// Fixed arity without optional slots.
    pub const fn exactly(n: usize) -> Self {
        Self::Fixed {
            required: n,
            optional: 0,
        }
    }

    /// Returns true if `slot` may legitimately be absent.
    pub fn is_optional_slot(self, slot: usize) -> bool {
        match self {
            Self::Fixed { required, optional } => slot >= required && slot < required + optional,
            Self::Variadic { .. } => false,
        }
    }

    /// Returns true if `count` slots is an acceptable shape.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Fixed { required, optional } => count == required + optional,
            Self::Variadic { min } => count >= min,
        }
    }

    /// Returns true if children can be appended or removed.
    pub fn is_variadic(self) -> bool {
        matches!(self, Self::Variadic { .. })
    }
}
