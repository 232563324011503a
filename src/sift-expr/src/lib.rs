//! Expression trees for sift queries.
//!
//! A parsed query is an [`ExprTree`]: an arena of nodes addressed by
//! [`ExprId`] handles, each carrying an [`ExprOp`] payload and an ordered list
//! of child slots. The tree maintains parent and slot back-references for
//! every attached node, and all structural edits go through a small set of
//! mutation methods (`replace_in_parent`, `detach`, `set_child`,
//! `push_child`) so that those references cannot drift.
//!
//! # Kinds
//!
//! Every node has one concrete [`ExprKind`]. Kinds form a fixed hierarchy
//! (for example `Filter` is-a `Iteration` is-a `Any`), exposed through
//! [`ExprKind::lineage`] for rule dispatch.
//!
//! # Variables
//!
//! Binders (`Binding`, `GroupBy`) introduce [`VarId`]s that `VarRef` leaves
//! refer to. Subtrees that are duplicated into a new scope must be copied
//! with [`ExprTree::clone_with_fresh_vars`].

mod builder;
mod decompile;
pub mod kind;
pub mod op;
pub mod tree;
mod validate;
pub mod var;

pub use kind::{Arity, ExprKind};
pub use op::{AggFunc, ArithOp, CompareOp, ExprOp};
pub use tree::{Children, ExprId, ExprTree};
pub use var::{VarId, VarMap, VarTable};
