//! Rewrite rules for Sift expression trees.
//!
//! Every rule is a local transformation registered for one or more
//! expression kinds. A rule must leave the result of the query unchanged,
//! including its `null` behavior.
//!
//! # Rules
//!
//! - **LetInline**: drop unused `Do` bindings and inline trivial ones
//! - **TrivialTransformElimination**: drop `transform each $x $x` over arrays
//! - **ConjunctSplit**: split `and` filter predicates into conjuncts
//! - **ConstantPredicateFilter**: resolve filter conjuncts that are literals
//! - **FilterMerge**: fuse a filter over a filter
//! - **EmptyInputElimination**: fold iterations over `[]` into `[]`
//! - **ConstEval**: evaluate operators whose operands are literals
//! - **InjectAggregate**: aggregate groups item by item

mod conjunct_split;
mod const_eval;
mod constant_predicate_filter;
mod empty_input_elimination;
mod filter_merge;
mod inject_aggregate;
mod let_inline;
mod rule;
mod trivial_transform_elimination;

pub use conjunct_split::ConjunctSplit;
pub use const_eval::ConstEval;
pub use constant_predicate_filter::ConstantPredicateFilter;
pub use empty_input_elimination::EmptyInputElimination;
pub use filter_merge::FilterMerge;
pub use inject_aggregate::InjectAggregate;
pub use let_inline::LetInline;
pub use rule::RewriteRule;
pub use trivial_transform_elimination::TrivialTransformElimination;
