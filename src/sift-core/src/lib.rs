//! Core data types for sift.
//!
//! `sift-core` holds the JSON [`Value`] model shared by the parser, the
//! rewrite engine, and the evaluator, plus the coarse read-only [`Schema`]
//! descriptor that rewrite rules consult.

pub mod schema;
pub mod value;

pub use schema::Schema;
pub use value::Value;
