//! Sift - rule-based query rewriting for a JSON query language
//!
//! Sift takes the expression tree of a parsed query and rewrites it into an
//! equivalent, cheaper tree by firing local rewrite rules to a bounded
//! fixpoint. Parsing and execution are left to the embedding compiler.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Re-export core crates
pub use common_config as config;
pub use common_error as error;
pub use sift_core as core;
pub use sift_expr as expr;
pub use sift_rewrite as rewrite;

pub use common_config::SiftConfig;
pub use common_error::{SiftError, SiftResult};
pub use sift_expr::{ExprId, ExprTree};
pub use sift_rewrite::{Environment, RewriteEngine};

use log::debug;

/// Sift version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Rewrite a query with the default pipeline configured by `config`.
///
/// Returns `root` unchanged when rewriting is disabled.
pub fn rewrite_query(
    config: &SiftConfig,
    env: &mut dyn Environment,
    tree: &mut ExprTree,
    root: ExprId,
) -> SiftResult<ExprId> {
    if !config.rewrite.enabled {
        debug!("Rewriting disabled by config");
        return Ok(root);
    }
    RewriteEngine::with_config(config.rewrite.clone()).run(env, tree, root)
}
