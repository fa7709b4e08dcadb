//! # LlamaScript: time-series scripting for DeFi dashboards
//!
//! LlamaScript lets a dashboard author combine protocol, chain and token
//! metrics with arithmetic, comparisons and a handful of analytic functions,
//! and declare what to chart:
//!
//! ```text
//! eth = chain("ethereum")
//! plot(ma(eth.tvl, 7), "Ethereum TVL (7d)", "area", "#627eea")
//! ```
//!
//! ## Processing Pipeline
//!
//! ```text
//! Parser tree (JSON) → Lowering → Evaluator → EvaluationReport
//! ```
//!
//! ### Stage 1: Lowering
//!
//! The [`syntax`] module models the tree emitted by the external parser and
//! lowers it into the typed [`ast`].
//!
//! ### Stage 2: Evaluation
//!
//! The [`eval`] module walks the script statement by statement. Entity
//! properties are fetched through a [`source::MetricSource`] and memoized
//! for the run; series are combined point-wise by timestamp.
//!
//! ### Stage 3: Report
//!
//! The [`Interpreter`] returns an [`eval::context::EvaluationReport`] holding
//! plot and highlight descriptors, final variables and every diagnostic in
//! the order it was raised. Scripts never abort on a bad statement.

pub mod ast;
pub mod config;
pub mod error;
pub mod eval;
pub mod source;
pub mod syntax;

// Re-exports
pub use ast::*;
pub use error::*;
pub use eval::evaluator::{EvalError, EvalResult, Interpreter};
