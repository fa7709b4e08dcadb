//! LlamaScript Evaluation System
//!
//! Executes a lowered [`crate::ast::Script`] against a metric source and
//! collects plot and highlight descriptors plus an ordered list of
//! diagnostics. Evaluation never aborts a run: a failing statement is
//! recorded and the next one runs.
//!
//! # Core Components
//!
//! ## Interpreter
//! Entry point ([`evaluator::Interpreter`]). Creates a fresh
//! [`context::EvaluationContext`] for each run.
//!
//! ## Statement Evaluator
//! Assignment, plot, highlight. Catches panics at the statement boundary.
//!
//! ## Expression Evaluator
//! Literals, variables, calls, property access and left-to-right operator
//! chains over series and scalars.
//!
//! ## Value Model
//! Timestamped series, scalars, entity references and lists ([`value`]),
//! with the point-wise operators in [`algebra`] and the built-in functions
//! in [`functions`].
//!
//! ## Property Resolution
//! Maps `entity.property` to a metric endpoint and memoizes fetches per run
//! ([`property`]).

pub mod algebra;
pub mod color;
pub mod context;
pub mod entity;
pub mod evaluator;
pub mod expression;
pub mod functions;
pub mod property;
pub mod statement;
pub mod value;
