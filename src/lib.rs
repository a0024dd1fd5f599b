//! Parser and tree-walking evaluator for Manascript, a small dynamically typed scripting
//! language.
//!
//! Source text goes through the [`scanner`], then the [`parser`] which builds an [`ast`] while
//! collecting [`diag`]nostics, and finally the [`eval`]uator which runs it against a single flat
//! environment.
//!
//! # Examples
//!
//! See [`crate::interpreter::Interpreter`].
//!
//! # Limitations
//!
//! - Blocks do not introduce scopes: all variables live in one namespace.
//! - Function declarations and `return` are parsed but fail at evaluation time.
//! - `print` is the only callable.

#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]

pub mod ast;
pub mod builtins;
pub mod config;
pub mod diag;
pub mod eval;
pub mod interpreter;
pub mod parser;
pub mod scanner;
pub mod token;
pub mod value;

mod char_reader;
