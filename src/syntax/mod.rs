//! Go syntax: lexer, typed AST and a fault-tolerant parser.
//!
//! ```text
//! source text ──▶ lexer (logos + semicolon insertion) ──▶ parser ──▶ ast::File
//! ```
//!
//! Parsing never fails outright; errors are collected in [`Parse::errors`]
//! next to a best-effort tree.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod visit;

pub use parser::{Parse, SyntaxError, parse, parse_imports};
