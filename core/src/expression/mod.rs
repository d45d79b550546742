//! Effect-expression language
//!
//! Mappings test activation with a small boolean language over active
//! effect names: `&&`, `||`, `\!`, `\(`, `\)`, with wildcard (`*`) and
//! brace-alternation (`{a,b,c}`) literals. Operator characters are escaped
//! in the legacy encoding, so effect names themselves may contain the
//! unescaped versions.
//!
//! The assembled expression is parsed into an AST and interpreted directly;
//! there is no dynamic code evaluation. Malformed expressions evaluate to
//! `false` and never propagate errors.

pub mod comparator;
mod eval;
mod lexer;
mod parser;

pub use comparator::Comparator;
pub use eval::{Evaluation, evaluate};
