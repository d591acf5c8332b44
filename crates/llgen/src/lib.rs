//! An LL(1) parser generator.
//!
//! A [`Grammar`](grammar::Grammar) is analyzed into the prediction sets and
//! the parsing table, which are serialized into a target-language template
//! by the [`DefaultGenerator`](codegen::DefaultGenerator) together with the
//! handlers translated from the semantic actions.

pub mod codegen;
pub mod grammar;
pub mod predict;
pub mod syntax;
pub mod table;
pub mod types;
pub mod util;
