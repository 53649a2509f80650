//! Recursive-descent parser, split by grammar area.

mod state;
mod state_declarations;
mod state_expressions;
mod state_statements;

pub use state::ParserState;
