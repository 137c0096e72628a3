//! The compilation stage a diagnostic originates from.
//!
//! Every error this compiler reports is a single line prefixed by the stage
//! that raised it (`Lexer Error`, `Parser Error`, `Semantic Error`). Each
//! pass crate's error type formats itself through [`Stage`] so the prefix
//! stays consistent without being duplicated in every `#[error("...")]`
//! string.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lexer,
    Parser,
    Semantic,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Lexer => "Lexer Error",
            Stage::Parser => "Parser Error",
            Stage::Semantic => "Semantic Error",
        };
        f.write_str(name)
    }
}
