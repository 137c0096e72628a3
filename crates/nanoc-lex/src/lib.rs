//! nanoc-lex — lexical analysis.
//!
//! Turns a preprocessed C source string into a sequence of [`Token`]s,
//! terminated by `Token::Eof`. The lexer never allocates per-character: it
//! scans over a byte cursor and only allocates when it needs to intern an
//! identifier or build a diagnostic snippet.

mod cursor;
mod error;
mod lexer;
mod token;

pub use error::{LexError, LexResult};
pub use lexer::Lexer;
pub use token::Token;
