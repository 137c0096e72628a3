use nanoc_util::Stage;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("{stage} unrecognized token near \"{snippet}\"", stage = Stage::Lexer)]
    UnrecognizedToken { snippet: String },
}

pub type LexResult<T> = Result<T, LexError>;
