use nanoc_lex::Token;
use nanoc_util::Stage;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("{stage} expected {expected}, found \"{found}\"", stage = Stage::Parser)]
    ExpectedToken { expected: String, found: Token },

    #[error("{stage} expected an expression, found \"{found}\"", stage = Stage::Parser)]
    ExpectedExpression { found: Token },

    #[error("{stage} unexpected token \"{found}\"", stage = Stage::Parser)]
    UnexpectedToken { found: Token },
}

pub type ParseResult<T> = Result<T, ParseError>;
