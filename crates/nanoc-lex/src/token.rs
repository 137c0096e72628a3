//! Token definitions.
//!
//! Tokens are positionless: the lexer reports no line/column, only the text
//! of the offending lexeme when it fails. Downstream passes compare tokens
//! structurally, never by provenance.

use nanoc_util::Symbol;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    // Punctuators
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semicolon,
    Comma,
    Question,
    Colon,

    // Unary-only
    Tilde,
    Bang,

    // Binary operators (also valid as unary where the grammar allows, e.g. `-`)
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Shl,
    Shr,
    Lt,
    LtEq,
    Gt,
    GtEq,
    EqEq,
    NotEq,
    AmpAmp,
    PipePipe,

    // Increment/decrement
    PlusPlus,
    MinusMinus,

    // Assignment and compound assignment
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,
    ShlEq,
    ShrEq,

    // Keywords
    KwInt,
    KwLong,
    KwUnsigned,
    KwVoid,
    KwStatic,
    KwReturn,
    KwIf,
    KwElse,
    KwDo,
    KwWhile,
    KwFor,
    KwBreak,
    KwContinue,

    Identifier(Symbol),
    IntegerLiteral(i64),

    Eof,
}

impl Token {
    /// Look up a keyword token for an already-scanned identifier lexeme.
    /// Returns `None` if `word` is an ordinary identifier.
    pub fn keyword(word: &str) -> Option<Token> {
        Some(match word {
            "int" => Token::KwInt,
            "long" => Token::KwLong,
            "unsigned" => Token::KwUnsigned,
            "void" => Token::KwVoid,
            "static" => Token::KwStatic,
            "return" => Token::KwReturn,
            "if" => Token::KwIf,
            "else" => Token::KwElse,
            "do" => Token::KwDo,
            "while" => Token::KwWhile,
            "for" => Token::KwFor,
            "break" => Token::KwBreak,
            "continue" => Token::KwContinue,
            _ => return None,
        })
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::Question => write!(f, "?"),
            Token::Colon => write!(f, ":"),
            Token::Tilde => write!(f, "~"),
            Token::Bang => write!(f, "!"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Amp => write!(f, "&"),
            Token::Pipe => write!(f, "|"),
            Token::Caret => write!(f, "^"),
            Token::Shl => write!(f, "<<"),
            Token::Shr => write!(f, ">>"),
            Token::Lt => write!(f, "<"),
            Token::LtEq => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::GtEq => write!(f, ">="),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::AmpAmp => write!(f, "&&"),
            Token::PipePipe => write!(f, "||"),
            Token::PlusPlus => write!(f, "++"),
            Token::MinusMinus => write!(f, "--"),
            Token::Eq => write!(f, "="),
            Token::PlusEq => write!(f, "+="),
            Token::MinusEq => write!(f, "-="),
            Token::StarEq => write!(f, "*="),
            Token::SlashEq => write!(f, "/="),
            Token::PercentEq => write!(f, "%="),
            Token::AmpEq => write!(f, "&="),
            Token::PipeEq => write!(f, "|="),
            Token::CaretEq => write!(f, "^="),
            Token::ShlEq => write!(f, "<<="),
            Token::ShrEq => write!(f, ">>="),
            Token::KwInt => write!(f, "int"),
            Token::KwLong => write!(f, "long"),
            Token::KwUnsigned => write!(f, "unsigned"),
            Token::KwVoid => write!(f, "void"),
            Token::KwStatic => write!(f, "static"),
            Token::KwReturn => write!(f, "return"),
            Token::KwIf => write!(f, "if"),
            Token::KwElse => write!(f, "else"),
            Token::KwDo => write!(f, "do"),
            Token::KwWhile => write!(f, "while"),
            Token::KwFor => write!(f, "for"),
            Token::KwBreak => write!(f, "break"),
            Token::KwContinue => write!(f, "continue"),
            Token::Identifier(sym) => write!(f, "{}", sym),
            Token::IntegerLiteral(v) => write!(f, "{}", v),
            Token::Eof => write!(f, "<eof>"),
        }
    }
}
