//! The lexer: character stream → token sequence.
//!
//! Scanning is maximal-munch over a hand-written state machine. Multi-
//! character punctuation is disambiguated with one byte of lookahead (two
//! for the shift-assignment operators `<<=`/`>>=`).

use crate::cursor::Cursor;
use crate::error::{LexError, LexResult};
use crate::token::Token;
use nanoc_util::Symbol;

pub struct Lexer<'a> {
    cursor: Cursor<'a>,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    /// Tokenize the entire source, ending with a single `Eof` token.
    pub fn tokenize(source: &'a str) -> LexResult<Vec<Token>> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token()?;
            let is_eof = matches!(tok, Token::Eof);
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    pub fn next_token(&mut self) -> LexResult<Token> {
        self.skip_trivia();

        if self.cursor.is_eof() {
            return Ok(Token::Eof);
        }

        let start = self.cursor.pos();
        let b = self.cursor.peek();

        if b.is_ascii_digit() {
            return self.lex_number(start);
        }
        if is_ident_start(b) {
            return Ok(self.lex_identifier());
        }

        self.cursor.advance();
        let tok = match b {
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b'{' => Token::LBrace,
            b'}' => Token::RBrace,
            b';' => Token::Semicolon,
            b',' => Token::Comma,
            b'?' => Token::Question,
            b':' => Token::Colon,
            b'~' => Token::Tilde,
            b'!' => self.one_or_two(b'=', Token::Bang, Token::NotEq),
            b'+' => {
                if self.eat(b'+') {
                    Token::PlusPlus
                } else {
                    self.one_or_two(b'=', Token::Plus, Token::PlusEq)
                }
            }
            b'-' => {
                if self.eat(b'-') {
                    Token::MinusMinus
                } else {
                    self.one_or_two(b'=', Token::Minus, Token::MinusEq)
                }
            }
            b'*' => self.one_or_two(b'=', Token::Star, Token::StarEq),
            b'/' => self.one_or_two(b'=', Token::Slash, Token::SlashEq),
            b'%' => self.one_or_two(b'=', Token::Percent, Token::PercentEq),
            b'^' => self.one_or_two(b'=', Token::Caret, Token::CaretEq),
            b'&' => {
                if self.eat(b'&') {
                    Token::AmpAmp
                } else {
                    self.one_or_two(b'=', Token::Amp, Token::AmpEq)
                }
            }
            b'|' => {
                if self.eat(b'|') {
                    Token::PipePipe
                } else {
                    self.one_or_two(b'=', Token::Pipe, Token::PipeEq)
                }
            }
            b'<' => {
                if self.eat(b'<') {
                    self.one_or_two(b'=', Token::Shl, Token::ShlEq)
                } else {
                    self.one_or_two(b'=', Token::Lt, Token::LtEq)
                }
            }
            b'>' => {
                if self.eat(b'>') {
                    self.one_or_two(b'=', Token::Shr, Token::ShrEq)
                } else {
                    self.one_or_two(b'=', Token::Gt, Token::GtEq)
                }
            }
            b'=' => self.one_or_two(b'=', Token::Eq, Token::EqEq),
            _ => {
                return Err(LexError::UnrecognizedToken {
                    snippet: self.cursor.snippet(start),
                })
            }
        };
        Ok(tok)
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.cursor.peek() == expected {
            self.cursor.advance();
            true
        } else {
            false
        }
    }

    fn one_or_two(&mut self, second: u8, one: Token, two: Token) -> Token {
        if self.eat(second) {
            two
        } else {
            one
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.cursor.peek() {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.cursor.advance();
                }
                b'/' if self.cursor.peek_at(1) == b'/' => {
                    while !self.cursor.is_eof() && self.cursor.peek() != b'\n' {
                        self.cursor.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_number(&mut self, start: usize) -> LexResult<Token> {
        while self.cursor.peek().is_ascii_digit() {
            self.cursor.advance();
        }
        // A literal immediately followed by a letter or underscore is
        // rejected outright: numeric type suffixes are not supported.
        if is_ident_start(self.cursor.peek()) {
            while is_ident_continue(self.cursor.peek()) {
                self.cursor.advance();
            }
            return Err(LexError::UnrecognizedToken {
                snippet: self.cursor.snippet(start),
            });
        }
        let digits = self.cursor.text(start, self.cursor.pos());
        let value: i64 = digits
            .parse()
            .map_err(|_| LexError::UnrecognizedToken {
                snippet: digits.to_string(),
            })?;
        Ok(Token::IntegerLiteral(value))
    }

    fn lex_identifier(&mut self) -> Token {
        let start = self.cursor.pos();
        while is_ident_continue(self.cursor.peek()) {
            self.cursor.advance();
        }
        let word = self.cursor.text(start, self.cursor.pos());
        Token::keyword(word).unwrap_or_else(|| Token::Identifier(Symbol::intern(word)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Token> {
        Lexer::tokenize(src).expect("lex should succeed")
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        assert_eq!(
            toks("int main"),
            vec![
                Token::KwInt,
                Token::Identifier(Symbol::intern("main")),
                Token::Eof
            ]
        );
    }

    #[test]
    fn lexes_integer_literal() {
        assert_eq!(toks("42"), vec![Token::IntegerLiteral(42), Token::Eof]);
    }

    #[test]
    fn disambiguates_compound_operators_with_lookahead() {
        assert_eq!(
            toks("<<= >>= << >> <= >= == != && || ++ --"),
            vec![
                Token::ShlEq,
                Token::ShrEq,
                Token::Shl,
                Token::Shr,
                Token::LtEq,
                Token::GtEq,
                Token::EqEq,
                Token::NotEq,
                Token::AmpAmp,
                Token::PipePipe,
                Token::PlusPlus,
                Token::MinusMinus,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(
            toks("1 // comment with + - * symbols\n2"),
            vec![
                Token::IntegerLiteral(1),
                Token::IntegerLiteral(2),
                Token::Eof
            ]
        );
    }

    #[test]
    fn rejects_numeric_literal_with_suffix() {
        assert!(Lexer::tokenize("123abc").is_err());
    }

    #[test]
    fn rejects_unknown_character() {
        assert!(Lexer::tokenize("$").is_err());
    }

    #[test]
    fn round_trip_matches_canonical_formatting() {
        let source = "int foo(int a, long b) { return a + b * 2 - (a << 1) ; }";
        let first = Lexer::tokenize(source).unwrap();
        let rendered = first
            .iter()
            .filter(|t| !matches!(t, Token::Eof))
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let second = Lexer::tokenize(&rendered).unwrap();
        assert_eq!(first, second);
    }

    // ------------------------------------------------------------------
    // Property-based tests over arbitrary inputs
    // ------------------------------------------------------------------

    #[test]
    fn property_arbitrary_identifiers_lex_to_a_single_token() {
        use proptest::prelude::*;

        proptest!(|(input in "[a-zA-Z_][a-zA-Z0-9_]{0,30}")| {
            let tokens = toks(&input);
            prop_assert_eq!(tokens.len(), 2); // the identifier/keyword, then Eof
            if Token::keyword(&input).is_none() {
                prop_assert!(matches!(tokens[0], Token::Identifier(_)));
            }
        });
    }

    #[test]
    fn property_arbitrary_decimal_literals_lex_to_a_single_token() {
        use proptest::prelude::*;

        proptest!(|(input in "[0-9]{1,18}")| {
            let tokens = toks(&input);
            prop_assert_eq!(tokens.len(), 2);
            prop_assert!(matches!(tokens[0], Token::IntegerLiteral(_)));
        });
    }

    #[test]
    fn property_roundtrip_lex_display_lex_is_stable() {
        use proptest::prelude::*;

        proptest!(|(a in 0i64..1_000_000, b in 0i64..1_000_000)| {
            let source = format!("{} + {} * 2", a, b);
            let first = Lexer::tokenize(&source).unwrap();
            let rendered = first
                .iter()
                .filter(|t| !matches!(t, Token::Eof))
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            let second = Lexer::tokenize(&rendered).unwrap();
            prop_assert_eq!(first, second);
        });
    }
}
