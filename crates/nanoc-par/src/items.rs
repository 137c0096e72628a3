//! Top-level item parsing and the shared declaration grammar used both at
//! file scope and inside blocks.
//!
//! Function vs. variable is classified with fixed lookahead: consume the
//! optional `static`, the type, and the name, then branch on whether a `(`
//! follows.

use nanoc_lex::Token;

use crate::ast::{CType, Declaration, Function, Item, Param, Program};
use crate::error::{ParseError, ParseResult};
use crate::parser::Parser;

impl Parser {
    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let mut items = Vec::new();
        while !self.at_eof() {
            items.push(self.parse_item()?);
        }
        Ok(items)
    }

    fn parse_item(&mut self) -> ParseResult<Item> {
        let (is_static, ty) = self.parse_storage_and_type()?;
        let name = self.expect_identifier()?;
        if *self.peek() == Token::LParen {
            Ok(Item::Function(self.parse_function_rest(name, ty, is_static)?))
        } else {
            Ok(Item::Declaration(
                self.parse_declaration_rest(name, ty, is_static)?,
            ))
        }
    }

    /// Declarations inside a block or a `for` initializer share this
    /// grammar exactly; only the enclosing context differs.
    pub(crate) fn parse_declaration(&mut self) -> ParseResult<Declaration> {
        let (is_static, ty) = self.parse_storage_and_type()?;
        let name = self.expect_identifier()?;
        self.parse_declaration_rest(name, ty, is_static)
    }

    fn parse_storage_and_type(&mut self) -> ParseResult<(bool, CType)> {
        let is_static = self.eat(&Token::KwStatic);
        let ty = self.parse_type()?;
        Ok((is_static, ty))
    }

    fn parse_type(&mut self) -> ParseResult<CType> {
        match self.advance() {
            Token::KwInt => Ok(CType::Int),
            Token::KwLong => Ok(CType::Long),
            Token::KwUnsigned => {
                if self.eat(&Token::KwLong) {
                    Ok(CType::ULong)
                } else {
                    self.eat(&Token::KwInt);
                    Ok(CType::UInt)
                }
            }
            other => Err(ParseError::ExpectedToken {
                expected: "a type".to_string(),
                found: other,
            }),
        }
    }

    fn parse_function_rest(
        &mut self,
        name: nanoc_util::Symbol,
        ret_type: CType,
        is_static: bool,
    ) -> ParseResult<Function> {
        self.expect(Token::LParen)?;
        let params = self.parse_params()?;
        self.expect(Token::RParen)?;
        let body = self.parse_block()?;
        Ok(Function {
            name,
            ret_type,
            params,
            body,
            is_static,
        })
    }

    fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        if *self.peek() == Token::RParen {
            return Ok(Vec::new());
        }
        if *self.peek() == Token::KwVoid && *self.peek_at(1) == Token::RParen {
            self.advance();
            return Ok(Vec::new());
        }
        let mut params = Vec::new();
        loop {
            let ty = self.parse_type()?;
            let name = self.expect_identifier()?;
            params.push(Param { name, ty });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(params)
    }

    fn parse_declaration_rest(
        &mut self,
        name: nanoc_util::Symbol,
        ty: CType,
        is_static: bool,
    ) -> ParseResult<Declaration> {
        let init = if self.eat(&Token::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(Token::Semicolon)?;
        Ok(Declaration {
            name,
            ty,
            init,
            is_static,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nanoc_lex::Lexer;

    fn parse(src: &str) -> Program {
        let tokens = Lexer::tokenize(src).unwrap();
        Parser::new(tokens).parse_program().unwrap()
    }

    #[test]
    fn classifies_function_vs_variable_by_lookahead() {
        let program = parse("int x; int main(void) { return x; }");
        assert!(matches!(program[0], Item::Declaration(_)));
        assert!(matches!(program[1], Item::Function(_)));
    }

    #[test]
    fn function_with_empty_parens_has_no_params() {
        let program = parse("int foo() { return 0; }");
        match &program[0] {
            Item::Function(f) => assert!(f.params.is_empty()),
            _ => panic!("expected a function"),
        }
    }

    #[test]
    fn unsigned_alone_means_unsigned_int() {
        let program = parse("unsigned x;");
        match &program[0] {
            Item::Declaration(d) => assert_eq!(d.ty, CType::UInt),
            _ => panic!("expected a declaration"),
        }
    }

    #[test]
    fn static_function_is_marked() {
        let program = parse("static int helper(void) { return 0; }");
        match &program[0] {
            Item::Function(f) => assert!(f.is_static),
            _ => panic!("expected a function"),
        }
    }

    #[test]
    fn multi_parameter_function_signature() {
        let program = parse("int add(int a, long b, unsigned c) { return a; }");
        match &program[0] {
            Item::Function(f) => {
                assert_eq!(f.params.len(), 3);
                assert_eq!(f.params[1].ty, CType::Long);
            }
            _ => panic!("expected a function"),
        }
    }
}
