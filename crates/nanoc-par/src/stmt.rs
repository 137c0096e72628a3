//! Statement and block parsing.

use nanoc_lex::Token;

use crate::ast::{Block, BlockItem, ForInit, Stmt};
use crate::error::ParseResult;
use crate::parser::Parser;

impl Parser {
    pub(crate) fn parse_block(&mut self) -> ParseResult<Block> {
        self.expect(Token::LBrace)?;
        let mut items = Vec::new();
        while *self.peek() != Token::RBrace {
            items.push(self.parse_block_item()?);
        }
        self.expect(Token::RBrace)?;
        Ok(items)
    }

    fn parse_block_item(&mut self) -> ParseResult<BlockItem> {
        if self.starts_declaration() {
            Ok(BlockItem::Declaration(self.parse_declaration()?))
        } else {
            Ok(BlockItem::Statement(self.parse_stmt()?))
        }
    }

    fn starts_declaration(&self) -> bool {
        matches!(
            self.peek(),
            Token::KwInt | Token::KwLong | Token::KwUnsigned | Token::KwStatic
        )
    }

    pub(crate) fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        match self.peek() {
            Token::KwReturn => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(Token::Semicolon)?;
                Ok(Stmt::Return(expr))
            }
            Token::LBrace => Ok(Stmt::Compound(self.parse_block()?)),
            Token::KwIf => {
                self.advance();
                self.expect(Token::LParen)?;
                let cond = self.parse_expr()?;
                self.expect(Token::RParen)?;
                let then_branch = Box::new(self.parse_stmt()?);
                let else_branch = if self.eat(&Token::KwElse) {
                    Some(Box::new(self.parse_stmt()?))
                } else {
                    None
                };
                Ok(Stmt::If {
                    cond,
                    then_branch,
                    else_branch,
                })
            }
            Token::KwWhile => {
                self.advance();
                self.expect(Token::LParen)?;
                let cond = self.parse_expr()?;
                self.expect(Token::RParen)?;
                let body = Box::new(self.parse_stmt()?);
                Ok(Stmt::While { cond, body })
            }
            Token::KwDo => {
                self.advance();
                let body = Box::new(self.parse_stmt()?);
                self.expect(Token::KwWhile)?;
                self.expect(Token::LParen)?;
                let cond = self.parse_expr()?;
                self.expect(Token::RParen)?;
                self.expect(Token::Semicolon)?;
                Ok(Stmt::DoWhile { body, cond })
            }
            Token::KwFor => {
                self.advance();
                self.expect(Token::LParen)?;
                let init = self.parse_for_init()?;
                let cond = if *self.peek() == Token::Semicolon {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(Token::Semicolon)?;
                let post = if *self.peek() == Token::RParen {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(Token::RParen)?;
                let body = Box::new(self.parse_stmt()?);
                Ok(Stmt::For {
                    init,
                    cond,
                    post,
                    body,
                })
            }
            Token::KwBreak => {
                self.advance();
                self.expect(Token::Semicolon)?;
                Ok(Stmt::Break)
            }
            Token::KwContinue => {
                self.advance();
                self.expect(Token::Semicolon)?;
                Ok(Stmt::Continue)
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect(Token::Semicolon)?;
                Ok(Stmt::Expression(expr))
            }
        }
    }

    fn parse_for_init(&mut self) -> ParseResult<ForInit> {
        if self.starts_declaration() {
            Ok(ForInit::Declaration(self.parse_declaration()?))
        } else if *self.peek() == Token::Semicolon {
            self.advance();
            Ok(ForInit::Expression(None))
        } else {
            let expr = self.parse_expr()?;
            self.expect(Token::Semicolon)?;
            Ok(ForInit::Expression(Some(expr)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nanoc_lex::Lexer;

    fn parse_one_stmt(src: &str) -> Stmt {
        let tokens = Lexer::tokenize(src).unwrap();
        Parser::new(tokens).parse_stmt().unwrap()
    }

    #[test]
    fn parses_for_with_declaration_init_and_omitted_post() {
        let stmt = parse_one_stmt("for (int i = 0; i < 10;) continue;");
        match stmt {
            Stmt::For {
                init, cond, post, ..
            } => {
                assert!(matches!(init, ForInit::Declaration(_)));
                assert!(cond.is_some());
                assert!(post.is_none());
            }
            _ => panic!("expected a for loop"),
        }
    }

    #[test]
    fn dangling_else_binds_to_nearest_if() {
        let stmt = parse_one_stmt("if (1) if (2) return 1; else return 2;");
        match stmt {
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                assert!(else_branch.is_none());
                assert!(matches!(*then_branch, Stmt::If { else_branch: Some(_), .. }));
            }
            _ => panic!("expected an if statement"),
        }
    }
}
