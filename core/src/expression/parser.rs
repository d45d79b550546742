//! Recursive-descent parser for the boolean expression language
//!
//! Precedence, lowest to highest: `||`, `&&`, `\!`, parenthesized group /
//! literal. Matches the short-circuit semantics of the legacy evaluator.

use thiserror::Error;

use super::lexer::Token;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token at position {0}")]
    UnexpectedToken(usize),

    #[error("trailing tokens after position {0}")]
    TrailingTokens(usize),
}

pub fn parse(tokens: &[Token]) -> Result<Expr, ParseError> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos != tokens.len() {
        return Err(ParseError::TrailingTokens(parser.pos));
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.peek() == Some(&Token::Not) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let pos = self.pos;
        match self.advance() {
            Some(Token::Name(name)) => Ok(Expr::Literal(name)),
            Some(Token::Open) => {
                let inner = self.parse_or()?;
                if self.advance() != Some(Token::Close) {
                    return Err(ParseError::UnexpectedToken(pos));
                }
                Ok(inner)
            }
            Some(_) => Err(ParseError::UnexpectedToken(pos)),
            None => Err(ParseError::UnexpectedEnd),
        }
    }
}
