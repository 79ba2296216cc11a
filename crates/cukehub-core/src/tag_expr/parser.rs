//! Recursive-descent parser producing an [`Expr`] tree.
//!
//! Grammar:
//!
//! ```text
//! or      := and ("or" and)*
//! and     := not ("and" not)*
//! not     := "not" not | primary
//! primary := TAG | "(" or ")"
//! ```
//!
//! Nesting and operator counts are bounded so neither parsing nor evaluation
//! can exhaust the stack.

use super::lexer::{Lexer, Token, TokenKind};
use super::{Expr, TagExprError};

/// Deepest `not` or parenthesis nesting accepted.
pub(super) const MAX_NESTING: usize = 128;
/// Most `and`, `or` and `not` operators accepted in one expression.
pub(super) const MAX_OPERATORS: usize = 1024;

pub(super) struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    depth: usize,
    operators: usize,
}

#[derive(Clone, Copy)]
enum Binary {
    Or,
    And,
}

impl Binary {
    fn matches(self, kind: &TokenKind) -> bool {
        match self {
            Self::Or => *kind == TokenKind::Or,
            Self::And => *kind == TokenKind::And,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Or => "or",
            Self::And => "and",
        }
    }

    fn build(self, lhs: Expr, rhs: Expr) -> Expr {
        match self {
            Self::Or => Expr::Or(Box::new(lhs), Box::new(rhs)),
            Self::And => Expr::And(Box::new(lhs), Box::new(rhs)),
        }
    }
}

impl<'a> Parser<'a> {
    pub(super) fn new(input: &'a str) -> Result<Self, TagExprError> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            depth: 0,
            operators: 0,
        })
    }

    pub(super) fn parse_expression(&mut self) -> Result<Expr, TagExprError> {
        self.parse_binary(Binary::Or)
    }

    pub(super) fn expect_end(&self) -> Result<(), TagExprError> {
        if self.current.kind == TokenKind::End {
            Ok(())
        } else {
            Err(TagExprError::new(
                self.current.start,
                format!("unexpected token {}", self.current.kind.describe()),
            ))
        }
    }

    fn advance(&mut self) -> Result<(), TagExprError> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn enter(&mut self, start: usize) -> Result<(), TagExprError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(TagExprError::new(
                start,
                format!("expression nests deeper than {MAX_NESTING} levels"),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn count_operator(&mut self, start: usize) -> Result<(), TagExprError> {
        self.operators += 1;
        if self.operators > MAX_OPERATORS {
            return Err(TagExprError::new(
                start,
                format!("expression has more than {MAX_OPERATORS} operators"),
            ));
        }
        Ok(())
    }

    fn parse_operand(&mut self, op: Binary) -> Result<Expr, TagExprError> {
        match op {
            Binary::Or => self.parse_binary(Binary::And),
            Binary::And => self.parse_not(),
        }
    }

    fn parse_binary(&mut self, op: Binary) -> Result<Expr, TagExprError> {
        let mut node = self.parse_operand(op)?;
        while op.matches(&self.current.kind) {
            self.count_operator(self.current.start)?;
            self.advance()?;
            if matches!(
                self.current.kind,
                TokenKind::Or | TokenKind::And | TokenKind::RParen | TokenKind::End
            ) {
                return Err(TagExprError::new(
                    self.current.start,
                    format!("expected tag or '(' after '{}'", op.name()),
                ));
            }
            let rhs = self.parse_operand(op)?;
            node = op.build(node, rhs);
        }
        Ok(node)
    }

    fn parse_not(&mut self) -> Result<Expr, TagExprError> {
        if self.current.kind == TokenKind::Not {
            let start = self.current.start;
            self.count_operator(start)?;
            self.enter(start)?;
            self.advance()?;
            let operand = self.parse_not()?;
            self.leave();
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, TagExprError> {
        let Token { kind, start } = self.current.clone();
        match kind {
            TokenKind::Tag(tag) => {
                self.advance()?;
                Ok(Expr::Tag(tag))
            }
            TokenKind::LParen => {
                self.enter(start)?;
                self.advance()?;
                let expr = self.parse_expression()?;
                if self.current.kind != TokenKind::RParen {
                    return Err(TagExprError::new(start, "missing ')'"));
                }
                self.advance()?;
                self.leave();
                Ok(expr)
            }
            TokenKind::End => Err(TagExprError::new(start, "expected tag or '('")),
            other => Err(TagExprError::new(
                start,
                format!("expected tag or '(' but found {}", other.describe()),
            )),
        }
    }
}
