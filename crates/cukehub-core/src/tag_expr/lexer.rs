//! Splits a tag expression into tags, keywords and parentheses.
//!
//! Keywords are matched case-insensitively, so `@fast Or not @wip` is valid.

use super::TagExprError;

#[derive(Clone, Debug)]
pub(super) struct Token {
    pub(super) kind: TokenKind,
    pub(super) start: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum TokenKind {
    Tag(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
    End,
}

impl TokenKind {
    pub(super) fn describe(&self) -> String {
        match self {
            Self::Tag(tag) => tag.clone(),
            Self::And => "'and'".to_string(),
            Self::Or => "'or'".to_string(),
            Self::Not => "'not'".to_string(),
            Self::LParen => "'('".to_string(),
            Self::RParen => "')'".to_string(),
            Self::End => "<end>".to_string(),
        }
    }
}

pub(super) struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub(super) fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub(super) fn next_token(&mut self) -> Result<Token, TagExprError> {
        self.take_while(char::is_whitespace);
        let start = self.pos;
        let Some(ch) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::End,
                start,
            });
        };
        let kind = match ch {
            '(' => {
                self.pos += 1;
                TokenKind::LParen
            }
            ')' => {
                self.pos += 1;
                TokenKind::RParen
            }
            '@' => {
                self.pos += 1;
                let name = self.take_while(is_tag_char);
                if name.is_empty() {
                    return Err(TagExprError::new(start + 1, "expected tag name after '@'"));
                }
                TokenKind::Tag(format!("@{name}"))
            }
            c if c.is_ascii_alphabetic() => {
                let word = self.take_while(|c| c.is_ascii_alphabetic());
                match word.to_ascii_lowercase().as_str() {
                    "and" => TokenKind::And,
                    "or" => TokenKind::Or,
                    "not" => TokenKind::Not,
                    _ => {
                        return Err(TagExprError::new(
                            start,
                            format!("unexpected identifier '{word}'"),
                        ));
                    }
                }
            }
            other => {
                return Err(TagExprError::new(
                    start,
                    format!("unexpected character '{other}'"),
                ));
            }
        };
        Ok(Token { kind, start })
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos..).and_then(|rest| rest.chars().next())
    }

    /// Consume characters while `pred` holds and return the consumed text.
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek().filter(|c| pred(*c)) {
            self.pos += ch.len_utf8();
        }
        self.input.get(start..self.pos).unwrap_or_default()
    }
}

fn is_tag_char(ch: char) -> bool {
    !ch.is_whitespace() && !matches!(ch, '(' | ')' | '@')
}
