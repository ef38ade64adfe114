//! Condition tokenizer.
//!
//! The condition language is deliberately tiny: numeric and string
//! literals, `true`/`false`, uppercase-led symbol identifiers, the
//! comparison/arithmetic/logical operators, and parentheses. Anything
//! else is a lex error with a byte position.

use crate::error::{ConditionError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Str(String),
    /// Uppercase-led identifier, e.g. `STOCK` or `MAX_PURCHASE`.
    Ident(String),
    True,
    False,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Lt,
    Le,
    Gt,
    Ge,
    /// `==`, also spelled `===`.
    EqEq,
    /// `!=`, also spelled `!==`.
    NotEq,
    AndAnd,
    OrOr,
    Bang,
    LParen,
    RParen,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset into the condition text, for error reporting.
    pub pos: usize,
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            input: text.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> u8 {
        let byte = self.input[self.pos];
        self.pos += 1;
        byte
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn err(&self, pos: usize, message: impl Into<String>) -> ConditionError {
        ConditionError::Lex {
            pos,
            message: message.into(),
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
        let start = self.pos;
        let Some(byte) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                pos: start,
            });
        };

        let kind = match byte {
            b'0'..=b'9' => return self.lex_number(start),
            b'A'..=b'Z' => return self.lex_ident(start),
            b'a'..=b'z' => return self.lex_word(start),
            b'"' | b'\'' => return self.lex_string(start),
            b'(' => {
                self.advance();
                TokenKind::LParen
            }
            b')' => {
                self.advance();
                TokenKind::RParen
            }
            b'+' => {
                self.advance();
                TokenKind::Plus
            }
            b'-' => {
                self.advance();
                TokenKind::Minus
            }
            b'*' => {
                self.advance();
                TokenKind::Star
            }
            b'/' => {
                self.advance();
                TokenKind::Slash
            }
            b'%' => {
                self.advance();
                TokenKind::Percent
            }
            b'<' => {
                self.advance();
                if self.eat(b'=') {
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            b'>' => {
                self.advance();
                if self.eat(b'=') {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            b'=' => {
                self.advance();
                if !self.eat(b'=') {
                    return Err(self.err(start, "single '=' is not an operator, use '=='"));
                }
                // Tolerate the strict spelling '==='.
                self.eat(b'=');
                TokenKind::EqEq
            }
            b'!' => {
                self.advance();
                if self.eat(b'=') {
                    self.eat(b'=');
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            b'&' => {
                self.advance();
                if !self.eat(b'&') {
                    return Err(self.err(start, "single '&' is not an operator, use '&&'"));
                }
                TokenKind::AndAnd
            }
            b'|' => {
                self.advance();
                if !self.eat(b'|') {
                    return Err(self.err(start, "single '|' is not an operator, use '||'"));
                }
                TokenKind::OrOr
            }
            other => {
                return Err(self.err(
                    start,
                    format!("unexpected character '{}'", other as char),
                ))
            }
        };

        Ok(Token { kind, pos: start })
    }

    fn lex_number(&mut self, start: usize) -> Result<Token> {
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
            self.pos += 1;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        let text = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.err(start, "number is not valid UTF-8"))?;
        let value: f64 = text
            .parse()
            .map_err(|_| self.err(start, format!("bad number '{text}'")))?;
        Ok(Token {
            kind: TokenKind::Number(value),
            pos: start,
        })
    }

    fn lex_ident(&mut self, start: usize) -> Result<Token> {
        while matches!(self.peek(), Some(b'A'..=b'Z' | b'0'..=b'9' | b'_')) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.err(start, "identifier is not valid UTF-8"))?;
        Ok(Token {
            kind: TokenKind::Ident(text.to_string()),
            pos: start,
        })
    }

    fn lex_word(&mut self, start: usize) -> Result<Token> {
        while matches!(self.peek(), Some(b'a'..=b'z')) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.err(start, "word is not valid UTF-8"))?;
        let kind = match text {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            other => {
                return Err(self.err(
                    start,
                    format!("unknown word '{other}' (symbols are uppercase)"),
                ))
            }
        };
        Ok(Token { kind, pos: start })
    }

    fn lex_string(&mut self, start: usize) -> Result<Token> {
        let quote = self.advance();
        let content_start = self.pos;
        loop {
            match self.peek() {
                Some(b) if b == quote => break,
                Some(_) => self.pos += 1,
                None => return Err(self.err(start, "unterminated string literal")),
            }
        }
        let text = std::str::from_utf8(&self.input[content_start..self.pos])
            .map_err(|_| self.err(start, "string is not valid UTF-8"))?
            .to_string();
        self.advance();
        Ok(Token {
            kind: TokenKind::Str(text),
            pos: start,
        })
    }
}

/// Tokenize the whole condition text. The returned stream always ends
/// with a single [`TokenKind::Eof`].
pub fn lex(text: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(text);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        lex(text).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_a_typical_condition() {
        assert_eq!(
            kinds("STOCK < 1.1 * MAX_PURCHASE"),
            vec![
                TokenKind::Ident("STOCK".to_string()),
                TokenKind::Lt,
                TokenKind::Number(1.1),
                TokenKind::Star,
                TokenKind::Ident("MAX_PURCHASE".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_operators_and_aliases() {
        assert_eq!(
            kinds("== === != !== && || ! <= >="),
            vec![
                TokenKind::EqEq,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::NotEq,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Bang,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_string_literals_with_either_quote() {
        assert_eq!(
            kinds(r#"STATUS == "LOW STOCK""#),
            vec![
                TokenKind::Ident("STATUS".to_string()),
                TokenKind::EqEq,
                TokenKind::Str("LOW STOCK".to_string()),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("'sold out'"),
            vec![TokenKind::Str("sold out".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn lexes_boolean_keywords() {
        assert_eq!(
            kinds("true && false"),
            vec![
                TokenKind::True,
                TokenKind::AndAnd,
                TokenKind::False,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn rejects_single_equals_with_position() {
        let err = lex("STOCK = 5").unwrap_err();
        assert!(matches!(
            err,
            crate::error::ConditionError::Lex { pos: 6, .. }
        ));
    }

    #[test]
    fn rejects_unknown_words_and_characters() {
        assert!(lex("stock < 5").is_err());
        assert!(lex("STOCK ~ 5").is_err());
        assert!(lex("\"unterminated").is_err());
    }
}
