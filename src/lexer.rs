//! Scans formula text into a stream of spanned tokens.
//!
//! The lexer is pull-based: the parser asks for one token at a time, so the
//! first problem reported is always the leftmost one in the formula.

use std::fmt;

use crate::error::{PricingError, Result};
use crate::variables::is_valid_identifier;

/// Tokens of the formula language.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// Non-negative numeric literal; a leading `-` is lexed as [`Token::Minus`].
    Number(f64),
    /// Contents of a `{key}` reference.
    Variable(String),
    /// `+`
    Plus,
    /// `-`, binary or unary depending on position.
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// End of input. Returned on every call once the text is exhausted.
    End,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Variable(key) => write!(f, "{{{}}}", key),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::End => write!(f, "end of formula"),
        }
    }
}

/// A token with the character range it was read from.
#[derive(Clone, Debug, PartialEq)]
pub struct Spanned {
    pub token: Token,
    /// Inclusive start, in characters.
    pub start: usize,
    /// Exclusive end, in characters.
    pub end: usize,
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    /// Returns the source text covered by a span.
    pub fn text(&self, start: usize, end: usize) -> String {
        self.chars[start.min(self.chars.len())..end.min(self.chars.len())]
            .iter()
            .collect()
    }

    /// Advances the lexer and returns the next token, or `Token::End` once
    /// the input is exhausted.
    pub fn next_token(&mut self) -> Result<Spanned> {
        self.skip_whitespace();
        let start = self.pos;

        let Some(&ch) = self.chars.get(self.pos) else {
            return Ok(Spanned {
                token: Token::End,
                start,
                end: start,
            });
        };

        let token = match ch {
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '*' => self.single(Token::Star),
            '/' => self.single(Token::Slash),
            '(' => self.single(Token::LParen),
            ')' => self.single(Token::RParen),
            '{' => self.read_variable()?,
            '}' => return Err(PricingError::invalid_reference("}")),
            c if c.is_ascii_digit() || c == '.' => self.read_number()?,
            character => {
                return Err(PricingError::InvalidCharacter {
                    character,
                    position: start,
                })
            }
        };

        Ok(Spanned {
            token,
            start,
            end: self.pos,
        })
    }

    fn single(&mut self, token: Token) -> Token {
        self.pos += 1;
        token
    }

    fn skip_whitespace(&mut self) {
        while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn read_number(&mut self) -> Result<Token> {
        let start = self.pos;
        let mut dots = 0usize;
        while let Some(&ch) = self.chars.get(self.pos) {
            match ch {
                '0'..='9' => {}
                '.' => dots += 1,
                _ => break,
            }
            self.pos += 1;
        }

        let literal = self.text(start, self.pos);
        if dots > 1 || literal == "." {
            return Err(PricingError::InvalidNumber { literal });
        }
        literal
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| PricingError::InvalidNumber { literal })
    }

    /// Reads `{identifier}`; the opening brace is at the current position.
    fn read_variable(&mut self) -> Result<Token> {
        let start = self.pos;
        self.pos += 1;
        let content_start = self.pos;

        while let Some(&ch) = self.chars.get(self.pos) {
            if ch == '}' || ch == '{' {
                break;
            }
            self.pos += 1;
        }

        let content = self.text(content_start, self.pos);
        let closed = self.chars.get(self.pos) == Some(&'}');
        if closed {
            self.pos += 1;
        }

        if closed && is_valid_identifier(&content) {
            Ok(Token::Variable(content))
        } else {
            let fragment = self.text(start, self.pos);
            Err(PricingError::invalid_reference(fragment.trim_end()))
        }
    }
}
