//! Recursive descent parser that turns formula text into an [`Expr`].
//!
//! Grammar, with the usual precedence and left-associative binary operators:
//!
//! ```text
//! expression := term (('+' | '-') term)*
//! term       := factor (('*' | '/') factor)*
//! factor     := '-' factor | primary
//! primary    := NUMBER | VARIABLE | '(' expression ')'
//! VARIABLE   := '{' IDENTIFIER '}'
//! IDENTIFIER := [A-Za-z_][A-Za-z0-9_]*
//! ```
//!
//! The parser knows nothing about which variables are defined; that check
//! belongs to evaluation and to [`undefined_variables`](crate::variables::undefined_variables).

use serde::{Deserialize, Serialize};

use crate::ast::{BinaryOp, Expr};
use crate::error::{PricingError, Result};
use crate::lexer::{Lexer, Spanned, Token};
use crate::options::EngineOptions;

/// Parses a formula with the default [`EngineOptions`].
pub fn parse(formula: &str) -> Result<Expr> {
    parse_with(formula, &EngineOptions::default())
}

/// Parses a formula using the limits from `options`.
pub fn parse_with(formula: &str, options: &EngineOptions) -> Result<Expr> {
    Parser::new(formula, options)?.parse()
}

/// Outcome of a syntax-only check, shaped for live inline feedback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxReport {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyntaxReport {
    pub fn valid() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(error: &PricingError) -> Self {
        Self {
            valid: false,
            error: Some(error.to_string()),
        }
    }
}

/// Checks formula syntax without a binding table. Never fails; problems are
/// reported through the returned [`SyntaxReport`].
pub fn validate_formula_syntax(formula: &str) -> SyntaxReport {
    validate_formula_syntax_with(formula, &EngineOptions::default())
}

/// [`validate_formula_syntax`] with explicit limits.
pub fn validate_formula_syntax_with(formula: &str, options: &EngineOptions) -> SyntaxReport {
    match parse_with(formula, options) {
        Ok(_) => SyntaxReport::valid(),
        Err(error) => SyntaxReport::invalid(&error),
    }
}

/// Holds the lexer, the lookahead token and nesting counters.
pub struct Parser {
    lexer: Lexer,
    current: Spanned,
    depth: usize,
    open_parens: usize,
    max_depth: usize,
}

impl Parser {
    /// Creates a parser and reads the first token.
    ///
    /// Blank input and input over the length limit are rejected here, before
    /// any token is produced.
    pub fn new(formula: &str, options: &EngineOptions) -> Result<Self> {
        if formula.trim().is_empty() {
            return Err(PricingError::EmptyFormula);
        }
        if formula.chars().count() > options.max_formula_length {
            return Err(PricingError::FormulaTooLong {
                limit: options.max_formula_length,
            });
        }

        let mut lexer = Lexer::new(formula);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            depth: 0,
            open_parens: 0,
            max_depth: options.max_nesting_depth,
        })
    }

    /// Parses the whole input; leftover tokens are an error.
    pub fn parse(&mut self) -> Result<Expr> {
        let expr = self.parse_expression()?;

        match self.current.token {
            Token::End => Ok(expr),
            Token::RParen => Err(PricingError::MismatchedParentheses),
            _ => Err(PricingError::unexpected_token(self.current_text())),
        }
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn current_text(&self) -> String {
        self.lexer.text(self.current.start, self.current.end)
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(PricingError::NestingTooDeep {
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.current.token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Subtract,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_term()?;
            left = Expr::binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut left = self.parse_factor()?;

        loop {
            let op = match self.current.token {
                Token::Star => BinaryOp::Multiply,
                Token::Slash => BinaryOp::Divide,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_factor()?;
            left = Expr::binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr> {
        if self.current.token != Token::Minus {
            return self.parse_primary();
        }

        self.enter()?;
        self.advance()?;
        let operand = self.parse_factor()?;
        self.leave();
        Ok(Expr::negate(operand))
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match &self.current.token {
            Token::Number(value) => {
                let value = *value;
                self.advance()?;
                Ok(Expr::Number(value))
            }
            Token::Variable(key) => {
                let key = key.clone();
                self.advance()?;
                Ok(Expr::Variable(key))
            }
            Token::LParen => self.parse_group(),
            Token::End => Err(PricingError::UnexpectedEnd),
            Token::RParen if self.open_parens == 0 => Err(PricingError::MismatchedParentheses),
            Token::Plus | Token::Minus | Token::Star | Token::Slash | Token::RParen => {
                Err(PricingError::invalid_syntax(self.current_text()))
            }
        }
    }

    /// Parses `'(' expression ')'`; the current token is the opening paren.
    fn parse_group(&mut self) -> Result<Expr> {
        self.enter()?;
        self.open_parens += 1;
        self.advance()?;

        let inner = self.parse_expression()?;

        match self.current.token {
            Token::RParen => {
                self.advance()?;
                self.open_parens -= 1;
                self.leave();
                Ok(inner)
            }
            Token::End => Err(PricingError::MismatchedParentheses),
            _ => Err(PricingError::unexpected_token(self.current_text())),
        }
    }
}
