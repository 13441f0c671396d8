//! Value-list parsing
//!
//! Splits the text between the parentheses of a `VALUES (...)` clause into
//! positional [`FieldValue`]s. The text is tokenized with the MsSql dialect
//! and each field is recognised in this order:
//!
//! 1. a string literal, `N'...'` (or plain `'...'`); a doubled quote inside
//!    the literal stands for one quote character,
//! 2. the `NULL` keyword,
//! 3. a numeric literal with an optional sign, or `CAST(<literal> AS <type>)`
//!    whose inner literal is taken as the field value.
//!
//! Commas separate fields only at the top level, so commas inside string
//! literals or inside a cast's type parameters (`Decimal(18, 2)`) are part
//! of the field.

use std::fmt;

use sqlparser::dialect::MsSqlDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer};
use thiserror::Error;

/// One positional field of an INSERT row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// String literal content, quotes removed and unescaped
    Text(String),
    /// Numeric literal text as written (`1500.00` keeps its scale)
    Number(String),
    /// `NULL`
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Literal payload of a text or number field; `None` for `NULL`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Number(s) => Some(s),
            FieldValue::Null => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Number(n) => n.parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => n.parse().ok(),
            _ => None,
        }
    }

    /// Compare against a user-supplied value.
    ///
    /// Numbers also match when numerically equal (`42` matches `42.00`).
    /// `NULL` matches nothing.
    pub fn matches(&self, expected: &str) -> bool {
        match self {
            FieldValue::Text(s) => s == expected,
            FieldValue::Number(n) => {
                n == expected
                    || matches!(
                        (n.parse::<f64>(), expected.trim().parse::<f64>()),
                        (Ok(a), Ok(b)) if a == b
                    )
            }
            FieldValue::Null => false,
        }
    }

    /// Render back to a T-SQL literal
    pub fn to_sql(&self) -> String {
        match self {
            FieldValue::Text(s) => format!("N'{}'", s.replace('\'', "''")),
            FieldValue::Number(n) => n.clone(),
            FieldValue::Null => "NULL".to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) | FieldValue::Number(s) => f.write_str(s),
            FieldValue::Null => f.write_str("NULL"),
        }
    }
}

/// A value list that does not follow the recognised literal shapes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field {field}: {message}")]
pub struct ValueListError {
    /// 0-based ordinal of the field being parsed when the error occurred
    pub field: usize,
    pub message: String,
}

impl ValueListError {
    fn new(field: usize, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

type ParseResult<T> = std::result::Result<T, ValueListError>;

/// Parse the raw text of a value list (without the surrounding parentheses)
pub fn parse_value_list(raw: &str) -> ParseResult<Vec<FieldValue>> {
    let dialect = MsSqlDialect {};
    let tokens = Tokenizer::new(&dialect, raw)
        .tokenize()
        .map_err(|e| ValueListError::new(0, format!("tokenizer error: {e}")))?;

    let tokens: Vec<Token> = tokens
        .into_iter()
        .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
        .collect();
    if tokens.is_empty() {
        return Err(ValueListError::new(0, "empty value list"));
    }

    let mut parser = ValueListParser { tokens, pos: 0 };
    let mut fields = Vec::new();
    loop {
        let field = parser.parse_field(fields.len())?;
        fields.push(field);
        match parser.next() {
            None => break,
            Some(Token::Comma) => continue,
            Some(Token::RParen) => {
                return Err(ValueListError::new(
                    fields.len() - 1,
                    "unbalanced parentheses: unexpected ')'",
                ))
            }
            Some(other) => {
                return Err(ValueListError::new(
                    fields.len() - 1,
                    format!("expected ',' after field, found `{other}`"),
                ))
            }
        }
    }
    Ok(fields)
}

/// Render fields back into value-list text that parses to the same fields
pub fn render_value_list(fields: &[FieldValue]) -> String {
    fields
        .iter()
        .map(FieldValue::to_sql)
        .collect::<Vec<_>>()
        .join(", ")
}

struct ValueListParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ValueListParser {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_field(&mut self, field: usize) -> ParseResult<FieldValue> {
        match self.next() {
            Some(Token::NationalStringLiteral(s)) | Some(Token::SingleQuotedString(s)) => {
                Ok(FieldValue::Text(s))
            }
            Some(Token::Word(w)) if w.quote_style.is_none() && w.keyword == Keyword::NULL => {
                Ok(FieldValue::Null)
            }
            Some(Token::Number(n, _)) => Ok(FieldValue::Number(n)),
            Some(Token::Minus) => self.parse_signed(field, "-"),
            Some(Token::Plus) => self.parse_signed(field, ""),
            Some(Token::Word(w)) if w.quote_style.is_none() && w.keyword == Keyword::CAST => {
                self.parse_cast(field)
            }
            Some(Token::Comma) | None => Err(ValueListError::new(field, "empty field")),
            Some(Token::LParen) | Some(Token::RParen) => Err(ValueListError::new(
                field,
                "unbalanced parentheses: unexpected parenthesis where a literal was expected",
            )),
            Some(other) => Err(ValueListError::new(
                field,
                format!("unrecognized literal `{other}`"),
            )),
        }
    }

    fn parse_signed(&mut self, field: usize, sign: &str) -> ParseResult<FieldValue> {
        match self.next() {
            Some(Token::Number(n, _)) => Ok(FieldValue::Number(format!("{sign}{n}"))),
            _ => Err(ValueListError::new(field, "sign not followed by a number")),
        }
    }

    /// `CAST(<literal> AS <type>)`; the CAST keyword is already consumed.
    fn parse_cast(&mut self, field: usize) -> ParseResult<FieldValue> {
        if self.next() != Some(Token::LParen) {
            return Err(ValueListError::new(field, "expected '(' after CAST"));
        }
        let inner = self.parse_field(field)?;
        match self.next() {
            Some(Token::Word(w)) if w.keyword == Keyword::AS => {}
            _ => return Err(ValueListError::new(field, "expected AS inside CAST")),
        }

        // Skip the target type, including its parameter list.
        let mut depth = 0usize;
        let mut type_tokens = 0usize;
        loop {
            match self.next() {
                Some(Token::LParen) => depth += 1,
                Some(Token::RParen) if depth == 0 => break,
                Some(Token::RParen) => depth -= 1,
                Some(_) => {}
                None => {
                    return Err(ValueListError::new(
                        field,
                        "unbalanced parentheses: unterminated CAST",
                    ))
                }
            }
            type_tokens += 1;
        }
        if type_tokens == 0 {
            return Err(ValueListError::new(field, "CAST without a target type"));
        }
        Ok(inner)
    }
}
