//! Column lists from `CREATE TABLE` statements
//!
//! INSERT rows are positional; this module recovers a table's column order
//! from its `CREATE TABLE` so a column such as `MemberId` can be located by
//! name for the dump at hand rather than by a hard-coded ordinal.

use sqlparser::dialect::MsSqlDialect;
use sqlparser::tokenizer::{Token, Tokenizer};
use tracing::debug;

use crate::error::{ExtractError, Result};
use crate::util::{find_matching_paren, normalize_identifier, starts_with_ci, ParenScanner};

/// Leading words of table-level elements that are not column definitions
const TABLE_ELEMENT_KEYWORDS: &[&str] = &[
    "CONSTRAINT",
    "PRIMARY",
    "UNIQUE",
    "FOREIGN",
    "CHECK",
    "INDEX",
    "PERIOD",
];

/// A column definition from a `CREATE TABLE` body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    /// Declared type without brackets, e.g. `int`, `decimal(18, 2)`
    pub data_type: String,
}

/// Ordered columns of one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnDef>,
    /// 1-based line of the `CREATE TABLE` statement
    pub line_number: usize,
}

impl TableSchema {
    /// 0-based ordinal of a column, matched case-insensitively with or without brackets
    pub fn ordinal_of(&self, column: &str) -> Option<usize> {
        let wanted = normalize_identifier(column);
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(&wanted))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Parse the full text of a `CREATE TABLE` statement
    pub fn from_create_table(
        schema: &str,
        table: &str,
        text: &str,
        line_number: usize,
    ) -> Result<Self> {
        let malformed = |message: &str| ExtractError::MalformedSchema {
            table: table.to_string(),
            line: line_number,
            message: message.to_string(),
        };

        let open = body_start(text).ok_or_else(|| malformed("missing column list"))?;
        let close = find_matching_paren(text, open)
            .ok_or_else(|| malformed("unbalanced parentheses in column list"))?;

        let dialect = MsSqlDialect {};
        let tokens = Tokenizer::new(&dialect, &text[open + 1..close])
            .tokenize()
            .map_err(|e| malformed(&e.to_string()))?;

        let columns = split_elements(tokens)
            .into_iter()
            .filter_map(column_from_element)
            .collect::<Vec<_>>();
        if columns.is_empty() {
            return Err(malformed("no column definitions"));
        }

        Ok(Self {
            schema: schema.to_string(),
            name: table.to_string(),
            columns,
            line_number,
        })
    }
}

/// Byte offset of the `(` that opens the column list
fn body_start(text: &str) -> Option<usize> {
    let mut scanner = ParenScanner::new();
    for (i, c) in text.char_indices() {
        if c == '(' && scanner.at_top_level() {
            return Some(i);
        }
        scanner.step(c);
    }
    None
}

/// Split body tokens into top-level, comma-separated elements
fn split_elements(tokens: Vec<Token>) -> Vec<Vec<Token>> {
    let mut elements = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0usize;
    for token in tokens {
        match token {
            Token::Whitespace(_) => continue,
            Token::Comma if depth == 0 => {
                elements.push(std::mem::take(&mut current));
                continue;
            }
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            _ => {}
        }
        current.push(token);
    }
    if !current.is_empty() {
        elements.push(current);
    }
    elements
}

fn column_from_element(element: Vec<Token>) -> Option<ColumnDef> {
    let mut tokens = element.into_iter();
    let name = match tokens.next()? {
        Token::Word(w) => {
            if w.quote_style.is_none()
                && TABLE_ELEMENT_KEYWORDS
                    .iter()
                    .any(|k| w.value.eq_ignore_ascii_case(k))
            {
                return None;
            }
            w.value
        }
        _ => return None,
    };

    let mut data_type = String::new();
    if let Some(Token::Word(w)) = tokens.next() {
        data_type.push_str(&w.value);
        if let Some(Token::LParen) = tokens.next() {
            let params: Vec<String> = tokens
                .by_ref()
                .take_while(|t| *t != Token::RParen)
                .filter(|t| *t != Token::Comma)
                .map(|t| t.to_string())
                .collect();
            data_type.push_str(&format!("({})", params.join(", ")));
        }
    }

    Some(ColumnDef { name, data_type })
}

/// Find and parse `CREATE TABLE [<schema>].[<table>]` in a line source.
///
/// Stops pulling lines as soon as that statement is complete. Returns
/// `Ok(None)` when the dump never declares the table.
pub fn read_table_schema<I>(lines: I, schema: &str, table: &str) -> Result<Option<TableSchema>>
where
    I: IntoIterator<Item = Result<String>>,
{
    let prefix = format!("CREATE TABLE [{schema}].[{table}]");
    let mut lines = lines.into_iter();
    let mut line_number = 0usize;

    while let Some(line) = lines.next() {
        let line = line?;
        line_number += 1;
        if !starts_with_ci(line.trim_start(), &prefix) {
            continue;
        }

        let start_line = line_number;
        let mut text = line.trim().to_string();
        let mut scanner = ParenScanner::new();
        scanner.feed(&text);
        while !scanner.is_closed() {
            match lines.next() {
                Some(more) => {
                    let more = more?;
                    line_number += 1;
                    text.push('\n');
                    text.push_str(&more);
                    scanner.feed("\n");
                    scanner.feed(&more);
                }
                None => break,
            }
        }

        let parsed = TableSchema::from_create_table(schema, table, &text, start_line)?;
        debug!(
            table = %parsed.name,
            columns = parsed.columns.len(),
            line = start_line,
            "Read table schema"
        );
        return Ok(Some(parsed));
    }

    Ok(None)
}
