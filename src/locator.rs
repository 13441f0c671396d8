//! INSERT statement location
//!
//! [`InsertLocator`] pulls lines from a dump one at a time and yields the
//! `INSERT [<schema>].[<table>] ... VALUES (...)` statements for one table.
//! It stops pulling lines once the configured number of matches has been
//! produced, so asking for a handful of samples from a dump with millions of
//! lines only reads up to the last sample.

use sqlparser::dialect::MsSqlDialect;
use sqlparser::tokenizer::{Token, Tokenizer};
use tracing::{debug, warn};

use crate::error::{ExtractError, Result};
use crate::schema::TableSchema;
use crate::util::{
    contains_ci, find_matching_paren, normalize_identifier, starts_with_ci, ParenScanner,
};
use crate::values::{parse_value_list, FieldValue};

/// Schema qualifier SSMS writes for every object in the legacy dumps
pub const DEFAULT_SCHEMA: &str = "dbo";

/// Line prefixes that begin a new statement in an SSMS script
const STATEMENT_STARTS: [&str; 4] = [
    "INSERT [",
    "INSERT INTO [",
    "CREATE TABLE",
    "SET IDENTITY_INSERT",
];

/// True when a trimmed line opens a new statement or is a batch separator
fn starts_statement(trimmed: &str) -> bool {
    trimmed.eq_ignore_ascii_case("GO")
        || STATEMENT_STARTS.iter().any(|p| starts_with_ci(trimmed, p))
}

/// Column used by a [`KeyFilter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    /// 0-based position within the value list
    Ordinal(usize),
    /// Column name, resolved through the statement's column list or a [`TableSchema`]
    Named(String),
}

/// Restricts a locator to rows whose column equals a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFilter {
    pub column: ColumnRef,
    pub value: String,
}

impl KeyFilter {
    /// Match on the first positional value, usually the row's identifier
    pub fn first_value(value: impl Into<String>) -> Self {
        Self {
            column: ColumnRef::Ordinal(0),
            value: value.into(),
        }
    }

    pub fn ordinal(ordinal: usize, value: impl Into<String>) -> Self {
        Self {
            column: ColumnRef::Ordinal(ordinal),
            value: value.into(),
        }
    }

    pub fn named(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: ColumnRef::Named(column.into()),
            value: value.into(),
        }
    }
}

/// What to look for in a dump
#[derive(Debug, Clone)]
pub struct LocatorOptions {
    /// Schema qualifier (`dbo`)
    pub schema: String,
    /// Target table
    pub table: String,
    /// Stop after this many matches
    pub limit: Option<usize>,
    /// Only yield rows matching this key
    pub key: Option<KeyFilter>,
    /// Column order used to resolve named keys when a statement has no column list
    pub table_schema: Option<TableSchema>,
}

impl LocatorOptions {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            schema: DEFAULT_SCHEMA.to_string(),
            table: table.into(),
            limit: None,
            key: None,
            table_schema: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_key(mut self, key: KeyFilter) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_table_schema(mut self, table_schema: TableSchema) -> Self {
        self.table_schema = Some(table_schema);
        self
    }

    fn prefixes(&self) -> [String; 2] {
        [
            format!("INSERT [{}].[{}]", self.schema, self.table),
            format!("INSERT INTO [{}].[{}]", self.schema, self.table),
        ]
    }
}

/// One matched INSERT statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    pub table: String,
    /// 1-based line the statement starts on
    pub line_number: usize,
    /// Statement text; contains line breaks when a string literal spans lines
    pub text: String,
}

impl InsertStatement {
    fn malformed(&self, message: impl Into<String>) -> ExtractError {
        ExtractError::MalformedValueList {
            table: self.table.clone(),
            line: self.line_number,
            text: self.text.clone(),
            message: message.into(),
        }
    }

    /// Byte offset of the top-level `VALUES` keyword
    fn values_keyword(&self) -> Option<usize> {
        let text = self.text.as_str();
        let bytes = text.as_bytes();
        let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
        let mut scanner = ParenScanner::new();
        for (i, c) in text.char_indices() {
            if scanner.at_top_level()
                && (c == 'V' || c == 'v')
                && starts_with_ci(&text[i..], "VALUES")
                && (i == 0 || !is_ident(bytes[i - 1]))
                && bytes.get(i + 6).map_or(true, |b| !is_ident(*b))
            {
                return Some(i);
            }
            scanner.step(c);
        }
        None
    }

    /// Raw text between the outermost parentheses following `VALUES`
    pub fn value_list(&self) -> Result<&str> {
        let keyword = self
            .values_keyword()
            .ok_or_else(|| self.malformed("no VALUES clause"))?;
        let after = keyword + "VALUES".len();
        let open = after
            + self.text[after..]
                .find(|c: char| !c.is_whitespace())
                .ok_or_else(|| self.malformed("VALUES without a value list"))?;
        if !self.text[open..].starts_with('(') {
            return Err(self.malformed("expected '(' after VALUES"));
        }
        let close = find_matching_paren(&self.text, open)
            .ok_or_else(|| self.malformed("unbalanced parentheses"))?;

        let tail = self.text[close + 1..].trim();
        if !tail.is_empty() && tail != ";" {
            return Err(self.malformed(format!("unexpected text after value list: {tail}")));
        }
        Ok(&self.text[open + 1..close])
    }

    /// Parsed fields of the value list
    pub fn fields(&self) -> Result<Vec<FieldValue>> {
        let raw = self.value_list()?;
        parse_value_list(raw).map_err(|e| self.malformed(e.to_string()))
    }

    /// Explicit column list, e.g. `([Id], [Amount], [MemberId])`, when present
    pub fn columns(&self) -> Option<Vec<String>> {
        let keyword = self.values_keyword()?;
        let head = &self.text[..keyword];
        let mut scanner = ParenScanner::new();
        let mut open = None;
        for (i, c) in head.char_indices() {
            if c == '(' && scanner.at_top_level() {
                open = Some(i);
                break;
            }
            scanner.step(c);
        }
        let open = open?;
        let close = find_matching_paren(head, open)?;

        let dialect = MsSqlDialect {};
        let tokens = Tokenizer::new(&dialect, &head[open + 1..close])
            .tokenize()
            .ok()?;
        let names: Vec<String> = tokens
            .into_iter()
            .filter_map(|t| match t {
                Token::Word(w) => Some(w.value),
                _ => None,
            })
            .collect();
        (!names.is_empty()).then_some(names)
    }

    /// Ordinal of a named column according to this statement's column list
    pub fn column_ordinal(&self, column: &str) -> Option<usize> {
        let wanted = normalize_identifier(column);
        self.columns()?
            .iter()
            .position(|c| c.eq_ignore_ascii_case(&wanted))
    }
}

/// Lazy, short-circuiting iterator over matching INSERT statements.
///
/// Not restartable; a new scan needs a new line source.
pub struct InsertLocator<I> {
    lines: I,
    options: LocatorOptions,
    prefixes: [String; 2],
    line_number: usize,
    /// Line read while joining a statement but belonging to the next one
    held_back: Option<String>,
    matched: usize,
    done: bool,
}

impl<I> InsertLocator<I>
where
    I: Iterator<Item = Result<String>>,
{
    pub fn new(lines: I, options: LocatorOptions) -> Self {
        let prefixes = options.prefixes();
        Self {
            lines,
            options,
            prefixes,
            line_number: 0,
            held_back: None,
            matched: 0,
            done: false,
        }
    }

    /// Lines consumed so far
    pub fn lines_scanned(&self) -> usize {
        self.line_number
    }

    pub fn options(&self) -> &LocatorOptions {
        &self.options
    }

    fn is_candidate(&self, trimmed: &str) -> bool {
        self.prefixes.iter().any(|p| starts_with_ci(trimmed, p)) && contains_ci(trimmed, "VALUES")
    }

    fn resolve_ordinal(&self, stmt: &InsertStatement, column: &ColumnRef) -> Result<usize> {
        match column {
            ColumnRef::Ordinal(n) => Ok(*n),
            ColumnRef::Named(name) => stmt
                .column_ordinal(name)
                .or_else(|| {
                    self.options
                        .table_schema
                        .as_ref()
                        .and_then(|s| s.ordinal_of(name))
                })
                .ok_or_else(|| ExtractError::UnknownColumn {
                    table: self.options.table.clone(),
                    column: name.clone(),
                }),
        }
    }

    fn key_matches(&self, stmt: &InsertStatement, key: &KeyFilter) -> Result<bool> {
        let ordinal = self.resolve_ordinal(stmt, &key.column)?;
        let fields = stmt.fields()?;
        Ok(fields.get(ordinal).is_some_and(|f| f.matches(&key.value)))
    }

    /// Next line, taking a held-back line before pulling from the source
    fn next_line(&mut self) -> Option<Result<String>> {
        let line = match self.held_back.take() {
            Some(line) => Ok(line),
            None => self.lines.next()?,
        };
        if line.is_ok() {
            self.line_number += 1;
        }
        Some(line)
    }

    /// Read the rest of a statement whose string literal continues on the next line.
    ///
    /// Physical lines keep their `\r`, so joining with `\n` restores the
    /// original line break inside the literal. A line that starts a new
    /// statement ends the join and is held back; the statement is then left
    /// with an open quote and reports as malformed.
    fn join_continuation(&mut self, text: &mut String) -> Result<()> {
        let mut scanner = ParenScanner::new();
        scanner.feed(text);
        while scanner.in_quote() {
            let more = match self.next_line() {
                Some(more) => more?,
                None => break,
            };
            if starts_statement(more.trim()) {
                self.line_number -= 1;
                self.held_back = Some(more);
                break;
            }
            text.push('\n');
            text.push_str(&more);
            scanner.feed("\n");
            scanner.feed(&more);
        }
        let trimmed_len = text.trim_end().len();
        text.truncate(trimmed_len);
        Ok(())
    }
}

impl<I> Iterator for InsertLocator<I>
where
    I: Iterator<Item = Result<String>>,
{
    type Item = Result<InsertStatement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.options.limit.is_some_and(|limit| self.matched >= limit) {
            self.done = true;
            return None;
        }

        loop {
            let line = match self.next_line() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Some(Ok(line)) => line,
            };

            if !self.is_candidate(line.trim()) {
                continue;
            }

            let start_line = self.line_number;
            let mut text = line.trim_start().to_string();
            if let Err(e) = self.join_continuation(&mut text) {
                self.done = true;
                return Some(Err(e));
            }
            let stmt = InsertStatement {
                table: self.options.table.clone(),
                line_number: start_line,
                text,
            };

            if let Some(key) = &self.options.key {
                match self.key_matches(&stmt, key) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(e) if e.is_line_error() => {
                        warn!(line = start_line, error = %e, "Skipping unparseable row while matching key");
                        continue;
                    }
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                }
            }

            self.matched += 1;
            debug!(
                table = %stmt.table,
                line = start_line,
                matched = self.matched,
                "Matched INSERT statement"
            );
            return Some(Ok(stmt));
        }
    }
}

/// Locate INSERT statements for `options.table` in a line source
pub fn locate_inserts<I>(lines: I, options: LocatorOptions) -> InsertLocator<I::IntoIter>
where
    I: IntoIterator<Item = Result<String>>,
{
    InsertLocator::new(lines.into_iter(), options)
}
