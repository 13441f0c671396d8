//! Extraction runs: locate INSERT statements and parse their value lists.
//!
//! A statement whose value list cannot be parsed is logged and recorded in
//! [`ExtractReport::failures`]; the scan carries on with the next line.
//! Errors reading the dump end the run.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::dump::DumpLines;
use crate::error::{ExtractError, Result};
use crate::locator::{locate_inserts, ColumnRef, KeyFilter, LocatorOptions, DEFAULT_SCHEMA};
use crate::schema::{read_table_schema, TableSchema};
use crate::values::FieldValue;

/// Options for one extraction run
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Path to the UTF-16LE dump
    pub dump_path: PathBuf,
    /// Schema qualifier, normally `dbo`
    pub schema: String,
    /// Table to extract
    pub table: String,
    /// Maximum number of rows
    pub limit: Option<usize>,
    /// Only rows whose column equals a value
    pub key: Option<KeyFilter>,
}

impl ExtractOptions {
    pub fn new(dump_path: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            dump_path: dump_path.into(),
            schema: DEFAULT_SCHEMA.to_string(),
            table: table.into(),
            limit: None,
            key: None,
        }
    }

    fn locator_options(&self) -> LocatorOptions {
        LocatorOptions {
            schema: self.schema.clone(),
            table: self.table.clone(),
            limit: self.limit,
            key: self.key.clone(),
            table_schema: None,
        }
    }
}

/// A parsed row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRow {
    pub line_number: usize,
    pub fields: Vec<FieldValue>,
}

/// Outcome of an extraction run
#[derive(Debug, Default)]
pub struct ExtractReport {
    pub table: String,
    pub rows: Vec<ExtractedRow>,
    /// Statements that matched but could not be parsed
    pub failures: Vec<ExtractError>,
}

impl ExtractReport {
    /// No statement matched at all (neither rows nor failures)
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.failures.is_empty()
    }
}

/// Locate and parse rows from any line source
pub fn extract_rows<I>(lines: I, options: &LocatorOptions) -> Result<ExtractReport>
where
    I: IntoIterator<Item = Result<String>>,
{
    let mut report = ExtractReport {
        table: options.table.clone(),
        ..Default::default()
    };

    for stmt in locate_inserts(lines, options.clone()) {
        let stmt = stmt?;
        match stmt.fields() {
            Ok(fields) => report.rows.push(ExtractedRow {
                line_number: stmt.line_number,
                fields,
            }),
            Err(e) => {
                warn!(table = %options.table, line = stmt.line_number, error = %e, "Skipping malformed row");
                report.failures.push(e);
            }
        }
    }

    info!(
        table = %options.table,
        rows = report.rows.len(),
        failures = report.failures.len(),
        "Extraction complete"
    );
    Ok(report)
}

/// Read the column list of a table straight from a dump file
pub fn read_schema_from_file(path: &Path, schema: &str, table: &str) -> Result<Option<TableSchema>> {
    read_table_schema(DumpLines::open(path)?, schema, table)
}

/// Run an extraction against a dump file.
///
/// A key given by column name is resolved through each statement's column
/// list, falling back to the table's `CREATE TABLE`, which is read in a
/// first pass that stops at the end of that statement.
pub fn run_extract(options: &ExtractOptions) -> Result<ExtractReport> {
    let mut locator = options.locator_options();
    if matches!(
        options.key,
        Some(KeyFilter {
            column: ColumnRef::Named(_),
            ..
        })
    ) {
        locator.table_schema =
            read_schema_from_file(&options.dump_path, &options.schema, &options.table)?;
    }

    info!(
        dump = %options.dump_path.display(),
        table = %options.table,
        limit = ?options.limit,
        "Starting extraction"
    );
    extract_rows(DumpLines::open(&options.dump_path)?, &locator)
}

/// Rows of `table` whose `column` equals `value`, e.g. a member's transactions
pub fn rows_for_key(
    dump_path: &Path,
    table: &str,
    column: &str,
    value: &str,
) -> Result<ExtractReport> {
    let options = ExtractOptions {
        key: Some(KeyFilter::named(column, value)),
        ..ExtractOptions::new(dump_path, table)
    };
    run_extract(&options)
}
