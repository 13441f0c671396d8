//! Table discovery
//!
//! Lists the tables a dump refers to through `CREATE TABLE [schema].[Name]`
//! or `INSERT [schema].[Name]` lines, in first-seen order.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::error::Result;

/// Bracket-qualified table reference at the start of a statement line
static TABLE_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(CREATE\s+TABLE|INSERT(?:\s+INTO)?)\s+\[([^\]]+)\]\.\[([^\]]+)\]")
        .expect("Invalid table reference regex")
});

/// Per-table counts gathered while scanning a dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub schema: String,
    pub name: String,
    /// A `CREATE TABLE` for this table was seen
    pub declared: bool,
    /// Number of INSERT lines for this table
    pub insert_lines: usize,
}

/// Scan every line and summarise each referenced table
pub fn table_inventory<I>(lines: I) -> Result<Vec<TableSummary>>
where
    I: IntoIterator<Item = Result<String>>,
{
    let mut tables: Vec<TableSummary> = Vec::new();
    // Keyed case-insensitively, matching how the locator compares names.
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut scanned = 0usize;

    for line in lines {
        let line = line?;
        scanned += 1;
        let Some(caps) = TABLE_REF_RE.captures(&line) else {
            continue;
        };
        let is_create = caps[1].to_ascii_uppercase().starts_with("CREATE");
        let schema = &caps[2];
        let name = &caps[3];
        let key = (schema.to_ascii_lowercase(), name.to_ascii_lowercase());

        let slot = *index.entry(key).or_insert_with(|| {
            tables.push(TableSummary {
                schema: schema.to_string(),
                name: name.to_string(),
                declared: false,
                insert_lines: 0,
            });
            tables.len() - 1
        });
        let summary = &mut tables[slot];
        if is_create {
            summary.declared = true;
        } else {
            summary.insert_lines += 1;
        }
    }

    info!(lines = scanned, tables = tables.len(), "Table discovery complete");
    Ok(tables)
}

/// Distinct table names in first-seen order.
///
/// Names differing only in case, or only in schema, are listed once with
/// the spelling seen first.
pub fn discover_tables<I>(lines: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = Result<String>>,
{
    let mut seen = HashSet::new();
    Ok(table_inventory(lines)?
        .into_iter()
        .filter(|t| seen.insert(t.name.to_ascii_lowercase()))
        .map(|t| t.name)
        .collect())
}
