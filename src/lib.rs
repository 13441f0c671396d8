//! dump-extract: row extraction from legacy SQL Server script dumps
//!
//! Reads UTF-16LE exports made of `CREATE TABLE` / `INSERT` statements,
//! lists the tables they contain, and pulls rows of a table out as
//! positional field lists for migration into another store.

pub mod discovery;
pub mod dump;
pub mod error;
pub mod extract;
pub mod locator;
pub mod logging;
pub mod schema;
pub mod util;
pub mod values;

pub use discovery::{discover_tables, table_inventory, TableSummary};
pub use dump::{load_dump, DumpDocument, DumpLines};
pub use error::{ExtractError, Result};
pub use extract::{
    extract_rows, read_schema_from_file, rows_for_key, run_extract, ExtractOptions, ExtractReport,
    ExtractedRow,
};
pub use locator::{
    locate_inserts, ColumnRef, InsertLocator, InsertStatement, KeyFilter, LocatorOptions,
};
pub use schema::{read_table_schema, ColumnDef, TableSchema};
pub use values::{parse_value_list, render_value_list, FieldValue, ValueListError};
