//! Table discovery tests

use pretty_assertions::assert_eq;

use dump_extract::dump::text_lines;
use dump_extract::{discover_tables, table_inventory};

use crate::common::ROSELYN_SAMPLE;

#[test]
fn test_declared_tables_reported_once_each() {
    let dump = "CREATE TABLE [dbo].[Member] ([Id] [int] NOT NULL)
CREATE TABLE [dbo].[Transaction] ([Id] [int] NOT NULL)
INSERT [dbo].[Member] ([Id]) VALUES (1)
INSERT [dbo].[Member] ([Id]) VALUES (2)
INSERT [dbo].[Member] ([Id]) VALUES (3)";
    let tables = discover_tables(text_lines(dump)).unwrap();
    assert_eq!(tables, vec!["Member", "Transaction"]);
}

#[test]
fn test_sample_dump_tables_in_first_seen_order() {
    let tables = discover_tables(text_lines(ROSELYN_SAMPLE)).unwrap();
    assert_eq!(tables, vec!["Member", "Transaction", "Contact", "TransactionType"]);
}

#[test]
fn test_inventory_counts_rows_per_table() {
    let inventory = table_inventory(text_lines(ROSELYN_SAMPLE)).unwrap();
    let counts: Vec<(&str, bool, usize)> = inventory
        .iter()
        .map(|t| (t.name.as_str(), t.declared, t.insert_lines))
        .collect();
    assert_eq!(
        counts,
        vec![
            ("Member", true, 3),
            ("Transaction", true, 5),
            ("Contact", true, 3),
            ("TransactionType", true, 0),
        ]
    );
}

#[test]
fn test_set_identity_insert_is_not_a_table_reference() {
    let dump = "SET IDENTITY_INSERT [dbo].[Ledger] ON\nGO";
    assert!(discover_tables(text_lines(dump)).unwrap().is_empty());
}
