//! CREATE TABLE column list tests

use pretty_assertions::assert_eq;

use dump_extract::dump::text_lines;
use dump_extract::read_table_schema;

use crate::common::ROSELYN_SAMPLE;

#[test]
fn test_member_id_ordinal_differs_per_table() {
    let transaction = read_table_schema(text_lines(ROSELYN_SAMPLE), "dbo", "Transaction")
        .unwrap()
        .unwrap();
    let contact = read_table_schema(text_lines(ROSELYN_SAMPLE), "dbo", "Contact")
        .unwrap()
        .unwrap();

    assert_eq!(transaction.ordinal_of("MemberId"), Some(2));
    assert_eq!(contact.ordinal_of("MemberId"), Some(5));
}

#[test]
fn test_member_columns_skip_primary_key_constraint() {
    let member = read_table_schema(text_lines(ROSELYN_SAMPLE), "dbo", "Member")
        .unwrap()
        .unwrap();
    assert_eq!(member.column_names(), vec!["Id", "FullName", "JoinedOn"]);
    assert_eq!(member.columns[1].data_type, "nvarchar(200)");
    assert_eq!(member.line_number, 5);
}

#[test]
fn test_schema_read_stops_after_statement() {
    let (lines, pulled) = crate::common::CountingLines::new(ROSELYN_SAMPLE);
    let member = read_table_schema(lines, "dbo", "Member").unwrap();
    assert!(member.is_some());
    // CREATE TABLE [dbo].[Member] ends on line 13.
    assert_eq!(pulled.get(), 13);
}
