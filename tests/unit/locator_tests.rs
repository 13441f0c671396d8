//! INSERT locator tests

use dump_extract::dump::text_lines;
use dump_extract::{locate_inserts, ExtractError, FieldValue, KeyFilter, LocatorOptions};

use crate::common::{CountingLines, ROSELYN_SAMPLE};

const FIVE_TRANSACTIONS: &str = "CREATE TABLE [dbo].[Transaction] ([Id] [int], [Amount] [decimal](18, 2), [MemberId] [int])
INSERT [dbo].[Transaction] ([Id], [Amount], [MemberId]) VALUES (1, CAST(1500.00 AS Decimal(18, 2)), 42)
INSERT [dbo].[Transaction] ([Id], [Amount], [MemberId]) VALUES (2, CAST(20.00 AS Decimal(18, 2)), 7)
INSERT [dbo].[Transaction] ([Id], [Amount], [MemberId]) VALUES (3, CAST(30.00 AS Decimal(18, 2)), 42)
INSERT [dbo].[Transaction] ([Id], [Amount], [MemberId]) VALUES (4, CAST(40.00 AS Decimal(18, 2)), 7)
INSERT [dbo].[Transaction] ([Id], [Amount], [MemberId]) VALUES (5, CAST(50.00 AS Decimal(18, 2)), 42)";

#[test]
fn test_limit_stops_reading_source() {
    let (lines, pulled) = CountingLines::new(FIVE_TRANSACTIONS);
    let found: Vec<_> = locate_inserts(lines, LocatorOptions::new("Transaction").with_limit(2))
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(found.len(), 2);
    // The CREATE TABLE line plus the two matching inserts; the last three are never read.
    assert_eq!(pulled.get(), 3);
}

#[test]
fn test_unlimited_reads_everything() {
    let (lines, pulled) = CountingLines::new(FIVE_TRANSACTIONS);
    let found = locate_inserts(lines, LocatorOptions::new("Transaction")).count();
    assert_eq!(found, 5);
    assert_eq!(pulled.get(), 6);
}

#[test]
fn test_no_matches_is_empty_not_error() {
    let mut locator = locate_inserts(text_lines(FIVE_TRANSACTIONS), LocatorOptions::new("Contact"));
    assert!(locator.next().is_none());
    assert_eq!(locator.lines_scanned(), 6);
}

#[test]
fn test_first_value_key_finds_specific_row() {
    let options = LocatorOptions::new("Transaction")
        .with_key(KeyFilter::first_value("4"))
        .with_limit(1);
    let found: Vec<_> = locate_inserts(text_lines(FIVE_TRANSACTIONS), options)
        .map(|s| s.unwrap())
        .collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].line_number, 5);
}

#[test]
fn test_member_key_by_name() {
    let options = LocatorOptions::new("Transaction").with_key(KeyFilter::named("MemberId", "42"));
    let ids: Vec<FieldValue> = locate_inserts(text_lines(FIVE_TRANSACTIONS), options)
        .map(|s| s.unwrap().fields().unwrap()[0].clone())
        .collect();
    assert_eq!(
        ids,
        vec![
            FieldValue::Number("1".to_string()),
            FieldValue::Number("3".to_string()),
            FieldValue::Number("5".to_string()),
        ]
    );
}

#[test]
fn test_keyed_locator_skips_malformed_rows() {
    let options = LocatorOptions::new("Contact").with_key(KeyFilter::named("MemberId", "42"));
    let found: Vec<_> = locate_inserts(text_lines(ROSELYN_SAMPLE), options)
        .map(|s| s.unwrap().line_number)
        .collect();
    assert_eq!(found, vec![52, 54]);
}

#[test]
fn test_read_error_is_passed_through_and_ends_scan() {
    let lines = vec![
        Ok("INSERT [dbo].[Member] ([Id]) VALUES (1)".to_string()),
        Err(ExtractError::Encoding {
            path: "roselyn.sql".into(),
            message: "invalid UTF-16LE sequence".to_string(),
        }),
        Ok("INSERT [dbo].[Member] ([Id]) VALUES (2)".to_string()),
    ];
    let results: Vec<_> = locate_inserts(lines, LocatorOptions::new("Member")).collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(ExtractError::Encoding { .. })));
}

#[test]
fn test_custom_schema_qualifier() {
    let dump = "INSERT [legacy].[Member] ([Id]) VALUES (1)\nINSERT [dbo].[Member] ([Id]) VALUES (2)";
    let found: Vec<_> = locate_inserts(
        text_lines(dump),
        LocatorOptions::new("Member").with_schema("legacy"),
    )
    .map(|s| s.unwrap().line_number)
    .collect();
    assert_eq!(found, vec![1]);
}

#[test]
fn test_unterminated_literal_keeps_limit_short_circuit() {
    let mut dump = String::from(
        "INSERT [dbo].[Contact] ([Id], [Phone], [MemberId]) VALUES (1, N'555, 42)\n",
    );
    for id in 2..1000 {
        dump.push_str(&format!(
            "INSERT [dbo].[Contact] ([Id], [Phone], [MemberId]) VALUES ({id}, N'555-{id}', 42)\n"
        ));
    }
    let (lines, pulled) = CountingLines::new(&dump);
    let found: Vec<_> = locate_inserts(lines, LocatorOptions::new("Contact").with_limit(2))
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(found.len(), 2);
    assert!(found[0].fields().is_err());
    assert_eq!(found[1].line_number, 2);
    assert_eq!(found[1].fields().unwrap()[0], FieldValue::Number("2".to_string()));
    assert_eq!(pulled.get(), 2);
}
