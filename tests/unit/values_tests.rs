//! Value-list parsing tests

use pretty_assertions::assert_eq;

use dump_extract::{parse_value_list, render_value_list, FieldValue, InsertStatement};

fn text(s: &str) -> FieldValue {
    FieldValue::Text(s.to_string())
}

fn num(s: &str) -> FieldValue {
    FieldValue::Number(s.to_string())
}

fn statement(text: &str) -> InsertStatement {
    InsertStatement {
        table: "Transaction".to_string(),
        line_number: 7,
        text: text.to_string(),
    }
}

// ============================================================================
// Field shapes
// ============================================================================

#[test]
fn test_embedded_comma_yields_three_fields() {
    let stmt = statement("INSERT [dbo].[Member] ([Id], [FullName], [JoinedOn]) VALUES (1, N'Smith, John', NULL)");
    let fields = stmt.fields().unwrap();
    assert_eq!(fields, vec![num("1"), text("Smith, John"), FieldValue::Null]);
}

#[test]
fn test_cast_decimal_is_numeric_payload() {
    let stmt = statement(
        "INSERT [dbo].[Transaction] ([Id], [Amount], [MemberId]) VALUES (1, CAST(1500.00 AS Decimal(18, 2)), 42)",
    );
    let fields = stmt.fields().unwrap();
    assert_eq!(fields[1], num("1500.00"));
    assert_eq!(fields[1].to_string(), "1500.00");
    assert_eq!(fields[2].as_i64(), Some(42));
}

#[test]
fn test_field_count_and_order_preserved() {
    let raw = "7, N'a', NULL, -1, CAST(0.10 AS Decimal(5, 2)), N'', 0, N'z'";
    let fields = parse_value_list(raw).unwrap();
    assert_eq!(
        fields,
        vec![
            num("7"),
            text("a"),
            FieldValue::Null,
            num("-1"),
            num("0.10"),
            text(""),
            num("0"),
            text("z"),
        ]
    );
}

#[test]
fn test_parentheses_inside_strings_are_literal() {
    let fields = parse_value_list("N'(draft', N'closed)', N'a, (b), c'").unwrap();
    assert_eq!(fields, vec![text("(draft"), text("closed)"), text("a, (b), c")]);
}

#[test]
fn test_unicode_text_survives() {
    let fields = parse_value_list("N'Peña Ñandú', N'日本'").unwrap();
    assert_eq!(fields, vec![text("Peña Ñandú"), text("日本")]);
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn test_rendered_value_lists_parse_to_same_fields() {
    let originals = [
        "1, N'Smith, John', NULL",
        "2, N'O''Neil, Mary', CAST(N'2015-06-01T00:00:00.000' AS DateTime)",
        "3, CAST(-75.25 AS Decimal(18, 2)), 42, 2, N'Withdrawal, partial'",
        "4, N'it''s ''quoted''', N'', -0",
    ];
    for original in originals {
        let fields = parse_value_list(original).unwrap();
        let rendered = render_value_list(&fields);
        let reparsed = parse_value_list(&rendered).unwrap();
        assert_eq!(reparsed, fields, "round trip changed fields of: {original}");
    }
}

// ============================================================================
// Malformed input
// ============================================================================

#[test]
fn test_malformed_statement_reports_context() {
    let stmt = statement("INSERT [dbo].[Transaction] ([Id], [Amount]) VALUES (1, CAST(1500.00 AS Decimal(18, 2))");
    let err = stmt.fields().unwrap_err();
    match err {
        dump_extract::ExtractError::MalformedValueList {
            table, line, text, ..
        } => {
            assert_eq!(table, "Transaction");
            assert_eq!(line, 7);
            assert!(text.contains("CAST(1500.00"));
        }
        other => panic!("Expected MalformedValueList, got {other:?}"),
    }
}

#[test]
fn test_function_call_is_not_a_literal() {
    let err = parse_value_list("1, GETDATE()").unwrap_err();
    assert_eq!(err.field, 1);
}

#[test]
fn test_missing_values_clause() {
    let stmt = statement("INSERT [dbo].[Transaction] ([Id]) SELECT 1");
    assert!(stmt.fields().is_err());
}
