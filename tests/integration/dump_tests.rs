//! Dump loading tests against files on disk

use std::path::Path;

use dump_extract::{load_dump, DumpLines, ExtractError};

use crate::common::{DumpFixture, ROSELYN_SAMPLE};

#[test]
fn test_load_whole_dump() {
    let fixture = DumpFixture::roselyn();
    let doc = load_dump(&fixture.path).unwrap();
    assert_eq!(doc.text(), ROSELYN_SAMPLE);
    assert_eq!(doc.line_count(), 54);
    assert_eq!(doc.path(), fixture.path.as_path());
}

#[test]
fn test_streaming_and_whole_document_agree() {
    let fixture = DumpFixture::roselyn();
    let doc = load_dump(&fixture.path).unwrap();
    let whole: Vec<String> = doc.lines().collect::<Result<_, _>>().unwrap();

    let mut stream = DumpLines::open(&fixture.path).unwrap();
    let streamed: Vec<String> = stream.by_ref().collect::<Result<_, _>>().unwrap();

    assert_eq!(streamed, whole);
    assert_eq!(stream.lines_read(), 54);
    // CRLF dump: the `\r` stays on each line.
    assert!(streamed.iter().all(|l| l.ends_with('\r')));
}

#[test]
fn test_utf8_dump_is_an_encoding_error() {
    let fixture = DumpFixture::raw(ROSELYN_SAMPLE.as_bytes());
    let err = load_dump(&fixture.path).unwrap_err();
    assert!(matches!(err, ExtractError::Encoding { .. }));
    assert!(err.to_string().contains("roselyn.sql"));

    let mut stream = DumpLines::open(&fixture.path).unwrap();
    assert!(matches!(stream.next(), Some(Err(ExtractError::Encoding { .. }))));
    assert!(stream.next().is_none());
}

#[test]
fn test_missing_dump_is_file_not_found() {
    let err = load_dump(Path::new("/definitely/not/here/roselyn.sql")).unwrap_err();
    match err {
        ExtractError::FileNotFound { path } => {
            assert!(path.ends_with("roselyn.sql"));
        }
        other => panic!("Expected FileNotFound, got {other:?}"),
    }
}
