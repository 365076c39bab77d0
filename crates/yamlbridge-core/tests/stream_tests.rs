//! Multi-document streams: sequencing, end of stream, and error policy.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use yamlbridge_core::{DecodeOptions, Error, StreamDecoder, StreamEncoder};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Doc {
    test: u32,
}

#[test]
fn three_documents_then_end_of_stream() {
    let mut stream = StreamDecoder::from_str("---\ntest: 1\n---\ntest: 2\n---\ntest: 3\n");
    assert_eq!(stream.decode::<Doc>().unwrap(), Some(Doc { test: 1 }));
    assert_eq!(stream.decode::<Doc>().unwrap(), Some(Doc { test: 2 }));
    assert_eq!(stream.decode::<Doc>().unwrap(), Some(Doc { test: 3 }));
    assert_eq!(stream.decode::<Doc>().unwrap(), None);
    assert_eq!(stream.decode::<Doc>().unwrap(), None);
}

#[test]
fn leading_marker_is_optional() {
    let docs: Vec<Doc> = StreamDecoder::from_str("test: 1\n---\ntest: 2\n")
        .documents()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(docs, vec![Doc { test: 1 }, Doc { test: 2 }]);
}

#[test]
fn encoder_writes_markers_between_documents_only() {
    let mut encoder = StreamEncoder::new(Vec::new());
    for test in 1..=3 {
        encoder.encode(&Doc { test }).unwrap();
    }
    let text = String::from_utf8(encoder.into_inner()).unwrap();
    assert_eq!(text, "test: 1\n---\ntest: 2\n---\ntest: 3\n");
    assert_eq!(text.matches("---").count(), 2);
}

#[test]
fn encoded_stream_decodes_back() {
    let values = vec![json!({"a": [1, 2]}), json!("text"), json!(null), json!({"b": {}})];
    let mut encoder = StreamEncoder::new(Vec::new());
    for value in &values {
        encoder.encode(value).unwrap();
    }
    let bytes = encoder.into_inner();
    let decoded: Vec<Value> = StreamDecoder::from_slice(&bytes)
        .documents()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(decoded, values);
}

#[test]
fn strict_options_apply_to_each_document() {
    let mut stream = StreamDecoder::from_str("test: 1\n---\ntest: 2\nextra: x\n---\ntest: 3\n")
        .with_options(DecodeOptions::strict());
    assert_eq!(stream.decode::<Doc>().unwrap(), Some(Doc { test: 1 }));
    assert!(matches!(
        stream.decode::<Doc>(),
        Err(Error::UnknownField { ref field, .. }) if field == "extra"
    ));
    assert_eq!(stream.decode::<Doc>().unwrap(), Some(Doc { test: 3 }));
    assert_eq!(stream.decode::<Doc>().unwrap(), None);
    assert_eq!(stream.documents_read(), 3);
}

#[test]
fn duplicate_key_in_one_document() {
    let mut stream = StreamDecoder::from_str("test: 1\n---\ntest: 2\ntest: 3\n");
    assert!(stream.decode::<Doc>().unwrap().is_some());
    match stream.decode::<Doc>() {
        Err(err @ Error::DuplicateKey { .. }) => {
            assert_eq!(err.to_string(), r#"key "test" already defined"#)
        }
        other => panic!("expected duplicate key error, got {other:?}"),
    }
    assert_eq!(stream.decode::<Doc>().unwrap(), None);
}

#[test]
fn parse_error_ends_the_stream() {
    let mut stream = StreamDecoder::from_str("test: 1\n---\ntest: \"unterminated\n");
    assert!(stream.decode::<Doc>().unwrap().is_some());
    assert!(matches!(stream.decode::<Doc>(), Err(Error::Parse(_))));
    assert!(stream.is_exhausted());
    assert_eq!(stream.decode::<Doc>().unwrap(), None);
}

#[test]
fn reader_source() {
    let source = std::io::Cursor::new(b"test: 7\n---\ntest: 8\n".to_vec());
    let docs: Vec<Doc> = StreamDecoder::from_reader(source)
        .documents()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[1].test, 8);
}
