// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Error recovery on malformed input.
//!
//! Each case lists the messages the first document must report, in source
//! order, and the data recovered despite them.

use serde_json::{Value as Json, json};
use yaml_compose::{Document, ErrorClass, ParseOptions, parse_all_documents};

fn compose(src: &str) -> Document {
    let mut docs = parse_all_documents(src, &ParseOptions::default());
    assert!(!docs.is_empty(), "{src:?} produced no document");
    docs.swap_remove(0)
}

fn messages(doc: &Document) -> Vec<String> {
    doc.errors.iter().map(ToString::to_string).collect()
}

#[test]
fn test_recovered_documents() {
    let test_cases: [(&str, &[&str], Json); 12] = [
        ("{ , }", &["Unexpected , in flow map"], json!({})),
        (
            "{ 123,,, }",
            &["Unexpected , in flow map", "Unexpected , in flow map"],
            json!({"123": null}),
        ),
        ("[ , ]", &["Unexpected , in flow sequence"], json!([])),
        (
            "[ 123,,, ]",
            &["Unexpected , in flow sequence", "Unexpected , in flow sequence"],
            json!([123]),
        ),
        ("{", &["Expected flow map to end with }"], json!({})),
        ("[a, b", &["Expected flow sequence to end with ]"], json!(["a", "b"])),
        (
            "[a, b}",
            &["Expected flow sequence to end with ], found }"],
            json!(["a", "b"]),
        ),
        ("{ ? : 123 }", &[], json!({"": 123})),
        (
            "abc: 123\ndef",
            &["Implicit map keys need to be followed by map values"],
            json!({"abc": 123, "def": null}),
        ),
        (
            "{ a: b: c }",
            &["Missing {} around pair used as mapping key"],
            json!({"{\"a\":\"b\"}": "c"}),
        ),
        (
            "[ a b, c d ]",
            &[],
            json!(["a b", "c d"]),
        ),
        (
            "[ 'a' 'b', c ]",
            &["Missing , between flow collection items"],
            json!(["b", "c"]),
        ),
    ];
    for (src, expected_messages, expected) in test_cases {
        let doc = compose(src);
        assert_eq!(messages(&doc), *expected_messages, "{src:?}");
        assert_eq!(doc.to_json(), Ok(expected), "{src:?}");
    }
}

#[test]
fn test_mixed_block_sequence() {
    let doc = compose("- a\n- b:\n  - c\n- d");
    assert!(doc.errors.is_empty(), "{:?}", doc.errors);
    assert_eq!(doc.to_json(), Ok(json!(["a", {"b": ["c"]}, "d"])));
}

#[test]
fn test_error_classes() {
    let test_cases = [
        ("[ , ]", ErrorClass::Syntax),
        ("{ a: b: c }", ErrorClass::Semantic),
        ("&a &b x", ErrorClass::Semantic),
        ("!nope x", ErrorClass::Semantic),
        ("*nope", ErrorClass::Reference),
        ("\"open", ErrorClass::Syntax),
    ];
    for (src, class) in test_cases {
        let doc = compose(src);
        let classes: Vec<ErrorClass> = doc.errors.iter().map(|err| err.class()).collect();
        assert_eq!(classes, vec![class], "{src:?}: {:?}", doc.errors);
    }
}

#[test]
fn test_warnings_are_separate() {
    let doc = compose("%YAML 1.1\n%FOO\n--- !!str\n");
    assert!(doc.errors.is_empty(), "{:?}", doc.errors);
    let warnings: Vec<String> = doc.warnings.iter().map(ToString::to_string).collect();
    assert_eq!(
        warnings,
        vec![
            "Document will be parsed as YAML 1.2 rather than YAML 1.1".to_owned(),
            "YAML only supports %TAG and %YAML directives, and not %FOO".to_owned(),
        ]
    );
    assert!(doc.warnings.iter().all(|err| err.class() == ErrorClass::Warning));
    assert_eq!(doc.to_json(), Ok(json!("")));
}

#[test]
fn test_tag_directives() {
    let doc = compose("%TAG !e! tag:example.com,2000:\n--- !e!thing x\n");
    assert_eq!(
        messages(&doc),
        vec!["Unresolved tag: tag:example.com,2000:thing".to_owned()]
    );
    assert_eq!(
        doc.root().and_then(|node| node.tag.as_deref()),
        Some("tag:example.com,2000:thing")
    );

    let doc = compose("!u!x y\n");
    assert_eq!(
        messages(&doc),
        vec!["The !u! tag handle is non-default and was not declared.".to_owned()]
    );
}

#[test]
fn test_every_document_recovers() {
    let docs = parse_all_documents("[ , ]\n---\n{ a: 1 }\n---\n- x\n- *y\n", &ParseOptions::default());
    let counts: Vec<usize> = docs.iter().map(|doc| doc.errors.len()).collect();
    assert_eq!(counts, vec![1, 0, 1]);
    assert_eq!(docs.get(1).map(Document::to_json), Some(Ok(json!({"a": 1}))));
}
