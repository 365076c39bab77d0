//! Text-to-text conversion in both directions, key canonicalization and the
//! duplicate-key guard.

use yamlbridge_core::{json_to_yaml, yaml_to_json, yaml_to_json_pretty, yaml_to_value, Error};

/// Helper: convert YAML → JSON and compare with the expected JSON text.
fn assert_yaml_to_json(yaml: &str, expected: &str) {
    let actual = yaml_to_json(yaml).unwrap_or_else(|err| panic!("{yaml:?}: {err}"));
    assert_eq!(actual, expected, "YAML input: {yaml:?}");
}

/// Helper: convert JSON → YAML and compare with the expected YAML text.
fn assert_json_to_yaml(json: &str, expected: &str) {
    let actual = json_to_yaml(json).unwrap_or_else(|err| panic!("{json:?}: {err}"));
    assert_eq!(actual, expected, "JSON input: {json:?}");
}

fn assert_duplicate(yaml: &str, key: &str) {
    match yaml_to_json(yaml) {
        Err(Error::DuplicateKey { key: actual, .. }) => assert_eq!(actual, key),
        other => panic!("{yaml:?}: expected duplicate key {key:?}, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// YAML → JSON
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn plain_mapping() {
    assert_yaml_to_json("t: a\n", r#"{"t":"a"}"#);
}

#[test]
fn empty_value_is_null() {
    assert_yaml_to_json("t: \n", r#"{"t":null}"#);
    assert_yaml_to_json("t:", r#"{"t":null}"#);
    assert_yaml_to_json("t: null\n", r#"{"t":null}"#);
    assert_yaml_to_json("t: ~\n", r#"{"t":null}"#);
}

#[test]
fn boolean_key_is_canonicalized() {
    assert_yaml_to_json("true: yes\n", r#"{"true":"yes"}"#);
    assert_yaml_to_json("false: 1\n", r#"{"false":1}"#);
}

#[test]
fn integer_and_float_keys_are_canonicalized() {
    assert_yaml_to_json("1: a\n", r#"{"1":"a"}"#);
    assert_yaml_to_json("-7: a\n", r#"{"-7":"a"}"#);
    assert_yaml_to_json("1.5: a\n", r#"{"1.5":"a"}"#);
}

#[test]
fn oversized_integer_key_uses_float_text() {
    assert_yaml_to_json(
        "1000000000000000000000000000000000000: a\n",
        r#"{"1e+36":"a"}"#,
    );
}

#[test]
fn null_key_is_canonicalized() {
    assert_yaml_to_json("~: a\n", r#"{"null":"a"}"#);
}

#[test]
fn yaml_1_1_booleans_stay_strings() {
    assert_yaml_to_json("a: YES\nb: on\nc: n\n", r#"{"a":"YES","b":"on","c":"n"}"#);
}

#[test]
fn sequence_of_mappings() {
    assert_yaml_to_json(
        "- t: a\n- t:\n    b: 1\n    c: 2\n",
        r#"[{"t":"a"},{"t":{"b":1,"c":2}}]"#,
    );
}

#[test]
fn key_order_is_preserved() {
    assert_yaml_to_json("z: 1\na: 2\nm: 3\n", r#"{"z":1,"a":2,"m":3}"#);
}

#[test]
fn flow_collections() {
    assert_yaml_to_json("a: [1, b, {c: d}]\n", r#"{"a":[1,"b",{"c":"d"}]}"#);
}

#[test]
fn scalar_documents() {
    assert_yaml_to_json("hello", r#""hello""#);
    assert_yaml_to_json("42", "42");
    assert_yaml_to_json("", "null");
}

#[test]
fn local_tags_are_dropped() {
    assert_yaml_to_json("color: !local red\n", r#"{"color":"red"}"#);
}

#[test]
fn negative_zero_keeps_its_sign() {
    assert_yaml_to_json("a: -0.0\nb: -0\n", r#"{"a":-0.0,"b":0}"#);
    assert_json_to_yaml(r#"{"a":-0.0}"#, "a: -0.0\n");
}

#[test]
fn pretty_output_keeps_canonical_numbers() {
    let json = yaml_to_json_pretty("big: 1e36\nlist: [1]\n").unwrap();
    assert_eq!(json, "{\n  \"big\": 1e+36,\n  \"list\": [\n    1\n  ]\n}");
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion errors
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn non_finite_floats_are_rejected() {
    for yaml in ["a: .inf\n", "a: -.inf\n", "a: .nan\n"] {
        match yaml_to_json(yaml) {
            Err(Error::Conversion { path, .. }) => assert_eq!(path, "a"),
            other => panic!("{yaml:?}: expected conversion error, got {other:?}"),
        }
    }
}

#[test]
fn binary_values_are_rejected() {
    for yaml in [
        "a: !!binary gIGC\n",
        "a: !<tag:yaml.org,2002:binary> gIGC\n",
        "a: !!binary |\n  R0lGODlhDAAMAIQAAP\n",
    ] {
        match yaml_to_json(yaml) {
            Err(Error::Conversion { path, message }) => {
                assert_eq!(path, "a");
                assert!(message.contains("binary"), "{message}");
            }
            other => panic!("{yaml:?}: expected conversion error, got {other:?}"),
        }
    }
    assert!(matches!(
        yaml_to_json("- ok\n- !!binary gIGC\n"),
        Err(Error::Conversion { ref path, .. }) if path == "[1]"
    ));
}

#[test]
fn timestamps_keep_their_text() {
    assert_yaml_to_json("when: !!timestamp 2001-12-14\n", r#"{"when":"2001-12-14"}"#);
}

#[test]
fn collection_keys_are_rejected() {
    let err = yaml_to_json("? [1, 2]\n: a\n").unwrap_err();
    assert!(matches!(err, Error::Conversion { .. }), "got {err:?}");
}

#[test]
fn malformed_input_is_a_parse_error() {
    assert!(matches!(yaml_to_json("a: 'open\n"), Err(Error::Parse(_))));
    assert!(matches!(json_to_yaml(r#"{"a": [1, 2}"#), Err(Error::Parse(_))));
}

// ─────────────────────────────────────────────────────────────────────────────
// Duplicate keys
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn repeated_string_key() {
    assert_duplicate("a: 1\na: 2\n", "a");
}

#[test]
fn repeated_boolean_key() {
    assert_duplicate("true: 1\ntrue: 2\n", "true");
}

#[test]
fn keys_colliding_after_canonicalization() {
    assert_duplicate("1: a\n\"1\": b\n", "1");
    assert_duplicate("true: a\n'true': b\n", "true");
    assert_duplicate("~: a\nnull: b\n", "null");
}

#[test]
fn duplicate_message_names_the_key() {
    let err = yaml_to_json("a: 1\na: 2\n").unwrap_err();
    assert_eq!(err.to_string(), r#"key "a" already defined"#);
}

#[test]
fn nested_duplicate_reports_its_location() {
    let err = yaml_to_json("outer:\n  inner:\n    k: 1\n    k: 2\n").unwrap_err();
    assert_eq!(err.to_string(), r#"key "k" already defined at outer.inner"#);
    assert_eq!(err.path(), Some("outer.inner"));
}

#[test]
fn same_key_in_sibling_mappings_is_fine() {
    assert_yaml_to_json("- a: 1\n- a: 2\n", r#"[{"a":1},{"a":2}]"#);
}

#[test]
fn json_input_is_checked_for_duplicates() {
    match json_to_yaml(r#"{"a": 1, "a": 2}"#) {
        Err(Error::DuplicateKey { key, .. }) => assert_eq!(key, "a"),
        other => panic!("expected duplicate key error, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON → YAML
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn json_null_value() {
    assert_json_to_yaml(r#"{"t":null}"#, "t: null\n");
}

#[test]
fn json_keys_that_look_like_scalars_are_quoted() {
    assert_json_to_yaml(r#"{"true":"yes"}"#, "\"true\": \"yes\"\n");
    assert_json_to_yaml(r#"{"1":"a"}"#, "\"1\": a\n");
    assert_json_to_yaml(r#"{"1e+36":"a"}"#, "\"1e+36\": a\n");
}

#[test]
fn json_sequence_of_objects() {
    assert_json_to_yaml(
        r#"[{"t":"a"},{"t":{"b":1,"c":2}}]"#,
        "- t: a\n- t:\n    b: 1\n    c: 2\n",
    );
}

#[test]
fn json_empty_collections() {
    assert_json_to_yaml(r#"{"a":[],"b":{}}"#, "a: []\nb: {}\n");
}

#[test]
fn json_strings_keep_their_type() {
    assert_json_to_yaml(
        r#"{"n":"1","b":"false","e":"","s":"a: b"}"#,
        "n: \"1\"\nb: \"false\"\ne: \"\"\ns: \"a: b\"\n",
    );
}

#[test]
fn yaml_json_yaml_is_stable() {
    let yaml = "name: svc\nports:\n- 80\n- 443\nlabels:\n  tier: web\n  \"on\": \"yes\"\n";
    let json = yaml_to_json(yaml).unwrap();
    assert_eq!(json_to_yaml(&json).unwrap(), yaml);
}

#[test]
fn value_tree_is_a_serde_json_value() {
    let value = yaml_to_value("a:\n- 1\n- x\n").unwrap();
    assert_eq!(value, serde_json::json!({"a": [1, "x"]}));
}
