//! YAML encoder: typed values and JSON text in, block-style YAML out.
//!
//! The emitter walks a [`Node`] tree and writes block mappings and sequences:
//!
//! - **Mappings**: `key: value`, nested mappings indented by two spaces
//! - **Sequences**: `- item`; a sequence under a key is not indented further
//! - **Mappings in sequences**: first entry on the dash line (`- name: a`)
//! - **Empty collections**: flow form, `[]` and `{}`
//! - **Long keys**: keys over 1024 characters use the explicit `? key` form,
//!   since a reader only accepts implicit keys up to that length
//! - **Quoting**: strings that would read back as null, boolean or number
//!   (including YAML 1.1 `yes`/`no`/`on`/`off`), or that contain indicator or
//!   control characters, are double-quoted
//! - **Numbers**: canonical form, `1e+36` rather than 37 digits
//!
//! Output always ends with a newline.
//!
//! # Example
//! ```
//! use yamlbridge_core::json_to_yaml;
//! let yaml = json_to_yaml(r#"{"t":"a","n":[1,2],"true":"yes"}"#).unwrap();
//! assert_eq!(yaml, "t: a\nn:\n- 1\n- 2\n\"true\": \"yes\"\n");
//! ```

use std::io::Write;

use serde::Serialize;

use crate::convert::{to_generic, to_strict};
use crate::decoder::parse;
use crate::error::Result;
use crate::number::format_float;
use crate::ser;
use crate::types::{Node, Tagged};

/// Serialize a value to a YAML string.
///
/// The value is first serialized to a JSON value tree, so anything
/// `serde_json` can represent is supported; map keys must serialize as
/// strings, integers or booleans.
///
/// # Examples
/// ```
/// use serde::Serialize;
/// use yamlbridge_core::to_string;
///
/// #[derive(Serialize)]
/// struct User { id: u64, name: String }
///
/// let yaml = to_string(&User { id: 42, name: "Ada".into() }).unwrap();
/// assert_eq!(yaml, "id: 42\nname: Ada\n");
/// ```
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    let value = ser::to_value(value)?;
    Ok(render(&to_generic(&value)))
}

/// Serialize a value to YAML bytes.
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    to_string(value).map(String::into_bytes)
}

/// Serialize a value as YAML into a writer.
pub fn to_writer<W, T>(mut writer: W, value: &T) -> Result<()>
where
    W: Write,
    T: ?Sized + Serialize,
{
    writer.write_all(to_string(value)?.as_bytes())?;
    Ok(())
}

/// Convert JSON text to YAML text.
///
/// JSON is read with the YAML parser (JSON is a subset of YAML 1.2), then goes
/// through the same converter as YAML input, so duplicate keys are rejected
/// here too.
pub fn json_to_yaml(json: impl AsRef<[u8]>) -> Result<String> {
    let node = parse(json)?;
    let value = to_strict(&node)?;
    Ok(render(&to_generic(&value)))
}

/// Render a node tree as a block-style YAML document.
pub fn render(node: &Node) -> String {
    let mut emitter = Emitter::default();
    emitter.document(node);
    emitter.out
}

#[derive(Default)]
struct Emitter {
    out: String,
}

impl Emitter {
    fn document(&mut self, node: &Node) {
        match node {
            Node::Mapping(entries) if !entries.is_empty() => self.mapping(entries, 0),
            Node::Sequence(items) if !items.is_empty() => self.sequence(items, 0),
            Node::Tagged(tagged) => {
                self.tag(tagged);
                self.tagged_body(&tagged.value, 0);
            }
            _ => {
                self.flow(node);
                self.out.push('\n');
            }
        }
    }

    /// Block mapping. The cursor is already at column `indent`.
    fn mapping(&mut self, entries: &[(Node, Node)], indent: usize) {
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 {
                self.pad(indent);
            }
            let key = flow_text(key);
            let explicit = is_long_key(&key);
            if explicit {
                self.out.push_str("? ");
                self.out.push_str(&key);
                self.out.push('\n');
                self.pad(indent);
            } else {
                self.out.push_str(&key);
            }
            self.out.push(':');
            match value {
                Node::Mapping(nested) if !nested.is_empty() => {
                    self.out.push('\n');
                    self.pad(indent + 2);
                    self.mapping(nested, indent + 2);
                }
                Node::Sequence(items) if !items.is_empty() => {
                    // Under `:` a sequence is indented like any other value.
                    let indent = if explicit { indent + 2 } else { indent };
                    self.out.push('\n');
                    self.pad(indent);
                    self.sequence(items, indent);
                }
                _ => self.inline(value, indent),
            }
        }
    }

    /// Block sequence. The cursor is already at column `indent`.
    fn sequence(&mut self, items: &[Node], indent: usize) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.pad(indent);
            }
            self.out.push('-');
            match item {
                Node::Mapping(entries) if !entries.is_empty() => {
                    self.out.push(' ');
                    self.mapping(entries, indent + 2);
                }
                Node::Sequence(nested) if !nested.is_empty() => {
                    self.out.push(' ');
                    self.sequence(nested, indent + 2);
                }
                _ => self.inline(item, indent),
            }
        }
    }

    /// A value that follows `key:` or `-` on the same line.
    fn inline(&mut self, node: &Node, indent: usize) {
        self.out.push(' ');
        match node {
            Node::Tagged(tagged) => {
                self.tag(tagged);
                self.tagged_body(&tagged.value, indent + 2);
            }
            _ => {
                self.flow(node);
                self.out.push('\n');
            }
        }
    }

    fn tagged_body(&mut self, value: &Node, indent: usize) {
        match value {
            Node::Mapping(entries) if !entries.is_empty() => {
                self.out.push('\n');
                self.pad(indent);
                self.mapping(entries, indent);
            }
            Node::Sequence(items) if !items.is_empty() => {
                self.out.push('\n');
                self.pad(indent);
                self.sequence(items, indent);
            }
            _ => {
                self.out.push(' ');
                self.flow(value);
                self.out.push('\n');
            }
        }
    }

    fn tag(&mut self, tagged: &Tagged) {
        if !tagged.tag.starts_with('!') {
            self.out.push('!');
        }
        self.out.push_str(&tagged.tag);
    }

    /// Single-line form of a node: scalars, empty collections, and
    /// collections used as keys.
    fn flow(&mut self, node: &Node) {
        match node {
            Node::Null => self.out.push_str("null"),
            Node::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Node::Int(i) => self.out.push_str(&i.to_string()),
            Node::Float(f) => self.out.push_str(&format_float(*f)),
            Node::Str(s) => self.string(s),
            Node::Sequence(items) => {
                self.out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.flow(item);
                }
                self.out.push(']');
            }
            Node::Mapping(entries) => {
                self.out.push('{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    let key = flow_text(key);
                    if is_long_key(&key) {
                        self.out.push_str("? ");
                    }
                    self.out.push_str(&key);
                    self.out.push_str(": ");
                    self.flow(value);
                }
                self.out.push('}');
            }
            Node::Tagged(tagged) => {
                self.tag(tagged);
                self.out.push(' ');
                self.flow(&tagged.value);
            }
        }
    }

    fn string(&mut self, s: &str) {
        if !needs_quotes(s) {
            self.out.push_str(s);
            return;
        }
        self.out.push('"');
        for ch in s.chars() {
            match ch {
                '\\' => self.out.push_str("\\\\"),
                '"' => self.out.push_str("\\\""),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                '\0' => self.out.push_str("\\0"),
                c if is_unprintable(c) => {
                    self.out.push_str(&format!("\\u{:04X}", c as u32));
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }

    fn pad(&mut self, indent: usize) {
        for _ in 0..indent {
            self.out.push(' ');
        }
    }
}

/// Longest key a reader accepts without the `?` indicator.
const MAX_IMPLICIT_KEY_CHARS: usize = 1024;

fn is_long_key(text: &str) -> bool {
    text.chars().count() > MAX_IMPLICIT_KEY_CHARS
}

fn flow_text(node: &Node) -> String {
    let mut emitter = Emitter::default();
    emitter.flow(node);
    emitter.out
}

/// Words that a YAML 1.1 or 1.2 reader resolves to null or a boolean.
const RESERVED_WORDS: &[&str] = &[
    "~", "null", "Null", "NULL", "true", "True", "TRUE", "false", "False", "FALSE", "y", "Y",
    "yes", "Yes", "YES", "n", "N", "no", "No", "NO", "on", "On", "ON", "off", "Off", "OFF",
];

/// Whether a string must be double-quoted to read back as the same string.
fn needs_quotes(s: &str) -> bool {
    if s.is_empty() || RESERVED_WORDS.contains(&s) || looks_numeric(s) {
        return true;
    }
    if s.starts_with([' ', '\t']) || s.ends_with([' ', '\t', ':']) {
        return true;
    }
    if s.starts_with([
        '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%',
        '@', '`',
    ]) {
        return true;
    }
    // Document markers.
    if s.starts_with("---") || s.starts_with("...") {
        return true;
    }
    if s.contains(": ") || s.contains(" #") {
        return true;
    }
    s.chars()
        .any(|c| matches!(c, ',' | '[' | ']' | '{' | '}') || is_unprintable(c))
}

fn is_unprintable(c: char) -> bool {
    c.is_control() || matches!(c, '\u{2028}' | '\u{2029}' | '\u{feff}')
}

/// Numeric in any spelling a YAML reader might accept: decimal, exponent,
/// hex/octal/binary prefixes, `.inf`/`.nan`, digit separators.
fn looks_numeric(s: &str) -> bool {
    if s.parse::<f64>().is_ok() || s.parse::<i128>().is_ok() {
        return true;
    }
    let unsigned = s.trim_start_matches(['+', '-']);
    let lower = unsigned.to_ascii_lowercase();
    if matches!(lower.as_str(), ".inf" | ".nan") {
        return true;
    }
    if lower.starts_with("0x") || lower.starts_with("0o") || lower.starts_with("0b") {
        return true;
    }
    // 1_000, 1:30 and similar YAML 1.1 forms.
    unsigned.starts_with(|c: char| c.is_ascii_digit())
        && unsigned
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '_' | ':' | '.' | 'e' | 'E' | '+' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: Vec<(&str, Node)>) -> Node {
        Node::Mapping(entries.into_iter().map(|(k, v)| (Node::from(k), v)).collect())
    }

    #[test]
    fn scalars_quote_when_ambiguous() {
        for s in ["", "true", "yes", "Off", "null", "~", "1", "1e+36", "0x1F", ".inf", "1_000"] {
            assert!(needs_quotes(s), "{s:?} should be quoted");
        }
        for s in ["a", "value-of-a", "Ada Lovelace", "1.2.3x", "a:b", "caf\u{e9}"] {
            assert!(!needs_quotes(s), "{s:?} should stay plain");
        }
    }

    #[test]
    fn indicators_and_controls_quote() {
        for s in [
            "- item", "#comment", "a: b", "a #b", "[x]", "line\nbreak", "tab\tin", " lead", "...",
            "...more", "---",
        ] {
            assert!(needs_quotes(s), "{s:?} should be quoted");
        }
    }

    #[test]
    fn escapes_in_double_quotes() {
        let node = Node::from("say \"hi\"\n\\");
        assert_eq!(render(&node), "\"say \\\"hi\\\"\\n\\\\\"\n");
    }

    #[test]
    fn sequence_of_mappings() {
        let node = Node::Sequence(vec![
            map(vec![("t", Node::from("a"))]),
            map(vec![(
                "t",
                map(vec![("b", Node::Int(1)), ("c", Node::Int(2))]),
            )]),
        ]);
        assert_eq!(render(&node), "- t: a\n- t:\n    b: 1\n    c: 2\n");
    }

    #[test]
    fn nested_sequences() {
        let node = map(vec![(
            "grid",
            Node::Sequence(vec![
                Node::Sequence(vec![Node::Int(1), Node::Int(2)]),
                Node::Sequence(vec![]),
            ]),
        )]);
        assert_eq!(render(&node), "grid:\n- - 1\n  - 2\n- []\n");
    }

    #[test]
    fn empty_collections_use_flow_form() {
        let node = map(vec![("a", Node::Sequence(vec![])), ("b", Node::Mapping(vec![]))]);
        assert_eq!(render(&node), "a: []\nb: {}\n");
        assert_eq!(render(&Node::Mapping(vec![])), "{}\n");
    }

    #[test]
    fn non_string_keys_and_tags() {
        let node = Node::Mapping(vec![
            (Node::Int(1), Node::Bool(true)),
            (
                Node::from("when"),
                Node::Tagged(Box::new(Tagged::new("!stamp", Node::from("2001-12-14")))),
            ),
        ]);
        assert_eq!(render(&node), "1: true\nwhen: !stamp \"2001-12-14\"\n");
    }

    #[test]
    fn long_keys_use_explicit_form() {
        let long = "k".repeat(1100);
        let node = Node::Mapping(vec![
            (Node::from(long.as_str()), Node::Int(1)),
            (Node::from("list"), Node::Sequence(vec![Node::Int(2)])),
        ]);
        assert_eq!(render(&node), format!("? {long}\n: 1\nlist:\n- 2\n"));

        let nested = map(vec![(
            "outer",
            Node::Mapping(vec![(
                Node::from(long.as_str()),
                Node::Sequence(vec![Node::Int(1)]),
            )]),
        )]);
        assert_eq!(render(&nested), format!("outer:\n  ? {long}\n  :\n    - 1\n"));

        let flow = Node::Mapping(vec![(
            Node::Mapping(vec![(Node::from(long.as_str()), Node::Int(1))]),
            Node::Int(2),
        )]);
        assert_eq!(render(&flow), format!("? {{? {long}: 1}}\n: 2\n"));
        assert_eq!(parse(render(&flow)).unwrap(), flow);
    }

    #[test]
    fn keys_at_the_length_limit_stay_implicit() {
        let key = "k".repeat(1024);
        let node = map(vec![(key.as_str(), Node::Int(1))]);
        assert_eq!(render(&node), format!("{key}: 1\n"));
    }

    #[test]
    fn top_level_scalar() {
        assert_eq!(render(&Node::Float(1e36)), "1e+36\n");
        assert_eq!(render(&Node::Null), "null\n");
    }
}
