//! Builds [`Node`] trees from parser events.
//!
//! The event parser reports every scalar together with its style and tag, so
//! resolution of plain scalars (YAML 1.2 core schema) happens here, and tags
//! such as `!!binary` reach the converter instead of being folded into text.
//! Aliases are resolved by copying the anchored node.

use std::collections::HashMap;

use tracing::trace;
use yaml_rust2::parser::{Event, Parser, Tag};
use yaml_rust2::scanner::TScalarStyle;

use crate::error::{Error, Result};
use crate::types::{Node, Tagged};

/// Collections nested deeper than this are rejected.
const MAX_DEPTH: usize = 128;

/// Handles under which the core tags (`!!str`, `!!int`, ...) are reported.
const CORE_TAG_PREFIXES: &[&str] = &["!!", "tag:yaml.org,2002:"];

/// Pulls documents one at a time out of a YAML character stream.
///
/// Any error ends the stream: the parser cannot resynchronize after one.
pub(crate) struct Loader<T: Iterator<Item = char>> {
    parser: Parser<T>,
    anchors: HashMap<usize, Node>,
    done: bool,
}

impl<T> Loader<T>
where
    T: Iterator<Item = char>,
{
    pub(crate) fn new(source: T) -> Self {
        Loader {
            parser: Parser::new(source),
            anchors: HashMap::new(),
            done: false,
        }
    }

    /// The next document, or `None` once the stream has ended.
    pub(crate) fn next_document(&mut self) -> Result<Option<Node>> {
        if self.done {
            return Ok(None);
        }
        loop {
            match self.next_event()? {
                Event::DocumentStart => break,
                Event::StreamEnd => {
                    self.done = true;
                    return Ok(None);
                }
                // Stream start.
                _ => {}
            }
        }
        self.anchors.clear();
        let event = self.next_event()?;
        let root = self.node(event, 0)?;
        match self.next_event()? {
            Event::DocumentEnd => {
                trace!(kind = root.kind_name(), "loaded YAML document");
                Ok(Some(root))
            }
            event => Err(self.fail(format!("expected end of document, found {event:?}"))),
        }
    }

    fn next_event(&mut self) -> Result<Event> {
        match self.parser.next_token() {
            Ok((event, _)) => Ok(event),
            Err(err) => {
                self.done = true;
                Err(err.into())
            }
        }
    }

    fn fail(&mut self, message: String) -> Error {
        self.done = true;
        Error::Parse(message)
    }

    fn node(&mut self, event: Event, depth: usize) -> Result<Node> {
        if depth > MAX_DEPTH {
            return Err(self.fail(format!("collections nested deeper than {MAX_DEPTH} levels")));
        }
        let (anchor, node) = match event {
            Event::Scalar(value, style, anchor, tag) => (anchor, self.scalar(value, style, tag)?),
            Event::SequenceStart(anchor, ..) => {
                let mut items = Vec::new();
                loop {
                    match self.next_event()? {
                        Event::SequenceEnd => break,
                        event => items.push(self.node(event, depth + 1)?),
                    }
                }
                (anchor, Node::Sequence(items))
            }
            // Entries are collected without deduplication so that repeated
            // keys reach the converter intact.
            Event::MappingStart(anchor, ..) => {
                let mut entries = Vec::new();
                loop {
                    let key = match self.next_event()? {
                        Event::MappingEnd => break,
                        event => self.node(event, depth + 1)?,
                    };
                    let event = self.next_event()?;
                    let value = self.node(event, depth + 1)?;
                    entries.push((key, value));
                }
                (anchor, Node::Mapping(entries))
            }
            Event::Alias(id) => {
                if let Some(node) = self.anchors.get(&id) {
                    return Ok(node.clone());
                }
                return Err(self.fail("alias refers to a node that contains it".to_string()));
            }
            event => return Err(self.fail(format!("unexpected parser event {event:?}"))),
        };
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }
        Ok(node)
    }

    fn scalar(&mut self, value: String, style: TScalarStyle, tag: Option<Tag>) -> Result<Node> {
        let plain = style == TScalarStyle::Plain;
        let Some(tag) = tag else {
            return Ok(if plain { resolve_plain(value) } else { Node::Str(value) });
        };
        let tag = format!("{}{}", tag.handle, tag.suffix);
        let core = CORE_TAG_PREFIXES
            .iter()
            .find_map(|prefix| tag.strip_prefix(prefix));
        let resolved = match core {
            Some("str") => Some(Node::Str(value)),
            Some("null") => is_null(&value).then_some(Node::Null),
            Some("bool") => parse_bool(&value).map(Node::Bool),
            Some("int") => parse_int(&value),
            Some("float") => parse_float(&value).map(Node::Float),
            // Binary, timestamp and the like: the text is the payload.
            Some(_) => Some(Node::Tagged(Box::new(Tagged::new(tag.clone(), Node::Str(value))))),
            None => {
                let inner = if plain { resolve_plain(value) } else { Node::Str(value) };
                Some(Node::Tagged(Box::new(Tagged::new(tag.clone(), inner))))
            }
        };
        match resolved {
            Some(node) => Ok(node),
            None => Err(self.fail(format!("scalar does not fit its {tag} tag"))),
        }
    }
}

/// Resolve an untagged plain scalar to null, boolean, integer or float,
/// falling back to a string. Digit runs with a leading zero (`0123`) stay
/// strings.
pub(crate) fn resolve_plain(text: String) -> Node {
    if is_null(&text) {
        return Node::Null;
    }
    if let Some(b) = parse_bool(&text) {
        return Node::Bool(b);
    }
    if has_leading_zero(&text) {
        return Node::Str(text);
    }
    match parse_int(&text).or_else(|| parse_float(&text).map(Node::Float)) {
        Some(node) => node,
        None => Node::Str(text),
    }
}

fn is_null(text: &str) -> bool {
    matches!(text, "" | "~" | "null" | "Null" | "NULL")
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

fn has_leading_zero(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    digits.len() > 1 && digits.starts_with('0') && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Decimal, `0x`, `0o` and `0b` integers. Values beyond the 128-bit range
/// become floats; decimal ones too large even for `u128` are left to
/// [`parse_float`].
fn parse_int(text: &str) -> Option<Node> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (radix, digits) = match unsigned.get(..2) {
        Some("0x") => (16, &unsigned[2..]),
        Some("0o") => (8, &unsigned[2..]),
        Some("0b") => (2, &unsigned[2..]),
        _ => (10, unsigned),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = u128::from_str_radix(digits, radix).ok()?;
    let node = if negative {
        match 0i128.checked_sub_unsigned(magnitude) {
            Some(value) => Node::Int(value),
            None => Node::Float(-(magnitude as f64)),
        }
    } else {
        match i128::try_from(magnitude) {
            Ok(value) => Node::Int(value),
            Err(_) => Node::Float(magnitude as f64),
        }
    };
    Some(node)
}

fn parse_float(text: &str) -> Option<f64> {
    let unsigned = match text.strip_prefix('+') {
        Some(rest) if rest.starts_with(['+', '-']) => return None,
        Some(rest) => rest,
        None => text,
    };
    match unsigned {
        ".inf" | ".Inf" | ".INF" => return Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => return Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Some(f64::NAN),
        _ => {}
    }
    unsigned.parse::<f64>().ok().filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TagKind;

    fn load(text: &str) -> Result<Vec<Node>> {
        let mut loader = Loader::new(text.chars());
        let mut docs = Vec::new();
        while let Some(doc) = loader.next_document()? {
            docs.push(doc);
        }
        Ok(docs)
    }

    fn single(text: &str) -> Node {
        let mut docs = load(text).unwrap();
        assert_eq!(docs.len(), 1, "{text:?}");
        docs.remove(0)
    }

    #[test]
    fn plain_scalars_follow_the_core_schema() {
        assert_eq!(single("~"), Node::Null);
        assert_eq!(single("True"), Node::Bool(true));
        assert_eq!(single("yes"), Node::from("yes"));
        assert_eq!(single("0x1F"), Node::Int(31));
        assert_eq!(single("-0o17"), Node::Int(-15));
        assert_eq!(single("0123"), Node::from("0123"));
        assert_eq!(single("1e+36"), Node::Float(1e36));
        assert_eq!(single("-.inf"), Node::Float(f64::NEG_INFINITY));
        assert_eq!(single("1_000"), Node::from("1_000"));
    }

    #[test]
    fn integers_beyond_128_bits_become_floats() {
        assert_eq!(
            single("1000000000000000000000000000000000000"),
            Node::Int(10i128.pow(36))
        );
        assert_eq!(
            single("340282366920938463463374607431768211456"),
            Node::Float(2f64.powi(128))
        );
    }

    #[test]
    fn quoted_scalars_are_strings() {
        assert_eq!(single("'1'"), Node::from("1"));
        assert_eq!(single("\"null\""), Node::from("null"));
    }

    #[test]
    fn binary_tag_survives_loading() {
        let node = single("a: !!binary gIGC\n");
        let Node::Mapping(entries) = node else {
            panic!("expected mapping");
        };
        match &entries[0].1 {
            Node::Tagged(tagged) => {
                assert_eq!(tagged.kind(), TagKind::Binary);
                assert_eq!(tagged.value, Node::from("gIGC"));
            }
            other => panic!("expected tagged node, got {other:?}"),
        }
    }

    #[test]
    fn core_tags_force_their_type() {
        assert_eq!(single("!!str 12"), Node::from("12"));
        assert_eq!(single("!!int \"12\""), Node::Int(12));
        assert_eq!(single("!!float 3"), Node::Float(3.0));
        assert!(matches!(load("!!bool maybe"), Err(Error::Parse(_))));
    }

    #[test]
    fn local_tags_wrap_the_resolved_value() {
        match single("!count 3") {
            Node::Tagged(tagged) => {
                assert_eq!(tagged.name(), "count");
                assert_eq!(tagged.value, Node::Int(3));
            }
            other => panic!("expected tagged node, got {other:?}"),
        }
    }

    #[test]
    fn aliases_copy_the_anchored_node() {
        let node = single("base: &b [1, 2]\ncopy: *b\n");
        let Node::Mapping(entries) = node else {
            panic!("expected mapping");
        };
        assert_eq!(entries[0].1, entries[1].1);
        assert!(load("&a [*a]").is_err());
    }

    #[test]
    fn documents_arrive_one_at_a_time() {
        let mut loader = Loader::new("a: 1\n---\nb: 2\n".chars());
        assert!(loader.next_document().unwrap().is_some());
        assert!(loader.next_document().unwrap().is_some());
        assert!(loader.next_document().unwrap().is_none());
        assert!(loader.next_document().unwrap().is_none());
        assert!(load("").unwrap().is_empty());
        assert!(load("# comment only\n").unwrap().is_empty());
        assert_eq!(load("---\n").unwrap(), vec![Node::Null]);
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let text = format!("{}{}", "[".repeat(200), "]".repeat(200));
        assert!(matches!(load(&text), Err(Error::Parse(_))));
    }
}
