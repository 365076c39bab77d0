//! Conversion between the generic YAML node tree and the JSON value tree.
//!
//! [`to_strict`] maps a [`Node`] onto `serde_json::Value`: mapping keys are
//! canonicalized to strings, integers are narrowed to 64 bits where they fit,
//! and every mapping is checked for repeated keys before anything is inserted.
//! [`to_generic`] is the structural inverse; how a string is quoted on output
//! is left to the emitter.

use std::fmt;

use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{Error, Result};
use crate::number;
use crate::types::{Node, TagKind, Tagged};

/// Convert a parsed YAML node into a JSON value tree.
///
/// Fails with [`Error::DuplicateKey`] when two keys of one mapping canonicalize
/// to the same string, and with [`Error::Conversion`] for nodes that have no
/// JSON form (binary data, `.inf`/`.nan`, collections used as keys).
///
/// # Examples
/// ```
/// use yamlbridge_core::{convert::to_strict, Node};
/// use serde_json::json;
///
/// let node = Node::Mapping(vec![(Node::Int(1), Node::from("a"))]);
/// assert_eq!(to_strict(&node).unwrap(), json!({"1": "a"}));
/// ```
pub fn to_strict(node: &Node) -> Result<Value> {
    let mut path = Path::default();
    strict_value(node, &mut path)
}

/// Convert a JSON value tree back into a generic node tree.
///
/// Object keys become string nodes; numbers become `Int` when they are
/// integral 64-bit values and `Float` otherwise.
pub fn to_generic(value: &Value) -> Node {
    match value {
        Value::Null => Node::Null,
        Value::Bool(b) => Node::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Node::Int(i.into())
            } else if let Some(u) = n.as_u64() {
                Node::Int(u.into())
            } else {
                n.as_f64().map_or(Node::Null, Node::Float)
            }
        }
        Value::String(s) => Node::Str(s.clone()),
        Value::Array(items) => Node::Sequence(items.iter().map(to_generic).collect()),
        Value::Object(map) => Node::Mapping(
            map.iter()
                .map(|(k, v)| (Node::Str(k.clone()), to_generic(v)))
                .collect(),
        ),
    }
}

/// Canonical string form of a mapping key, as the JSON writer would print
/// the equivalent value: `true`, `null`, `1`, `1e+36`.
pub fn canonical_key(key: &Node) -> Result<String> {
    canonical_key_at(key, &Path::default())
}

fn strict_value(node: &Node, path: &mut Path) -> Result<Value> {
    match node {
        Node::Null => Ok(Value::Null),
        Node::Bool(b) => Ok(Value::Bool(*b)),
        Node::Int(i) => Ok(Value::Number(number::integer(*i))),
        Node::Float(f) => number::float(*f).map(Value::Number).ok_or_else(|| {
            conversion(
                format!("{} has no JSON representation", number::format_float(*f)),
                path,
            )
        }),
        Node::Str(s) => Ok(Value::String(s.clone())),
        Node::Sequence(items) => {
            let mut array = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                path.push(Segment::Index(index));
                array.push(strict_value(item, path)?);
                path.pop();
            }
            Ok(Value::Array(array))
        }
        Node::Mapping(entries) => strict_object(entries, path),
        Node::Tagged(tagged) => strict_tagged(tagged, path),
    }
}

fn strict_object(entries: &[(Node, Node)], path: &mut Path) -> Result<Value> {
    // The map doubles as the membership set for this mapping only; nested
    // mappings get their own.
    let mut map = Map::with_capacity(entries.len());
    for (key, value) in entries {
        let key = canonical_key_at(key, path)?;
        if map.contains_key(&key) {
            return Err(Error::DuplicateKey {
                key,
                path: path.to_string(),
            });
        }
        path.push(Segment::Key(key.clone()));
        let value = strict_value(value, path)?;
        path.pop();
        map.insert(key, value);
    }
    Ok(Value::Object(map))
}

fn strict_tagged(tagged: &Tagged, path: &mut Path) -> Result<Value> {
    match tagged.kind() {
        TagKind::Binary => Err(conversion(
            "binary data (!!binary) has no JSON representation".to_string(),
            path,
        )),
        TagKind::Timestamp | TagKind::Other => {
            trace!(tag = %tagged.tag, "dropping tag");
            strict_value(&tagged.value, path)
        }
    }
}

fn canonical_key_at(key: &Node, path: &Path) -> Result<String> {
    match key {
        Node::Null => Ok("null".to_string()),
        Node::Bool(b) => Ok(b.to_string()),
        Node::Int(i) => Ok(number::format_number(&number::integer(*i))),
        Node::Float(f) => match number::float(*f) {
            Some(n) => Ok(number::format_number(&n)),
            None => Err(conversion(
                format!(
                    "mapping key {} has no JSON representation",
                    number::format_float(*f)
                ),
                path,
            )),
        },
        Node::Str(s) => Ok(s.clone()),
        Node::Sequence(_) | Node::Mapping(_) => Err(conversion(
            format!("{} cannot be used as a mapping key", key.kind_name()),
            path,
        )),
        Node::Tagged(tagged) => match tagged.kind() {
            TagKind::Binary => Err(conversion(
                "binary data (!!binary) cannot be used as a mapping key".to_string(),
                path,
            )),
            TagKind::Timestamp | TagKind::Other => canonical_key_at(&tagged.value, path),
        },
    }
}

fn conversion(message: String, path: &Path) -> Error {
    Error::Conversion {
        message,
        path: path.to_string(),
    }
}

/// Location of the node being converted, for error messages.
#[derive(Debug, Default)]
pub(crate) struct Path(Vec<Segment>);

#[derive(Debug)]
pub(crate) enum Segment {
    Key(String),
    Index(usize),
}

impl Path {
    pub(crate) fn push(&mut self, segment: Segment) {
        self.0.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => write!(f, "{key}")?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}
