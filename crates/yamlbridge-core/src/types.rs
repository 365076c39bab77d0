//! Generic YAML node tree, as produced by the parser and consumed by the emitter.
//!
//! `Node` keeps everything the block format can express that JSON cannot:
//! non-string mapping keys, repeated keys, 128-bit integers, non-finite floats
//! and tags. Deciding what to do with those is the converter's job
//! ([`crate::convert`]), not the parser's.

/// One node of a parsed YAML document.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `null`, `~`, or an empty scalar.
    Null,
    Bool(bool),
    /// Integers up to the 128-bit range. Wider integers are parsed as floats.
    Int(i128),
    Float(f64),
    /// Any scalar that did not resolve to another type, including quoted
    /// scalars that look numeric or boolean.
    Str(String),
    Sequence(Vec<Node>),
    /// Key-value pairs in document order. Keys may repeat here; the
    /// converter rejects repeats.
    Mapping(Vec<(Node, Node)>),
    /// A node carrying an explicit tag such as `!local`.
    Tagged(Box<Tagged>),
}

/// A tagged node: `!tag value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged {
    /// Tag text as reported by the parser, with or without leading `!`.
    pub tag: String,
    pub value: Node,
}

/// The tags the converter distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `!!binary`: base64 payload with no JSON counterpart.
    Binary,
    /// `!!timestamp`: kept as its string text.
    Timestamp,
    /// Any other tag. The tag is dropped and the value kept.
    Other,
}

impl Tagged {
    pub fn new(tag: impl Into<String>, value: Node) -> Self {
        Tagged {
            tag: tag.into(),
            value,
        }
    }

    /// Tag name without `!` prefixes or the `tag:yaml.org,2002:` namespace.
    pub fn name(&self) -> &str {
        let tag = self.tag.trim_start_matches('!');
        tag.strip_prefix("tag:yaml.org,2002:").unwrap_or(tag)
    }

    pub fn kind(&self) -> TagKind {
        match self.name() {
            "binary" => TagKind::Binary,
            "timestamp" => TagKind::Timestamp,
            _ => TagKind::Other,
        }
    }
}

impl Node {
    /// Short description of the node kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "boolean",
            Node::Int(_) => "integer",
            Node::Float(_) => "float",
            Node::Str(_) => "string",
            Node::Sequence(_) => "sequence",
            Node::Mapping(_) => "mapping",
            Node::Tagged(_) => "tagged value",
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Node::Sequence(_) | Node::Mapping(_))
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Str(s.to_owned())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Str(s)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl From<i64> for Node {
    fn from(i: i64) -> Self {
        Node::Int(i.into())
    }
}

impl From<f64> for Node {
    fn from(f: f64) -> Self {
        Node::Float(f)
    }
}
