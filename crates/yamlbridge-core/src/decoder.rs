//! YAML decoder: block-format text in, JSON text or typed values out.
//!
//! Decoding runs in three stages:
//!
//! 1. **Parse**: the event parser reads the text and the loader
//!    resolves scalars (YAML 1.2 core schema: only `true`/`false` are
//!    booleans, so `yes`/`on` stay strings) into a [`Node`] tree that keeps
//!    repeated keys, non-string keys and tags.
//! 2. **Convert**: [`crate::convert::to_strict`] canonicalizes keys, rejects
//!    duplicates and produces a `serde_json::Value`. This step runs on every
//!    decode path, whatever the options.
//! 3. **Bind**: [`crate::binder`] drives the target type's `Deserialize`
//!    impl, rejecting unknown fields when [`UnknownFields::Deny`] is set.
//!
//! # Example
//! ```
//! use yamlbridge_core::yaml_to_json;
//! let json = yaml_to_json("t: \n1: a\nlist: [yes, 1.5]\n").unwrap();
//! assert_eq!(json, r#"{"t":null,"1":"a","list":["yes",1.5]}"#);
//! ```
//!
//! [`UnknownFields::Deny`]: crate::options::UnknownFields::Deny

use std::io::Read;
use std::str::Utf8Error;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use crate::binder;
use crate::convert::to_strict;
use crate::error::{Error, Result};
use crate::json;
use crate::loader::Loader;
use crate::options::DecodeOptions;
use crate::types::Node;

/// Parse a single YAML document into a generic node tree.
///
/// Empty input parses as [`Node::Null`]. Input holding more than one document
/// is rejected; use [`crate::StreamDecoder`] for streams.
pub fn parse(input: impl AsRef<[u8]>) -> Result<Node> {
    let text = utf8(input.as_ref())?;
    let mut loader = Loader::new(text.chars());
    let node = loader.next_document()?.unwrap_or(Node::Null);
    if loader.next_document()?.is_some() {
        return Err(Error::Parse(
            "expected a single document but found more than one".to_string(),
        ));
    }
    trace!(bytes = text.len(), kind = node.kind_name(), "parsed YAML document");
    Ok(node)
}

/// Parse every document of a YAML stream into generic node trees.
///
/// Unlike [`parse`], this accepts any number of `---`-separated documents;
/// a stream with no documents yields an empty vector.
pub fn parse_documents(input: impl AsRef<[u8]>) -> Result<Vec<Node>> {
    let mut loader = Loader::new(utf8(input.as_ref())?.chars());
    let mut nodes = Vec::new();
    while let Some(node) = loader.next_document()? {
        nodes.push(node);
    }
    Ok(nodes)
}

pub(crate) fn utf8(input: &[u8]) -> Result<&str> {
    std::str::from_utf8(input).map_err(not_utf8)
}

pub(crate) fn not_utf8(err: Utf8Error) -> Error {
    Error::Parse(format!("input is not UTF-8: {err}"))
}

/// Parse a YAML document into a JSON value tree.
pub fn yaml_to_value(yaml: impl AsRef<[u8]>) -> Result<Value> {
    to_strict(&parse(yaml)?)
}

/// Convert YAML text to compact JSON text.
pub fn yaml_to_json(yaml: impl AsRef<[u8]>) -> Result<String> {
    json::to_string(&yaml_to_value(yaml)?)
}

/// Convert YAML text to indented JSON text.
pub fn yaml_to_json_pretty(yaml: impl AsRef<[u8]>) -> Result<String> {
    json::to_string_pretty(&yaml_to_value(yaml)?)
}

/// Deserialize a value from a YAML string, ignoring unknown fields.
///
/// # Examples
/// ```
/// use serde::Deserialize;
/// use yamlbridge_core::from_str;
///
/// #[derive(Deserialize, Debug, PartialEq)]
/// struct User { id: u64, name: String }
///
/// let user: User = from_str("id: 42\nname: Ada\nextra: ignored\n").unwrap();
/// assert_eq!(user, User { id: 42, name: "Ada".into() });
/// ```
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_slice_with_options(s.as_bytes(), &DecodeOptions::default())
}

/// Deserialize a value from a YAML string with explicit options.
///
/// # Examples
/// ```
/// use serde::Deserialize;
/// use yamlbridge_core::{from_str_with_options, DecodeOptions, Error};
///
/// #[derive(Deserialize, Debug)]
/// struct User { name: String }
///
/// let err = from_str_with_options::<User>("name: Ada\nrole: admin\n", &DecodeOptions::strict())
///     .unwrap_err();
/// assert!(matches!(err, Error::UnknownField { ref field, .. } if field == "role"));
/// ```
pub fn from_str_with_options<T>(s: &str, options: &DecodeOptions) -> Result<T>
where
    T: DeserializeOwned,
{
    from_slice_with_options(s.as_bytes(), options)
}

/// Deserialize a value from YAML bytes, ignoring unknown fields.
pub fn from_slice<T>(v: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    from_slice_with_options(v, &DecodeOptions::default())
}

/// Deserialize a value from YAML bytes with explicit options.
pub fn from_slice_with_options<T>(v: &[u8], options: &DecodeOptions) -> Result<T>
where
    T: DeserializeOwned,
{
    let value = yaml_to_value(v)?;
    binder::from_value_with_options(value, options)
}

/// Deserialize a value from a reader holding one YAML document.
pub fn from_reader<R, T>(rdr: R) -> Result<T>
where
    R: Read,
    T: DeserializeOwned,
{
    from_reader_with_options(rdr, &DecodeOptions::default())
}

/// Deserialize a value from a reader holding one YAML document, with
/// explicit options.
pub fn from_reader_with_options<R, T>(mut rdr: R, options: &DecodeOptions) -> Result<T>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut buf = Vec::new();
    rdr.read_to_end(&mut buf)?;
    from_slice_with_options(&buf, options)
}
