//! # yamlbridge-core
//!
//! YAML codec built on the JSON data model. Every YAML document is converted
//! to a `serde_json::Value` before it reaches a typed value, and every typed
//! value passes through a `serde_json::Value` on its way out, so both
//! directions agree on what a document means.
//!
//! Along the way the converter:
//!
//! - canonicalizes mapping keys to strings (`1: a` becomes `{"1":"a"}`,
//!   `true: yes` becomes `{"true":"yes"}`);
//! - rejects mappings whose keys collide after canonicalization
//!   (`key "a" already defined`), on every decode path;
//! - keeps YAML 1.2 scalar typing (`yes` is a string, `t: ` is null).
//!
//! ## Quick start
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use yamlbridge_core::{from_str, from_str_with_options, to_string, DecodeOptions};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Service { name: String, port: u16 }
//!
//! let yaml = to_string(&Service { name: "api".into(), port: 8080 }).unwrap();
//! assert_eq!(yaml, "name: api\nport: 8080\n");
//!
//! let back: Service = from_str(&yaml).unwrap();
//! assert_eq!(back.port, 8080);
//!
//! // Strict mode rejects keys the struct does not declare.
//! let err = from_str_with_options::<Service>("name: api\nport: 1\nhost: x\n", &DecodeOptions::strict());
//! assert!(err.is_err());
//!
//! // Text to text, no target type involved.
//! assert_eq!(yamlbridge_core::yaml_to_json("1: a").unwrap(), r#"{"1":"a"}"#);
//! assert_eq!(yamlbridge_core::json_to_yaml(r#"{"1":"a"}"#).unwrap(), "\"1\": a\n");
//! ```
//!
//! ## Modules
//!
//! - [`decoder`]: YAML text → node tree → JSON text or typed value
//! - [`encoder`]: typed value or JSON text → YAML text
//! - [`convert`]: node tree ↔ JSON value tree, duplicate-key guard
//! - [`binder`]: JSON value tree → typed value, optional unknown-field check
//! - [`stream`]: multi-document decode and encode
//! - [`number`]: canonical number text
//! - [`json`]: JSON writer using canonical numbers
//! - [`options`]: decode options
//! - [`error`]: error type
//! - [`types`]: `Node`, the generic YAML tree

pub mod binder;
pub mod convert;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod json;
mod loader;
pub mod number;
pub mod options;
mod ser;
pub mod stream;
pub mod types;

pub use binder::{from_value, from_value_with_options, FieldSpec};
pub use convert::{to_generic, to_strict};
pub use decoder::{
    from_reader, from_reader_with_options, from_slice, from_slice_with_options, from_str,
    from_str_with_options, parse, parse_documents, yaml_to_json, yaml_to_json_pretty,
    yaml_to_value,
};
pub use encoder::{json_to_yaml, render, to_string, to_vec, to_writer};
pub use error::{Error, Result};
pub use options::{DecodeOptions, UnknownFields};
pub use stream::{Documents, StreamDecoder, StreamEncoder};
pub use types::{Node, TagKind, Tagged};
