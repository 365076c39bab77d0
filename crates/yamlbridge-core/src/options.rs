//! Configuration options for decoding.

use std::fmt;

/// Options for controlling how YAML is bound to a typed value.
///
/// Options are passed to each decode call; there is no process-wide default
/// to mutate.
///
/// # Examples
///
/// ```
/// use yamlbridge_core::{DecodeOptions, UnknownFields};
///
/// let opts = DecodeOptions {
///     unknown_fields: UnknownFields::Deny,
/// };
/// assert_eq!(opts, DecodeOptions::strict());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// What to do with mapping keys the target struct does not declare.
    ///
    /// Default: [`UnknownFields::Ignore`]
    pub unknown_fields: UnknownFields,
}

impl DecodeOptions {
    /// Options that reject unknown fields.
    pub fn strict() -> Self {
        DecodeOptions {
            unknown_fields: UnknownFields::Deny,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.unknown_fields == UnknownFields::Deny
    }
}

/// Policy for keys that match no field of the target struct.
///
/// Duplicate keys are rejected under either policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownFields {
    /// Skip unknown keys (default).
    #[default]
    Ignore,
    /// Fail with [`crate::Error::UnknownField`].
    Deny,
}

impl fmt::Display for UnknownFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownFields::Ignore => write!(f, "ignore"),
            UnknownFields::Deny => write!(f, "deny"),
        }
    }
}
