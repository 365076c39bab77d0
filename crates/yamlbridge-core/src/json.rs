//! JSON text output with canonical number formatting.
//!
//! `serde_json` prints floats with `ryu` (`1e36`); the converter's key
//! canonicalization prints `1e+36`. [`CanonicalFormatter`] routes floats
//! through [`crate::number::format_float`] so that keys and values agree, and
//! delegates layout to a compact or pretty inner formatter.

use std::io;

use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::number::format_float;

/// A `serde_json` formatter that prints floats canonically.
#[derive(Debug, Clone)]
pub struct CanonicalFormatter<F = CompactFormatter> {
    inner: F,
}

impl CanonicalFormatter<CompactFormatter> {
    pub fn compact() -> Self {
        CanonicalFormatter {
            inner: CompactFormatter,
        }
    }
}

impl CanonicalFormatter<PrettyFormatter<'static>> {
    pub fn pretty() -> Self {
        CanonicalFormatter {
            inner: PrettyFormatter::new(),
        }
    }
}

impl<F: Formatter> Formatter for CanonicalFormatter<F> {
    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(format_float(value).as_bytes())
    }

    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.begin_array(writer)
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.begin_object(writer)
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.begin_object_key(writer, first)
    }

    fn end_object_key<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.end_object_key(writer)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.end_object_value(writer)
    }
}

/// Compact JSON text for a value tree.
pub fn to_string(value: &Value) -> Result<String> {
    write_with(value, CanonicalFormatter::compact())
}

/// Indented JSON text for a value tree.
pub fn to_string_pretty(value: &Value) -> Result<String> {
    write_with(value, CanonicalFormatter::pretty())
}

fn write_with<F: Formatter>(value: &Value, formatter: F) -> Result<String> {
    let mut buf = Vec::with_capacity(128);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|err| Error::Message(err.to_string()))
}
