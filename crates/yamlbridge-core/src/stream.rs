//! Multi-document YAML streams.
//!
//! A [`StreamDecoder`] reads `---`-separated documents one at a time, each
//! through the same convert-and-bind path as [`crate::from_str`]. The end of
//! the stream is `Ok(None)`, never an error:
//!
//! ```
//! use yamlbridge_core::StreamDecoder;
//! use std::collections::BTreeMap;
//!
//! let mut stream = StreamDecoder::from_str("---\ntest: 1\n---\ntest: 2\n");
//! while let Some(doc) = stream.decode::<BTreeMap<String, u32>>().unwrap() {
//!     assert!(doc["test"] > 0);
//! }
//! assert_eq!(stream.documents_read(), 2);
//! ```
//!
//! A [`StreamEncoder`] writes one document per call, with a `---` marker
//! before every document but the first.

use std::io::{Read, Write};
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::binder;
use crate::convert::to_strict;
use crate::decoder::{not_utf8, utf8};
use crate::encoder;
use crate::error::{Error, Result};
use crate::loader::Loader;
use crate::options::DecodeOptions;

const DOCUMENT_MARKER: &[u8] = b"---\n";

type Source<'de> = Box<dyn Iterator<Item = char> + 'de>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Exhausted,
}

/// Reads successive documents from one YAML stream.
///
/// A parse error exhausts the stream, since the parser cannot resynchronize.
/// Duplicate keys, unknown fields and type mismatches fail only the current
/// document; the next call moves on to the following one.
pub struct StreamDecoder<'de> {
    loader: Loader<Source<'de>>,
    /// Input that could not be read at all; reported by the first decode.
    failed: Option<Error>,
    options: DecodeOptions,
    state: State,
    read: usize,
}

impl<'de> StreamDecoder<'de> {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &'de str) -> Self {
        Self::new(Box::new(s.chars()), None)
    }

    pub fn from_slice(v: &'de [u8]) -> Self {
        match utf8(v) {
            Ok(s) => Self::from_str(s),
            Err(err) => Self::new(Box::new(std::iter::empty()), Some(err)),
        }
    }

    /// Read the whole of `rdr` up front, then decode from the buffer.
    pub fn from_reader<R>(mut rdr: R) -> Self
    where
        R: Read,
    {
        let mut buf = Vec::new();
        if let Err(err) = rdr.read_to_end(&mut buf) {
            return Self::new(Box::new(std::iter::empty()), Some(err.into()));
        }
        match String::from_utf8(buf) {
            Ok(text) => Self::new(Box::new(OwnedChars { text, pos: 0 }), None),
            Err(err) => Self::new(
                Box::new(std::iter::empty()),
                Some(not_utf8(err.utf8_error())),
            ),
        }
    }

    fn new(source: Source<'de>, failed: Option<Error>) -> Self {
        StreamDecoder {
            loader: Loader::new(source),
            failed,
            options: DecodeOptions::default(),
            state: State::Open,
            read: 0,
        }
    }

    /// Apply decode options to every following document.
    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        debug!(unknown_fields = %options.unknown_fields, "YAML stream decode options set");
        self.options = options;
        self
    }

    /// Decode the next document, or `Ok(None)` once the stream is exhausted.
    pub fn decode<T>(&mut self) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        if self.state == State::Exhausted {
            return Ok(None);
        }
        if let Some(err) = self.failed.take() {
            self.state = State::Exhausted;
            return Err(err);
        }
        let node = match self.loader.next_document() {
            Ok(Some(node)) => node,
            Ok(None) => {
                self.state = State::Exhausted;
                debug!(documents = self.read, "YAML stream exhausted");
                return Ok(None);
            }
            Err(err) => {
                self.state = State::Exhausted;
                debug!(document = self.read + 1, error = %err, "YAML stream stopped on parse error");
                return Err(err);
            }
        };
        self.read += 1;
        debug!(document = self.read, kind = node.kind_name(), "decoded YAML document");
        let value = to_strict(&node)?;
        binder::from_value_with_options(value, &self.options).map(Some)
    }

    /// Number of documents parsed so far, including ones that failed to
    /// convert or bind.
    pub fn documents_read(&self) -> usize {
        self.read
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == State::Exhausted
    }

    /// Turn the decoder into an iterator of typed documents.
    pub fn documents<T>(self) -> Documents<'de, T>
    where
        T: DeserializeOwned,
    {
        Documents {
            decoder: self,
            marker: PhantomData,
        }
    }
}

/// Iterator over the documents of a stream, from [`StreamDecoder::documents`].
pub struct Documents<'de, T> {
    decoder: StreamDecoder<'de>,
    marker: PhantomData<fn() -> T>,
}

impl<'de, T> Documents<'de, T> {
    pub fn into_decoder(self) -> StreamDecoder<'de> {
        self.decoder
    }
}

impl<T> Iterator for Documents<'_, T>
where
    T: DeserializeOwned,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.decoder.decode().transpose()
    }
}

/// Characters of a buffer the decoder owns.
struct OwnedChars {
    text: String,
    pos: usize,
}

impl Iterator for OwnedChars {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        let ch = self.text[self.pos..].chars().next()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }
}

/// Writes successive documents to one YAML stream.
pub struct StreamEncoder<W> {
    writer: W,
    written: usize,
}

impl<W: Write> StreamEncoder<W> {
    pub fn new(writer: W) -> Self {
        StreamEncoder { writer, written: 0 }
    }

    /// Write one document, preceded by `---` unless it is the first.
    pub fn encode<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let text = encoder::to_string(value)?;
        if self.written > 0 {
            self.writer.write_all(DOCUMENT_MARKER)?;
        }
        self.writer.write_all(text.as_bytes())?;
        self.written += 1;
        debug!(document = self.written, bytes = text.len(), "encoded YAML document");
        Ok(())
    }

    pub fn documents_written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Unwrap the underlying writer. No trailing marker is written.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
