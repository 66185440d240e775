//! Canonical LUD-06 metadata.
//!
//! The metadata string is part of the protocol contract: wallets hash the
//! exact string they received and compare it with the description hash
//! committed in the invoice. Serialization is therefore byte-stable and
//! matches the common Python `json.dumps` layout used by LNURL services:
//! `", "` between array items, ASCII-only output with `\uXXXX` escapes,
//! entries in insertion order, `text/plain` first and `text/identifier`
//! second.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use sha2::{Digest, Sha256};

use crate::address::LightningAddress;
use crate::error::LnurlError;

/// MIME type of the description entry.
pub const TEXT_PLAIN: &str = "text/plain";

/// MIME type of the Lightning address entry.
pub const TEXT_IDENTIFIER: &str = "text/identifier";

/// Ordered `[mime, value]` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    /// Creates metadata with the mandatory description and identifier entries.
    #[must_use]
    pub fn new(description: impl Into<String>, address: &LightningAddress) -> Self {
        Self {
            entries: vec![
                (TEXT_PLAIN.to_owned(), description.into()),
                (TEXT_IDENTIFIER.to_owned(), address.to_string()),
            ],
        }
    }

    /// Appends an extension entry, e.g. `image/png;base64`.
    #[must_use]
    pub fn with_entry(mut self, mime: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((mime.into(), value.into()));
        self
    }

    /// Parses a metadata string received from a service.
    ///
    /// # Errors
    ///
    /// Returns [`LnurlError::InvalidMetadata`] unless the string is a JSON
    /// array of two-string arrays.
    pub fn parse(metadata: &str) -> Result<Self, LnurlError> {
        let entries: Vec<(String, String)> = serde_json::from_str(metadata)?;
        Ok(Self { entries })
    }

    /// All entries in order.
    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// First value with the given MIME type.
    #[must_use]
    pub fn get(&self, mime: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(m, _)| m == mime)
            .map(|(_, v)| v.as_str())
    }

    /// The `text/plain` description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.get(TEXT_PLAIN)
    }

    /// The `text/identifier` Lightning address.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.get(TEXT_IDENTIFIER)
    }

    /// Canonical string sent as the `metadata` field.
    #[must_use]
    pub fn serialize(&self) -> String {
        to_canonical_json(&self.entries)
    }

    /// Hex SHA-256 of [`Metadata::serialize`].
    #[must_use]
    pub fn hash(&self) -> String {
        hash(&self.serialize())
    }
}

/// `json.dumps` style output: `", "` item separators, non-ASCII and DEL as
/// lowercase `\uXXXX` escapes (UTF-16 surrogate pairs above the BMP).
#[derive(Debug, Clone, Copy, Default)]
struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if matches!(ch, ' '..='~') {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..index])?;
            let mut units = [0_u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}

fn to_canonical_json(entries: &[(String, String)]) -> String {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, CanonicalFormatter);
    entries
        .serialize(&mut serializer)
        .expect("serialization failed");
    // Every byte outside printable ASCII is escaped above.
    String::from_utf8(out).expect("canonical metadata is ASCII")
}

/// Canonical metadata string for a description and address.
#[must_use]
pub fn serialize(description: &str, address: &LightningAddress) -> String {
    Metadata::new(description, address).serialize()
}

/// Lowercase hex SHA-256 over the UTF-8 bytes of `canonical`.
#[must_use]
pub fn hash(canonical: &str) -> String {
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

/// Description used when a request carries none.
#[must_use]
pub fn default_description(username: &str) -> String {
    format!("Zap {username} some sats")
}
