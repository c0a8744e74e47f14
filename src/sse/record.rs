//! Event-stream record codec
//!
//! A record is the text form of one published value with every line
//! prefixed by `data: `, joined with `\n` and closed by a blank line:
//!
//! ```text
//! "line 1\nline 2"  ->  "data: line 1\ndata: line 2\n\n"
//! ```
//!
//! A multi-line value always becomes one record. The blank line is the only
//! record delimiter a consumer needs.

use std::fmt;

use bytes::Bytes;

/// Prefix written before every line of a value
pub const DATA_PREFIX: &str = "data: ";

/// Terminator appended after the last `data:` line
pub const RECORD_TERMINATOR: &str = "\n\n";

/// One encoded event-stream record
///
/// Cheap to clone: the encoded text lives in a reference-counted `Bytes`,
/// so every subscriber of a non-differentiated publish shares one buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record(Bytes);

impl Record {
    /// Encode a value into a record
    pub fn encode<T: fmt::Display + ?Sized>(value: &T) -> Self {
        let text = value.to_string();
        let capacity = text.len() + DATA_PREFIX.len() + RECORD_TERMINATOR.len();
        let mut out = String::with_capacity(capacity);

        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(DATA_PREFIX);
            out.push_str(line);
        }
        out.push_str(RECORD_TERMINATOR);

        Self(Bytes::from(out))
    }

    /// Encoded text
    pub fn as_str(&self) -> &str {
        // Only ever built from a `String` in `encode`
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Encoded bytes, ready to be written to a client
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the record, returning the shared buffer
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Length of the encoded record in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record is empty (never true for an encoded record)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode the value carried by this record
    pub fn value(&self) -> String {
        decode_one(self.as_str())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<[u8]> for Record {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Record> for Bytes {
    fn from(record: Record) -> Self {
        record.0
    }
}

/// Decode a concatenated event stream into the values it carries
///
/// Records are split on the blank-line terminator. Inside a record, the
/// `data: ` prefix is stripped from every line and the lines are re-joined
/// with `\n`. Lines without the prefix (comments, other fields) are skipped.
/// A trailing partial record with no terminator is ignored.
pub fn decode(stream: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut rest = stream;

    while let Some(end) = rest.find(RECORD_TERMINATOR) {
        values.push(decode_one(&rest[..end]));
        rest = &rest[end + RECORD_TERMINATOR.len()..];
    }

    values
}

fn decode_one(record: &str) -> String {
    let record = record.strip_suffix(RECORD_TERMINATOR).unwrap_or(record);

    record
        .split('\n')
        .filter_map(|line| line.strip_prefix(DATA_PREFIX))
        .collect::<Vec<_>>()
        .join("\n")
}
