//! Server-Sent Events framing
//!
//! This module provides:
//! - Record encoding (`data: ` prefixed lines, blank-line terminated)
//! - Stream decoding for consumers and tests

pub mod record;

pub use record::{decode, Record, DATA_PREFIX, RECORD_TERMINATOR};
