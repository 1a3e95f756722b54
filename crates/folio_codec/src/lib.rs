//! # Folio Codec
//!
//! Record serialization capability for foliodb.
//!
//! A record is a mapping from field names to arbitrary JSON values. This
//! crate defines the [`Encoder`] and [`Decoder`] capability traits the
//! stores consume, plus the default JSON implementations.
//!
//! ## Design Principles
//!
//! - Codecs are **capabilities**: the stores hold them as trait objects and
//!   never assume a concrete format
//! - Field insertion order is irrelevant to record equality
//! - Swapping the codec must not affect store logic
//!
//! ## Usage
//!
//! ```
//! use folio_codec::{Decoder, Encoder, JsonDecoder, JsonEncoder, Record};
//!
//! let mut record = Record::new();
//! record.insert("name".to_string(), "Karn".into());
//!
//! let encoder = JsonEncoder::pretty();
//! let bytes = encoder.encode(&record).unwrap();
//!
//! let decoder = JsonDecoder;
//! let decoded = decoder.decode(&bytes).unwrap();
//! assert_eq!(decoded, record);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod json;

pub use error::{CodecError, CodecResult};
pub use json::{JsonDecoder, JsonEncoder};

/// A JSON value stored in a record field.
pub use serde_json::Value;

/// A record: a mapping from field names to arbitrary values.
///
/// Records are the unit of storage in foliodb. They carry no schema;
/// equality ignores field insertion order.
pub type Record = serde_json::Map<String, Value>;

/// Capability for turning records into bytes.
///
/// Implementations must be deterministic for a given record and must not
/// hold mutable state. Failures surface as [`CodecError::Encode`].
pub trait Encoder: Send + Sync {
    /// Encodes a record into its serialized byte form.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if the record cannot be serialized.
    fn encode(&self, record: &Record) -> CodecResult<Vec<u8>>;
}

/// Capability for turning bytes back into records.
///
/// Failures surface as [`CodecError::Decode`].
pub trait Decoder: Send + Sync {
    /// Decodes serialized bytes into a record.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] if the bytes are malformed or do not
    /// describe a field mapping.
    fn decode(&self, bytes: &[u8]) -> CodecResult<Record>;
}
