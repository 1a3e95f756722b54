//! # Folio Core
//!
//! Embedded document store for single-process applications.
//!
//! foliodb persists named records (arbitrary key-value documents) grouped
//! into named collections. Two backends expose an equivalent document-store
//! surface:
//!
//! - [`FlatFileStore`] - one JSON file per record under a root directory,
//!   with per-collection write serialization and atomic file replacement
//! - [`EmbeddedStore`] - one transactional engine file, with a
//!   query-builder ([`Filter`]) per collection and store-assigned
//!   monotonic record identifiers
//!
//! Both implement the [`DocumentStore`] capability, so callers can stay
//! backend-agnostic.
//!
//! ## Example
//!
//! ```no_run
//! use folio_core::{Config, FlatFileStore, Record};
//!
//! let store = FlatFileStore::open("./data", Config::default()).unwrap();
//!
//! let mut karn = Record::new();
//! karn.insert("Name".to_string(), "Karn".into());
//! karn.insert("Age".to_string(), "23".into());
//!
//! store.write("users", "karn", &karn).unwrap();
//! let back = store.read("users", "karn").unwrap();
//! assert_eq!(back, karn);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod embedded;
mod error;
mod filter;
mod flatfile;
mod registry;
mod store;

pub use config::{Config, DEFAULT_DB_NAME};
pub use embedded::{EmbeddedStore, DB_EXT};
pub use error::{CoreError, CoreResult};
pub use filter::Filter;
pub use flatfile::FlatFileStore;
pub use registry::MutexRegistry;
pub use store::DocumentStore;

pub use folio_codec::{Decoder, Encoder, JsonDecoder, JsonEncoder, Record, Value};
