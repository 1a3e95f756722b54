//! Store configuration.

use folio_codec::{Decoder, Encoder, JsonDecoder, JsonEncoder};
use std::fmt;
use std::sync::Arc;

/// Database name used when none is configured.
pub const DEFAULT_DB_NAME: &str = "default";

/// Configuration for opening a store.
///
/// The encoder and decoder are capabilities injected at construction; the
/// stores never fall back to a global default. Logging goes through the
/// `tracing` facade, so the subscriber installed by the host application
/// decides what is emitted.
#[derive(Clone)]
pub struct Config {
    /// Database name; the embedded backend stores its data in
    /// `<db_name>.folio`.
    pub db_name: String,

    /// Record serializer. Defaults to pretty JSON (tab indentation,
    /// trailing newline), the flat-file on-disk format.
    pub encoder: Arc<dyn Encoder>,

    /// Record deserializer. Defaults to JSON.
    pub decoder: Arc<dyn Decoder>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_name: DEFAULT_DB_NAME.to_string(),
            encoder: Arc::new(JsonEncoder::pretty()),
            decoder: Arc::new(JsonDecoder),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the database name.
    #[must_use]
    pub fn db_name(mut self, name: impl Into<String>) -> Self {
        self.db_name = name.into();
        self
    }

    /// Sets the record encoder.
    #[must_use]
    pub fn encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Sets the record decoder.
    #[must_use]
    pub fn decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = decoder;
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("db_name", &self.db_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.db_name, "default");
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .db_name("inventory")
            .encoder(Arc::new(JsonEncoder::compact()));
        assert_eq!(config.db_name, "inventory");
    }
}
