//! Default JSON codec.

use crate::error::{CodecError, CodecResult};
use crate::{Decoder, Encoder, Record};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

/// JSON encoder with a pretty and a compact mode.
///
/// The pretty mode produces tab-indented output terminated by a single
/// newline, which is the flat-file backend's on-disk record format. The
/// compact mode produces the shortest serialization. Both decode back to
/// the same record; JSON decoding is whitespace-insensitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder {
    compact: bool,
}

impl JsonEncoder {
    /// Creates the pretty encoder: tab indentation, trailing newline.
    #[must_use]
    pub fn pretty() -> Self {
        Self { compact: false }
    }

    /// Creates the compact encoder.
    #[must_use]
    pub fn compact() -> Self {
        Self { compact: true }
    }
}

impl Encoder for JsonEncoder {
    fn encode(&self, record: &Record) -> CodecResult<Vec<u8>> {
        if self.compact {
            return serde_json::to_vec(record)
                .map_err(|e| CodecError::encode_failed(e.to_string()));
        }

        let mut buf = Vec::with_capacity(128);
        let formatter = PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        record
            .serialize(&mut ser)
            .map_err(|e| CodecError::encode_failed(e.to_string()))?;
        buf.push(b'\n');
        Ok(buf)
    }
}

/// JSON decoder.
///
/// Rejects input whose top-level value is not an object, since a record is
/// a field mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode(&self, bytes: &[u8]) -> CodecResult<Record> {
        serde_json::from_slice::<Record>(bytes)
            .map_err(|e| CodecError::decode_failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn pretty_output_is_tab_indented_with_trailing_newline() {
        let r = record(json!({"Name": "Karn", "Age": "23"}));
        let bytes = JsonEncoder::pretty().encode(&r).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.ends_with('\n'));
        assert!(text.contains("\n\t\"Name\": \"Karn\""));
    }

    #[test]
    fn compact_output_has_no_whitespace() {
        let r = record(json!({"a": 1}));
        let bytes = JsonEncoder::compact().encode(&r).unwrap();
        assert_eq!(bytes, br#"{"a":1}"#);
    }

    #[test]
    fn decode_roundtrips_pretty_output() {
        let r = record(json!({"Name": "Karn", "Age": 23, "Active": true}));
        let bytes = JsonEncoder::pretty().encode(&r).unwrap();
        let decoded = JsonDecoder.decode(&bytes).unwrap();
        assert_eq!(decoded, r);
    }

    #[test]
    fn decode_rejects_malformed_input() {
        let err = JsonDecoder.decode(b"{ not json").unwrap_err();
        assert!(matches!(err, CodecError::Decode { .. }));
    }

    #[test]
    fn decode_rejects_non_object_top_level() {
        let err = JsonDecoder.decode(b"[1, 2, 3]").unwrap_err();
        assert!(matches!(err, CodecError::Decode { .. }));
    }

    fn field_value() -> impl Strategy<Value = serde_json::Value> {
        prop_oneof![
            any::<bool>().prop_map(serde_json::Value::from),
            any::<i64>().prop_map(serde_json::Value::from),
            "[a-zA-Z0-9 ]{0,16}".prop_map(serde_json::Value::from),
        ]
    }

    proptest! {
        // Pretty and compact encodings of the same record must decode
        // identically: the format is whitespace-insensitive.
        #[test]
        fn pretty_and_compact_decode_identically(
            fields in prop::collection::btree_map("[a-z]{1,8}", field_value(), 0..8)
        ) {
            let r: Record = fields.into_iter().collect();
            let pretty = JsonEncoder::pretty().encode(&r).unwrap();
            let compact = JsonEncoder::compact().encode(&r).unwrap();
            prop_assert_eq!(
                JsonDecoder.decode(&pretty).unwrap(),
                JsonDecoder.decode(&compact).unwrap()
            );
        }
    }
}
