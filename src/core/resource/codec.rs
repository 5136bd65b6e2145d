// ─── Declaration codecs ───
// Serde adapters for the textual forms used in resource declarations.

use std::collections::BTreeMap;

use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::integrity::{checksum_to_hex, parse_checksum, ChecksumAlgorithm};

/// `Url` as a plain string.
pub(crate) mod url_str {
    use super::*;

    pub fn serialize<S: Serializer>(url: &Url, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(url.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Url, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Url::parse(raw.trim()).map_err(serde::de::Error::custom)
    }
}

/// Optional `Url`, used by declaration structs before validation.
pub(crate) mod opt_url_str {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Url>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|value| Url::parse(value.trim()).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawChecksum {
    Number(u64),
    Text(String),
}

/// Checksum maps: numeric in memory, `0x`-prefixed lower-case hex text on
/// the wire. The prefix keeps all-digit hex values from being read back as
/// decimal. Unprefixed decimal or hex text (and JSON numbers) are still
/// accepted on input.
pub(crate) mod hex_checksums {
    use super::*;

    pub fn serialize<S: Serializer>(
        checksums: &BTreeMap<ChecksumAlgorithm, u64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let encoded: BTreeMap<ChecksumAlgorithm, String> = checksums
            .iter()
            .map(|(algorithm, value)| (*algorithm, format!("0x{}", checksum_to_hex(*value))))
            .collect();
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<ChecksumAlgorithm, u64>, D::Error> {
        let raw = Option::<BTreeMap<ChecksumAlgorithm, RawChecksum>>::deserialize(deserializer)?;
        raw.unwrap_or_default()
            .into_iter()
            .map(|(algorithm, value)| {
                let decoded = match value {
                    RawChecksum::Number(number) => Ok(number),
                    RawChecksum::Text(text) => parse_checksum(&text),
                };
                decoded
                    .map(|value| (algorithm, value))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "hex_checksums", default)]
        checksums: BTreeMap<ChecksumAlgorithm, u64>,
    }

    #[test]
    fn checksums_encode_as_hex_text() {
        let mut checksums = BTreeMap::new();
        checksums.insert(ChecksumAlgorithm::Crc32, 0xdead_beef);
        let json = serde_json::to_string(&Holder { checksums }).unwrap();
        assert_eq!(json, r#"{"checksums":{"crc32":"0xdeadbeef"}}"#);
    }

    #[test]
    fn checksums_accept_decimal_hex_and_numbers() {
        let holder: Holder = serde_json::from_str(
            r#"{"checksums":{"crc32":"3735928559","adler32":"ff","CRC32C":42}}"#,
        )
        .unwrap();
        assert_eq!(holder.checksums[&ChecksumAlgorithm::Crc32], 0xdead_beef);
        assert_eq!(holder.checksums[&ChecksumAlgorithm::Adler32], 0xff);
        assert_eq!(holder.checksums[&ChecksumAlgorithm::Crc32c], 42);
    }

    #[test]
    fn all_digit_hex_survives_round_trip() {
        let mut checksums = BTreeMap::new();
        checksums.insert(ChecksumAlgorithm::Crc32, 0x1234_5678);
        let json = serde_json::to_string(&Holder { checksums }).unwrap();
        let back: Holder = serde_json::from_str(&json).unwrap();
        assert_eq!(back.checksums[&ChecksumAlgorithm::Crc32], 0x1234_5678);
    }

    #[test]
    fn null_checksums_decode_empty() {
        let holder: Holder = serde_json::from_str(r#"{"checksums":null}"#).unwrap();
        assert!(holder.checksums.is_empty());
    }
}
