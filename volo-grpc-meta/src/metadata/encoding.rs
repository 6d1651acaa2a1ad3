//! Key and value grammar of gRPC custom metadata, and the base64 form of `-bin` values.

use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD_NO_PAD},
        DecodePaddingMode,
    },
    Engine as _,
};
use bytes::Bytes;
use faststr::FastStr;

use super::MetadataValue;
use crate::error::{Error, Result};

const BINARY_SUFFIX: &str = "-bin";
const RESERVED_PREFIX: &str = "grpc-";
const PSEUDO_PREFIX: &str = ":";

/// Headers owned by the protocol itself, never surfaced as custom metadata.
const RESERVED_KEYS: [&str; 3] = ["te", "content-type", "user-agent"];

/// Peers may send `-bin` values with or without padding.
const BASE64_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[inline]
pub(crate) fn is_binary_key(key: &str) -> bool {
    key.ends_with(BINARY_SUFFIX)
}

/// Keys which are reserved by gRPC or HTTP/2 and skipped when decoding.
#[inline]
pub(crate) fn is_reserved_key(key: &str) -> bool {
    key.starts_with(PSEUDO_PREFIX)
        || key.starts_with(RESERVED_PREFIX)
        || RESERVED_KEYS.contains(&key)
}

/// `^[0-9a-z_.\-]+$`
#[inline]
pub(crate) fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'_' | b'.' | b'-'))
}

/// `^[ -~]+$`, space and printable ascii.
#[inline]
pub(crate) fn is_valid_ascii_value(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| matches!(b, b' '..=b'~'))
}

pub(crate) fn check_key(key: &FastStr) -> Result<()> {
    if is_reserved_key(key) || !is_valid_key(key) {
        return Err(Error::InvalidMetadataKey(key.clone()));
    }
    Ok(())
}

/// Check that an outgoing entry may be put on the wire.
pub(crate) fn check_entry(key: &FastStr, value: &MetadataValue) -> Result<()> {
    check_key(key)?;
    match (is_binary_key(key), value) {
        (true, MetadataValue::Binary(_)) => Ok(()),
        (false, MetadataValue::Ascii(s)) if is_valid_ascii_value(s) => Ok(()),
        (false, MetadataValue::Ascii(s)) => Err(Error::InvalidMetadataValue {
            key: key.clone(),
            value: s.clone(),
        }),
        (true, MetadataValue::Ascii(_)) => Err(Error::InvalidMetadataValueType {
            key: key.clone(),
            expected: "bytes",
        }),
        (false, MetadataValue::Binary(_)) => Err(Error::InvalidMetadataValueType {
            key: key.clone(),
            expected: "str",
        }),
    }
}

/// The header value of an entry which already passed [`check_entry`].
pub(crate) fn wire_value(value: &MetadataValue) -> FastStr {
    match value {
        MetadataValue::Ascii(s) => s.clone(),
        MetadataValue::Binary(b) => encode_binary(b),
    }
}

pub(crate) fn encode_binary(value: &[u8]) -> FastStr {
    FastStr::from_string(STANDARD_NO_PAD.encode(value))
}

pub(crate) fn decode_binary(key: &str, value: &str) -> Result<Bytes> {
    BASE64_LENIENT
        .decode(value)
        .map(Bytes::from)
        .map_err(|err| {
            tracing::debug!("[VOLO] invalid base64 in metadata {}: {}", key, err);
            Error::InvalidBinaryMetadata {
                key: FastStr::new(key),
                reason: err.to_string(),
            }
        })
}
