//! Contains data structures and utilities for handling gRPC custom metadata.

mod encoding;
mod map;
mod value;

use faststr::FastStr;

pub(crate) use self::encoding::{decode_binary, encode_binary};
pub use self::{
    map::{Iter, Metadata},
    value::MetadataValue,
};
use crate::{
    error::Result,
    header::{HeaderField, HeaderList},
};

/// Encode an ordered sequence of metadata entries into wire headers.
///
/// Accepts anything yielding `(key, value)` pairs, e.g. a [`Metadata`] or a plain
/// `Vec<(&str, &str)>`. One header is produced per entry, in input order.
///
/// ```
/// # use volo_grpc_meta::metadata;
/// let headers = metadata::encode([("x-trace", "abc")]).unwrap();
/// assert_eq!(headers[0].1.as_str(), "abc");
///
/// assert!(metadata::encode([("grpc-foo", "x")]).is_err());
/// assert!(metadata::encode([("X-Trace", "abc")]).is_err());
/// ```
pub fn encode<I, K, V>(items: I) -> Result<HeaderList>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<FastStr>,
    V: Into<MetadataValue>,
{
    items
        .into_iter()
        .map(|(key, value)| {
            let (key, value) = (key.into(), value.into());
            encoding::check_entry(&key, &value)?;
            let value = encoding::wire_value(&value);
            Ok((key, value))
        })
        .collect()
}

/// Decode the custom metadata out of an incoming header block, see [`Metadata::decode`].
pub fn decode<I>(headers: I) -> Result<Metadata>
where
    I: IntoIterator,
    I::Item: HeaderField,
{
    Metadata::decode(headers)
}
