use std::{collections::HashSet, slice};

use faststr::FastStr;
use http::HeaderMap;

use super::{
    encoding::{check_entry, decode_binary, is_binary_key, is_reserved_key, wire_value},
    MetadataValue,
};
use crate::{
    error::Result,
    header::{HeaderField, HeaderList},
};

/// A set of gRPC custom metadata entries.
///
/// Keys may repeat. Entries keep the order they were appended in, which is the order they
/// are put on the wire; lookups by key do not depend on it.
///
/// # Examples
///
/// ```
/// # use volo_grpc_meta::metadata::Metadata;
/// let mut map = Metadata::new();
///
/// map.append("x-host", "example.com");
/// map.append("x-host", "example.org");
/// map.append("trace-proto-bin", b"[binary data]");
///
/// assert!(map.contains_key("x-host"));
/// assert!(!map.contains_key("x-location"));
///
/// assert_eq!(map.get("x-host").unwrap(), "example.com");
/// assert_eq!(map.get_all("x-host").count(), 2);
/// assert_eq!(map.len(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(FastStr, MetadataValue)>,
}

/// `Metadata` entry iterator.
///
/// Yields `(&FastStr, &MetadataValue)` in insertion order. The same key may be yielded
/// more than once if it has more than one associated value.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: slice::Iter<'a, (FastStr, MetadataValue)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append a value under `key`, keeping any value already stored for it.
    ///
    /// No validation happens here, an invalid entry is reported by [`Metadata::encode`].
    pub fn append(&mut self, key: impl Into<FastStr>, value: impl Into<MetadataValue>) {
        self.entries.push((key.into(), value.into()));
    }

    /// The first value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    /// All values stored under `key`, in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a MetadataValue> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k.as_str() == key)
    }

    /// Each distinct key once, in order of first appearance.
    pub fn keys(&self) -> impl Iterator<Item = &FastStr> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        self.entries
            .iter()
            .map(|(key, _)| key)
            .filter(move |key| seen.insert(*key))
    }

    /// The number of entries, counting every value of a repeated key.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Decode the custom metadata out of an incoming header block.
    ///
    /// Pseudo-headers, `grpc-*` headers, `te`, `content-type` and `user-agent` are skipped.
    /// Values of `-bin` keys are base64 decoded, padded or not.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBinaryMetadata`](crate::Error::InvalidBinaryMetadata) if a `-bin` value is not valid base64.
    pub fn decode<I>(headers: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: HeaderField,
    {
        let headers = headers.into_iter();
        let mut metadata = Self::with_capacity(headers.size_hint().0);
        for header in headers {
            metadata.append_decoded(header.name(), header.value())?;
        }
        Ok(metadata)
    }

    /// Same as [`Metadata::decode`] for a [`HeaderMap`].
    ///
    /// A `HeaderMap` groups the values of one key together, so entries of different keys do
    /// not keep their relative arrival order. Text values which are not valid UTF-8 are kept
    /// with the invalid sequences replaced by U+FFFD.
    pub fn from_header_map(headers: &HeaderMap) -> Result<Self> {
        let mut metadata = Self::with_capacity(headers.len());
        for (name, value) in headers {
            let value = String::from_utf8_lossy(value.as_bytes());
            metadata.append_decoded(name.as_str(), &value)?;
        }
        Ok(metadata)
    }

    fn append_decoded(&mut self, key: &str, value: &str) -> Result<()> {
        if is_reserved_key(key) {
            return Ok(());
        }
        let value = if is_binary_key(key) {
            MetadataValue::Binary(decode_binary(key, value)?)
        } else {
            MetadataValue::Ascii(FastStr::new(value))
        };
        self.entries.push((FastStr::new(key), value));
        Ok(())
    }

    /// Encode every entry into its wire form, in order.
    ///
    /// # Errors
    ///
    /// Fails on the first entry with a reserved or malformed key, a value whose kind does
    /// not match its key, or a text value outside printable ascii.
    pub fn encode(&self) -> Result<HeaderList> {
        self.entries
            .iter()
            .map(|(key, value)| {
                check_entry(key, value)?;
                Ok((key.clone(), wire_value(value)))
            })
            .collect()
    }

    /// Check every entry without producing the wire form.
    pub fn validate(&self) -> Result<()> {
        self.entries
            .iter()
            .try_for_each(|(key, value)| check_entry(key, value))
    }

    /// The wire form of metadata which already passed [`Metadata::validate`].
    pub(crate) fn wire_entries(&self) -> impl Iterator<Item = (FastStr, FastStr)> + '_ {
        self.entries
            .iter()
            .map(|(key, value)| (key.clone(), wire_value(value)))
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a FastStr, &'a MetadataValue);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a Metadata {
    type Item = (&'a FastStr, &'a MetadataValue);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Metadata {
    type Item = (FastStr, MetadataValue);
    type IntoIter = std::vec::IntoIter<(FastStr, MetadataValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Metadata
where
    K: Into<FastStr>,
    V: Into<MetadataValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut metadata = Self::new();
        metadata.extend(iter);
        metadata
    }
}

impl<K, V> Extend<(K, V)> for Metadata
where
    K: Into<FastStr>,
    V: Into<MetadataValue>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        self.entries
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::HeaderValue;

    use super::*;
    use crate::error::Error;

    #[test]
    fn repeated_keys_keep_order() {
        let metadata: Metadata = [("x-a", "1"), ("x-b", "2"), ("x-a", "3")]
            .into_iter()
            .collect();

        assert_eq!(metadata.len(), 3);
        assert_eq!(metadata.get("x-a").unwrap(), "1");
        assert_eq!(
            metadata.get_all("x-a").collect::<Vec<_>>(),
            vec![&MetadataValue::from("1"), &MetadataValue::from("3")]
        );
        assert_eq!(
            metadata.keys().map(FastStr::as_str).collect::<Vec<_>>(),
            vec!["x-a", "x-b"]
        );
        assert_eq!(
            metadata.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            vec!["x-a", "x-b", "x-a"]
        );
        assert!(metadata.get("x-c").is_none());
    }

    #[test]
    fn decode_skips_reserved_headers() {
        let metadata = Metadata::decode([
            (":method", "POST"),
            (":path", "/foo.Bar/Baz"),
            ("te", "trailers"),
            ("content-type", "application/grpc"),
            ("user-agent", "grpc-rust"),
            ("grpc-timeout", "1S"),
            ("grpc-encoding", "gzip"),
            ("x-trace", "abc"),
            ("x-id-bin", "/wA"),
            ("x-trace", "def"),
        ])
        .unwrap();

        let expected: Metadata = vec![
            ("x-trace", MetadataValue::from("abc")),
            ("x-id-bin", MetadataValue::from(b"\xff\x00")),
            ("x-trace", MetadataValue::from("def")),
        ]
        .into_iter()
        .collect();
        assert_eq!(metadata, expected);
    }

    #[test]
    fn decode_rejects_malformed_binary() {
        assert!(matches!(
            Metadata::decode([("x-id-bin", "not base64!")]),
            Err(Error::InvalidBinaryMetadata { .. })
        ));
    }

    #[test]
    fn encode_preserves_order() {
        let metadata: Metadata = vec![
            ("x-b", MetadataValue::from("2")),
            ("x-a-bin", MetadataValue::from(Bytes::from_static(b"abc"))),
            ("x-b", MetadataValue::from("1")),
        ]
        .into_iter()
        .collect();

        let headers = metadata.encode().unwrap();
        let headers: Vec<(&str, &str)> = headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(headers, vec![("x-b", "2"), ("x-a-bin", "YWJj"), ("x-b", "1")]);

        assert_eq!(Metadata::decode(metadata.encode().unwrap()).unwrap(), metadata);
    }

    #[test]
    fn validate() {
        let mut metadata = Metadata::new();
        metadata.append("x-ok", "fine");
        assert!(metadata.validate().is_ok());

        metadata.append("X-Trace", "abc");
        assert_eq!(
            metadata.validate(),
            Err(Error::InvalidMetadataKey(FastStr::from_static_str("X-Trace")))
        );
    }

    #[test]
    fn from_header_map() {
        let mut hm = HeaderMap::new();
        hm.insert("content-type", HeaderValue::from_static("application/grpc"));
        hm.insert("grpc-timeout", HeaderValue::from_static("1S"));
        hm.append("x-trace", HeaderValue::from_static("abc"));
        hm.append("x-trace", HeaderValue::from_static("def"));
        hm.insert("x-id-bin", HeaderValue::from_static("/wA="));

        let metadata = Metadata::from_header_map(&hm).unwrap();
        assert_eq!(metadata.len(), 3);
        assert_eq!(
            metadata.get_all("x-trace").collect::<Vec<_>>(),
            vec![&MetadataValue::from("abc"), &MetadataValue::from("def")]
        );
        assert_eq!(metadata.get("x-id-bin").unwrap(), &b"\xff\x00"[..]);
    }

    #[test]
    fn header_map_keeps_non_ascii_text() {
        let mut hm = HeaderMap::new();
        hm.insert("x-name", HeaderValue::from_bytes("café".as_bytes()).unwrap());
        assert_eq!(
            Metadata::from_header_map(&hm).unwrap(),
            Metadata::decode([("x-name", "café")]).unwrap()
        );

        let mut hm = HeaderMap::new();
        hm.insert("x-name", HeaderValue::from_bytes(b"caf\xe9").unwrap());
        let metadata = Metadata::from_header_map(&hm).unwrap();
        assert_eq!(metadata.get("x-name").unwrap(), "caf\u{FFFD}");
    }

    #[test]
    fn header_map_rejects_non_ascii_binary() {
        let mut hm = HeaderMap::new();
        hm.insert("x-id-bin", HeaderValue::from_bytes(b"/w\xe9").unwrap());
        let err = Metadata::from_header_map(&hm).unwrap_err();
        assert!(matches!(err, Error::InvalidBinaryMetadata { .. }));
        assert_eq!(
            crate::status::Status::from(err).code(),
            crate::status::Code::InvalidArgument
        );
    }

    #[test]
    fn keys_are_unique_in_first_seen_order() {
        let metadata: Metadata = [
            ("x-b", "1"),
            ("x-a", "2"),
            ("x-b", "3"),
            ("x-c", "4"),
            ("x-a", "5"),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            metadata.keys().map(FastStr::as_str).collect::<Vec<_>>(),
            vec!["x-b", "x-a", "x-c"]
        );
        assert_eq!(Metadata::new().keys().count(), 0);
    }
}
