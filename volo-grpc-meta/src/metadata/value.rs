use bytes::Bytes;
use faststr::FastStr;

/// A single metadata value.
///
/// Keys ending in `-bin` carry [`MetadataValue::Binary`], every other key carries
/// [`MetadataValue::Ascii`]. The pairing is checked when the metadata is encoded.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MetadataValue {
    Ascii(FastStr),
    Binary(Bytes),
}

impl MetadataValue {
    /// The text of an ascii value, `None` for binary values.
    pub fn to_str(&self) -> Option<&str> {
        match self {
            Self::Ascii(s) => Some(s.as_str()),
            Self::Binary(_) => None,
        }
    }

    /// The raw bytes of the value, whichever kind it is.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Ascii(s) => s.as_bytes(),
            Self::Binary(b) => &b[..],
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }
}

impl From<FastStr> for MetadataValue {
    fn from(value: FastStr) -> Self {
        Self::Ascii(value)
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Ascii(FastStr::from_string(value))
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Ascii(FastStr::new(value))
    }
}

impl From<Bytes> for MetadataValue {
    fn from(value: Bytes) -> Self {
        Self::Binary(value)
    }
}

impl From<Vec<u8>> for MetadataValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(value))
    }
}

impl From<&[u8]> for MetadataValue {
    fn from(value: &[u8]) -> Self {
        Self::Binary(Bytes::copy_from_slice(value))
    }
}

impl<const N: usize> From<&[u8; N]> for MetadataValue {
    fn from(value: &[u8; N]) -> Self {
        Self::Binary(Bytes::copy_from_slice(value))
    }
}

impl PartialEq<str> for MetadataValue {
    fn eq(&self, other: &str) -> bool {
        self.to_str() == Some(other)
    }
}

impl PartialEq<&str> for MetadataValue {
    fn eq(&self, other: &&str) -> bool {
        self.to_str() == Some(*other)
    }
}

impl PartialEq<[u8]> for MetadataValue {
    fn eq(&self, other: &[u8]) -> bool {
        matches!(self, Self::Binary(b) if b.as_ref() == other)
    }
}

impl PartialEq<&[u8]> for MetadataValue {
    fn eq(&self, other: &&[u8]) -> bool {
        *self == **other
    }
}
