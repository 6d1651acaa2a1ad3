//! Well-known header names and the ordered header list exchanged with the transport.

use faststr::FastStr;

pub const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";
pub const MESSAGE_TYPE_HEADER: &str = "grpc-message-type";
pub const ENCODING_HEADER: &str = "grpc-encoding";
pub const ACCEPT_ENCODING_HEADER: &str = "grpc-accept-encoding";
pub const TE_HEADER: &str = "te";
pub const CONTENT_TYPE_HEADER: &str = "content-type";
pub const USER_AGENT_HEADER: &str = "user-agent";

pub const METHOD_PSEUDO_HEADER: &str = ":method";
pub const SCHEME_PSEUDO_HEADER: &str = ":scheme";
pub const PATH_PSEUDO_HEADER: &str = ":path";
pub const AUTHORITY_PSEUDO_HEADER: &str = ":authority";

pub const TE_TRAILERS: &str = "trailers";
pub const GRPC_CONTENT_TYPE: &str = "application/grpc";
pub const GRPC_PROTO_CONTENT_TYPE: &str = "application/grpc+proto";

/// An ordered HTTP/2 header block, pseudo-headers included.
pub type HeaderList = Vec<(FastStr, FastStr)>;

/// A single `(name, value)` entry of an incoming header block.
///
/// Implemented for owned pairs and for references to them, so both `Vec<(K, V)>` and
/// `&[(K, V)]` can be scanned without copying.
pub trait HeaderField {
    fn name(&self) -> &str;

    fn value(&self) -> &str;
}

impl<K, V> HeaderField for (K, V)
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    #[inline]
    fn name(&self) -> &str {
        self.0.as_ref()
    }

    #[inline]
    fn value(&self) -> &str {
        self.1.as_ref()
    }
}

impl<T> HeaderField for &T
where
    T: HeaderField + ?Sized,
{
    #[inline]
    fn name(&self) -> &str {
        (**self).name()
    }

    #[inline]
    fn value(&self) -> &str {
        (**self).value()
    }
}
