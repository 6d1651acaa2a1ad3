use faststr::FastStr;
use thiserror::Error;

/// Errors raised while translating between gRPC wire headers and their in-process form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The `grpc-timeout` value does not match `<digits><unit>`.
    #[error("invalid timeout: '{0}'")]
    InvalidTimeoutFormat(FastStr),
    /// The metadata key is reserved or contains characters outside `[0-9a-z_.-]`.
    #[error("invalid metadata key: '{0}'")]
    InvalidMetadataKey(FastStr),
    /// A `-bin` key carries text, or a text key carries bytes.
    #[error("invalid metadata value type for '{key}', {expected} expected")]
    InvalidMetadataValueType {
        key: FastStr,
        expected: &'static str,
    },
    /// The text value contains characters outside printable ASCII.
    #[error("invalid metadata value for '{key}': {value:?}")]
    InvalidMetadataValue { key: FastStr, value: FastStr },
    /// An incoming `-bin` value is not valid base64.
    #[error("invalid binary metadata for '{key}': {reason}")]
    InvalidBinaryMetadata { key: FastStr, reason: String },
    /// A mandatory request field was never set on the builder.
    #[error("missing mandatory request field '{0}'")]
    MissingRequestField(&'static str),
    /// The request could not be represented as an `http::Request`.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}
