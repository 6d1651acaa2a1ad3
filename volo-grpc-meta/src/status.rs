//! gRPC status codes and the trailers that carry them.

use std::{borrow::Cow, fmt};

use bytes::Bytes;
use faststr::FastStr;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use tracing::{debug, trace};

use crate::{
    error::{Error, Result},
    header::{HeaderField, HeaderList},
    metadata::{decode_binary, encode_binary},
};

/// Everything outside `0x20..=0x24 | 0x26..=0x7E` is escaped, `%` included.
const ENCODING_SET: &AsciiSet = &CONTROLS.add(b'%');

pub const GRPC_STATUS_HEADER_CODE: &str = "grpc-status";
pub const GRPC_STATUS_MESSAGE_HEADER: &str = "grpc-message";
pub const GRPC_STATUS_DETAILS_HEADER: &str = "grpc-status-details-bin";

/// Percent-encode a `grpc-message` value.
///
/// ```
/// # use volo_grpc_meta::status::encode_message;
/// assert_eq!(encode_message("100% done"), "100%25 done");
/// assert_eq!(encode_message("naïve\n"), "na%C3%AFve%0A");
/// ```
pub fn encode_message(message: &str) -> Cow<'_, str> {
    utf8_percent_encode(message, ENCODING_SET).into()
}

/// Reverse [`encode_message`].
///
/// Never fails: escapes which do not form valid UTF-8 become U+FFFD, malformed escapes are
/// kept as they are.
pub fn decode_message(value: &str) -> Cow<'_, str> {
    percent_decode_str(value).decode_utf8_lossy()
}

/// gRPC status codes used by `Status`.
///
/// These variants match the [gRPC status codes].
///
/// [gRPC status codes]: https://github.com/grpc/grpc/blob/master/doc/statuscodes.md#status-codes-and-their-use-in-grpc
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Code {
    /// The operation completed successfully.
    Ok = 0,

    /// The operation was cancelled.
    Cancelled = 1,

    /// Unknown error.
    Unknown = 2,

    /// Client specified an invalid argument.
    InvalidArgument = 3,

    /// Deadline expired before operation could complete.
    DeadlineExceeded = 4,

    /// Some requested entity was not found.
    NotFound = 5,

    /// Some entity that we attempted to create already exists.
    AlreadyExists = 6,

    /// The caller does not have permission to execute the specified operation.
    PermissionDenied = 7,

    /// Some resource has been exhausted.
    ResourceExhausted = 8,

    /// The system is not in a state required for the operation's execution.
    FailedPrecondition = 9,

    /// The operation was aborted.
    Aborted = 10,

    /// Operation was attempted past the valid range.
    OutOfRange = 11,

    /// Operation is not implemented or not supported.
    Unimplemented = 12,

    /// Internal error.
    Internal = 13,

    /// The service is currently unavailable.
    Unavailable = 14,

    /// Unrecoverable data loss or corruption.
    DataLoss = 15,

    /// The request does not have valid authentication credentials
    Unauthenticated = 16,
}

impl Code {
    /// Get description of this `Code`.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Ok => "The operation completed successfully",
            Self::Cancelled => "The operation was cancelled",
            Self::Unknown => "Unknown error",
            Self::InvalidArgument => "Client specified an invalid argument",
            Self::DeadlineExceeded => "Deadline expired before operation could complete",
            Self::NotFound => "Some requested entity was not found",
            Self::AlreadyExists => "Some entity that we attempted to create already exists",
            Self::PermissionDenied => {
                "The caller does not have permission to execute the specified operation"
            }
            Self::ResourceExhausted => "Some resource has been exhausted",
            Self::FailedPrecondition => {
                "The system is not in a state required for the operation's execution"
            }
            Self::Aborted => "The operation was aborted",
            Self::OutOfRange => "Operation was attempted past the valid range",
            Self::Unimplemented => "Operation is not implemented or not supported",
            Self::Internal => "Internal error",
            Self::Unavailable => "The service is currently unavailable",
            Self::DataLoss => "Unrecoverable data loss or corruption",
            Self::Unauthenticated => "The request does not have valid authentication credentials",
        }
    }

    /// Get the `Code` that represents the integer, if known.
    ///
    /// If not known, returns `Code::Unknown`.
    pub fn from_i32(i: i32) -> Self {
        Self::from(i)
    }

    /// Convert the string representation of a `Code`, as stored in the `grpc-status`
    /// trailer, into a `Code`. Returns `Code::Unknown` if the code string is not a valid
    /// gRPC status code.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| {
                let code = Self::from(s.parse::<i32>().ok()?);
                // reject anything that is not the canonical spelling, e.g. "+1" or "01"
                (code.as_str() == s).then_some(code)
            })
            .unwrap_or_else(Self::parse_err)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "0",
            Self::Cancelled => "1",
            Self::Unknown => "2",
            Self::InvalidArgument => "3",
            Self::DeadlineExceeded => "4",
            Self::NotFound => "5",
            Self::AlreadyExists => "6",
            Self::PermissionDenied => "7",
            Self::ResourceExhausted => "8",
            Self::FailedPrecondition => "9",
            Self::Aborted => "10",
            Self::OutOfRange => "11",
            Self::Unimplemented => "12",
            Self::Internal => "13",
            Self::Unavailable => "14",
            Self::DataLoss => "15",
            Self::Unauthenticated => "16",
        }
    }

    fn parse_err() -> Self {
        trace!("[VOLO] error parsing grpc-status");
        Self::Unknown
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.description(), f)
    }
}

impl From<i32> for Code {
    fn from(i: i32) -> Self {
        match i {
            0 => Self::Ok,
            1 => Self::Cancelled,
            2 => Self::Unknown,
            3 => Self::InvalidArgument,
            4 => Self::DeadlineExceeded,
            5 => Self::NotFound,
            6 => Self::AlreadyExists,
            7 => Self::PermissionDenied,
            8 => Self::ResourceExhausted,
            9 => Self::FailedPrecondition,
            10 => Self::Aborted,
            11 => Self::OutOfRange,
            12 => Self::Unimplemented,
            13 => Self::Internal,
            14 => Self::Unavailable,
            15 => Self::DataLoss,
            16 => Self::Unauthenticated,

            _ => Self::Unknown,
        }
    }
}

impl From<Code> for i32 {
    #[inline]
    fn from(code: Code) -> i32 {
        code as i32
    }
}

/// The outcome of a call, as carried in the `grpc-status`, `grpc-message` and
/// `grpc-status-details-bin` trailers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    code: Code,
    message: FastStr,
    details: Bytes,
}

macro_rules! status_ctor {
    ($($(#[$doc:meta])* $name:ident => $code:ident,)*) => {
        $(
            $(#[$doc])*
            pub fn $name(message: impl Into<FastStr>) -> Self {
                Self::new(Code::$code, message)
            }
        )*
    };
}

impl Status {
    /// Create a new [`Status`] with the associated code and message.
    pub fn new(code: Code, message: impl Into<FastStr>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Bytes::new(),
        }
    }

    /// Create a new [`Status`] with the associated code, message, and binary details field.
    pub fn with_details(code: Code, message: impl Into<FastStr>, details: Bytes) -> Self {
        Self {
            code,
            message: message.into(),
            details,
        }
    }

    status_ctor! {
        /// Not an error, returned on success.
        ok => Ok,
        /// The operation was cancelled (typically by the caller).
        cancelled => Cancelled,
        unknown => Unknown,
        /// Client specified an invalid argument.
        invalid_argument => InvalidArgument,
        /// Deadline expired before operation could complete.
        deadline_exceeded => DeadlineExceeded,
        not_found => NotFound,
        already_exists => AlreadyExists,
        permission_denied => PermissionDenied,
        resource_exhausted => ResourceExhausted,
        failed_precondition => FailedPrecondition,
        aborted => Aborted,
        out_of_range => OutOfRange,
        unimplemented => Unimplemented,
        internal => Internal,
        unavailable => Unavailable,
        data_loss => DataLoss,
        unauthenticated => Unauthenticated,
    }

    /// Get the gRPC `Code` of this `Status`.
    pub fn code(&self) -> Code {
        self.code
    }

    /// Get whether this `Status` is a success.
    pub fn is_ok(&self) -> bool {
        self.code == Code::Ok
    }

    /// Get the text error message of this `Status`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the opaque error details of this `Status`.
    pub fn details(&self) -> &[u8] {
        &self.details
    }

    /// Build the trailers of this status: `grpc-status`, then `grpc-message` and
    /// `grpc-status-details-bin` if they are not empty.
    pub fn to_trailers(&self) -> HeaderList {
        let mut trailers = Vec::with_capacity(3);
        trailers.push((
            FastStr::from_static_str(GRPC_STATUS_HEADER_CODE),
            FastStr::from_static_str(self.code.as_str()),
        ));
        if !self.message.is_empty() {
            trailers.push((
                FastStr::from_static_str(GRPC_STATUS_MESSAGE_HEADER),
                FastStr::new(encode_message(&self.message)),
            ));
        }
        if !self.details.is_empty() {
            trailers.push((
                FastStr::from_static_str(GRPC_STATUS_DETAILS_HEADER),
                encode_binary(&self.details),
            ));
        }
        trailers
    }

    /// Extract a `Status` from a trailer block, `None` if there is no `grpc-status`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBinaryMetadata`] if `grpc-status-details-bin` is not valid
    /// base64.
    pub fn from_headers<I>(headers: I) -> Result<Option<Self>>
    where
        I: IntoIterator,
        I::Item: HeaderField,
    {
        let mut code = None;
        let mut message = FastStr::empty();
        let mut details = Bytes::new();
        for header in headers {
            match header.name() {
                GRPC_STATUS_HEADER_CODE => {
                    code = Some(Code::from_bytes(header.value().as_bytes()));
                }
                GRPC_STATUS_MESSAGE_HEADER => {
                    message = FastStr::new(decode_message(header.value()));
                }
                GRPC_STATUS_DETAILS_HEADER => {
                    details = decode_binary(GRPC_STATUS_DETAILS_HEADER, header.value())?;
                }
                _ => {}
            }
        }
        Ok(code.map(|code| Self {
            code,
            message,
            details,
        }))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status: {:?}, message: {:?}, details: {:?}",
            self.code(),
            self.message(),
            self.details(),
        )
    }
}

impl std::error::Error for Status {}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        debug!("[VOLO] converting error into status: {}", err);
        match err {
            Error::InvalidTimeoutFormat(_) | Error::InvalidBinaryMetadata { .. } => {
                Self::invalid_argument(err.to_string())
            }
            Error::InvalidMetadataKey(_)
            | Error::InvalidMetadataValueType { .. }
            | Error::InvalidMetadataValue { .. }
            | Error::MissingRequestField(_)
            | Error::InvalidHeader(_) => Self::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_from_i32() {
        // This for loop should catch if we ever add a new variant and don't
        // update From<i32>.
        for i in 0..(Code::Unauthenticated as i32) {
            let code = Code::from(i);
            assert_eq!(
                i, code as i32,
                "Code::from({}) returned {:?} which is {}",
                i, code, code as i32,
            );
        }

        assert_eq!(Code::from(-1), Code::Unknown);
    }

    #[test]
    fn code_from_bytes() {
        for i in 0..=16 {
            let code = Code::from_i32(i);
            assert_eq!(Code::from_bytes(code.as_str().as_bytes()), code);
        }
        let bad: [&[u8]; 7] = [b"", b"17", b"01", b"+1", b"-1", b"abc", b"\xff"];
        for bad in bad {
            assert_eq!(Code::from_bytes(bad), Code::Unknown);
        }
    }

    #[test]
    fn constructors() {
        assert_eq!(Status::ok("").code(), Code::Ok);
        assert_eq!(Status::cancelled("").code(), Code::Cancelled);
        assert_eq!(Status::unknown("").code(), Code::Unknown);
        assert_eq!(Status::invalid_argument("").code(), Code::InvalidArgument);
        assert_eq!(Status::deadline_exceeded("").code(), Code::DeadlineExceeded);
        assert_eq!(Status::not_found("").code(), Code::NotFound);
        assert_eq!(Status::already_exists("").code(), Code::AlreadyExists);
        assert_eq!(Status::permission_denied("").code(), Code::PermissionDenied);
        assert_eq!(
            Status::resource_exhausted("").code(),
            Code::ResourceExhausted
        );
        assert_eq!(
            Status::failed_precondition("").code(),
            Code::FailedPrecondition
        );
        assert_eq!(Status::aborted("").code(), Code::Aborted);
        assert_eq!(Status::out_of_range("").code(), Code::OutOfRange);
        assert_eq!(Status::unimplemented("").code(), Code::Unimplemented);
        assert_eq!(Status::internal("").code(), Code::Internal);
        assert_eq!(Status::unavailable("").code(), Code::Unavailable);
        assert_eq!(Status::data_loss("").code(), Code::DataLoss);
        assert_eq!(Status::unauthenticated("").code(), Code::Unauthenticated);
    }

    #[test]
    fn message_codec() {
        assert_eq!(encode_message("plain text ~!"), "plain text ~!");
        assert_eq!(encode_message("50%"), "50%25");
        assert_eq!(encode_message("a\tb\r\n"), "a%09b%0D%0A");
        assert_eq!(encode_message("\u{7f}"), "%7F");
        assert_eq!(encode_message("日本"), "%E6%97%A5%E6%9C%AC");

        for message in ["plain", "50% off", "line\nbreak", "日本語", ""] {
            assert_eq!(decode_message(&encode_message(message)), message);
        }
    }

    #[test]
    fn message_decode_is_lossy() {
        assert_eq!(decode_message("bad%FFbyte"), "bad\u{FFFD}byte");
        assert_eq!(decode_message("100%"), "100%");
        assert_eq!(decode_message("%zz"), "%zz");
    }

    #[test]
    fn details() {
        const DETAILS: &[u8] = &[0, 2, 3];

        let status = Status::with_details(Code::Unavailable, "some message", DETAILS.into());
        assert_eq!(status.details(), DETAILS);

        let trailers = status.to_trailers();
        assert_eq!(trailers.len(), 3);
        assert_eq!(trailers[2].0.as_str(), GRPC_STATUS_DETAILS_HEADER);
        assert_eq!(trailers[2].1.as_str(), "AAID");

        let decoded = Status::from_headers(&trailers).unwrap().unwrap();
        assert_eq!(decoded, status);
    }

    #[test]
    fn trailers_round_trip() {
        let status = Status::internal("boom: 100% broken\n");
        let trailers = status.to_trailers();
        let trailers: Vec<(&str, &str)> = trailers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            trailers,
            vec![
                ("grpc-status", "13"),
                ("grpc-message", "boom: 100%25 broken%0A")
            ]
        );
        assert_eq!(Status::from_headers(trailers).unwrap(), Some(status));

        let ok = Status::ok("");
        assert_eq!(ok.to_trailers().len(), 1);
        assert!(Status::from_headers([("grpc-status", "0")])
            .unwrap()
            .unwrap()
            .is_ok());
        assert_eq!(Status::from_headers([("x-other", "1")]), Ok(None));
    }

    #[test]
    fn from_error() {
        let status = Status::from(Error::InvalidTimeoutFormat(FastStr::from_static_str("5X")));
        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "invalid timeout: '5X'");

        let status = Status::from(Error::InvalidMetadataKey(FastStr::from_static_str("X")));
        assert_eq!(status.code(), Code::Internal);
    }
}
