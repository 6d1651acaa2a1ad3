use std::time::Duration;

use faststr::FastStr;
use http::{header::HeaderName, HeaderValue};

use crate::{
    deadline::Deadline,
    error::{Error, Result},
    header::{
        HeaderList, ACCEPT_ENCODING_HEADER, AUTHORITY_PSEUDO_HEADER, CONTENT_TYPE_HEADER,
        ENCODING_HEADER, GRPC_TIMEOUT_HEADER, MESSAGE_TYPE_HEADER, METHOD_PSEUDO_HEADER,
        PATH_PSEUDO_HEADER, SCHEME_PSEUDO_HEADER, TE_HEADER, TE_TRAILERS, USER_AGENT_HEADER,
    },
    metadata::Metadata,
    timeout,
};

/// Everything needed to open a gRPC call, projected onto HTTP/2 headers by
/// [`Request::to_headers`].
///
/// A `Request` is immutable once built. Its metadata has been validated by
/// [`RequestBuilder::build`], so projecting it never fails.
///
/// ```
/// # use volo_grpc_meta::{Request, header::GRPC_PROTO_CONTENT_TYPE};
/// let req = Request::builder()
///     .method("POST")
///     .scheme("http")
///     .path("/helloworld.Greeter/SayHello")
///     .authority("localhost:50051")
///     .content_type(GRPC_PROTO_CONTENT_TYPE)
///     .build()
///     .unwrap();
///
/// let names: Vec<_> = req.to_headers().into_iter().map(|(k, _)| k.to_string()).collect();
/// assert_eq!(
///     names,
///     [":method", ":scheme", ":path", ":authority", "te", "content-type"]
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    method: FastStr,
    scheme: FastStr,
    path: FastStr,
    authority: FastStr,
    content_type: FastStr,
    message_type: Option<FastStr>,
    message_encoding: Option<FastStr>,
    message_accept_encoding: Option<FastStr>,
    user_agent: Option<FastStr>,
    metadata: Option<Metadata>,
    deadline: Option<Deadline>,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn message_type(&self) -> Option<&str> {
        self.message_type.as_deref()
    }

    pub fn message_encoding(&self) -> Option<&str> {
        self.message_encoding.as_deref()
    }

    pub fn message_accept_encoding(&self) -> Option<&str> {
        self.message_accept_encoding.as_deref()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn deadline(&self) -> Option<&Deadline> {
        self.deadline.as_ref()
    }

    /// The header block that opens this call.
    ///
    /// The order is fixed: pseudo-headers, `grpc-timeout`, `te`, `content-type`,
    /// `grpc-message-type`, `grpc-encoding`, `grpc-accept-encoding`, `user-agent`, then the
    /// custom metadata in its stored order. Optional fields that are not set produce no
    /// header at all. The `grpc-timeout` value is the time remaining at the moment of the
    /// call, so two calls may differ in that single value.
    pub fn to_headers(&self) -> HeaderList {
        let metadata_len = self.metadata.as_ref().map_or(0, Metadata::len);
        let mut headers = Vec::with_capacity(11 + metadata_len);

        let mut push = |name: &'static str, value: &FastStr| {
            headers.push((FastStr::from_static_str(name), value.clone()));
        };

        push(METHOD_PSEUDO_HEADER, &self.method);
        push(SCHEME_PSEUDO_HEADER, &self.scheme);
        push(PATH_PSEUDO_HEADER, &self.path);
        push(AUTHORITY_PSEUDO_HEADER, &self.authority);

        if let Some(deadline) = &self.deadline {
            let remaining = deadline.time_remaining();
            if remaining.is_zero() {
                tracing::trace!("[VOLO] deadline already exceeded when encoding grpc-timeout");
            }
            push(GRPC_TIMEOUT_HEADER, &FastStr::from_string(timeout::encode(remaining)));
        }

        push(TE_HEADER, &FastStr::from_static_str(TE_TRAILERS));
        push(CONTENT_TYPE_HEADER, &self.content_type);

        let optional = [
            (MESSAGE_TYPE_HEADER, &self.message_type),
            (ENCODING_HEADER, &self.message_encoding),
            (ACCEPT_ENCODING_HEADER, &self.message_accept_encoding),
            (USER_AGENT_HEADER, &self.user_agent),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                push(name, value);
            }
        }

        if let Some(metadata) = &self.metadata {
            headers.extend(metadata.wire_entries());
        }

        headers
    }

    /// Convert into an `http::Request` for transports built on the `http` crate.
    ///
    /// Pseudo-headers become the method and URI, every other header keeps the order of
    /// [`Request::to_headers`].
    pub fn to_http(&self) -> Result<http::Request<()>> {
        let uri = http::Uri::builder()
            .scheme(self.scheme.as_str())
            .authority(self.authority.as_str())
            .path_and_query(self.path.as_str())
            .build()?;

        let mut req = http::Request::builder()
            .method(self.method.as_str())
            .uri(uri)
            .version(http::Version::HTTP_2)
            .body(())?;

        let headers = req.headers_mut();
        for (name, value) in self.to_headers() {
            if name.starts_with(':') {
                continue;
            }
            headers.append(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(&value)?,
            );
        }
        Ok(req)
    }
}

/// Builder for [`Request`].
///
/// `method`, `scheme`, `path`, `authority` and `content_type` are mandatory, everything else
/// is absent unless set.
#[derive(Clone, Debug, Default)]
pub struct RequestBuilder {
    method: Option<FastStr>,
    scheme: Option<FastStr>,
    path: Option<FastStr>,
    authority: Option<FastStr>,
    content_type: Option<FastStr>,
    message_type: Option<FastStr>,
    message_encoding: Option<FastStr>,
    message_accept_encoding: Option<FastStr>,
    user_agent: Option<FastStr>,
    metadata: Option<Metadata>,
    deadline: Option<Deadline>,
}

macro_rules! builder_setters {
    ($($(#[$doc:meta])* $field:ident,)*) => {
        $(
            $(#[$doc])*
            pub fn $field(mut self, $field: impl Into<FastStr>) -> Self {
                self.$field = Some($field.into());
                self
            }
        )*
    };
}

impl RequestBuilder {
    builder_setters! {
        method,
        scheme,
        path,
        authority,
        content_type,
        /// The fully qualified protobuf message name, sent as `grpc-message-type`.
        message_type,
        /// The compression of the request messages, sent as `grpc-encoding`.
        message_encoding,
        /// The compressions accepted for responses, sent as `grpc-accept-encoding`.
        message_accept_encoding,
        /// See [`crate::user_agent()`] to append the default agent.
        user_agent,
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Shorthand for a deadline `timeout` from now.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.deadline(Deadline::from_timeout(timeout))
    }

    /// # Errors
    ///
    /// Returns [`Error::MissingRequestField`] if a mandatory field is not set, or the
    /// metadata validation error of the first invalid entry.
    pub fn build(self) -> Result<Request> {
        if let Some(metadata) = &self.metadata {
            metadata.validate()?;
        }

        Ok(Request {
            method: self.method.ok_or(Error::MissingRequestField("method"))?,
            scheme: self.scheme.ok_or(Error::MissingRequestField("scheme"))?,
            path: self.path.ok_or(Error::MissingRequestField("path"))?,
            authority: self
                .authority
                .ok_or(Error::MissingRequestField("authority"))?,
            content_type: self
                .content_type
                .ok_or(Error::MissingRequestField("content_type"))?,
            message_type: self.message_type,
            message_encoding: self.message_encoding,
            message_accept_encoding: self.message_accept_encoding,
            user_agent: self.user_agent,
            metadata: self.metadata,
            deadline: self.deadline,
        })
    }
}
