#![doc(
    html_logo_url = "https://github.com/cloudwego/volo/raw/main/.github/assets/logo.png?sanitize=true"
)]

//! The metadata and deadline core of volo's gRPC support.
//!
//! This crate translates between the gRPC-over-HTTP/2 header conventions and their
//! in-process form:
//!
//! - [`timeout`] encodes and decodes `grpc-timeout` values.
//! - [`Deadline`] anchors a timeout on the monotonic clock.
//! - [`metadata`] validates custom metadata and handles `-bin` values.
//! - [`Request`] projects a call onto the ordered header block that opens it.
//! - [`status`] carries the outcome of a call in trailers.
//!
//! Nothing here performs I/O or arms timers, the transport stays in charge of both.

pub mod deadline;
pub mod error;
pub mod header;
pub mod metadata;
pub mod request;
pub mod status;
pub mod timeout;
mod user_agent;

pub use deadline::Deadline;
pub use error::{Error, Result};
pub use header::{HeaderField, HeaderList};
pub use metadata::{Metadata, MetadataValue};
pub use request::{Request, RequestBuilder};
pub use status::{Code, Status};
pub use user_agent::{user_agent, DEFAULT_USER_AGENT};
