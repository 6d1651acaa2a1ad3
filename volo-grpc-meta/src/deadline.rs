use std::time::Duration;

use faststr::FastStr;
use http::HeaderMap;
use tokio::time::Instant;

use crate::{
    error::{Error, Result},
    header::{HeaderField, GRPC_TIMEOUT_HEADER},
    timeout,
};

/// Used when `now + timeout` does not fit in an [`Instant`], about 30 years.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// The point in time by which a call must complete.
///
/// A deadline is anchored on the monotonic clock, so it is unaffected by wall-clock
/// adjustments and only meaningful inside the process that created it. Deadlines are
/// ordered by their anchor, so the sooner deadline is the smaller one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Deadline {
    instant: Instant,
}

impl Deadline {
    /// Create a deadline `timeout` from now.
    pub fn from_timeout(timeout: Duration) -> Self {
        let now = Instant::now();
        let instant = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);
        Self { instant }
    }

    /// Create a deadline from an incoming header block.
    ///
    /// Every `grpc-timeout` entry is decoded and the strictest one wins. A well-behaved peer
    /// sends at most one, so the minimum is only there to interoperate with those that don't.
    ///
    /// # Return
    ///
    ///  Ok(Some(deadline)) => if at least one `grpc-timeout` header is present.
    ///  Ok(None)           => if there is no `grpc-timeout` header.
    ///  Err(_)             => if any `grpc-timeout` value is malformed.
    pub fn from_headers<I>(headers: I) -> Result<Option<Self>>
    where
        I: IntoIterator,
        I::Item: HeaderField,
    {
        Self::from_timeouts(
            headers
                .into_iter()
                .filter(|header| header.name() == GRPC_TIMEOUT_HEADER)
                .map(|header| decode_logged(header.value())),
        )
    }

    /// Same as [`Deadline::from_headers`] for a [`HeaderMap`], which has no pseudo-headers but
    /// keeps repeated `grpc-timeout` values.
    pub fn from_header_map(headers: &HeaderMap) -> Result<Option<Self>> {
        Self::from_timeouts(headers.get_all(GRPC_TIMEOUT_HEADER).iter().map(|value| {
            value
                .to_str()
                .map_err(|_| {
                    tracing::debug!("[VOLO] non-ascii grpc-timeout header: {:?}", value);
                    let lossy = String::from_utf8_lossy(value.as_bytes());
                    Error::InvalidTimeoutFormat(FastStr::new(lossy))
                })
                .and_then(decode_logged)
        }))
    }

    fn from_timeouts(timeouts: impl Iterator<Item = Result<Duration>>) -> Result<Option<Self>> {
        let mut min: Option<Duration> = None;
        for timeout in timeouts {
            let timeout = timeout?;
            min = Some(min.map_or(timeout, |min| min.min(timeout)));
        }
        Ok(min.map(Self::from_timeout))
    }

    /// The time left until the deadline, zero once it has passed.
    pub fn time_remaining(&self) -> Duration {
        self.instant.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has already passed.
    pub fn is_expired(&self) -> bool {
        self.instant <= Instant::now()
    }

    /// The monotonic instant this deadline is anchored at, suitable for
    /// [`tokio::time::sleep_until`].
    pub fn instant(&self) -> Instant {
        self.instant
    }
}

impl From<Instant> for Deadline {
    fn from(instant: Instant) -> Self {
        Self { instant }
    }
}

fn decode_logged(value: &str) -> Result<Duration> {
    timeout::decode(value).inspect_err(|_| {
        tracing::debug!("[VOLO] error parsing grpc-timeout header: {:?}", value);
    })
}
