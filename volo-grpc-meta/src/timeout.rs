//! Encoding and decoding of the `grpc-timeout` header value.
//!
//! The wire grammar is `<digits><unit>` where unit is one of `H`, `M`, `S`, `m`, `u` or `n`.

use std::time::Duration;

use faststr::FastStr;

use crate::error::{Error, Result};

const SECONDS_HOUR: u64 = 60 * 60;
const SECONDS_MINUTE: u64 = 60;

const SECONDS_TIER: Duration = Duration::from_secs(10);
const MILLIS_TIER: Duration = Duration::from_millis(10);
const MICROS_TIER: Duration = Duration::from_micros(10);

/// Encode a timeout with the coarsest unit that still keeps its precision band.
///
/// Every tier truncates, so `10.5s` becomes `"10S"` and `5.9ms` becomes `"5900u"`.
pub fn encode(timeout: Duration) -> String {
    let (value, unit) = if timeout > SECONDS_TIER {
        (timeout.as_secs() as u128, 'S')
    } else if timeout > MILLIS_TIER {
        (timeout.as_millis(), 'm')
    } else if timeout > MICROS_TIER {
        (timeout.as_micros(), 'u')
    } else {
        (timeout.as_nanos(), 'n')
    };

    let mut buf = itoa::Buffer::new();
    let digits = buf.format(value);
    let mut encoded = String::with_capacity(digits.len() + 1);
    encoded.push_str(digits);
    encoded.push(unit);
    encoded
}

/// Decode a `grpc-timeout` header value.
///
/// # Errors
///
/// Returns [`Error::InvalidTimeoutFormat`] if the value has no digits, an unknown unit,
/// trailing characters, or does not fit in a [`Duration`].
pub fn decode(value: &str) -> Result<Duration> {
    let invalid = || Error::InvalidTimeoutFormat(FastStr::new(value));

    // the unit must be a single ascii byte, checked before slicing off the digits
    let Some(&unit) = value.as_bytes().last() else {
        return Err(invalid());
    };
    let to_duration: fn(u64) -> Option<Duration> = match unit {
        b'H' => |v| v.checked_mul(SECONDS_HOUR).map(Duration::from_secs),
        b'M' => |v| v.checked_mul(SECONDS_MINUTE).map(Duration::from_secs),
        b'S' => |v| Some(Duration::from_secs(v)),
        b'm' => |v| Some(Duration::from_millis(v)),
        b'u' => |v| Some(Duration::from_micros(v)),
        b'n' => |v| Some(Duration::from_nanos(v)),
        _ => return Err(invalid()),
    };

    let digits = &value[..value.len() - 1];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let timeout_value = digits.parse::<u64>().map_err(|_| invalid())?;
    let duration = to_duration(timeout_value).ok_or_else(invalid)?;
    Ok(duration)
}
