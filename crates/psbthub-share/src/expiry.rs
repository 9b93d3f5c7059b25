//! Retention window for shares.
//!
//! A share must expire at least 30 seconds and at most 31 days after the
//! reference instant. Both bounds are inclusive.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::error::ExpiryError;

pub const MIN_SHARE_EXPIRY_BUFFER_SECONDS: i64 = 30;
pub const MAX_SHARE_EXPIRY_DAYS: i64 = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryBounds {
    pub min_date: DateTime<Utc>,
    pub max_date: DateTime<Utc>,
}

/// An accepted expiry instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExpiry {
    pub expires_at: DateTime<Utc>,
    /// UTC, millisecond precision, `Z` suffix.
    pub expires_at_iso: String,
    pub bounds: ExpiryBounds,
}

pub fn compute_bounds(reference: DateTime<Utc>) -> ExpiryBounds {
    ExpiryBounds {
        min_date: reference + Duration::seconds(MIN_SHARE_EXPIRY_BUFFER_SECONDS),
        max_date: reference + Duration::days(MAX_SHARE_EXPIRY_DAYS),
    }
}

/// The longest allowed retention, used when the caller picks nothing.
pub fn default_expiry(reference: DateTime<Utc>) -> DateTime<Utc> {
    compute_bounds(reference).max_date
}

/// Format an instant the way storage expects it.
pub fn to_iso(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Validate `candidate` against the window around `reference`.
pub fn resolve(
    candidate: Option<DateTime<Utc>>,
    reference: DateTime<Utc>,
) -> Result<ResolvedExpiry, ExpiryError> {
    let candidate = candidate
        .ok_or_else(|| ExpiryError::InvalidExpiry("no expiration date selected".into()))?;

    let bounds = compute_bounds(reference);
    if candidate < bounds.min_date {
        return Err(ExpiryError::TooSoon {
            min: bounds.min_date,
        });
    }
    if candidate > bounds.max_date {
        return Err(ExpiryError::TooLate {
            max: bounds.max_date,
        });
    }

    Ok(ResolvedExpiry {
        expires_at: candidate,
        expires_at_iso: to_iso(candidate),
        bounds,
    })
}

pub fn resolve_now(candidate: Option<DateTime<Utc>>) -> Result<ResolvedExpiry, ExpiryError> {
    resolve(candidate, Utc::now())
}

/// Parse RFC 3339 text, then [`resolve`] it.
pub fn resolve_iso(text: &str, reference: DateTime<Utc>) -> Result<ResolvedExpiry, ExpiryError> {
    let parsed = DateTime::parse_from_rfc3339(text.trim())
        .map_err(|e| ExpiryError::InvalidExpiry(format!("not an RFC 3339 timestamp: {e}")))?;
    resolve(Some(parsed.with_timezone(&Utc)), reference)
}
