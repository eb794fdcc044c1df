//! Expiration policy and cache entries

use chrono::{DateTime, Utc};
use std::time::Duration;

/// When a cached value stops being considered fresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    /// Never expires
    #[default]
    Never,
    /// Expires this long after it is written
    After(Duration),
    /// Expires at a fixed point in time
    At(DateTime<Utc>),
}

impl Expiry {
    /// Resolve to an absolute deadline relative to `now`.
    ///
    /// `None` means the entry never expires. Durations too large to represent
    /// are treated as never expiring.
    pub fn deadline_from(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Expiry::Never => None,
            Expiry::After(duration) => chrono::Duration::from_std(*duration)
                .ok()
                .and_then(|d| now.checked_add_signed(d)),
            Expiry::At(at) => Some(*at),
        }
    }

    /// Resolve to an absolute deadline relative to the current time
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline_from(Utc::now())
    }

    /// Rebuild an expiry from a stored deadline
    pub fn from_deadline(expires_at: Option<DateTime<Utc>>) -> Self {
        expires_at.map(Expiry::At).unwrap_or(Expiry::Never)
    }
}

/// A cached value together with its expiration marker
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<V> {
    pub value: V,
    pub expires_at: Option<DateTime<Utc>>,
}

impl<V> Entry<V> {
    pub fn new(value: V, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { value, expires_at }
    }

    /// Expired entries are still readable until swept
    pub fn is_expired(&self) -> bool {
        is_past(self.expires_at)
    }
}

pub(crate) fn is_past(expires_at: Option<DateTime<Utc>>) -> bool {
    expires_at.map_or(false, |at| at <= Utc::now())
}
