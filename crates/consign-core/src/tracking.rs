//! Submission tracking identifiers.
//!
//! An identifier looks like `OPC-20250314-96021`: a prefix, the UTC date, and the
//! last five digits of the Unix timestamp. It is a human-readable tag for the
//! notification, not a unique key. Two submissions in the same second share one.

use std::fmt;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackingId(String);

impl TrackingId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the identifier for the given instant.
    pub fn at(prefix: &str, now: DateTime<Utc>) -> Self {
        let suffix = now.timestamp().rem_euclid(100_000);
        TrackingId(format!(
            "{}-{}-{:05}",
            prefix,
            now.format("%Y%m%d"),
            suffix
        ))
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TrackingId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Source of tracking identifiers for the intake pipeline.
pub trait IdentifierGenerator: Send + Sync {
    fn generate(&self) -> TrackingId;
}

/// Wall-clock generator.
#[derive(Debug, Clone)]
pub struct TimestampIdentifierGenerator {
    prefix: String,
}

impl TimestampIdentifierGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl IdentifierGenerator for TimestampIdentifierGenerator {
    fn generate(&self) -> TrackingId {
        TrackingId::at(&self.prefix, Utc::now())
    }
}
