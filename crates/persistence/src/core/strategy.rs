//! Version allocation strategies.
//!
//! Every write to a resource key is assigned the next number in that key's
//! version sequence. Two algorithms are available; which one a repository
//! runs is fixed when the repository is constructed.
//!
//! | Strategy | Algorithm |
//! |----------|-----------|
//! | [`AtomicUpsert`](ConcurrencyStrategy::AtomicUpsert) | One conflict-resolving insert into the per-key head row returns the next version. There is no separate read step. |
//! | [`AdvisoryLock`](ConcurrencyStrategy::AdvisoryLock) | Take an engine-level exclusive lock for the transaction, read `MAX(version)` for the key, then insert `max + 1`. |
//!
//! Both run inside one transaction per write. A failed write rolls back and
//! consumes no version number.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConcurrencyError;
use crate::types::ResourceKey;

/// How a repository allocates version numbers under concurrent writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConcurrencyStrategy {
    /// Conflict-resolving insert (`INSERT ... ON CONFLICT DO UPDATE ... RETURNING`).
    #[default]
    AtomicUpsert,
    /// Lock, read the current maximum, insert `max + 1`.
    AdvisoryLock,
}

impl ConcurrencyStrategy {
    /// Returns the configuration spelling of the strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConcurrencyStrategy::AtomicUpsert => "atomic-upsert",
            ConcurrencyStrategy::AdvisoryLock => "advisory-lock",
        }
    }
}

impl fmt::Display for ConcurrencyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConcurrencyStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "atomic-upsert" | "atomic" | "upsert" => Ok(ConcurrencyStrategy::AtomicUpsert),
            "advisory-lock" | "lock" | "lock-then-insert" => Ok(ConcurrencyStrategy::AdvisoryLock),
            other => Err(format!("unknown concurrency strategy: {}", other)),
        }
    }
}

/// Compare-and-swap check run inside the write transaction.
///
/// `current` is the latest committed version for the key (0 when the key has
/// no rows). A precondition against a key with no rows is ignored, so the
/// first write for a key always goes through.
pub(crate) fn check_precondition(
    key: &ResourceKey,
    expected: Option<u64>,
    current: u64,
) -> Result<(), ConcurrencyError> {
    match expected {
        Some(expected) if current > 0 && expected != current => {
            Err(ConcurrencyError::PreconditionFailed {
                kind: key.kind().to_string(),
                id: key.external_id().to_string(),
                expected_version: expected,
                actual_version: current,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!(
            "atomic-upsert".parse::<ConcurrencyStrategy>().unwrap(),
            ConcurrencyStrategy::AtomicUpsert
        );
        assert_eq!(
            "Advisory-Lock".parse::<ConcurrencyStrategy>().unwrap(),
            ConcurrencyStrategy::AdvisoryLock
        );
        assert!("optimistic".parse::<ConcurrencyStrategy>().is_err());
        assert_eq!(ConcurrencyStrategy::AdvisoryLock.to_string(), "advisory-lock");
    }

    #[test]
    fn test_serde_kebab_case() {
        let json = serde_json::to_string(&ConcurrencyStrategy::AdvisoryLock).unwrap();
        assert_eq!(json, "\"advisory-lock\"");
    }

    #[test]
    fn test_check_precondition() {
        let key = ResourceKey::new("Patient", "123");

        assert!(check_precondition(&key, None, 4).is_ok());
        assert!(check_precondition(&key, Some(4), 4).is_ok());
        assert!(check_precondition(&key, Some(7), 0).is_ok());

        let err = check_precondition(&key, Some(3), 4).unwrap_err();
        let ConcurrencyError::PreconditionFailed {
            expected_version,
            actual_version,
            ..
        } = err;
        assert_eq!((expected_version, actual_version), (3, 4));
    }
}
