//! Owner pseudonyms.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An opaque identifier scoping a resource to the subject it concerns.
///
/// Pseudonyms are UUIDs. The register never interprets them beyond equality;
/// they are stored and compared in their canonical hyphenated, lower-case form.
///
/// # Examples
///
/// ```
/// use register_persistence::types::Pseudonym;
///
/// let owner: Pseudonym = "A1B2C3D4-0000-4000-8000-000000000001".parse().unwrap();
/// assert_eq!(owner.as_str(), "a1b2c3d4-0000-4000-8000-000000000001");
///
/// assert!("not-a-uuid".parse::<Pseudonym>().is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pseudonym(String);

impl Pseudonym {
    /// Creates a pseudonym from a UUID.
    pub fn new(id: Uuid) -> Self {
        Self(id.hyphenated().to_string())
    }

    /// Creates a fresh random pseudonym.
    pub fn random() -> Self {
        Self::new(Uuid::new_v4())
    }

    /// Returns the pseudonym as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pseudonym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Pseudonym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pseudonym({})", self.0)
    }
}

impl FromStr for Pseudonym {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self::new)
    }
}

impl TryFrom<String> for Pseudonym {
    type Error = uuid::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Pseudonym> for String {
    fn from(p: Pseudonym) -> Self {
        p.0
    }
}

impl From<Uuid> for Pseudonym {
    fn from(id: Uuid) -> Self {
        Self::new(id)
    }
}

impl AsRef<str> for Pseudonym {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
