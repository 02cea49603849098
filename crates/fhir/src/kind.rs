//! The allow-listed resource kinds.

use std::fmt;
use std::str::FromStr;

/// A resource kind the register can parse into a typed shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Patient,
    ImagingStudy,
    Observation,
    Practitioner,
    Organization,
}

impl ResourceKind {
    /// Every allow-listed kind.
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Patient,
        ResourceKind::ImagingStudy,
        ResourceKind::Observation,
        ResourceKind::Practitioner,
        ResourceKind::Organization,
    ];

    /// Returns the canonical kind name, as it appears in `resourceType`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Patient => "Patient",
            ResourceKind::ImagingStudy => "ImagingStudy",
            ResourceKind::Observation => "Observation",
            ResourceKind::Practitioner => "Practitioner",
            ResourceKind::Organization => "Organization",
        }
    }

    /// Looks up a kind by name, ignoring case.
    ///
    /// Returns `None` for kinds outside the allow-list.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().to_lowercase() == name)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unsupported resource kind: {}", s))
    }
}
