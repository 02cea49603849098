//! Resource keys.

use std::fmt;

/// Characters a caller could use as search wildcards. They are stripped from
/// every key before it reaches a query so one key never matches many rows.
const WILDCARD_CHARS: [char; 2] = ['%', '?'];

/// The `(kind, external id)` pair a version sequence belongs to.
///
/// Keys are sanitized on construction. The original casing is preserved for
/// storage and display; comparisons go through the lower-cased
/// [`kind_key`](Self::kind_key) and [`external_key`](Self::external_key) so a
/// reader and writer using different casing resolve to the same entity.
///
/// # Examples
///
/// ```
/// use register_persistence::types::ResourceKey;
///
/// let key = ResourceKey::new("Patient", "ABC%?");
/// assert_eq!(key.kind(), "Patient");
/// assert_eq!(key.external_id(), "ABC");
/// assert_eq!(key.kind_key(), "patient");
/// assert_eq!(key.external_key(), "abc");
///
/// assert_eq!(key, ResourceKey::new("patient", "abc"));
/// ```
#[derive(Clone, Eq)]
pub struct ResourceKey {
    kind: String,
    external_id: String,
    kind_key: String,
    external_key: String,
}

impl ResourceKey {
    /// Creates a sanitized key.
    pub fn new(kind: &str, external_id: &str) -> Self {
        let kind = sanitize(kind);
        let external_id = sanitize(external_id);
        Self {
            kind_key: fold_case(&kind),
            external_key: fold_case(&external_id),
            kind,
            external_id,
        }
    }

    /// The kind, as supplied by the caller (sanitized).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The external id, as supplied by the caller (sanitized).
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    /// The lower-cased kind used for matching.
    pub fn kind_key(&self) -> &str {
        &self.kind_key
    }

    /// The lower-cased external id used for matching.
    pub fn external_key(&self) -> &str {
        &self.external_key
    }
}

impl PartialEq for ResourceKey {
    fn eq(&self, other: &Self) -> bool {
        self.kind_key == other.kind_key && self.external_key == other.external_key
    }
}

impl std::hash::Hash for ResourceKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.kind_key.hash(state);
        self.external_key.hash(state);
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.external_id)
    }
}

impl fmt::Debug for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceKey({}/{})", self.kind, self.external_id)
    }
}

/// Folds a key component to the form keys are matched on.
///
/// Folding is Unicode-aware, so `ÉCOLE` and `école` name the same entity.
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

/// Returns true if two key components match ignoring case.
pub fn same_key(a: &str, b: &str) -> bool {
    fold_case(a) == fold_case(b)
}

/// Strips wildcard characters from a key component.
pub fn sanitize(value: &str) -> String {
    value.chars().filter(|c| !WILDCARD_CHARS.contains(c)).collect()
}
