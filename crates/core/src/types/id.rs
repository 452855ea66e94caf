//! Newtype IDs for type-safe entity references.
//!
//! Catalog identities are opaque strings handed to us by the product
//! provider. Wrapping them keeps a product ID from being confused with a
//! display name or an image URL, which are also plain strings.

use core::fmt;
use std::borrow::Borrow;

use serde::{Deserialize, Serialize};

/// Identity of a catalog product, and the sole key distinguishing cart lines.
///
/// # Example
///
/// ```rust
/// use arbatai_core::ProductId;
///
/// let id = ProductId::new("tea-1");
/// assert_eq!(id.as_str(), "tea-1");
/// assert_eq!(id, "tea-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a new ID from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the ID and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ProductId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ProductId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ProductId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_plain_string() {
        let id = ProductId::new("tea-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"tea-1\"");

        let parsed: ProductId = serde_json::from_str("\"tea-1\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_compares_with_str() {
        let id = ProductId::from("honey-2");
        assert_eq!(id, "honey-2");
        assert_eq!(format!("{id}"), "honey-2");
    }
}
