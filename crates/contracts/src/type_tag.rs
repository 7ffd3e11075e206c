//! TypeTag - message discriminant
//!
//! Uses `Arc<str>` internally so tags can be cloned on every hop of a
//! propagation chain without allocating.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Reserved tag used for untyped messages and fallback handlers.
///
/// Tags starting with `$` are reserved for the runtime.
pub const DEFAULT_TYPE: &str = "$default";

/// Message type tag with cheap cloning.
///
/// `TypeTag::default()` is the reserved default tag, not an empty string.
///
/// # Examples
/// ```
/// use contracts::{TypeTag, DEFAULT_TYPE};
///
/// let tag: TypeTag = "say".into();
/// assert_eq!(tag, "say");
/// assert!(!tag.is_default());
/// assert_eq!(TypeTag::default(), DEFAULT_TYPE);
/// ```
#[derive(Clone)]
pub struct TypeTag(Arc<str>);

impl TypeTag {
    /// Create a new tag from a string slice.
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the reserved default tag.
    #[inline]
    pub fn is_default(&self) -> bool {
        self.as_str() == DEFAULT_TYPE
    }

    /// Whether this tag lives in the reserved `$` namespace.
    #[inline]
    pub fn is_reserved(&self) -> bool {
        self.0.starts_with('$')
    }
}

impl Default for TypeTag {
    fn default() -> Self {
        Self::new(DEFAULT_TYPE)
    }
}

impl Deref for TypeTag {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for TypeTag {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TypeTag {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeTag {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for TypeTag {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<&TypeTag> for TypeTag {
    #[inline]
    fn from(tag: &TypeTag) -> Self {
        tag.clone()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({:?})", self.0)
    }
}

impl PartialEq for TypeTag {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for TypeTag {}

impl PartialEq<str> for TypeTag {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for TypeTag {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl PartialEq<String> for TypeTag {
    #[inline]
    fn eq(&self, other: &String) -> bool {
        self.0.as_ref() == other
    }
}

// Same as str hash so maps keyed by TypeTag can be queried with &str
impl Hash for TypeTag {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl Serialize for TypeTag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TypeTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}
