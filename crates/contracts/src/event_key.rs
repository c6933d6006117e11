//! EventKey - stable `area::name` identity of a tracked event

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Stable identity of a tracked event, always of the form `area::name`.
///
/// A key is composed once at emit time and then travels with the event
/// through the consent gate, the catalog lookup, the queue, and every
/// per-destination delivery task. Backed by `Arc<str>` so all of those
/// hops share one allocation.
///
/// Borrows as `&str`, so a `HashMap<EventKey, _>` (the catalog, the
/// consent rule table) can be probed with plain string slices.
///
/// # Examples
/// ```
/// use contracts::EventKey;
///
/// let key = EventKey::compose("checkout", "purchase");
/// assert_eq!(key.as_str(), "checkout::purchase");
/// ```
#[derive(Clone, Default)]
pub struct EventKey(Arc<str>);

impl EventKey {
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Compose a key from its area and name parts.
    pub fn compose(area: &str, name: &str) -> Self {
        Self(Arc::from(format!("{area}::{name}")))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for EventKey {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for EventKey {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets HashMap<EventKey, V> be probed with &str
impl Borrow<str> for EventKey {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventKey {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for EventKey {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<Arc<str>> for EventKey {
    #[inline]
    fn from(s: Arc<str>) -> Self {
        Self(s)
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventKey({:?})", self.0)
    }
}

impl PartialEq for EventKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        // Clones of one key compare by pointer alone
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for EventKey {}

impl PartialEq<str> for EventKey {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for EventKey {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl PartialEq<String> for EventKey {
    #[inline]
    fn eq(&self, other: &String) -> bool {
        self.0.as_ref() == other
    }
}

// Must hash identically to str for the Borrow<str> lookups to hold
impl Hash for EventKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl Serialize for EventKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EventKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}
