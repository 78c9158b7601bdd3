//! SyncIdentity - content address of one ordered synchronization request
//!
//! Uses Arc<str> internally for O(1) clone operations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Hex digest identifying an ordered pair of inputs.
///
/// The digest is produced by the cache layer from a type tag and the content
/// identities of input A and input B, in that order. Swapping the inputs
/// yields a different identity. The same string names the persisted
/// artifact on disk.
///
/// # Examples
/// ```
/// use contracts::SyncIdentity;
///
/// let id = SyncIdentity::from_hex("0cc175b9c0f1b6a831c399e269772661").unwrap();
/// assert_eq!(id.artifact_file_name("npy"), "0cc175b9c0f1b6a831c399e269772661.npy");
/// ```
#[derive(Clone)]
pub struct SyncIdentity(Arc<str>);

impl SyncIdentity {
    /// Wrap a lowercase hex digest.
    ///
    /// Returns `None` if the string is empty or contains anything other than
    /// lowercase hex digits, so an identity is always a safe file stem.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let valid = !hex.is_empty()
            && hex
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(Arc::from(hex)))
    }

    /// Hex-encode raw digest bytes.
    pub fn from_digest(digest: &[u8]) -> Self {
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        Self(Arc::from(hex))
    }

    /// Get the underlying hex string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the persisted artifact for this identity.
    pub fn artifact_file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.0, extension)
    }
}

impl Deref for SyncIdentity {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for SyncIdentity {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SyncIdentity {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SyncIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SyncIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SyncIdentity({:?})", self.0)
    }
}

impl PartialEq for SyncIdentity {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for SyncIdentity {}

impl PartialEq<str> for SyncIdentity {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

// Must agree with `Borrow<str>`
impl Hash for SyncIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.as_ref().hash(state);
    }
}

impl Serialize for SyncIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SyncIdentity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid sync identity '{s}'")))
    }
}
