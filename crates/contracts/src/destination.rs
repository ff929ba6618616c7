//! DestinationKey - identifies one output target
//!
//! Keys are created once (registration, config load) and cloned on every
//! routed record, so the string lives behind an `Arc<str>`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::ContractError;

/// Opaque destination identifier.
///
/// Maps 1:1 to a sink target, e.g. the file `<files_dir>/<key>.txt`.
///
/// # Examples
/// ```
/// use contracts::DestinationKey;
///
/// let key: DestinationKey = "file1".into();
/// assert_eq!(key.as_str(), "file1");
/// assert!(key.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct DestinationKey(Arc<str>);

impl DestinationKey {
    pub fn new(key: &str) -> Self {
        Self(Arc::from(key))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that the key can be used as a file stem.
    ///
    /// Empty keys, `.`/`..` and keys containing path separators or NUL are
    /// rejected so a key can never escape the storage directory.
    pub fn validate(&self) -> Result<(), ContractError> {
        let key = self.as_str();
        let reason = if key.is_empty() {
            Some("destination key cannot be empty")
        } else if key == "." || key == ".." {
            Some("destination key cannot be a relative path component")
        } else if key.contains(['/', '\\', '\0']) {
            Some("destination key cannot contain path separators")
        } else {
            None
        };

        match reason {
            Some(message) => Err(ContractError::invalid_destination(key, message)),
            None => Ok(()),
        }
    }
}

impl AsRef<str> for DestinationKey {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for DestinationKey {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DestinationKey {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for DestinationKey {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for DestinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for DestinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DestinationKey({:?})", self.0)
    }
}

impl PartialEq for DestinationKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for DestinationKey {}

impl PartialEq<str> for DestinationKey {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for DestinationKey {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

// Must hash exactly like `str` so `HashMap<DestinationKey, _>::get(&str)` works.
impl Hash for DestinationKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl Serialize for DestinationKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DestinationKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}
