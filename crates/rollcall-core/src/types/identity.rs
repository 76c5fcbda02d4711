//! Caller identities and matric numbers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque caller reference, typically a wallet address.
///
/// Identities are both the authorization subject and the key for student
/// and attendance records. They are compared exactly; no case folding or
/// checksum normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Creates an identity from any string.
    ///
    /// # Examples
    ///
    /// ```
    /// use rollcall_core::Identity;
    ///
    /// let id = Identity::new("0xabc");
    /// assert_eq!(id.as_str(), "0xabc");
    /// assert!(!id.is_null());
    /// ```
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// The null identity: an empty reference.
    pub fn null() -> Self {
        Self(String::new())
    }

    /// Returns `true` for the null sentinel.
    ///
    /// Blank strings and the zero address (`0x` followed only by `0`
    /// digits) are both treated as null.
    ///
    /// ```
    /// use rollcall_core::Identity;
    ///
    /// assert!(Identity::null().is_null());
    /// assert!(Identity::new("  ").is_null());
    /// assert!(Identity::new("0x0000000000000000000000000000000000000000").is_null());
    /// assert!(!Identity::new("0x01").is_null());
    /// ```
    pub fn is_null(&self) -> bool {
        let trimmed = self.0.trim();
        if trimmed.is_empty() {
            return true;
        }
        match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b == b'0'),
            None => false,
        }
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A student's external enrollment identifier, e.g. `CSC/2021/001`.
///
/// Unique across all student records and distinct from the [`Identity`].
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MatricNumber(String);

impl MatricNumber {
    /// Creates a matric number from any string.
    pub fn new<S: Into<String>>(matric: S) -> Self {
        Self(matric.into())
    }

    /// Returns `true` when the matric number is blank.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Returns the matric number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatricNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MatricNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MatricNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for MatricNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
