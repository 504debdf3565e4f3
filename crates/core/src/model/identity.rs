use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity must not be empty")]
    Empty,
}

/// Email used as the persistence key for saved progress.
///
/// Not authenticated. Always stored trimmed and lower-cased so that
/// `" Ada@Example.com "` and `"ada@example.com"` address the same record.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Normalize a raw email string.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Empty` when nothing remains after trimming.
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(IdentityError::Empty);
        }
        Ok(Self(normalized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.0
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_lowercases() {
        let identity = Identity::parse("  Ada.Lovelace@Example.COM \n").unwrap();
        assert_eq!(identity.as_str(), "ada.lovelace@example.com");
    }

    #[test]
    fn parse_rejects_blank() {
        assert_eq!(Identity::parse("   "), Err(IdentityError::Empty));
    }

    #[test]
    fn deserialize_normalizes() {
        let identity: Identity = serde_json::from_str("\"BOB@x.io\"").unwrap();
        assert_eq!(identity.as_str(), "bob@x.io");
    }
}
