use crate::error::{PurgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_IDENTITY_LEN: usize = 254;

/// A validated email address. Immutable once accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Validate and wrap a user supplied address.
    ///
    /// The value is kept exactly as given (no case folding) because every
    /// structured match downstream is case-sensitive.
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = |reason: &str| PurgeError::InvalidIdentity {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        if value.is_empty() {
            return Err(invalid("empty"));
        }
        if value.len() > MAX_IDENTITY_LEN {
            return Err(invalid("longer than 254 bytes"));
        }
        if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(invalid("contains whitespace or control characters"));
        }

        let (local, domain) = match value.split_once('@') {
            Some(parts) => parts,
            None => return Err(invalid("missing '@'")),
        };

        if domain.contains('@') {
            return Err(invalid("more than one '@'"));
        }
        if local.is_empty() {
            return Err(invalid("empty local part"));
        }
        if !domain.contains('.') {
            return Err(invalid("domain has no '.'"));
        }
        if domain.split('.').any(|label| label.is_empty()) {
            return Err(invalid("domain has an empty label"));
        }

        Ok(Identity(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Identity {
    type Error = PurgeError;

    fn try_from(value: String) -> Result<Self> {
        Identity::parse(&value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}
