//! Output tokens keep concurrently produced artifacts apart on disk.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Length of generated output tokens.
pub const OUTPUT_TOKEN_LEN: usize = 16;

/// A random, filename-safe token unique to one render session.
///
/// Generation lives behind the engine's random port; the domain only
/// validates that a token is non-empty ASCII alphanumeric so it can be
/// embedded in a file name verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OutputToken(String);

impl OutputToken {
    pub fn new(token: impl Into<String>) -> Result<Self, DomainError> {
        let token = token.into();
        if token.is_empty() {
            return Err(DomainError::validation("Output token cannot be empty"));
        }
        if !token.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::validation(format!(
                "Output token must be alphanumeric: {token}"
            )));
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OutputToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OutputToken {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OutputToken> for String {
    fn from(value: OutputToken) -> Self {
        value.0
    }
}
