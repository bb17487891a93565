//! Username type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Username`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    /// The input string is empty.
    #[error("username cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("username must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains characters outside letters, digits and `@.+-_`.
    #[error("username may contain only letters, numbers, and @/./+/-/_ characters")]
    InvalidCharacters,
}

/// A login name.
///
/// ## Constraints
///
/// - Length: 1-150 characters
/// - Letters, digits and `@`, `.`, `+`, `-`, `_`
///
/// ## Examples
///
/// ```
/// use shopapp_core::Username;
///
/// assert!(Username::parse("admin").is_ok());
/// assert!(Username::parse("jane.doe+shop@corp").is_ok());
/// assert!(Username::parse("").is_err());
/// assert!(Username::parse("has space").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Maximum length of a username.
    pub const MAX_LENGTH: usize = 150;

    /// Parse a `Username` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 150 characters, or
    /// contains disallowed characters.
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        if s.is_empty() {
            return Err(UsernameError::Empty);
        }

        if s.chars().count() > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if !s
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            return Err(UsernameError::InvalidCharacters);
        }

        Ok(Self(s.to_owned()))
    }

    /// Get the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_long() {
        let long = "a".repeat(151);
        assert_eq!(
            Username::parse(&long),
            Err(UsernameError::TooLong { max: 150 })
        );
        assert!(Username::parse(&"a".repeat(150)).is_ok());
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(
            Username::parse("semi;colon"),
            Err(UsernameError::InvalidCharacters)
        );
    }
}
