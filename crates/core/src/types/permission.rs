//! Permission codenames.
//!
//! A permission is identified by `app_label.codename`, where the codename is
//! conventionally `<action>_<model>` (e.g. `shopapp.view_order`).

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PermissionCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionCodeError {
    /// The input has no `.` separating app label and codename.
    #[error("permission must look like `app_label.codename`")]
    MissingAppLabel,
    /// App label or codename contains characters outside `[a-z0-9_]`.
    #[error("permission may only contain lowercase letters, digits and underscores")]
    InvalidCharacters,
}

/// A fully-qualified permission codename such as `shopapp.view_order`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionCode(String);

impl PermissionCode {
    /// Parse a permission codename.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not `app_label.codename` or contains
    /// characters other than lowercase ASCII letters, digits and underscores.
    pub fn parse(s: &str) -> Result<Self, PermissionCodeError> {
        let (app_label, codename) = s
            .split_once('.')
            .ok_or(PermissionCodeError::MissingAppLabel)?;

        let valid = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        };
        if !valid(app_label) || !valid(codename) {
            return Err(PermissionCodeError::InvalidCharacters);
        }

        Ok(Self(s.to_owned()))
    }

    /// The part before the dot.
    #[must_use]
    pub fn app_label(&self) -> &str {
        self.0.split_once('.').map_or("", |(app, _)| app)
    }

    /// The part after the dot.
    #[must_use]
    pub fn codename(&self) -> &str {
        self.0.split_once('.').map_or("", |(_, code)| code)
    }

    /// Get the full codename as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PermissionCode {
    type Err = PermissionCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PermissionCode {
    type Error = PermissionCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PermissionCode> for String {
    fn from(code: PermissionCode) -> Self {
        code.0
    }
}

impl fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
