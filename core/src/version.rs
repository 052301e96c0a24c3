//! Four-part dotted version numbers.
//!
//! A [`Version`] is written `Major.Minor[.Build[.Revision]]`. Two to four
//! numeric components are accepted. Components that were not written are
//! *absent* rather than zero, and an absent component orders before any
//! present one, so `1.0 < 1.0.0 < 1.0.0.0 < 1.0.0.1`.
//!
//! # Examples
//!
//! ```
//! use sqlite_wrapper_core::Version;
//!
//! let a: Version = "1.5".parse().unwrap();
//! let b: Version = "1.10.2".parse().unwrap();
//! assert!(a < b);
//! assert_eq!(b.to_string(), "1.10.2");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string is not a valid [`Version`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    /// Fewer than two or more than four dot-separated components.
    #[error("version '{0}' must have between 2 and 4 components")]
    ComponentCount(String),
    /// A component is empty or contains something other than ASCII digits.
    #[error("version '{input}' has an invalid component '{component}'")]
    InvalidComponent { input: String, component: String },
}

/// A `Major.Minor[.Build[.Revision]]` version.
///
/// Field order matters: the derived ordering compares major, minor, build
/// and revision in turn, and `None < Some(_)` for the optional parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    major: u32,
    minor: u32,
    build: Option<u32>,
    revision: Option<u32>,
}

impl Version {
    /// Creates a two-component version.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            build: None,
            revision: None,
        }
    }

    /// Adds a build component.
    pub const fn with_build(mut self, build: u32) -> Self {
        self.build = Some(build);
        self
    }

    /// Adds a revision component. Implies a build component of `0` when
    /// none was set.
    pub const fn with_revision(mut self, revision: u32) -> Self {
        if self.build.is_none() {
            self.build = Some(0);
        }
        self.revision = Some(revision);
        self
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn build(&self) -> Option<u32> {
        self.build
    }

    pub fn revision(&self) -> Option<u32> {
        self.revision
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let parts: Vec<&str> = trimmed.split('.').collect();
        if !(2..=4).contains(&parts.len()) {
            return Err(VersionParseError::ComponentCount(input.to_string()));
        }

        let mut numbers = Vec::with_capacity(parts.len());
        for part in &parts {
            // u32::from_str accepts a leading '+', which is not a valid component.
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionParseError::InvalidComponent {
                    input: input.to_string(),
                    component: (*part).to_string(),
                });
            }
            let value = part
                .parse::<u32>()
                .map_err(|_| VersionParseError::InvalidComponent {
                    input: input.to_string(),
                    component: (*part).to_string(),
                })?;
            numbers.push(value);
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            build: numbers.get(2).copied(),
            revision: numbers.get(3).copied(),
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(build) = self.build {
            write!(f, ".{build}")?;
            if let Some(revision) = self.revision {
                write!(f, ".{revision}")?;
            }
        }
        Ok(())
    }
}

impl TryFrom<String> for Version {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}
