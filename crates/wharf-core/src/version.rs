//! Application versions.
//!
//! Application versions are one to four dot-separated non-negative integers
//! (`"1"`, `"2.0"`, `"1.4.0.12"`). Missing trailing components compare as
//! zero, so `1.0` and `1.0.0` are equal.

use std::cmp::Ordering;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Maximum number of components in a version.
const MAX_COMPONENTS: usize = 4;

/// A dotted application version with 1 to 4 numeric components.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    components: Vec<u32>,
}

impl Version {
    /// Creates a version from its components.
    ///
    /// # Errors
    ///
    /// Returns [`VersionParseError`] if there are no components or more than four.
    pub fn new(components: Vec<u32>) -> Result<Self, VersionParseError> {
        if components.is_empty() {
            return Err(VersionParseError::Empty);
        }
        if components.len() > MAX_COMPONENTS {
            return Err(VersionParseError::TooManyComponents(components.len()));
        }
        Ok(Self { components })
    }

    /// The numeric components as written.
    #[must_use]
    pub fn components(&self) -> &[u32] {
        &self.components
    }

    /// Checks if this version is strictly newer than another.
    #[must_use]
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self > other
    }

    fn component(&self, index: usize) -> u32 {
        self.components.get(index).copied().unwrap_or(0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.components {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
            first = false;
        }
        Ok(())
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (0..MAX_COMPONENTS)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

/// Error returned when parsing a version string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    /// The version string was empty.
    Empty,
    /// More than four components were supplied.
    TooManyComponents(usize),
    /// A component was empty or contained something other than ASCII digits.
    InvalidComponent(String),
    /// A numeric component did not fit in 32 bits.
    InvalidNumber(ParseIntError),
}

impl fmt::Display for VersionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "version is empty"),
            Self::TooManyComponents(n) => {
                write!(f, "version has {n} components (at most {MAX_COMPONENTS} allowed)")
            },
            Self::InvalidComponent(s) => write!(f, "invalid version component: '{s}'"),
            Self::InvalidNumber(e) => write!(f, "invalid version number: {e}"),
        }
    }
}

impl std::error::Error for VersionParseError {}

impl From<ParseIntError> for VersionParseError {
    fn from(e: ParseIntError) -> Self {
        Self::InvalidNumber(e)
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let mut components = Vec::new();
        for part in s.split('.') {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionParseError::InvalidComponent(part.to_string()));
            }
            components.push(part.parse()?);
        }
        Self::new(components)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.to_string()
    }
}
