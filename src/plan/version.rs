// src/plan/version.rs

//! Semantic comparison of YugabyteDB-style version strings.
//!
//! A version like `2.13.1.0-b5` is split on `.` and on the `-b` build
//! separator into integer components: `[2, 13, 1, 0, 5]`. Comparison pads
//! the shorter side with zeros.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{MatrixError, Result};

static COMPONENT_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.|-b").expect("static regex is valid"));

static URL_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"yugabyte-(\d+\.\d+(?:\.\d+){0,2}(?:-b\d+)?)").expect("static regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    raw: String,
    components: Vec<u64>,
}

impl Version {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// `true` if `self` (the actual version) satisfies the minimum `required`.
    ///
    /// Versions that agree on every compared component satisfy the gate:
    /// "at least" includes "equal".
    pub fn is_at_least(&self, required: &Version) -> bool {
        let len = self.components.len().max(required.components.len());
        (0..len)
            .map(|i| {
                let least = required.components.get(i).copied().unwrap_or(0);
                let actual = self.components.get(i).copied().unwrap_or(0);
                least.cmp(&actual)
            })
            .find(|ord| *ord != Ordering::Equal)
            .map(|ord| ord == Ordering::Less)
            .unwrap_or(true)
    }
}

impl FromStr for Version {
    type Err = MatrixError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(MatrixError::VersionError("empty version string".to_string()));
        }

        let components = COMPONENT_SEPARATOR
            .split(raw)
            .map(|part| {
                part.parse::<u64>().map_err(|_| {
                    MatrixError::VersionError(format!(
                        "invalid component '{part}' in version '{raw}'"
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Version {
            raw: raw.to_string(),
            components,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// String-level convenience over [`Version::is_at_least`].
pub fn is_version_at_least(least: &str, actual: &str) -> Result<bool> {
    let least: Version = least.parse()?;
    let actual: Version = actual.parse()?;
    Ok(actual.is_at_least(&least))
}

/// Extract the artifact version from a tarball URL such as
/// `https://downloads.yugabyte.com/yugabyte-2.13.1.0-b112-linux.tar.gz`.
pub fn version_from_url(url: &str) -> Result<Version> {
    let captures = URL_VERSION.captures(url).ok_or_else(|| {
        MatrixError::ConfigError(format!("failed to parse version from URL {url}"))
    })?;
    captures[1].parse()
}
