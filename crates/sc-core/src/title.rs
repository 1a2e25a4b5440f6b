//! Screen titles with a structured version number.
//!
//! Generated screens carry their version in the display title as a trailing
//! `" (vN)"`. The suffix is parsed once at the boundary into a `Title`, which
//! keeps the base title and version as separate fields; the display string is
//! re-derived through `Display` whenever it is needed.
//!
//! Built on `winnow` 0.7 for the suffix grammar.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use winnow::ascii::digit1;
use winnow::combinator::terminated;
use winnow::prelude::*;

const SUFFIX_OPEN: &str = " (v";

/// A screen title split into its base text and optional version number.
///
/// `version == None` is the original screen (version 0 for ordering).
/// Version numbers are always `>= 1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Title {
    base: String,
    version: Option<u32>,
}

impl Title {
    /// An un-versioned title.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            version: None,
        }
    }

    /// Parse a display title, splitting off a trailing `" (vN)"`.
    ///
    /// `(v0)`, non-numeric, or overflowing suffixes are kept as part of the base.
    pub fn parse(display: &str) -> Self {
        if let Some(at) = display.rfind(SUFFIX_OPEN) {
            let rest = &display[at + SUFFIX_OPEN.len()..];
            if let Ok(n) = parse_version_digits.parse(rest)
                && n > 0
            {
                return Self {
                    base: display[..at].to_string(),
                    version: Some(n),
                };
            }
        }
        Self::new(display)
    }

    /// The same base title at version `n` (`0` yields the original).
    pub fn with_version(&self, n: u32) -> Self {
        Self {
            base: self.base.clone(),
            version: (n > 0).then_some(n),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn version(&self) -> Option<u32> {
        self.version
    }

    /// Version used for ordering: the original sorts as `0`.
    pub fn ordinal(&self) -> u32 {
        self.version.unwrap_or(0)
    }

    pub fn is_versioned(&self) -> bool {
        self.version.is_some()
    }
}

fn parse_version_digits(input: &mut &str) -> ModalResult<u32> {
    terminated(digit1.parse_to::<u32>(), ")").parse_next(input)
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(n) => write!(f, "{} (v{n})", self.base),
            None => f.write_str(&self.base),
        }
    }
}

impl From<&str> for Title {
    fn from(display: &str) -> Self {
        Title::parse(display)
    }
}

impl Serialize for Title {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Title {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Title::parse(&s))
    }
}
