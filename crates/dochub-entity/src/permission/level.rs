//! Access level enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use dochub_core::AppError;
use dochub_core::error::codes;

/// Permission granted to a user role on a folder.
///
/// Ordered by privilege: Publisher > Uploader > Viewer > None > Unset.
/// Serialized as its ordinal (0-4), which is the backend's wire form.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum AccessLevel {
    /// No binding exists.
    #[default]
    Unset,
    /// Explicitly denied.
    None,
    /// May browse and download published files.
    Viewer,
    /// May additionally upload and edit.
    Uploader,
    /// May additionally publish.
    Publisher,
}

impl AccessLevel {
    /// Every level in ascending order.
    pub const ALL: [AccessLevel; 5] = [
        Self::Unset,
        Self::None,
        Self::Viewer,
        Self::Uploader,
        Self::Publisher,
    ];

    /// The wire ordinal.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Check if this level grants at least `required`.
    pub fn has_at_least(self, required: AccessLevel) -> bool {
        self >= required
    }

    /// Return the level as a lowercase string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::None => "none",
            Self::Viewer => "viewer",
            Self::Uploader => "uploader",
            Self::Publisher => "publisher",
        }
    }
}

impl TryFrom<u8> for AccessLevel {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| AppError::validation(codes::INVALID_ACCESS_LEVEL))
    }
}

impl From<AccessLevel> for u8 {
    fn from(level: AccessLevel) -> u8 {
        level.ordinal()
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if let Ok(n) = s.parse::<u8>() {
            return Self::try_from(n);
        }
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| AppError::validation(codes::INVALID_ACCESS_LEVEL))
    }
}
