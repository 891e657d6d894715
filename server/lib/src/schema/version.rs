use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A release version as used by the `since` and `deprecatedSince` schema
/// fields. `future` sorts after every numbered release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Version {
    Release { major: u32, minor: u32, patch: u32 },
    Future,
}

impl Version {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version::Release {
            major,
            minor,
            patch,
        }
    }

    pub fn is_future(&self) -> bool {
        matches!(self, Version::Future)
    }

    fn major_minor(&self) -> Option<(u32, u32)> {
        match self {
            Version::Release { major, minor, .. } => Some((*major, *minor)),
            Version::Future => None,
        }
    }

    /// Both versions belong to the same `major.minor` release line.
    pub fn is_same_minor_release(&self, other: &Version) -> bool {
        match (self.major_minor(), other.major_minor()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => true,
            _ => false,
        }
    }

    /// This version's `major.minor` is strictly later than `other`'s.
    pub fn is_later_major_minor(&self, other: &Version) -> bool {
        match (self.major_minor(), other.major_minor()) {
            (Some(a), Some(b)) => a > b,
            (None, Some(_)) => true,
            (_, None) => false,
        }
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("future") {
            return Ok(Version::Future);
        }

        let parts: Vec<&str> = s.split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(format!("invalid version {}", s));
        }
        let mut nums = [0u32; 3];
        for (slot, part) in nums.iter_mut().zip(parts.iter()) {
            *slot = part
                .parse()
                .map_err(|_| format!("invalid version {}", s))?;
        }
        Ok(Version::new(nums[0], nums[1], nums[2]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Version::Release {
                major,
                minor,
                patch,
            } => write!(f, "{}.{}.{}", major, minor, patch),
            Version::Future => f.write_str("future"),
        }
    }
}
