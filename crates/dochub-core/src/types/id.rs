//! Newtype wrappers around the backend's unsigned integer keys.
//!
//! Using distinct types prevents accidentally passing a `UserId` where a
//! `FolderId` is expected. The backend never issues id `0`; it is reserved
//! as the "no parent" sentinel on folders.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Macro to define a newtype ID wrapper around `u32`.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Create an identifier from a raw key.
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Return the raw key.
            pub const fn get(self) -> u32 {
                self.0
            }

            /// Whether this is the unassigned (`0`) key.
            pub const fn is_unset(self) -> bool {
                self.0 == 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u32>().map(Self)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> u32 {
                id.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for a folder.
    FolderId
);

define_id!(
    /// Unique identifier for a file.
    FileId
);

define_id!(
    /// Unique identifier for a user.
    UserId
);

define_id!(
    /// Unique identifier for a user role.
    UserRoleId
);

define_id!(
    /// Unique identifier for an access role binding.
    AccessRoleId
);

impl FolderId {
    /// Parent id carried by the root of roots.
    pub const SENTINEL: FolderId = FolderId(0);

    /// The distinguished root folder.
    pub const ROOT: FolderId = FolderId(1);

    /// Whether this id is the "no parent" sentinel.
    pub const fn is_sentinel(self) -> bool {
        self.0 == Self::SENTINEL.0
    }
}

impl AccessRoleId {
    /// The irremovable baseline access role on the root folder.
    pub const ROOT_DEFAULT: AccessRoleId = AccessRoleId(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_sentinel() {
        assert!(FolderId::SENTINEL.is_sentinel());
        assert!(!FolderId::ROOT.is_sentinel());
        assert!(FolderId::ROOT < FolderId::new(2));
    }

    #[test]
    fn test_display_and_parse() {
        let id: FileId = " 42 ".parse().expect("should parse");
        assert_eq!(id, FileId::new(42));
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<UserId>().is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&UserRoleId::new(7)).expect("serialize");
        assert_eq!(json, "7");
        let parsed: UserRoleId = serde_json::from_str("7").expect("deserialize");
        assert_eq!(parsed, UserRoleId::new(7));
    }
}
