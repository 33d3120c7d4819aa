//! Newtype wrappers for string identifiers, providing compile-time type safety.
//!
//! All newtypes serialize/deserialize as plain strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use thiserror::Error;

/// Multihash function code for SHA-256.
pub const MULTIHASH_SHA256: u8 = 0x12;
/// Digest length in bytes announced in the package hash header.
pub const SHA256_DIGEST_LEN: u8 = 0x20;
/// `"1220"`: the two header bytes, each written as two hex characters.
pub const PACKAGE_HASH_PREFIX: &str = "1220";
/// Header plus 64 hex characters of digest.
pub const PACKAGE_HASH_LEN: usize = PACKAGE_HASH_PREFIX.len() + 2 * SHA256_DIGEST_LEN as usize;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_newtype!(
    /// Field name of a dependency inside the `dependencies` object.
    DependencyName
);

string_newtype!(
    /// Package identifier: `"1220"` followed by 64 lowercase hex characters.
    PackageHash
);

impl DependencyName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl From<&str> for DependencyName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidPackageHash {
    #[error("package hash must be 68 characters, got {0}")]
    Length(usize),
    #[error("package hash must start with '1220'")]
    Prefix,
    #[error("package hash digest must be lowercase hex")]
    NotHex,
}

impl PackageHash {
    /// Validate and wrap an identifier read from a manifest.
    pub fn parse(s: &str) -> Result<Self, InvalidPackageHash> {
        if s.len() != PACKAGE_HASH_LEN {
            return Err(InvalidPackageHash::Length(s.len()));
        }
        let Some(digest) = s.strip_prefix(PACKAGE_HASH_PREFIX) else {
            return Err(InvalidPackageHash::Prefix);
        };
        if !digest
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(InvalidPackageHash::NotHex);
        }
        Ok(Self(s.to_owned()))
    }

    /// Build the identifier for a finished SHA-256 package digest.
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        Self(format!(
            "{MULTIHASH_SHA256:02x}{SHA256_DIGEST_LEN:02x}{}",
            hex::encode(digest)
        ))
    }

    /// Build the identifier from hex digest text.
    ///
    /// The header bytes are rendered as hex and concatenated with the digest
    /// text as-is; callers pass the lowercase hex of a 32-byte SHA-256 digest.
    pub fn from_hex_digest(digest_hex: &str) -> Result<Self, InvalidPackageHash> {
        Self::parse(&format!(
            "{MULTIHASH_SHA256:02x}{SHA256_DIGEST_LEN:02x}{digest_hex}"
        ))
    }

    /// The 64-character hex digest without the header.
    pub fn digest_hex(&self) -> &str {
        self.0.get(PACKAGE_HASH_PREFIX.len()..).unwrap_or_default()
    }
}

impl std::str::FromStr for PackageHash {
    type Err = InvalidPackageHash;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
