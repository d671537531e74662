use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::TypeError;

/// Identifier of a stored file.
///
/// A `FileId` only exists for text that passed strict validation: the
/// canonical hyphenated `8-4-4-4-12` form, 36 characters long. Hex digits are
/// case-insensitive; simple, braced and URN forms are rejected. Equality is
/// on the 128-bit value, so the textual case does not matter for lookups.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(Uuid);

impl FileId {
    /// Length of the canonical textual form.
    pub const TEXT_LEN: usize = 36;

    /// Parse the canonical hyphenated form.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if !Self::is_valid(s) {
            return Err(TypeError::InvalidUuid(s.to_string()));
        }
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| TypeError::InvalidUuid(s.to_string()))
    }

    /// Returns `true` if `s` is a syntactically valid file identifier.
    pub fn is_valid(s: &str) -> bool {
        s.len() == Self::TEXT_LEN
            && s.bytes().enumerate().all(|(i, b)| match i {
                8 | 13 | 18 | 23 => b == b'-',
                _ => b.is_ascii_hexdigit(),
            })
    }

    /// A fresh random (v4) identifier.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0.hyphenated())
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for FileId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for FileId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FileId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
