// Tag domain model
use crate::domain::error::DashboardError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A tracking device attached to an animal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagId(u32);

/// Every device the report knows about, in dropdown order.
pub const KNOWN_TAGS: [TagId; 9] = [
    TagId(3600038),
    TagId(3600049),
    TagId(3600057),
    TagId(3600063),
    TagId(3600065),
    TagId(3600072),
    TagId(3600076),
    TagId(3600077),
    TagId(3600080),
];

impl TagId {
    pub fn all() -> &'static [TagId] {
        &KNOWN_TAGS
    }

    /// Dropdown value, e.g. "38" for 3600038
    pub fn short_code(&self) -> String {
        format!("{:02}", self.0 % 100)
    }

    /// Name of the remote and local CSV file for this tag
    pub fn csv_file_name(&self) -> String {
        format!("{}_gapped.csv", self.0)
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TagId {
    type Err = DashboardError;

    /// Accepts either the full device id ("3600038") or the dropdown value ("38")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        KNOWN_TAGS
            .iter()
            .copied()
            .find(|tag| tag.to_string() == trimmed || tag.short_code() == trimmed)
            .ok_or_else(|| DashboardError::UnknownTag(trimmed.to_string()))
    }
}

impl Serialize for TagId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Dropdown option for a tag
#[derive(Debug, Clone, Serialize)]
pub struct TagOption {
    pub id: TagId,
    pub label: String,
    pub value: String,
}

impl From<TagId> for TagOption {
    fn from(tag: TagId) -> Self {
        Self {
            id: tag,
            label: tag.to_string(),
            value: tag.short_code(),
        }
    }
}
