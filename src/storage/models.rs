use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The closed set of categories a file can be filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Other,
    Games,
    Documents,
    Projects,
    Music,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Other,
        Category::Games,
        Category::Documents,
        Category::Projects,
        Category::Music,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Other => "other",
            Category::Games => "games",
            Category::Documents => "documents",
            Category::Projects => "projects",
            Category::Music => "music",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A registered user stored in redb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    /// Encoded password hash, see `auth::password`
    pub password_hash: String,
    /// Sum of every vote cast on this user's files
    pub rating: i64,
    /// IANA zone name used when displaying timestamps
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

/// An uploaded file stored in redb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Assigned by the store on insert
    pub id: u64,
    pub label: String,
    pub description: String,
    pub owner: String,
    pub category: Category,
    pub uploaded_at: DateTime<Utc>,
    pub byte_size: u64,
    /// Sum of every vote cast on this file
    pub rating: i64,
    /// Object store key holding the file contents
    pub blob_key: String,
}

/// Fields supplied by the uploader. The id and rating are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub label: String,
    pub description: String,
    pub owner: String,
    pub category: Category,
    pub byte_size: u64,
    pub blob_key: String,
}

/// One page of a newest-first listing
#[derive(Debug, Clone)]
pub struct FilePage {
    pub files: Vec<FileRecord>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_names() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn test_category_rejects_unknown_and_mixed_case() {
        assert!("videos".parse::<Category>().is_err());
        assert!("Games".parse::<Category>().is_err());
    }
}
