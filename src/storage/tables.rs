use redb::TableDefinition;

/// User records: username -> UserRecord (msgpack)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// File records: file id -> FileRecord (msgpack)
pub const FILES: TableDefinition<u64, &[u8]> = TableDefinition::new("files");

/// One vote per voter per file: "{file_id}:{voter}" -> rating
pub const FILE_RATINGS: TableDefinition<&str, i32> = TableDefinition::new("file_ratings");

/// Category index: category -> msgpack Vec of file ids, in upload order
pub const CATEGORY_FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("category_files");

/// Owner index: username -> msgpack Vec of file ids, in upload order
pub const OWNER_FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("owner_files");

/// Sequences and other counters
pub const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

pub const NEXT_FILE_ID: &str = "next_file_id";

/// Key of a FILE_RATINGS row. Usernames never contain ':'.
pub fn rating_key(file_id: u64, voter: &str) -> String {
    format!("{file_id}:{voter}")
}
