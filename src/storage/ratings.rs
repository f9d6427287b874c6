use redb::{ReadableTable, WriteTransaction};

use super::db::{Database, DatabaseError};
use super::models::{FileRecord, UserRecord};
use super::tables::*;

impl Database {
    // ========================================================================
    // File rating operations
    // ========================================================================

    /// Record a voter's first rating of a file and add it to the file's and
    /// the owner's aggregates, all in one write transaction. Fails with
    /// `UniqueViolation` when the voter already rated it, and `NotFound` when
    /// the file is unknown. Returns the owner's username.
    pub fn record_file_rating(
        &self,
        file_id: u64,
        voter: &str,
        rating: i32,
    ) -> Result<String, DatabaseError> {
        let key = rating_key(file_id, voter);

        let write_txn = self.begin_write()?;
        let owner = {
            let mut table = write_txn.open_table(FILE_RATINGS)?;
            if table.get(key.as_str())?.is_some() {
                return Err(DatabaseError::UniqueViolation {
                    table: "file_ratings",
                    key,
                });
            }
            table.insert(key.as_str(), rating)?;

            adjust_aggregates(&write_txn, file_id, i64::from(rating))?
        };
        write_txn.commit()?;
        Ok(owner)
    }

    /// Replace a voter's existing rating and move both aggregates by the
    /// difference, in one write transaction. Returns the previous value.
    /// Nothing is written when it equals `rating`. Fails with `NotFound`
    /// when the voter has no row for this file.
    pub fn change_file_rating(
        &self,
        file_id: u64,
        voter: &str,
        rating: i32,
    ) -> Result<i32, DatabaseError> {
        let key = rating_key(file_id, voter);

        let write_txn = self.begin_write()?;
        let previous = {
            let mut table = write_txn.open_table(FILE_RATINGS)?;
            let previous = match table.get(key.as_str())? {
                Some(v) => v.value(),
                None => {
                    return Err(DatabaseError::NotFound {
                        table: "file_ratings",
                        key,
                    })
                }
            };
            if previous == rating {
                return Ok(previous);
            }
            table.insert(key.as_str(), rating)?;

            adjust_aggregates(&write_txn, file_id, i64::from(rating) - i64::from(previous))?;
            previous
        };
        write_txn.commit()?;
        Ok(previous)
    }

    /// A voter's current rating of a file, if any
    pub fn get_file_rating(&self, file_id: u64, voter: &str) -> Result<Option<i32>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILE_RATINGS)?;
        let rating = table
            .get(rating_key(file_id, voter).as_str())?
            .map(|v| v.value());
        Ok(rating)
    }
}

/// Add `delta` to a file's aggregate rating and to its owner's inside an open
/// write transaction. Returns the owner's username.
fn adjust_aggregates(
    txn: &WriteTransaction,
    file_id: u64,
    delta: i64,
) -> Result<String, DatabaseError> {
    let mut files = txn.open_table(FILES)?;
    let mut file: FileRecord = match files.get(file_id)? {
        Some(data) => rmp_serde::from_slice(data.value())?,
        None => {
            return Err(DatabaseError::NotFound {
                table: "files",
                key: file_id.to_string(),
            })
        }
    };
    file.rating += delta;
    let data = rmp_serde::to_vec_named(&file)?;
    files.insert(file_id, data.as_slice())?;

    let mut users = txn.open_table(USERS)?;
    let mut owner: UserRecord = match users.get(file.owner.as_str())? {
        Some(data) => rmp_serde::from_slice(data.value())?,
        None => {
            return Err(DatabaseError::NotFound {
                table: "users",
                key: file.owner,
            })
        }
    };
    owner.rating += delta;
    let data = rmp_serde::to_vec_named(&owner)?;
    users.insert(file.owner.as_str(), data.as_slice())?;

    Ok(file.owner)
}
