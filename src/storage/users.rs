use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::UserRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // User operations
    // ========================================================================

    /// Insert a new user. Fails with `UniqueViolation` if the username is taken.
    pub fn insert_user(&self, user: &UserRecord) -> Result<(), DatabaseError> {
        debug_assert!(!user.username.is_empty(), "username must not be empty");

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(USERS)?;
            if table.get(user.username.as_str())?.is_some() {
                return Err(DatabaseError::UniqueViolation {
                    table: "users",
                    key: user.username.clone(),
                });
            }
            let data = rmp_serde::to_vec_named(user)?;
            table.insert(user.username.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a user by username
    pub fn get_user(&self, username: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        match table.get(username)? {
            Some(data) => {
                let user: UserRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Look up the stored password hash for a username
    pub fn get_password_hash(&self, username: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self.get_user(username)?.map(|u| u.password_hash))
    }
}
