use chrono::Utc;
use redb::{ReadOnlyTable, ReadableTable, Table};

use super::db::{decode_ids, Database, DatabaseError};
use super::models::{Category, FilePage, FileRecord, NewFile};
use super::tables::*;

impl Database {
    // ========================================================================
    // File operations
    // ========================================================================

    /// Insert a file, assigning the next sequence id, and update the category
    /// and owner indexes
    pub fn insert_file(&self, new: NewFile) -> Result<FileRecord, DatabaseError> {
        debug_assert!(!new.label.is_empty(), "file label must not be empty");

        let write_txn = self.begin_write()?;
        let file = {
            let mut meta = write_txn.open_table(META)?;
            let id = meta.get(NEXT_FILE_ID)?.map(|v| v.value()).unwrap_or(1);
            meta.insert(NEXT_FILE_ID, id + 1)?;

            let file = FileRecord {
                id,
                label: new.label,
                description: new.description,
                owner: new.owner,
                category: new.category,
                uploaded_at: Utc::now(),
                byte_size: new.byte_size,
                rating: 0,
                blob_key: new.blob_key,
            };

            let mut table = write_txn.open_table(FILES)?;
            let data = rmp_serde::to_vec_named(&file)?;
            table.insert(id, data.as_slice())?;

            let mut category_table = write_txn.open_table(CATEGORY_FILES)?;
            append_id(&mut category_table, file.category.as_str(), id)?;

            let mut owner_table = write_txn.open_table(OWNER_FILES)?;
            append_id(&mut owner_table, file.owner.as_str(), id)?;

            file
        };
        write_txn.commit()?;
        Ok(file)
    }

    /// Get a file by id
    pub fn get_file(&self, id: u64) -> Result<Option<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;
        read_file(&table, id)
    }

    /// Number of files filed under a category
    pub fn count_category(&self, category: Category) -> Result<u64, DatabaseError> {
        let read_txn = self.begin_read()?;
        let index = read_txn.open_table(CATEGORY_FILES)?;
        let ids = match index.get(category.as_str())? {
            Some(data) => decode_ids(data.value())?,
            None => Vec::new(),
        };
        Ok(ids.len() as u64)
    }

    /// One newest-first page of a category listing
    pub fn list_category(
        &self,
        category: Category,
        offset: u64,
        limit: u64,
    ) -> Result<FilePage, DatabaseError> {
        let read_txn = self.begin_read()?;
        let index = read_txn.open_table(CATEGORY_FILES)?;
        let files = read_txn.open_table(FILES)?;
        page_from_index(&index, &files, category.as_str(), offset, limit)
    }

    /// Every file uploaded by a user, newest first
    pub fn list_owner_files(&self, owner: &str) -> Result<Vec<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let index = read_txn.open_table(OWNER_FILES)?;
        let files = read_txn.open_table(FILES)?;
        Ok(page_from_index(&index, &files, owner, 0, u64::MAX)?.files)
    }
}

fn read_file(
    table: &ReadOnlyTable<u64, &'static [u8]>,
    id: u64,
) -> Result<Option<FileRecord>, DatabaseError> {
    match table.get(id)? {
        Some(data) => {
            let file: FileRecord = rmp_serde::from_slice(data.value())?;
            Ok(Some(file))
        }
        None => Ok(None),
    }
}

fn append_id(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    key: &str,
    id: u64,
) -> Result<(), DatabaseError> {
    let mut ids: Vec<u64> = match table.get(key)? {
        Some(data) => decode_ids(data.value())?,
        None => Vec::new(),
    };
    ids.push(id);
    let data = rmp_serde::to_vec_named(&ids)?;
    table.insert(key, data.as_slice())?;
    Ok(())
}

fn page_from_index(
    index: &ReadOnlyTable<&'static str, &'static [u8]>,
    files: &ReadOnlyTable<u64, &'static [u8]>,
    key: &str,
    offset: u64,
    limit: u64,
) -> Result<FilePage, DatabaseError> {
    let ids = match index.get(key)? {
        Some(data) => decode_ids(data.value())?,
        None => {
            return Ok(FilePage {
                files: Vec::new(),
                total: 0,
            })
        }
    };

    let total = ids.len() as u64;
    let mut page = Vec::new();
    for id in ids
        .iter()
        .rev()
        .skip(offset.min(total) as usize)
        .take(limit.min(total) as usize)
    {
        if let Some(file) = read_file(files, *id)? {
            page.push(file);
        }
    }

    Ok(FilePage { files: page, total })
}
