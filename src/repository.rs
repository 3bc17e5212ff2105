use std::path::Path;

use redb::{
    Database,
    ReadableDatabase,
    ReadableTable,
    ReadableTableMetadata,
    TableDefinition,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

const MATCH_RECORDS: TableDefinition<u64, &[u8]> =
    TableDefinition::new("match_records");

/// A matching file's derived data, before the repository assigns it an
/// identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMatch {
    pub source_path: String,
    /// Matched keywords in vocabulary order, `", "`-joined.
    pub keywords: String,
    pub names: String,
    /// ISO calendar dates, ascending, `", "`-joined.
    pub dates: String,
    pub snippet: String,
    /// Full-text artifact name inside the `fulltext/` directory.
    pub fulltext_file: String,
    pub face_count: u32,
    /// Face-crop artifact names inside the `faces/` directory.
    pub face_files: String,
}

/// The persisted unit: one record per file that matched at least one
/// keyword. Records are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: u64,
    #[serde(flatten)]
    pub data: NewMatch,
}

/// Append-only store of [`MatchRecord`]s.
///
/// redb admits a single write transaction at a time, which is what keeps
/// identifier assignment race-free; the pipeline additionally funnels all
/// inserts through one collecting thread.
pub struct Repository {
    db: Database,
}

impl Repository {
    /// Open or create the results database at the given path.
    ///
    /// # Examples
    ///
    /// ```
    /// # let tmp = tempfile::tempdir().unwrap();
    /// use docsift::Repository;
    ///
    /// let repo = Repository::open(&tmp.path().join("results.redb")).unwrap();
    /// assert_eq!(repo.count().unwrap(), 0);
    /// ```
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path)?;

        let txn = db.begin_write()?;
        txn.open_table(MATCH_RECORDS)?;
        txn.commit()?;

        Ok(Self { db })
    }

    /// Append a record. The identifier is one past the largest stored
    /// identifier (starting at 1), assigned inside the write transaction.
    pub fn insert(&self, data: NewMatch) -> Result<MatchRecord> {
        let txn = self.db.begin_write()?;
        let record = {
            let mut table = txn.open_table(MATCH_RECORDS)?;
            let id = match table.last()? {
                Some((key, _)) => key.value() + 1,
                None => 1,
            };
            let record = MatchRecord { id, data };
            let bytes = serde_json::to_vec(&record)?;
            table.insert(id, bytes.as_slice())?;
            record
        };
        txn.commit()?;
        Ok(record)
    }

    pub fn get(&self, id: u64) -> Result<Option<MatchRecord>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(MATCH_RECORDS)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Records in identifier order, at most `limit` of them when given.
    pub fn list(&self, limit: Option<usize>) -> Result<Vec<MatchRecord>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(MATCH_RECORDS)?;
        let mut records = Vec::new();
        for entry in table.iter()?.take(limit.unwrap_or(usize::MAX)) {
            let (_, value) = entry?;
            records.push(serde_json::from_slice(value.value())?);
        }
        Ok(records)
    }

    pub fn count(&self) -> Result<u64> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(MATCH_RECORDS)?;
        Ok(table.len()?)
    }
}
