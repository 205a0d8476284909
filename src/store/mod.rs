//! SQLite-backed dictionary store
//!
//! One table per entity, keyed by the owning dictionary's title. Writes go
//! through a [`WriteTxn`]; each `batch_write` batch is its own savepoint inside
//! it, and dropping an uncommitted transaction rolls everything back.

pub mod records;
pub mod scan;
pub mod schema;

use std::ops::Deref;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, Transaction, TransactionBehavior, params};

use crate::error::{DictError, Result};
use crate::model::{DictionaryCounts, DictionaryRows, DictionarySummary};

pub use records::{StoreRecord, Table, TermColumn};
pub use scan::{KeyRange, RangeScan, TermIndex};

pub const DEFAULT_BATCH_SIZE: usize = 2000;

pub struct Store {
    conn: Connection,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl Store {
    /// Opens (creating if needed) a store file. The parent directory must exist.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        let found = schema::migrate(&conn)?;
        if found < schema::SCHEMA_VERSION {
            tracing::info!(
                "Dictionary store upgraded from schema v{} to v{}",
                found,
                schema::SCHEMA_VERSION
            );
        }
        Ok(Self { conn })
    }

    pub fn schema_version(&self) -> Result<i64> {
        Ok(schema::user_version(&self.conn)?)
    }

    /// A consistent snapshot for a group of reads.
    pub fn read(&self) -> Result<ReadTxn<'_>> {
        Ok(ReadTxn {
            tx: self.conn.unchecked_transaction()?,
        })
    }

    pub fn write(&mut self) -> Result<WriteTxn<'_>> {
        Ok(WriteTxn {
            tx: self
                .conn
                .transaction_with_behavior(TransactionBehavior::Immediate)?,
        })
    }

    /// Upserts a single record in its own transaction.
    pub fn put<R: StoreRecord>(&mut self, record: &R) -> Result<()> {
        let txn = self.write()?;
        txn.put(record)?;
        txn.commit()
    }

    pub fn list_dictionaries(&self) -> Result<Vec<DictionarySummary>> {
        Ok(records::dictionaries(&self.conn)?)
    }

    pub fn find_dictionary(&self, title: &str) -> Result<Option<DictionarySummary>> {
        Ok(records::dictionary(&self.conn, title)?)
    }

    /// Commits a dictionary whose rows are already in memory.
    ///
    /// Entity rows go first in `batch_size` batches, the Dictionary row last,
    /// all inside one write transaction. `progress` receives the table and the
    /// number of its rows saved so far.
    pub fn store_dictionary(
        &mut self,
        mut summary: DictionarySummary,
        rows: &DictionaryRows,
        batch_size: usize,
        mut progress: impl FnMut(Table, usize),
    ) -> Result<DictionarySummary> {
        let mut txn = self.write()?;
        if txn.find_dictionary(&summary.title)?.is_some() {
            return Err(DictError::DictionaryAlreadyPresent(summary.title));
        }

        txn.batch_write(&rows.tag_meta, batch_size, |n| progress(Table::TagMeta, n))?;
        txn.batch_write(&rows.terms, batch_size, |n| progress(Table::Terms, n))?;
        txn.batch_write(&rows.term_meta, batch_size, |n| progress(Table::TermMeta, n))?;
        txn.batch_write(&rows.kanji, batch_size, |n| progress(Table::Kanji, n))?;
        txn.batch_write(&rows.kanji_meta, batch_size, |n| progress(Table::KanjiMeta, n))?;
        txn.batch_write(&rows.media, batch_size, |n| progress(Table::Media, n))?;

        txn.finish_dictionary(&mut summary)?;
        txn.commit()?;
        Ok(summary)
    }
}

pub struct ReadTxn<'a> {
    tx: Transaction<'a>,
}

impl Deref for ReadTxn<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.tx
    }
}

pub struct WriteTxn<'a> {
    tx: Transaction<'a>,
}

impl Deref for WriteTxn<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.tx
    }
}

impl WriteTxn<'_> {
    pub fn put<R: StoreRecord>(&self, record: &R) -> Result<()> {
        Ok(record.put(&self.tx)?)
    }

    /// Writes `records` in batches, each atomic on its own. Returns the row count.
    pub fn batch_write<R: StoreRecord>(
        &mut self,
        records: &[R],
        batch_size: usize,
        mut progress: impl FnMut(usize),
    ) -> Result<usize> {
        let mut written = 0;
        for batch in records.chunks(batch_size.max(1)) {
            let savepoint = self.tx.savepoint()?;
            for record in batch {
                record.put(&savepoint)?;
            }
            savepoint.commit()?;
            written += batch.len();
            progress(written);
        }
        if written > 0 {
            tracing::debug!("Saved {} row(s) to {}", written, R::TABLE);
        }
        Ok(written)
    }

    /// Deletes every row of `table` owned by `dictionary`, `batch_size` rows at
    /// a time. `progress` sees the running total and may abort the delete.
    pub fn cursor_delete(
        &mut self,
        table: Table,
        dictionary: &str,
        batch_size: usize,
        mut progress: impl FnMut(u64) -> Result<()>,
    ) -> Result<u64> {
        let sql = format!(
            "DELETE FROM {table} WHERE rowid IN (SELECT rowid FROM {table} WHERE {owner} = ?1 LIMIT ?2)",
            table = table.name(),
            owner = table.owner_column()
        );
        let mut total = 0u64;
        loop {
            let removed = self
                .tx
                .prepare_cached(&sql)?
                .execute(params![dictionary, batch_size.max(1) as i64])?;
            if removed == 0 {
                break;
            }
            total += removed as u64;
            progress(total)?;
        }
        Ok(total)
    }

    pub fn range_scan(
        &self,
        index: TermIndex,
        dictionary: Option<&str>,
        range: KeyRange,
    ) -> RangeScan<'_> {
        RangeScan::new(&self.tx, index, dictionary, range)
    }

    pub fn find_dictionary(&self, title: &str) -> Result<Option<DictionarySummary>> {
        Ok(records::dictionary(&self.tx, title)?)
    }

    pub fn counts(&self, dictionary: &str) -> Result<DictionaryCounts> {
        Ok(records::counts(&self.tx, dictionary)?)
    }

    /// Stamps counts and install date onto `summary` and writes the Dictionary row.
    pub fn finish_dictionary(&self, summary: &mut DictionarySummary) -> Result<()> {
        summary.counts = self.counts(&summary.title)?;
        summary.import_date = self.next_import_date()?;
        self.put(summary)
    }

    /// Now, or the newest install date if the clock is behind it.
    fn next_import_date(&self) -> Result<i64> {
        let latest: Option<i64> =
            self.tx
                .query_row("SELECT MAX(import_date) FROM dictionaries", [], |row| row.get(0))?;
        Ok(unix_millis().max(latest.unwrap_or(0)))
    }

    pub fn commit(self) -> Result<()> {
        Ok(self.tx.commit()?)
    }

    pub fn rollback(self) -> Result<()> {
        Ok(self.tx.rollback()?)
    }
}

pub fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Media, Term};

    fn rows(dictionary: &str, terms: usize) -> DictionaryRows {
        DictionaryRows {
            terms: (0..terms)
                .map(|i| Term::new(dictionary, &format!("w{i:03}"), "", vec![format!("g{i}")]))
                .collect(),
            media: vec![Media {
                dictionary: dictionary.to_string(),
                path: "a.png".to_string(),
                media_type: "image/png".to_string(),
                width: 1,
                height: 1,
                content: vec![0],
            }],
            ..DictionaryRows::default()
        }
    }

    #[test]
    fn test_store_dictionary_commits_with_counts() {
        let mut store = Store::open_in_memory().unwrap();
        let mut saved = Vec::new();
        let summary = store
            .store_dictionary(
                DictionarySummary::new("D", "1", 3),
                &rows("D", 5),
                2,
                |table, n| saved.push((table, n)),
            )
            .unwrap();
        assert_eq!(summary.counts.terms_total, 5);
        assert_eq!(summary.counts.media_total, 1);
        assert!(summary.import_date > 0);
        assert_eq!(
            saved,
            vec![
                (Table::Terms, 2),
                (Table::Terms, 4),
                (Table::Terms, 5),
                (Table::Media, 1)
            ]
        );
        assert_eq!(store.list_dictionaries().unwrap(), vec![summary]);
    }

    #[test]
    fn test_duplicate_title_rejected() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .store_dictionary(DictionarySummary::new("D", "1", 3), &rows("D", 1), 10, |_, _| {})
            .unwrap();
        let err = store
            .store_dictionary(DictionarySummary::new("D", "2", 3), &rows("D", 1), 10, |_, _| {})
            .unwrap_err();
        assert!(matches!(err, DictError::DictionaryAlreadyPresent(ref t) if t == "D"));
        assert_eq!(store.find_dictionary("D").unwrap().unwrap().revision, "1");
    }

    #[test]
    fn test_dropped_transaction_rolls_back() {
        let mut store = Store::open_in_memory().unwrap();
        {
            let mut txn = store.write().unwrap();
            txn.batch_write(&rows("D", 3).terms, 1, |_| {}).unwrap();
            assert_eq!(txn.counts("D").unwrap().terms_total, 3);
        }
        let read = store.read().unwrap();
        assert_eq!(records::counts(&read, "D").unwrap().terms_total, 0);
    }

    #[test]
    fn test_cursor_delete_in_batches() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .store_dictionary(DictionarySummary::new("D", "1", 3), &rows("D", 7), 10, |_, _| {})
            .unwrap();
        store
            .store_dictionary(DictionarySummary::new("E", "1", 3), &rows("E", 2), 10, |_, _| {})
            .unwrap();

        let mut txn = store.write().unwrap();
        let mut seen = Vec::new();
        let removed = txn
            .cursor_delete(Table::Terms, "D", 3, |n| {
                seen.push(n);
                Ok(())
            })
            .unwrap();
        assert_eq!(removed, 7);
        assert_eq!(seen, vec![3, 6, 7]);
        txn.commit().unwrap();

        let read = store.read().unwrap();
        assert_eq!(records::counts(&read, "D").unwrap().terms_total, 0);
        assert_eq!(records::counts(&read, "E").unwrap().terms_total, 2);
    }

    #[test]
    fn test_cursor_delete_can_abort() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .store_dictionary(DictionarySummary::new("D", "1", 3), &rows("D", 4), 10, |_, _| {})
            .unwrap();
        let mut txn = store.write().unwrap();
        let err = txn
            .cursor_delete(Table::Terms, "D", 2, |_| Err(DictError::Cancelled))
            .unwrap_err();
        assert!(matches!(err, DictError::Cancelled));
    }

    #[test]
    fn test_open_file_creates_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict.db");
        let store = Store::open(&path).unwrap();
        assert_eq!(store.schema_version().unwrap(), schema::SCHEMA_VERSION);
        assert!(path.exists());
    }
}
