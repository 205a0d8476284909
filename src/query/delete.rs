//! Dictionary removal

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::cancel::CancelSignal;
use crate::error::Result;
use crate::store::{Store, Table};

/// Minimum spacing between progress reports.
const REPORT_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub dictionary_removed: bool,
    /// Rows removed per entity table, in deletion order.
    pub rows: Vec<(String, u64)>,
}

impl DeleteReport {
    pub fn total_rows(&self) -> u64 {
        self.rows.iter().map(|(_, n)| n).sum()
    }

    pub fn rows_in(&self, table: Table) -> u64 {
        self.rows
            .iter()
            .find(|(name, _)| name == table.name())
            .map_or(0, |(_, n)| *n)
    }
}

/// Removes the Dictionary row and every row it owns in one write transaction.
///
/// `progress` receives the cumulative number of deleted entity rows, at most
/// once per two seconds while deleting and once more at the end. A cancelled
/// or failed delete rolls back and leaves the dictionary installed.
pub fn delete_dictionary(
    store: &mut Store,
    title: &str,
    batch_size: usize,
    mut progress: impl FnMut(u64),
    cancel: &CancelSignal,
) -> Result<DeleteReport> {
    let mut txn = store.write()?;
    let mut report = DeleteReport {
        dictionary_removed: txn.execute("DELETE FROM dictionaries WHERE title = ?1", [title])? > 0,
        rows: Vec::new(),
    };

    let mut deleted = 0u64;
    let mut last_report = Instant::now();
    for table in Table::ALL.into_iter().filter(|t| *t != Table::Dictionaries) {
        cancel.check()?;
        let base = deleted;
        let removed = txn.cursor_delete(table, title, batch_size, |so_far| {
            cancel.check()?;
            if last_report.elapsed() >= REPORT_INTERVAL {
                progress(base + so_far);
                last_report = Instant::now();
            }
            Ok(())
        })?;
        deleted += removed;
        report.rows.push((table.name().to_string(), removed));
    }

    txn.commit()?;
    progress(deleted);
    tracing::info!("Deleted {} ({} row(s))", title, deleted);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DictionarySummary, Media, Term};
    use crate::store::StoreRecord;

    fn installed(title: &str, terms: usize) -> Store {
        let mut store = Store::open_in_memory().unwrap();
        let txn = store.write().unwrap();
        for i in 0..terms {
            Term::new(title, &format!("w{i}"), "", vec![]).put(&txn).unwrap();
        }
        Media {
            dictionary: title.to_string(),
            path: "a.png".to_string(),
            media_type: "image/png".to_string(),
            width: 1,
            height: 1,
            content: vec![0],
        }
        .put(&txn)
        .unwrap();
        DictionarySummary::new(title, "1", 3).put(&txn).unwrap();
        txn.commit().unwrap();
        store
    }

    #[test]
    fn test_delete_everything() {
        let mut store = installed("D", 25);
        let mut reports = Vec::new();
        let report =
            delete_dictionary(&mut store, "D", 10, |n| reports.push(n), &CancelSignal::new())
                .unwrap();
        assert!(report.dictionary_removed);
        assert_eq!(report.rows_in(Table::Terms), 25);
        assert_eq!(report.rows_in(Table::Media), 1);
        assert_eq!(report.total_rows(), 26);
        assert_eq!(reports.last(), Some(&26));
        assert!(store.list_dictionaries().unwrap().is_empty());
        let counts = store.read().unwrap().query_row(
            "SELECT (SELECT COUNT(*) FROM terms) + (SELECT COUNT(*) FROM media)",
            [],
            |row| row.get::<_, i64>(0),
        );
        assert_eq!(counts.unwrap(), 0);
    }

    #[test]
    fn test_delete_unknown() {
        let mut store = installed("D", 1);
        let report = delete_dictionary(&mut store, "E", 10, |_| {}, &CancelSignal::new()).unwrap();
        assert!(!report.dictionary_removed);
        assert_eq!(report.total_rows(), 0);
        assert_eq!(store.list_dictionaries().unwrap().len(), 1);
    }

    #[test]
    fn test_cancelled_delete_rolls_back() {
        let mut store = installed("D", 5);
        let cancel = CancelSignal::new();
        cancel.cancel();
        assert!(delete_dictionary(&mut store, "D", 2, |_| {}, &cancel).is_err());
        assert_eq!(store.list_dictionaries().unwrap().len(), 1);
    }
}
