//! Import orchestration
//!
//! `Start -> ReadArchive -> Detect -> ParsePipelined -> MergeStream -> Persist
//! -> Commit`, or `Failed` from any of them. Parsing fans out over a worker
//! pool; everything that touches the store happens on the calling thread
//! inside one write transaction, so a failed or cancelled import leaves
//! nothing behind.

mod pipeline;
pub mod progress;

use std::sync::Arc;

use crate::archive::{Archive, DictionaryFormat, detect_format};
use crate::cancel::CancelSignal;
use crate::error::{DictError, ImportError, Result};
use crate::merge::{DEFAULT_WATERMARK, DEFAULT_WINDOW, TermMerger};
use crate::model::{Chunk, DictionarySummary};
use crate::stardict::{StarDictMembers, StarDictSource};
use crate::store::{DEFAULT_BATCH_SIZE, Store, WriteTxn};
use crate::yomitan::YomitanSource;

pub use progress::{ImportProgress, ImportStage};

use pipeline::run_pipeline;
use progress::ImportState;

/// A parsed dictionary package cut into independent parse jobs.
///
/// Jobs run on worker threads in any order; their chunks are persisted in job
/// index order.
pub trait ChunkSource: Sync {
    fn summary(&self) -> DictionarySummary;
    fn job_count(&self) -> usize;
    fn run_job(&self, index: usize) -> Result<Vec<Chunk>>;
    /// Whether terms sharing a key arrive next to each other, letting the
    /// merger close groups with a rolling window.
    fn clustered_keys(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub workers: usize,
    /// StarDict records per parse job, and rows per Yomitan chunk.
    pub chunk_size: usize,
    pub batch_size: usize,
    pub merge_watermark: usize,
    pub merge_window: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            workers: 3,
            chunk_size: 5000,
            batch_size: DEFAULT_BATCH_SIZE,
            merge_watermark: DEFAULT_WATERMARK,
            merge_window: DEFAULT_WINDOW,
        }
    }
}

/// Imports one dictionary archive into `store`.
pub fn import_archive(
    store: &mut Store,
    bytes: impl Into<Arc<[u8]>>,
    options: &ImportOptions,
    mut progress: impl FnMut(&ImportProgress),
    cancel: &CancelSignal,
) -> std::result::Result<DictionarySummary, ImportError> {
    let mut state = ImportState::new();
    match run(store, bytes.into(), options, &mut progress, cancel, &mut state) {
        Ok(summary) => {
            tracing::info!(
                "Imported {} ({} terms, {} kanji, {} media)",
                summary.title,
                summary.counts.terms_total,
                summary.counts.kanji_total,
                summary.counts.media_total
            );
            Ok(summary)
        }
        Err(e) => {
            let err = state.fail(e);
            tracing::debug!("Import rolled back: {}", err);
            Err(err)
        }
    }
}

fn run(
    store: &mut Store,
    bytes: Arc<[u8]>,
    options: &ImportOptions,
    progress: &mut dyn FnMut(&ImportProgress),
    cancel: &CancelSignal,
    state: &mut ImportState,
) -> Result<DictionarySummary> {
    state.enter(ImportStage::ReadArchive);
    let archive = Archive::open(bytes)?;
    cancel.check()?;

    state.enter(ImportStage::Detect);
    let format = detect_format(archive.names())?;
    tracing::debug!("Detected {} archive with {} member(s)", format, archive.len());
    let source = open_source(store, archive, format, options)?;
    cancel.check()?;

    let mut txn = store.write()?;
    let mut summary = source.summary();
    if txn.find_dictionary(&summary.title)?.is_some() {
        return Err(DictError::DictionaryAlreadyPresent(summary.title));
    }

    let window = source.clustered_keys().then_some(options.merge_window);
    let mut merger = TermMerger::new(window, options.merge_watermark);
    let mut report = ImportProgress {
        stage: ImportStage::ParsePipelined,
        chunks_done: 0,
        chunks_total: source.job_count(),
        rows_written: 0,
    };

    state.enter(ImportStage::ParsePipelined);
    run_pipeline(source.as_ref(), options.workers, cancel, |_, chunks| {
        for chunk in chunks {
            cancel.check()?;
            report.rows_written += persist_chunk(&mut txn, &mut merger, chunk, options, state)?;
        }
        report.chunks_done += 1;
        report.stage = state.stage();
        progress(&report);
        Ok(())
    })?;

    state.enter(ImportStage::Persist);
    let rest = merger.finish();
    report.rows_written += txn.batch_write(&rest, options.batch_size, |_| {})?;
    cancel.check()?;

    state.enter(ImportStage::Commit);
    txn.finish_dictionary(&mut summary)?;
    txn.commit()?;
    report.stage = ImportStage::Commit;
    progress(&report);
    Ok(summary)
}

/// Reads just enough of the archive to know its title, rejects titles that
/// are already installed, then loads the full source.
fn open_source(
    store: &Store,
    archive: Archive,
    format: DictionaryFormat,
    options: &ImportOptions,
) -> Result<Box<dyn ChunkSource>> {
    let reject_installed = |title: &str| -> Result<()> {
        match store.find_dictionary(title)? {
            Some(_) => Err(DictError::DictionaryAlreadyPresent(title.to_string())),
            None => Ok(()),
        }
    };
    let chunk_size = options.chunk_size.max(1);

    match format {
        DictionaryFormat::StarDict => {
            let members = StarDictMembers::locate(&archive)?;
            let ifo = members.read_ifo(&archive)?;
            reject_installed(&members.title())?;
            Ok(Box::new(StarDictSource::load(&archive, &members, ifo, chunk_size)?))
        }
        DictionaryFormat::Yomitan => {
            let index = YomitanSource::read_index(&archive)?;
            reject_installed(&index.title)?;
            Ok(Box::new(YomitanSource::new(archive, index, chunk_size)?))
        }
    }
}

fn persist_chunk(
    txn: &mut WriteTxn<'_>,
    merger: &mut TermMerger,
    chunk: Chunk,
    options: &ImportOptions,
    state: &mut ImportState,
) -> Result<usize> {
    let batch = options.batch_size;
    let written = match chunk {
        Chunk::Terms(terms) => {
            state.enter(ImportStage::MergeStream);
            let flushed = merger.extend(terms);
            if flushed.is_empty() {
                return Ok(0);
            }
            state.enter(ImportStage::Persist);
            txn.batch_write(&flushed, batch, |_| {})?
        }
        Chunk::TermMeta(rows) => txn.batch_write(&rows, batch, |_| {})?,
        Chunk::Kanji(rows) => txn.batch_write(&rows, batch, |_| {})?,
        Chunk::KanjiMeta(rows) => txn.batch_write(&rows, batch, |_| {})?,
        Chunk::TagMeta(rows) => txn.batch_write(&rows, batch, |_| {})?,
        Chunk::Media(rows) => txn.batch_write(&rows, batch, |_| {})?,
    };
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_support::build_zip;
    use crate::error::ErrorKind;

    fn yomitan_zip(title: &str, banks: usize) -> Vec<u8> {
        let index = format!(r#"{{"title":"{title}","revision":"r1","format":3}}"#);
        let names: Vec<String> = (1..=banks).map(|i| format!("term_bank_{i}.json")).collect();
        let bodies: Vec<String> = (1..=banks)
            .map(|i| format!(r#"[["w{i}","r{i}","","",0,["gloss {i}"],{i},""]]"#))
            .collect();
        let mut files: Vec<(&str, &[u8])> = vec![("index.json", index.as_bytes())];
        for (name, body) in names.iter().zip(&bodies) {
            files.push((name.as_str(), body.as_bytes()));
        }
        build_zip(&files)
    }

    #[test]
    fn test_import_reports_progress() {
        let mut store = Store::open_in_memory().unwrap();
        let mut reports = Vec::new();
        let summary = import_archive(
            &mut store,
            yomitan_zip("Demo", 4),
            &ImportOptions::default(),
            |p| reports.push(*p),
            &CancelSignal::new(),
        )
        .unwrap();

        assert_eq!(summary.title, "Demo");
        assert_eq!(summary.counts.terms_total, 4);
        assert!(summary.import_date > 0);
        let last = reports.last().unwrap();
        assert_eq!(last.stage, ImportStage::Commit);
        assert_eq!((last.chunks_done, last.chunks_total), (4, 4));
        assert_eq!(last.rows_written, 4);
        assert_eq!(store.list_dictionaries().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_title_rejected() {
        let mut store = Store::open_in_memory().unwrap();
        let options = ImportOptions::default();
        import_archive(&mut store, yomitan_zip("Demo", 1), &options, |_| {}, &CancelSignal::new())
            .unwrap();
        let err = import_archive(&mut store, yomitan_zip("Demo", 2), &options, |_| {}, &CancelSignal::new())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DictionaryAlreadyPresent);
        assert_eq!(err.context, "detect");
    }

    #[test]
    fn test_not_a_zip() {
        let mut store = Store::open_in_memory().unwrap();
        let err = import_archive(
            &mut store,
            b"definitely not a zip".to_vec(),
            &ImportOptions::default(),
            |_| {},
            &CancelSignal::new(),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArchiveRead);
        assert_eq!(err.context, "read archive");
    }

    #[test]
    fn test_cancel_leaves_nothing() {
        let mut store = Store::open_in_memory().unwrap();
        let cancel = CancelSignal::new();
        let err = import_archive(
            &mut store,
            yomitan_zip("Demo", 10),
            &ImportOptions::default(),
            |_| cancel.cancel(),
            &cancel,
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cancelled);
        assert!(store.list_dictionaries().unwrap().is_empty());
        let terms: i64 = store
            .read()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM terms", [], |row| row.get(0))
            .unwrap();
        assert_eq!(terms, 0);
    }
}
