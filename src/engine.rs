//! The dictionary engine: one owned store plus import and query settings

use std::path::Path;
use std::sync::Arc;

use crate::cancel::CancelSignal;
use crate::error::{ImportError, Result};
use crate::import::{ImportOptions, ImportProgress, import_archive};
use crate::model::{DictionarySummary, Kanji, KanjiMeta, Media, TagMeta, TermMeta};
use crate::query::{self, DefinitionSet, DeleteReport, QueryOptions};
use crate::store::{Store, records};

#[derive(Debug)]
pub struct Engine {
    store: Store,
    import: ImportOptions,
    query: QueryOptions,
}

impl Engine {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_store(Store::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_store(Store::open_in_memory()?))
    }

    pub fn from_store(store: Store) -> Self {
        Self {
            store,
            import: ImportOptions::default(),
            query: QueryOptions::default(),
        }
    }

    pub fn with_import_options(mut self, options: ImportOptions) -> Self {
        self.import = options;
        self
    }

    pub fn with_query_options(mut self, options: QueryOptions) -> Self {
        self.query = options;
        self
    }

    pub fn import_options(&self) -> &ImportOptions {
        &self.import
    }

    pub fn query_options(&self) -> &QueryOptions {
        &self.query
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Imports a StarDict or Yomitan archive. Nothing of it is visible unless
    /// the whole import succeeds.
    pub fn import_dictionary(
        &mut self,
        bytes: impl Into<Arc<[u8]>>,
        progress: impl FnMut(&ImportProgress),
        cancel: &CancelSignal,
    ) -> std::result::Result<DictionarySummary, ImportError> {
        import_archive(&mut self.store, bytes, &self.import, progress, cancel)
    }

    /// Definition HTML from every installed dictionary in install order, or
    /// `None` when nothing matches.
    pub fn lookup(&self, expression: &str, reading: Option<&str>) -> Result<Option<String>> {
        let read = self.store.read()?;
        query::lookup(&read, expression, reading, &CancelSignal::new())
    }

    pub fn lookup_in_dictionaries(
        &self,
        expression: &str,
        dictionaries: &[String],
        reading: Option<&str>,
        order: Option<&[String]>,
    ) -> Result<Option<String>> {
        let read = self.store.read()?;
        query::lookup_in_dictionaries(
            &read,
            expression,
            dictionaries,
            reading,
            order,
            &CancelSignal::new(),
        )
    }

    /// Structured form of [`Engine::lookup_in_dictionaries`]; `None` selects
    /// every dictionary.
    pub fn lookup_definitions(
        &self,
        expression: &str,
        reading: Option<&str>,
        dictionaries: Option<&[String]>,
        order: Option<&[String]>,
        cancel: &CancelSignal,
    ) -> Result<DefinitionSet> {
        let read = self.store.read()?;
        query::lookup_definitions(&read, expression, reading, dictionaries, order, cancel)
    }

    /// `max` defaults to the configured `max_suggestions`.
    pub fn suggest_prefix(
        &self,
        prefix: &str,
        max: Option<usize>,
        dictionaries: &[String],
    ) -> Result<Vec<String>> {
        let read = self.store.read()?;
        let max = max.unwrap_or(self.query.max_suggestions);
        query::suggest_prefix(&read, prefix, max, dictionaries)
    }

    /// `max` defaults to the configured `did_you_mean_max`.
    pub fn suggest_did_you_mean(
        &self,
        word: &str,
        next_chars: &str,
        max: Option<usize>,
        dictionaries: &[String],
    ) -> Result<Vec<String>> {
        let read = self.store.read()?;
        let max = max.unwrap_or(self.query.did_you_mean_max);
        query::suggest_did_you_mean(&read, word, next_chars, max, dictionaries)
    }

    pub fn list_dictionaries(&self) -> Result<Vec<DictionarySummary>> {
        self.store.list_dictionaries()
    }

    pub fn delete_dictionary(
        &mut self,
        title: &str,
        progress: impl FnMut(u64),
        cancel: &CancelSignal,
    ) -> Result<DeleteReport> {
        query::delete_dictionary(&mut self.store, title, self.import.batch_size, progress, cancel)
    }

    pub fn term_meta(&self, expression: &str, dictionaries: &[String]) -> Result<Vec<TermMeta>> {
        let read = self.store.read()?;
        Ok(records::term_meta(&read, expression, dictionaries)?)
    }

    pub fn kanji(&self, character: &str, dictionaries: &[String]) -> Result<Vec<Kanji>> {
        let read = self.store.read()?;
        Ok(records::kanji(&read, character, dictionaries)?)
    }

    pub fn kanji_meta(&self, character: &str, dictionaries: &[String]) -> Result<Vec<KanjiMeta>> {
        let read = self.store.read()?;
        Ok(records::kanji_meta(&read, character, dictionaries)?)
    }

    pub fn tag_meta(&self, dictionary: &str, name: &str) -> Result<Option<TagMeta>> {
        let read = self.store.read()?;
        Ok(records::tag_meta(&read, dictionary, name)?)
    }

    pub fn media(&self, dictionary: &str, path: &str) -> Result<Option<Media>> {
        let read = self.store.read()?;
        Ok(records::media(&read, dictionary, path)?)
    }
}
