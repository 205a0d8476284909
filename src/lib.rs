//! Local dictionary engine
//!
//! Imports StarDict and Yomitan dictionary archives into an indexed SQLite
//! store and answers exact lookups, prefix suggestions and did-you-mean
//! queries across every installed dictionary.

pub mod archive;
pub mod cancel;
pub mod engine;
pub mod error;
pub mod import;
pub mod merge;
pub mod model;
pub mod query;
pub mod sanitize;
pub mod stardict;
pub mod store;
pub mod yomitan;

pub use cancel::CancelSignal;
pub use engine::Engine;
pub use error::{DictError, ErrorKind, ImportError, Result};
pub use import::{ImportOptions, ImportProgress, ImportStage};
pub use model::DictionarySummary;
pub use query::{DefinitionSet, DeleteReport, QueryOptions};
