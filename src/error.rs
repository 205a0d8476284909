//! Error taxonomy shared by every stage of the engine

use thiserror::Error;

/// Coarse classification of a [`DictError`], stable across variants' payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnrecognizedFormat,
    InvalidMetadata,
    CorruptIndex,
    MalformedRecord,
    DictionaryAlreadyPresent,
    ArchiveRead,
    Decompress,
    Cancelled,
    Storage,
    WorkerPool,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::UnrecognizedFormat => "unrecognized format",
            ErrorKind::InvalidMetadata => "invalid metadata",
            ErrorKind::CorruptIndex => "corrupt index",
            ErrorKind::MalformedRecord => "malformed record",
            ErrorKind::DictionaryAlreadyPresent => "dictionary already present",
            ErrorKind::ArchiveRead => "archive read",
            ErrorKind::Decompress => "decompress",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Storage => "storage",
            ErrorKind::WorkerPool => "worker pool",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum DictError {
    #[error("Unrecognized dictionary format ({entries} archive member(s) inspected)")]
    UnrecognizedFormat { entries: usize },

    #[error("Invalid metadata in {file}: {reason}")]
    InvalidMetadata { file: String, reason: String },

    #[error("Corrupt index {file}: word #{word_number} at byte {position}: {reason}")]
    CorruptIndex {
        file: String,
        word_number: usize,
        position: usize,
        reason: &'static str,
    },

    #[error("Malformed record #{index} in {file}: {reason}")]
    MalformedRecord {
        file: String,
        index: usize,
        reason: String,
    },

    #[error("Dictionary already installed: {0}")]
    DictionaryAlreadyPresent(String),

    #[error("Failed to read archive{}: {}", member_suffix(.file), .reason)]
    ArchiveRead {
        file: Option<String>,
        reason: String,
    },

    #[error("Failed to decompress {file}: {source}")]
    Decompress {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl DictError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DictError::UnrecognizedFormat { .. } => ErrorKind::UnrecognizedFormat,
            DictError::InvalidMetadata { .. } => ErrorKind::InvalidMetadata,
            DictError::CorruptIndex { .. } => ErrorKind::CorruptIndex,
            DictError::MalformedRecord { .. } => ErrorKind::MalformedRecord,
            DictError::DictionaryAlreadyPresent(_) => ErrorKind::DictionaryAlreadyPresent,
            DictError::ArchiveRead { .. } => ErrorKind::ArchiveRead,
            DictError::Decompress { .. } => ErrorKind::Decompress,
            DictError::Cancelled => ErrorKind::Cancelled,
            DictError::Storage(_) => ErrorKind::Storage,
            DictError::WorkerPool(_) => ErrorKind::WorkerPool,
        }
    }

    pub(crate) fn invalid_metadata(file: &str, reason: impl Into<String>) -> Self {
        DictError::InvalidMetadata {
            file: file.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(file: &str, index: usize, reason: impl Into<String>) -> Self {
        DictError::MalformedRecord {
            file: file.to_string(),
            index,
            reason: reason.into(),
        }
    }
}

fn member_suffix(file: &Option<String>) -> String {
    file.as_ref()
        .map(|f| format!(" member {f}"))
        .unwrap_or_default()
}

/// Failure of a whole import, raised at the orchestrator boundary.
#[derive(Debug, Error)]
#[error("Import failed during {context} ({kind}): {source}")]
pub struct ImportError {
    pub kind: ErrorKind,
    pub context: String,
    #[source]
    pub source: DictError,
}

impl ImportError {
    pub(crate) fn new(context: impl Into<String>, source: DictError) -> Self {
        Self {
            kind: source.kind(),
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DictError>;
