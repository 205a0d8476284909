//! Import stages and progress reports

use std::fmt;

use crate::error::{DictError, ImportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Start,
    ReadArchive,
    Detect,
    ParsePipelined,
    MergeStream,
    Persist,
    Commit,
    Failed,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportStage::Start => "start",
            ImportStage::ReadArchive => "read archive",
            ImportStage::Detect => "detect",
            ImportStage::ParsePipelined => "parse",
            ImportStage::MergeStream => "merge",
            ImportStage::Persist => "persist",
            ImportStage::Commit => "commit",
            ImportStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Snapshot handed to the caller's progress callback after each parsed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportProgress {
    pub stage: ImportStage,
    pub chunks_done: usize,
    pub chunks_total: usize,
    pub rows_written: usize,
}

/// Tracks the current stage of one import.
#[derive(Debug)]
pub(crate) struct ImportState {
    stage: ImportStage,
}

impl ImportState {
    pub fn new() -> Self {
        Self {
            stage: ImportStage::Start,
        }
    }

    pub fn stage(&self) -> ImportStage {
        self.stage
    }

    pub fn enter(&mut self, next: ImportStage) {
        if next != self.stage {
            tracing::debug!("Import: {} -> {}", self.stage, next);
            self.stage = next;
        }
    }

    /// Moves to `Failed`, wrapping `err` with the stage it happened in.
    pub fn fail(&mut self, err: DictError) -> ImportError {
        let at = self.stage;
        self.enter(ImportStage::Failed);
        ImportError::new(at.to_string(), err)
    }
}
