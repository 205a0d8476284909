//! Streaming term merger
//!
//! Terms of one dictionary sharing `(expression, reading)` collapse into one
//! record. Open groups are bounded two ways: a rolling window evicts the
//! oldest group once too many are open, and a soft watermark flushes every
//! open group. Output follows first appearance, and each emitted term gets
//! the next sequence number starting at 1.

use std::collections::{HashMap, VecDeque};

use crate::model::Term;

pub const DEFAULT_WATERMARK: usize = 50_000;
pub const DEFAULT_WINDOW: usize = 1024;

#[derive(Debug)]
pub struct TermMerger {
    window: Option<usize>,
    watermark: usize,
    pending: VecDeque<Term>,
    /// Absolute position of each open group; `pending[0]` sits at `evicted`.
    positions: HashMap<(String, String), usize>,
    evicted: usize,
    next_sequence: i64,
}

impl TermMerger {
    pub fn new(window: Option<usize>, watermark: usize) -> Self {
        Self {
            window: window.map(|w| w.max(1)),
            watermark: watermark.max(1),
            pending: VecDeque::new(),
            positions: HashMap::new(),
            evicted: 0,
            next_sequence: 1,
        }
    }

    /// Adds one term and returns whatever groups were flushed by it.
    pub fn push(&mut self, term: Term) -> Vec<Term> {
        let key = (term.expression.clone(), term.reading.clone());
        if let Some(&pos) = self.positions.get(&key) {
            self.pending[pos - self.evicted].absorb(term);
            return Vec::new();
        }

        self.positions.insert(key, self.evicted + self.pending.len());
        self.pending.push_back(term);

        if self.pending.len() >= self.watermark {
            tracing::debug!("Merge watermark reached, flushing {} group(s)", self.pending.len());
            return self.drain(self.pending.len());
        }
        match self.window {
            Some(window) if self.pending.len() > window => self.drain(self.pending.len() - window),
            _ => Vec::new(),
        }
    }

    pub fn extend(&mut self, terms: impl IntoIterator<Item = Term>) -> Vec<Term> {
        let mut out = Vec::new();
        for term in terms {
            out.extend(self.push(term));
        }
        out
    }

    pub fn finish(mut self) -> Vec<Term> {
        let open = self.pending.len();
        self.drain(open)
    }

    pub fn open_groups(&self) -> usize {
        self.pending.len()
    }

    fn drain(&mut self, count: usize) -> Vec<Term> {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let Some(mut term) = self.pending.pop_front() else {
                break;
            };
            self.positions
                .remove(&(term.expression.clone(), term.reading.clone()));
            self.evicted += 1;
            term.sequence = self.next_sequence;
            self.next_sequence += 1;
            out.push(term);
        }
        out
    }
}

/// Merges a complete term list in one go.
pub fn merge_terms(terms: impl IntoIterator<Item = Term>, window: Option<usize>) -> Vec<Term> {
    let mut merger = TermMerger::new(window, DEFAULT_WATERMARK);
    let mut out = merger.extend(terms);
    out.extend(merger.finish());
    out
}
