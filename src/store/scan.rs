//! Cursor-style range scans over the term indexes
//!
//! Pages are fetched with keyset pagination: each page resumes strictly after
//! the ordering key of the last row seen, so no statement stays open between
//! calls to `next()`.

use std::collections::VecDeque;

use rusqlite::{Connection, ToSql};

use crate::model::Term;

use super::records::{TERM_COLUMNS, term_from_row};

const DEFAULT_PAGE: usize = 256;

/// Term indexes a range can be scanned over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermIndex {
    /// `(dictionary, expression)`
    DictionaryExpression,
    /// `(dictionary, reading)`
    DictionaryReading,
    /// `(expression)` across every dictionary
    Expression,
}

impl TermIndex {
    fn key(self) -> &'static str {
        match self {
            TermIndex::DictionaryExpression | TermIndex::Expression => "expression",
            TermIndex::DictionaryReading => "reading",
        }
    }

    /// Total order used for pagination; unique per row.
    fn order(self) -> &'static [&'static str] {
        match self {
            TermIndex::DictionaryExpression => &["expression", "reading"],
            TermIndex::DictionaryReading => &["reading", "expression"],
            TermIndex::Expression => &["expression", "dictionary", "reading"],
        }
    }

    fn scoped(self) -> bool {
        !matches!(self, TermIndex::Expression)
    }

    fn cursor_of(self, term: &Term) -> Vec<String> {
        self.order()
            .iter()
            .map(|column| match *column {
                "expression" => term.expression.clone(),
                "reading" => term.reading.clone(),
                _ => term.dictionary.clone(),
            })
            .collect()
    }
}

/// Half-open key range `[lower, upper)` compared bytewise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    pub lower: String,
    pub upper: String,
}

impl KeyRange {
    pub fn new(lower: impl Into<String>, upper: impl Into<String>) -> Self {
        Self {
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    /// Every key beginning with `prefix`.
    pub fn prefix(prefix: &str) -> Self {
        let mut upper = prefix.to_string();
        upper.push(char::MAX);
        Self::new(prefix, upper)
    }
}

pub struct RangeScan<'c> {
    conn: &'c Connection,
    index: TermIndex,
    dictionary: Option<String>,
    range: KeyRange,
    cursor: Option<Vec<String>>,
    page_size: usize,
    buffer: VecDeque<Term>,
    exhausted: bool,
}

impl<'c> RangeScan<'c> {
    /// `dictionary` is required by the scoped indexes and ignored by [`TermIndex::Expression`].
    pub fn new(
        conn: &'c Connection,
        index: TermIndex,
        dictionary: Option<&str>,
        range: KeyRange,
    ) -> Self {
        Self {
            conn,
            index,
            dictionary: dictionary.filter(|_| index.scoped()).map(str::to_string),
            range,
            cursor: None,
            page_size: DEFAULT_PAGE,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn fetch_page(&mut self) -> rusqlite::Result<()> {
        let key = self.index.key();
        let order = self.index.order();
        let mut sql = format!("SELECT {TERM_COLUMNS} FROM terms WHERE {key} >= ?1 AND {key} < ?2");
        let mut values: Vec<&dyn ToSql> = vec![&self.range.lower, &self.range.upper];

        if let Some(dictionary) = &self.dictionary {
            values.push(dictionary);
            sql.push_str(&format!(" AND dictionary = ?{}", values.len()));
        }
        if let Some(cursor) = &self.cursor {
            let first = values.len() + 1;
            values.extend(cursor.iter().map(|v| v as &dyn ToSql));
            let params: Vec<String> = (first..first + cursor.len()).map(|i| format!("?{i}")).collect();
            sql.push_str(&format!(" AND ({}) > ({})", order.join(", "), params.join(", ")));
        }
        let limit = self.page_size as i64;
        values.push(&limit);
        sql.push_str(&format!(" ORDER BY {} LIMIT ?{}", order.join(", "), values.len()));

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let page: Vec<Term> = stmt
            .query_map(values.as_slice(), term_from_row)?
            .collect::<rusqlite::Result<_>>()?;

        if page.len() < self.page_size {
            self.exhausted = true;
        }
        if let Some(last) = page.last() {
            self.cursor = Some(self.index.cursor_of(last));
        }
        self.buffer.extend(page);
        Ok(())
    }
}

impl Iterator for RangeScan<'_> {
    type Item = rusqlite::Result<Term>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(e) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}
