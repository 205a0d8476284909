//! Read-side queries over installed dictionaries

pub mod delete;
pub mod suggest;

use rusqlite::Connection;
use serde::Serialize;

use crate::cancel::CancelSignal;
use crate::error::Result;
use crate::model::{DictionarySummary, Term};
use crate::store::TermColumn;
use crate::store::records;

pub use delete::{DeleteReport, delete_dictionary};
pub use suggest::{did_you_mean_candidates, suggest_did_you_mean, suggest_prefix};

/// Separator between glossary fragments, terms and dictionaries.
pub const RULE: &str = "<hr>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub max_suggestions: usize,
    pub did_you_mean_max: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_suggestions: 10,
            did_you_mean_max: 5,
        }
    }
}

/// What one dictionary has to say about a lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DictionaryDefinition {
    pub dictionary: String,
    pub terms: Vec<Term>,
    pub html: String,
}

/// Per-dictionary results in dictionary order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DefinitionSet {
    pub definitions: Vec<DictionaryDefinition>,
}

impl DefinitionSet {
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Blocks separated by a rule and blank lines, or `None` when nothing matched.
    pub fn to_html(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let blocks: Vec<&str> = self.definitions.iter().map(|d| d.html.as_str()).collect();
        Some(blocks.join(&format!("\n\n{RULE}\n\n")))
    }
}

/// A term's glossary; two or more fragments get a rule between each.
pub fn term_html(term: &Term) -> String {
    match term.glossary.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        many => many.join(RULE),
    }
}

fn dictionary_html(terms: &[Term]) -> String {
    terms
        .iter()
        .map(term_html)
        .filter(|html| !html.is_empty())
        .collect::<Vec<_>>()
        .join(RULE)
}

/// Exact match on expression, falling back to the reading index when the
/// expression finds nothing and `reading` differs from it.
fn match_in(
    conn: &Connection,
    dictionary: &str,
    expression: &str,
    reading: Option<&str>,
) -> Result<Vec<Term>> {
    let terms = records::terms_matching(conn, dictionary, TermColumn::Expression, expression)?;
    if !terms.is_empty() {
        return Ok(terms);
    }
    match reading {
        Some(reading) if reading != expression => Ok(records::terms_matching(
            conn,
            dictionary,
            TermColumn::Reading,
            reading,
        )?),
        _ => Ok(terms),
    }
}

/// Restricts installed dictionaries to `names` (every one when `None`) and
/// orders them by `order`, falling back to install order.
pub fn select_dictionaries(
    installed: Vec<DictionarySummary>,
    names: Option<&[String]>,
    order: Option<&[String]>,
) -> Vec<DictionarySummary> {
    let mut selected: Vec<DictionarySummary> = installed
        .into_iter()
        .filter(|d| names.is_none_or(|names| names.contains(&d.title)))
        .collect();
    if let Some(order) = order {
        // stable: titles missing from `order` keep install order at the end
        selected.sort_by_key(|d| {
            order
                .iter()
                .position(|title| *title == d.title)
                .unwrap_or(usize::MAX)
        });
    }
    selected
}

/// Looks `expression` up in each selected dictionary.
pub fn lookup_definitions(
    conn: &Connection,
    expression: &str,
    reading: Option<&str>,
    names: Option<&[String]>,
    order: Option<&[String]>,
    cancel: &CancelSignal,
) -> Result<DefinitionSet> {
    let dictionaries = select_dictionaries(records::dictionaries(conn)?, names, order);
    let mut set = DefinitionSet::default();
    for dictionary in dictionaries {
        cancel.check()?;
        let terms = match_in(conn, &dictionary.title, expression, reading)?;
        if terms.is_empty() {
            continue;
        }
        let html = dictionary_html(&terms);
        set.definitions.push(DictionaryDefinition {
            dictionary: dictionary.title,
            terms,
            html,
        });
    }
    tracing::debug!(
        "Lookup {:?}: {} dictionary match(es)",
        expression,
        set.len()
    );
    Ok(set)
}

/// Definition string across every dictionary in install order.
pub fn lookup(
    conn: &Connection,
    expression: &str,
    reading: Option<&str>,
    cancel: &CancelSignal,
) -> Result<Option<String>> {
    Ok(lookup_definitions(conn, expression, reading, None, None, cancel)?.to_html())
}

pub fn lookup_in_dictionaries(
    conn: &Connection,
    expression: &str,
    names: &[String],
    reading: Option<&str>,
    order: Option<&[String]>,
    cancel: &CancelSignal,
) -> Result<Option<String>> {
    Ok(lookup_definitions(conn, expression, reading, Some(names), order, cancel)?.to_html())
}
