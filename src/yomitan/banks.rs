//! Positional-array bank records

use serde_json::Value;

use crate::error::{DictError, Result};
use crate::model::{Kanji, KanjiMeta, TagMeta, Term, TermMeta};
use crate::sanitize::sanitize;

use super::structured::{MediaRef, render_glossary_item};

/// Bank families, in the order they are ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BankKind {
    Tag,
    Term,
    TermMeta,
    Kanji,
    KanjiMeta,
}

impl BankKind {
    /// Classifies a member by its file name, e.g. `term_meta_bank_3.json`.
    pub fn classify(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(".json")?;
        let (prefix, number) = stem.rsplit_once('_')?;
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        match prefix {
            "tag_bank" => Some(BankKind::Tag),
            "term_bank" => Some(BankKind::Term),
            "term_meta_bank" => Some(BankKind::TermMeta),
            "kanji_bank" => Some(BankKind::Kanji),
            "kanji_meta_bank" => Some(BankKind::KanjiMeta),
            _ => None,
        }
    }
}

/// Splits a bank file into its records.
pub fn parse_bank(file: &str, bytes: &[u8]) -> Result<Vec<Value>> {
    serde_json::from_slice(bytes).map_err(|e| DictError::malformed(file, 0, e.to_string()))
}

/// Decodes a term row. Version 1 rows carry the glossary inline from field 5.
pub fn term_row(
    dictionary: &str,
    file: &str,
    index: usize,
    row: &Value,
    version: i64,
    media: &mut Vec<MediaRef>,
) -> Result<Term> {
    let fields = fields(file, index, row)?;
    let expression = string_at(fields, 0)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DictError::malformed(file, index, "expression is missing"))?;
    let reading = string_at(fields, 1).unwrap_or_default();

    let glossary_items: Vec<&Value> = if version >= 2 {
        match fields.get(5) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(_) => return Err(DictError::malformed(file, index, "glossary is not an array")),
        }
    } else {
        fields.iter().skip(5).collect()
    };

    let mut glossary = Vec::with_capacity(glossary_items.len());
    for item in glossary_items {
        match render_glossary_item(item, media) {
            Some(html) => glossary.push(sanitize(&html)),
            None => tracing::warn!("{} #{}: unsupported glossary element skipped", file, index),
        }
    }

    let mut term = Term::new(dictionary, expression, reading, glossary);
    term.definition_tags = tags_at(fields, 2);
    term.rules = string_at(fields, 3).unwrap_or_default().to_string();
    term.score = int_at(fields, 4);
    if version >= 2 {
        term.sequence = int_at(fields, 6);
        term.term_tags = tags_at(fields, 7);
    } else {
        term.sequence = 1;
    }
    Ok(term)
}

/// `[expression, mode, data]`
pub fn term_meta_row(dictionary: &str, file: &str, index: usize, row: &Value) -> Result<TermMeta> {
    let fields = fields(file, index, row)?;
    let expression = required_string(file, index, fields, 0, "expression")?;
    let mode = required_string(file, index, fields, 1, "mode")?;
    Ok(TermMeta {
        dictionary: dictionary.to_string(),
        expression: expression.to_string(),
        mode: mode.to_string(),
        data: fields.get(2).cloned().unwrap_or(Value::Null),
    })
}

/// `[character, onyomi, kunyomi, tags, meanings, stats]`
pub fn kanji_row(dictionary: &str, file: &str, index: usize, row: &Value) -> Result<Kanji> {
    let fields = fields(file, index, row)?;
    let character = required_string(file, index, fields, 0, "character")?;
    Ok(Kanji {
        dictionary: dictionary.to_string(),
        character: character.to_string(),
        onyomi: tags_at(fields, 1),
        kunyomi: tags_at(fields, 2),
        tags: tags_at(fields, 3),
        meanings: match fields.get(4) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        },
        stats: fields.get(5).cloned().unwrap_or(Value::Null),
    })
}

/// `[character, mode, data]`
pub fn kanji_meta_row(dictionary: &str, file: &str, index: usize, row: &Value) -> Result<KanjiMeta> {
    let fields = fields(file, index, row)?;
    let character = required_string(file, index, fields, 0, "character")?;
    let mode = required_string(file, index, fields, 1, "mode")?;
    Ok(KanjiMeta {
        dictionary: dictionary.to_string(),
        character: character.to_string(),
        mode: mode.to_string(),
        data: fields.get(2).cloned().unwrap_or(Value::Null),
    })
}

/// `[name, category, order, notes, score]`
pub fn tag_row(dictionary: &str, file: &str, index: usize, row: &Value) -> Result<TagMeta> {
    let fields = fields(file, index, row)?;
    let name = required_string(file, index, fields, 0, "name")?;
    Ok(TagMeta {
        dictionary: dictionary.to_string(),
        name: name.to_string(),
        category: string_at(fields, 1).unwrap_or_default().to_string(),
        order: int_at(fields, 2),
        notes: string_at(fields, 3).unwrap_or_default().to_string(),
        score: int_at(fields, 4),
    })
}

fn fields<'a>(file: &str, index: usize, row: &'a Value) -> Result<&'a [Value]> {
    row.as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| DictError::malformed(file, index, "record is not an array"))
}

fn string_at(fields: &[Value], i: usize) -> Option<&str> {
    fields.get(i).and_then(Value::as_str)
}

fn required_string<'a>(
    file: &str,
    index: usize,
    fields: &'a [Value],
    i: usize,
    what: &str,
) -> Result<&'a str> {
    string_at(fields, i).ok_or_else(|| DictError::malformed(file, index, format!("{what} is missing")))
}

fn int_at(fields: &[Value], i: usize) -> i64 {
    match fields.get(i) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Tags come as a space-separated string, an array of strings, or null.
fn tags_at(fields: &[Value], i: usize) -> Vec<String> {
    match fields.get(i) {
        Some(Value::String(s)) => s.split_whitespace().map(str::to_string).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .flat_map(str::split_whitespace)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
