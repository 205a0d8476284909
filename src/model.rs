//! Normalized records shared by both parsers, the store and the query layer

use serde::{Deserialize, Serialize};

/// A headword with its ordered glossary fragments.
///
/// `reading` is never empty: a source without readings stores the expression
/// twice so that the `(dictionary, reading)` index stays total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub dictionary: String,
    pub expression: String,
    pub reading: String,
    pub definition_tags: Vec<String>,
    pub rules: String,
    pub score: i64,
    pub glossary: Vec<String>,
    pub term_tags: Vec<String>,
    pub sequence: i64,
}

impl Term {
    pub fn new(dictionary: &str, expression: &str, reading: &str, glossary: Vec<String>) -> Self {
        let reading = if reading.is_empty() {
            expression
        } else {
            reading
        };
        Self {
            dictionary: dictionary.to_string(),
            expression: expression.to_string(),
            reading: reading.to_string(),
            definition_tags: Vec::new(),
            rules: String::new(),
            score: 0,
            glossary,
            term_tags: Vec::new(),
            sequence: 0,
        }
    }

    pub fn key(&self) -> (&str, &str) {
        (&self.expression, &self.reading)
    }

    /// Folds `other` into `self`: glossaries concatenate, tags union in
    /// first-seen order, score takes the max. `self` keeps its sequence.
    pub fn absorb(&mut self, other: Term) {
        self.glossary.extend(other.glossary);
        union_into(&mut self.definition_tags, other.definition_tags);
        union_into(&mut self.term_tags, other.term_tags);
        self.score = self.score.max(other.score);
        if self.rules.is_empty() {
            self.rules = other.rules;
        } else if !other.rules.is_empty() && other.rules != self.rules {
            let mut rules: Vec<String> = self.rules.split_whitespace().map(str::to_string).collect();
            union_into(
                &mut rules,
                other.rules.split_whitespace().map(str::to_string).collect(),
            );
            self.rules = rules.join(" ");
        }
    }
}

fn union_into(target: &mut Vec<String>, extra: Vec<String>) {
    for tag in extra {
        if !target.contains(&tag) {
            target.push(tag);
        }
    }
}

/// Per-term auxiliary data such as frequency or pitch accent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermMeta {
    pub dictionary: String,
    pub expression: String,
    pub mode: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kanji {
    pub dictionary: String,
    pub character: String,
    pub onyomi: Vec<String>,
    pub kunyomi: Vec<String>,
    pub tags: Vec<String>,
    pub meanings: Vec<String>,
    pub stats: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KanjiMeta {
    pub dictionary: String,
    pub character: String,
    pub mode: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagMeta {
    pub dictionary: String,
    pub name: String,
    pub category: String,
    pub order: i64,
    pub notes: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub dictionary: String,
    pub path: String,
    pub media_type: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryCounts {
    pub terms_total: u64,
    pub term_meta_total: u64,
    pub kanji_total: u64,
    pub kanji_meta_total: u64,
    pub tag_meta_total: u64,
    pub media_total: u64,
}

/// The Dictionary row. Written last during an import; its presence marks the
/// dictionary as committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionarySummary {
    pub title: String,
    pub revision: String,
    pub version: i64,
    pub sequenced: bool,
    /// Unix milliseconds; the install-order key.
    pub import_date: i64,
    pub counts: DictionaryCounts,
    pub author: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub attribution: Option<String>,
    pub source_language: Option<String>,
    pub target_language: Option<String>,
    pub styles: Option<String>,
}

impl DictionarySummary {
    pub fn new(title: &str, revision: &str, version: i64) -> Self {
        Self {
            title: title.to_string(),
            revision: revision.to_string(),
            version,
            sequenced: false,
            import_date: 0,
            counts: DictionaryCounts::default(),
            author: None,
            url: None,
            description: None,
            attribution: None,
            source_language: None,
            target_language: None,
            styles: None,
        }
    }
}

/// All per-entity rows of one dictionary, for callers that already hold them in memory.
#[derive(Debug, Clone, Default)]
pub struct DictionaryRows {
    pub terms: Vec<Term>,
    pub term_meta: Vec<TermMeta>,
    pub kanji: Vec<Kanji>,
    pub kanji_meta: Vec<KanjiMeta>,
    pub tag_meta: Vec<TagMeta>,
    pub media: Vec<Media>,
}

/// A batch of parsed rows travelling from a parser worker to the writer.
#[derive(Debug, Clone)]
pub enum Chunk {
    Terms(Vec<Term>),
    TermMeta(Vec<TermMeta>),
    Kanji(Vec<Kanji>),
    KanjiMeta(Vec<KanjiMeta>),
    TagMeta(Vec<TagMeta>),
    Media(Vec<Media>),
}

impl Chunk {
    pub fn len(&self) -> usize {
        match self {
            Chunk::Terms(rows) => rows.len(),
            Chunk::TermMeta(rows) => rows.len(),
            Chunk::Kanji(rows) => rows.len(),
            Chunk::KanjiMeta(rows) => rows.len(),
            Chunk::TagMeta(rows) => rows.len(),
            Chunk::Media(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_reading_falls_back_to_expression() {
        let term = Term::new("d", "apple", "", vec!["fruit".to_string()]);
        assert_eq!(term.reading, "apple");
    }

    #[test]
    fn test_absorb_merges_fields() {
        let mut a = Term::new("d", "走る", "はしる", vec!["to run".to_string()]);
        a.definition_tags = vec!["v5r".to_string()];
        a.score = 3;
        a.sequence = 7;
        let mut b = Term::new("d", "走る", "はしる", vec!["to dash".to_string()]);
        b.definition_tags = vec!["vi".to_string(), "v5r".to_string()];
        b.term_tags = vec!["P".to_string()];
        b.score = 12;
        b.sequence = 9;

        a.absorb(b);
        assert_eq!(a.glossary, vec!["to run", "to dash"]);
        assert_eq!(a.definition_tags, vec!["v5r", "vi"]);
        assert_eq!(a.term_tags, vec!["P"]);
        assert_eq!(a.score, 12);
        assert_eq!(a.sequence, 7);
    }
}
