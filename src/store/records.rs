//! Row mapping between model records and tables

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, ToSql, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::model::{
    DictionaryCounts, DictionarySummary, Kanji, KanjiMeta, Media, TagMeta, Term, TermMeta,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Dictionaries,
    Terms,
    TermMeta,
    Kanji,
    KanjiMeta,
    TagMeta,
    Media,
}

impl Table {
    pub const ALL: [Table; 7] = [
        Table::Dictionaries,
        Table::Terms,
        Table::TermMeta,
        Table::Kanji,
        Table::KanjiMeta,
        Table::TagMeta,
        Table::Media,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Dictionaries => "dictionaries",
            Table::Terms => "terms",
            Table::TermMeta => "term_meta",
            Table::Kanji => "kanji",
            Table::KanjiMeta => "kanji_meta",
            Table::TagMeta => "tag_meta",
            Table::Media => "media",
        }
    }

    /// Column holding the owning dictionary's title.
    pub fn owner_column(self) -> &'static str {
        match self {
            Table::Dictionaries => "title",
            _ => "dictionary",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A model record with a home table and an upsert.
pub trait StoreRecord {
    const TABLE: Table;

    fn put(&self, conn: &Connection) -> rusqlite::Result<()>;
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> rusqlite::Result<String> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

pub(crate) fn json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) const TERM_COLUMNS: &str =
    "dictionary, expression, reading, definition_tags, rules, score, glossary, term_tags, sequence";

pub(crate) fn term_from_row(row: &Row) -> rusqlite::Result<Term> {
    Ok(Term {
        dictionary: row.get(0)?,
        expression: row.get(1)?,
        reading: row.get(2)?,
        definition_tags: json_column(row, 3)?,
        rules: row.get(4)?,
        score: row.get(5)?,
        glossary: json_column(row, 6)?,
        term_tags: json_column(row, 7)?,
        sequence: row.get(8)?,
    })
}

impl StoreRecord for Term {
    const TABLE: Table = Table::Terms;

    /// Merges into an existing row with the same key; the stored sequence wins.
    fn put(&self, conn: &Connection) -> rusqlite::Result<()> {
        let existing = conn
            .prepare_cached(&format!(
                "SELECT {TERM_COLUMNS} FROM terms WHERE dictionary = ?1 AND expression = ?2 AND reading = ?3"
            ))?
            .query_row(
                params![self.dictionary, self.expression, self.reading],
                term_from_row,
            )
            .optional()?;
        let merged;
        let term = match existing {
            Some(mut stored) => {
                stored.absorb(self.clone());
                merged = stored;
                &merged
            }
            None => self,
        };
        conn.prepare_cached(&format!(
            "INSERT OR REPLACE INTO terms ({TERM_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        ))?
        .execute(params![
            term.dictionary,
            term.expression,
            term.reading,
            to_json(&term.definition_tags)?,
            term.rules,
            term.score,
            to_json(&term.glossary)?,
            to_json(&term.term_tags)?,
            term.sequence,
        ])?;
        Ok(())
    }
}

impl StoreRecord for TermMeta {
    const TABLE: Table = Table::TermMeta;

    fn put(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.prepare_cached(
            "INSERT INTO term_meta (dictionary, expression, mode, data) VALUES (?1, ?2, ?3, ?4)",
        )?
        .execute(params![
            self.dictionary,
            self.expression,
            self.mode,
            to_json(&self.data)?
        ])?;
        Ok(())
    }
}

impl StoreRecord for Kanji {
    const TABLE: Table = Table::Kanji;

    fn put(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.prepare_cached(
            "INSERT OR REPLACE INTO kanji (dictionary, character, onyomi, kunyomi, tags, meanings, stats)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?
        .execute(params![
            self.dictionary,
            self.character,
            to_json(&self.onyomi)?,
            to_json(&self.kunyomi)?,
            to_json(&self.tags)?,
            to_json(&self.meanings)?,
            to_json(&self.stats)?,
        ])?;
        Ok(())
    }
}

impl StoreRecord for KanjiMeta {
    const TABLE: Table = Table::KanjiMeta;

    fn put(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.prepare_cached(
            "INSERT INTO kanji_meta (dictionary, character, mode, data) VALUES (?1, ?2, ?3, ?4)",
        )?
        .execute(params![
            self.dictionary,
            self.character,
            self.mode,
            to_json(&self.data)?
        ])?;
        Ok(())
    }
}

impl StoreRecord for TagMeta {
    const TABLE: Table = Table::TagMeta;

    fn put(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.prepare_cached(
            "INSERT OR REPLACE INTO tag_meta (dictionary, name, category, sort_order, notes, score)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?
        .execute(params![
            self.dictionary,
            self.name,
            self.category,
            self.order,
            self.notes,
            self.score
        ])?;
        Ok(())
    }
}

impl StoreRecord for Media {
    const TABLE: Table = Table::Media;

    fn put(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.prepare_cached(
            "INSERT OR REPLACE INTO media (dictionary, path, media_type, width, height, content)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?
        .execute(params![
            self.dictionary,
            self.path,
            self.media_type,
            self.width,
            self.height,
            self.content
        ])?;
        Ok(())
    }
}

const DICTIONARY_COLUMNS: &str = "title, revision, version, sequenced, import_date, \
    terms_total, term_meta_total, kanji_total, kanji_meta_total, tag_meta_total, media_total, \
    author, url, description, attribution, source_language, target_language, styles";

impl StoreRecord for DictionarySummary {
    const TABLE: Table = Table::Dictionaries;

    fn put(&self, conn: &Connection) -> rusqlite::Result<()> {
        let c = &self.counts;
        conn.prepare_cached(&format!(
            "INSERT INTO dictionaries ({DICTIONARY_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
        ))?
        .execute(params![
            self.title,
            self.revision,
            self.version,
            self.sequenced,
            self.import_date,
            c.terms_total as i64,
            c.term_meta_total as i64,
            c.kanji_total as i64,
            c.kanji_meta_total as i64,
            c.tag_meta_total as i64,
            c.media_total as i64,
            self.author,
            self.url,
            self.description,
            self.attribution,
            self.source_language,
            self.target_language,
            self.styles,
        ])?;
        Ok(())
    }
}

fn dictionary_from_row(row: &Row) -> rusqlite::Result<DictionarySummary> {
    Ok(DictionarySummary {
        title: row.get(0)?,
        revision: row.get(1)?,
        version: row.get(2)?,
        sequenced: row.get(3)?,
        import_date: row.get(4)?,
        counts: DictionaryCounts {
            terms_total: row.get::<_, i64>(5)? as u64,
            term_meta_total: row.get::<_, i64>(6)? as u64,
            kanji_total: row.get::<_, i64>(7)? as u64,
            kanji_meta_total: row.get::<_, i64>(8)? as u64,
            tag_meta_total: row.get::<_, i64>(9)? as u64,
            media_total: row.get::<_, i64>(10)? as u64,
        },
        author: row.get(11)?,
        url: row.get(12)?,
        description: row.get(13)?,
        attribution: row.get(14)?,
        source_language: row.get(15)?,
        target_language: row.get(16)?,
        styles: row.get(17)?,
    })
}

/// Installed dictionaries in install order.
pub fn dictionaries(conn: &Connection) -> rusqlite::Result<Vec<DictionarySummary>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {DICTIONARY_COLUMNS} FROM dictionaries ORDER BY import_date, rowid"
    ))?;
    stmt.query_map([], dictionary_from_row)?.collect()
}

pub fn dictionary(conn: &Connection, title: &str) -> rusqlite::Result<Option<DictionarySummary>> {
    conn.prepare_cached(&format!(
        "SELECT {DICTIONARY_COLUMNS} FROM dictionaries WHERE title = ?1"
    ))?
    .query_row([title], dictionary_from_row)
    .optional()
}

/// Which term column an exact match runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermColumn {
    Expression,
    Reading,
}

impl TermColumn {
    pub(crate) fn name(self) -> &'static str {
        match self {
            TermColumn::Expression => "expression",
            TermColumn::Reading => "reading",
        }
    }
}

/// Exact matches within one dictionary, in sequence order.
pub fn terms_matching(
    conn: &Connection,
    dictionary: &str,
    column: TermColumn,
    value: &str,
) -> rusqlite::Result<Vec<Term>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {TERM_COLUMNS} FROM terms WHERE dictionary = ?1 AND {} = ?2 ORDER BY sequence, rowid",
        column.name()
    ))?;
    stmt.query_map([dictionary, value], term_from_row)?.collect()
}

/// `?n, ?n+1, ...` for an `IN (...)` list.
pub(crate) fn placeholders(count: usize, first: usize) -> String {
    (first..first + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The subset of `candidates` present as an expression in any of `dictionaries`
/// (all dictionaries when the list is empty).
pub fn existing_expressions(
    conn: &Connection,
    candidates: &[String],
    dictionaries: &[String],
) -> rusqlite::Result<Vec<String>> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    let mut sql = format!(
        "SELECT DISTINCT expression FROM terms WHERE expression IN ({})",
        placeholders(candidates.len(), 1)
    );
    if !dictionaries.is_empty() {
        sql.push_str(&format!(
            " AND dictionary IN ({})",
            placeholders(dictionaries.len(), candidates.len() + 1)
        ));
    }
    let values: Vec<&dyn ToSql> = candidates
        .iter()
        .chain(dictionaries)
        .map(|s| s as &dyn ToSql)
        .collect();
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_map(values.as_slice(), |row| row.get(0))?.collect()
}

fn dictionary_filter(dictionaries: &[String], first: usize) -> String {
    if dictionaries.is_empty() {
        String::new()
    } else {
        format!(" AND dictionary IN ({})", placeholders(dictionaries.len(), first))
    }
}

pub fn term_meta(
    conn: &Connection,
    expression: &str,
    dictionaries: &[String],
) -> rusqlite::Result<Vec<TermMeta>> {
    let sql = format!(
        "SELECT dictionary, expression, mode, data FROM term_meta WHERE expression = ?1{} ORDER BY id",
        dictionary_filter(dictionaries, 2)
    );
    let values: Vec<&dyn ToSql> = std::iter::once(&expression as &dyn ToSql)
        .chain(dictionaries.iter().map(|d| d as &dyn ToSql))
        .collect();
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_map(values.as_slice(), |row| {
        Ok(TermMeta {
            dictionary: row.get(0)?,
            expression: row.get(1)?,
            mode: row.get(2)?,
            data: json_column(row, 3)?,
        })
    })?
    .collect()
}

pub fn kanji(
    conn: &Connection,
    character: &str,
    dictionaries: &[String],
) -> rusqlite::Result<Vec<Kanji>> {
    let sql = format!(
        "SELECT dictionary, character, onyomi, kunyomi, tags, meanings, stats FROM kanji
         WHERE character = ?1{} ORDER BY rowid",
        dictionary_filter(dictionaries, 2)
    );
    let values: Vec<&dyn ToSql> = std::iter::once(&character as &dyn ToSql)
        .chain(dictionaries.iter().map(|d| d as &dyn ToSql))
        .collect();
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_map(values.as_slice(), |row| {
        Ok(Kanji {
            dictionary: row.get(0)?,
            character: row.get(1)?,
            onyomi: json_column(row, 2)?,
            kunyomi: json_column(row, 3)?,
            tags: json_column(row, 4)?,
            meanings: json_column(row, 5)?,
            stats: json_column(row, 6)?,
        })
    })?
    .collect()
}

pub fn kanji_meta(
    conn: &Connection,
    character: &str,
    dictionaries: &[String],
) -> rusqlite::Result<Vec<KanjiMeta>> {
    let sql = format!(
        "SELECT dictionary, character, mode, data FROM kanji_meta WHERE character = ?1{} ORDER BY id",
        dictionary_filter(dictionaries, 2)
    );
    let values: Vec<&dyn ToSql> = std::iter::once(&character as &dyn ToSql)
        .chain(dictionaries.iter().map(|d| d as &dyn ToSql))
        .collect();
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_map(values.as_slice(), |row| {
        Ok(KanjiMeta {
            dictionary: row.get(0)?,
            character: row.get(1)?,
            mode: row.get(2)?,
            data: json_column(row, 3)?,
        })
    })?
    .collect()
}

pub fn tag_meta(conn: &Connection, dictionary: &str, name: &str) -> rusqlite::Result<Option<TagMeta>> {
    conn.prepare_cached(
        "SELECT dictionary, name, category, sort_order, notes, score FROM tag_meta
         WHERE dictionary = ?1 AND name = ?2",
    )?
    .query_row([dictionary, name], |row| {
        Ok(TagMeta {
            dictionary: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            order: row.get(3)?,
            notes: row.get(4)?,
            score: row.get(5)?,
        })
    })
    .optional()
}

pub fn media(conn: &Connection, dictionary: &str, path: &str) -> rusqlite::Result<Option<Media>> {
    conn.prepare_cached(
        "SELECT dictionary, path, media_type, width, height, content FROM media
         WHERE dictionary = ?1 AND path = ?2",
    )?
    .query_row([dictionary, path], |row| {
        Ok(Media {
            dictionary: row.get(0)?,
            path: row.get(1)?,
            media_type: row.get(2)?,
            width: row.get(3)?,
            height: row.get(4)?,
            content: row.get(5)?,
        })
    })
    .optional()
}

/// Rows per entity table currently owned by `dictionary`.
pub fn counts(conn: &Connection, dictionary: &str) -> rusqlite::Result<DictionaryCounts> {
    let count = |table: Table| -> rusqlite::Result<u64> {
        conn.prepare_cached(&format!(
            "SELECT COUNT(*) FROM {} WHERE dictionary = ?1",
            table.name()
        ))?
        .query_row([dictionary], |row| row.get::<_, i64>(0))
        .map(|n| n as u64)
    };
    Ok(DictionaryCounts {
        terms_total: count(Table::Terms)?,
        term_meta_total: count(Table::TermMeta)?,
        kanji_total: count(Table::Kanji)?,
        kanji_meta_total: count(Table::KanjiMeta)?,
        tag_meta_total: count(Table::TagMeta)?,
        media_total: count(Table::Media)?,
    })
}
