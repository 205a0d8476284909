//! Versioned schema, tracked through `PRAGMA user_version`

use rusqlite::Connection;

pub const SCHEMA_VERSION: i64 = 7;

/// `(version, ddl)` steps; every statement is `IF NOT EXISTS`.
const MIGRATIONS: &[(i64, &str)] = &[
    (
        2,
        "CREATE TABLE IF NOT EXISTS dictionaries (
            title TEXT PRIMARY KEY NOT NULL,
            revision TEXT NOT NULL,
            version INTEGER NOT NULL,
            sequenced INTEGER NOT NULL DEFAULT 0,
            import_date INTEGER NOT NULL,
            terms_total INTEGER NOT NULL DEFAULT 0,
            term_meta_total INTEGER NOT NULL DEFAULT 0,
            kanji_total INTEGER NOT NULL DEFAULT 0,
            kanji_meta_total INTEGER NOT NULL DEFAULT 0,
            tag_meta_total INTEGER NOT NULL DEFAULT 0,
            media_total INTEGER NOT NULL DEFAULT 0,
            author TEXT,
            url TEXT,
            description TEXT,
            attribution TEXT,
            source_language TEXT,
            target_language TEXT,
            styles TEXT
        );
        CREATE TABLE IF NOT EXISTS terms (
            dictionary TEXT NOT NULL,
            expression TEXT NOT NULL,
            reading TEXT NOT NULL,
            definition_tags TEXT NOT NULL,
            rules TEXT NOT NULL,
            score INTEGER NOT NULL,
            glossary TEXT NOT NULL,
            term_tags TEXT NOT NULL,
            sequence INTEGER NOT NULL,
            PRIMARY KEY (dictionary, expression, reading)
        );
        CREATE INDEX IF NOT EXISTS terms_dictionary_expression ON terms (dictionary, expression);
        CREATE TABLE IF NOT EXISTS kanji (
            dictionary TEXT NOT NULL,
            character TEXT NOT NULL,
            onyomi TEXT NOT NULL,
            kunyomi TEXT NOT NULL,
            tags TEXT NOT NULL,
            meanings TEXT NOT NULL,
            stats TEXT NOT NULL,
            PRIMARY KEY (dictionary, character)
        );
        CREATE TABLE IF NOT EXISTS media (
            dictionary TEXT NOT NULL,
            path TEXT NOT NULL,
            media_type TEXT NOT NULL,
            width INTEGER NOT NULL,
            height INTEGER NOT NULL,
            content BLOB NOT NULL,
            PRIMARY KEY (dictionary, path)
        );",
    ),
    (
        3,
        "CREATE INDEX IF NOT EXISTS terms_dictionary_reading ON terms (dictionary, reading);
        CREATE TABLE IF NOT EXISTS term_meta (
            id INTEGER PRIMARY KEY,
            dictionary TEXT NOT NULL,
            expression TEXT NOT NULL,
            mode TEXT NOT NULL,
            data TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS term_meta_key ON term_meta (dictionary, expression, mode);
        CREATE TABLE IF NOT EXISTS kanji_meta (
            id INTEGER PRIMARY KEY,
            dictionary TEXT NOT NULL,
            character TEXT NOT NULL,
            mode TEXT NOT NULL,
            data TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS kanji_meta_key ON kanji_meta (dictionary, character, mode);
        CREATE TABLE IF NOT EXISTS tag_meta (
            dictionary TEXT NOT NULL,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            sort_order INTEGER NOT NULL,
            notes TEXT NOT NULL,
            score INTEGER NOT NULL,
            PRIMARY KEY (dictionary, name)
        );",
    ),
    (
        7,
        "CREATE INDEX IF NOT EXISTS terms_expression ON terms (expression);",
    ),
];

pub fn user_version(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

/// Brings the schema up to [`SCHEMA_VERSION`]. Returns the version found on open.
pub fn migrate(conn: &Connection) -> rusqlite::Result<i64> {
    let found = user_version(conn)?;
    for &(version, sql) in MIGRATIONS {
        if version <= found {
            continue;
        }
        tracing::debug!("Migrating dictionary store to schema v{}", version);
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
    }
    Ok(found)
}
