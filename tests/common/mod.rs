//! Archive builders shared by the integration tests

#![allow(dead_code)]

use std::io::{Cursor, Write};

use dictengine::{CancelSignal, DictionarySummary, Engine, ImportError};
use flate2::Compression;
use flate2::write::GzEncoder;
use zip::write::SimpleFileOptions;

pub fn build_zip(files: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// One `.idx` record with 32-bit big-endian offset and size.
pub fn idx_record(word: &str, offset: u32, size: u32) -> Vec<u8> {
    let mut record = word.as_bytes().to_vec();
    record.push(0);
    record.extend_from_slice(&offset.to_be_bytes());
    record.extend_from_slice(&size.to_be_bytes());
    record
}

/// One `.syn` record pointing at a main-index entry.
pub fn syn_record(word: &str, main_index: u32) -> Vec<u8> {
    let mut record = word.as_bytes().to_vec();
    record.push(0);
    record.extend_from_slice(&main_index.to_be_bytes());
    record
}

pub struct StarDictFixture {
    pub name: String,
    pub idx: Vec<u8>,
    pub dict: Vec<u8>,
    pub syn: Option<Vec<u8>>,
    pub wordcount: usize,
    pub gzip_idx: bool,
    pub dictzip: bool,
}

impl StarDictFixture {
    /// `entries` must already be in StarDict order.
    pub fn new(name: &str, entries: &[(&str, &str)]) -> Self {
        let mut idx = Vec::new();
        let mut dict = Vec::new();
        for (word, article) in entries {
            idx.extend(idx_record(word, dict.len() as u32, article.len() as u32));
            dict.extend_from_slice(article.as_bytes());
        }
        Self {
            name: name.to_string(),
            idx,
            dict,
            syn: None,
            wordcount: entries.len(),
            gzip_idx: false,
            dictzip: false,
        }
    }

    pub fn with_synonyms(mut self, synonyms: &[(&str, u32)]) -> Self {
        self.syn = Some(synonyms.iter().flat_map(|(w, i)| syn_record(w, *i)).collect());
        self
    }

    pub fn gzip_idx(mut self) -> Self {
        self.gzip_idx = true;
        self
    }

    pub fn dictzip(mut self) -> Self {
        self.dictzip = true;
        self
    }

    pub fn ifo(&self) -> String {
        format!(
            "StarDict's dict ifo file\nversion=2.4.2\nbookname={}\nwordcount={}\nidxfilesize={}\nsametypesequence=h\n",
            self.name,
            self.wordcount,
            self.idx.len()
        )
    }

    pub fn build(&self) -> Vec<u8> {
        let name = &self.name;
        let mut files = vec![(format!("{name}.ifo"), self.ifo().into_bytes())];
        if self.gzip_idx {
            files.push((format!("{name}.idx.gz"), gzip(&self.idx)));
        } else {
            files.push((format!("{name}.idx"), self.idx.clone()));
        }
        if self.dictzip {
            files.push((format!("{name}.dict.dz"), gzip(&self.dict)));
        } else {
            files.push((format!("{name}.dict"), self.dict.clone()));
        }
        if let Some(syn) = &self.syn {
            files.push((format!("{name}.syn"), syn.clone()));
        }
        let files: Vec<(&str, Vec<u8>)> = files
            .iter()
            .map(|(n, d)| (n.as_str(), d.clone()))
            .collect();
        build_zip(&files)
    }
}

pub fn yomitan_index(title: &str, version: u32) -> Vec<u8> {
    format!(r#"{{"title":"{title}","revision":"{title}-1","format":{version},"sequenced":true}}"#)
        .into_bytes()
}

pub fn import(engine: &mut Engine, archive: Vec<u8>) -> Result<DictionarySummary, ImportError> {
    engine.import_dictionary(archive, |_| {}, &CancelSignal::new())
}

/// Rows in `table` that belong to `dictionary`.
pub fn rows_owned(engine: &Engine, table: &str, dictionary: &str) -> i64 {
    let column = if table == "dictionaries" { "title" } else { "dictionary" };
    engine
        .store()
        .read()
        .unwrap()
        .query_row(
            &format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1"),
            [dictionary],
            |row| row.get(0),
        )
        .unwrap()
}

pub const ALL_TABLES: [&str; 7] = [
    "dictionaries",
    "terms",
    "term_meta",
    "kanji",
    "kanji_meta",
    "tag_meta",
    "media",
];
