//! StarDict package parser
//!
//! A package is an `.ifo` metadata file, an `.idx` word table (optionally
//! gzip-compressed), a `.dict` payload (plain, gzip or dictzip) and optionally
//! a `.syn` synonym table and a `.res.zip` resource archive.

pub mod idx;
pub mod ifo;
pub mod payload;

use std::ops::Range;

use crate::archive::{Archive, basename};
use crate::error::{DictError, Result};
use crate::import::ChunkSource;
use crate::model::{Chunk, DictionarySummary, Term};

use idx::{IdxEntry, SynEntry, parse_idx, parse_syn};
use ifo::{Ifo, parse_ifo};
use payload::{inflate_member, render_article};

/// Archive members making up one StarDict package.
#[derive(Debug, Clone, PartialEq)]
pub struct StarDictMembers {
    pub ifo: String,
    pub idx: String,
    pub dict: String,
    pub syn: Option<String>,
    pub resources: Option<String>,
}

impl StarDictMembers {
    pub fn locate(archive: &Archive) -> Result<Self> {
        let not_found = || DictError::UnrecognizedFormat {
            entries: archive.len(),
        };
        let ifo = archive
            .find(|n| n.ends_with(".ifo"))
            .ok_or_else(not_found)?
            .to_string();
        let stem = basename(&ifo).trim_end_matches(".ifo").to_string();

        let pick = |suffixes: &[&str]| -> Option<String> {
            let matches = |n: &str| suffixes.iter().any(|s| n.ends_with(s));
            archive
                .find(|n| matches(n) && n.starts_with(stem.as_str()))
                .or_else(|| archive.find(|n| matches(n)))
                .map(str::to_string)
        };

        Ok(Self {
            idx: pick(&[".idx", ".idx.gz"]).ok_or_else(not_found)?,
            dict: pick(&[".dict", ".dict.gz", ".dict.dz"]).ok_or_else(not_found)?,
            syn: pick(&[".syn"]),
            resources: pick(&[".res.zip"]),
            ifo,
        })
    }

    /// Dictionary title: the `.ifo` file name without its extension.
    pub fn title(&self) -> String {
        basename(&self.ifo).trim_end_matches(".ifo").to_string()
    }

    pub fn read_ifo(&self, archive: &Archive) -> Result<Ifo> {
        parse_ifo(&self.ifo, &archive.read(&self.ifo)?)
    }
}

/// A fully indexed StarDict package, ready to be cut into chunk jobs.
#[derive(Debug)]
pub struct StarDictSource {
    title: String,
    ifo: Ifo,
    entries: Vec<IdxEntry>,
    synonyms: Vec<SynEntry>,
    dict: Vec<u8>,
    styles: Option<String>,
    chunk_size: usize,
}

impl StarDictSource {
    pub fn load(
        archive: &Archive,
        members: &StarDictMembers,
        ifo: Ifo,
        chunk_size: usize,
    ) -> Result<Self> {
        let idx_data = inflate_member(&members.idx, archive.read(&members.idx)?)?;
        let entries = parse_idx(&members.idx, &idx_data, &ifo)?;
        drop(idx_data);

        let dict = inflate_member(&members.dict, archive.read(&members.dict)?)?;
        if let Some(expected) = ifo.dictfilesize {
            if expected != dict.len() {
                tracing::warn!(
                    "{}: dictfilesize is {} but payload has {} bytes",
                    members.dict,
                    expected,
                    dict.len()
                );
            }
        }
        for (word_number, entry) in entries.iter().enumerate() {
            let end = entry.offset.checked_add(entry.size);
            if end.is_none_or(|end| end > dict.len() as u64) {
                return Err(DictError::CorruptIndex {
                    file: members.idx.clone(),
                    word_number,
                    position: entry.position,
                    reason: "article lies outside the dict payload",
                });
            }
        }

        let synonyms = match &members.syn {
            Some(syn) => parse_syn(syn, &archive.read(syn)?, entries.len())?,
            None => Vec::new(),
        };

        let styles = match &members.resources {
            Some(res) => read_styles(archive, res)?,
            None => None,
        };

        tracing::debug!(
            "StarDict {}: {} words, {} synonyms, {} payload bytes",
            members.title(),
            entries.len(),
            synonyms.len(),
            dict.len()
        );

        Ok(Self {
            title: members.title(),
            ifo,
            entries,
            synonyms,
            dict,
            styles,
            chunk_size: chunk_size.max(1),
        })
    }

    fn record_count(&self) -> usize {
        self.entries.len() + self.synonyms.len()
    }

    fn job_range(&self, index: usize) -> Range<usize> {
        let start = index * self.chunk_size;
        start..(start + self.chunk_size).min(self.record_count())
    }

    fn article(&self, entry: &IdxEntry) -> String {
        // offsets were validated in load()
        let start = entry.offset as usize;
        let end = start + entry.size as usize;
        render_article(&self.dict[start..end], &self.ifo.sametypesequence)
    }

    /// Terms for records `range`: main entries first, then synonyms.
    pub fn terms(&self, range: Range<usize>) -> Vec<Term> {
        range
            .map(|i| {
                let (word, entry) = match self.entries.get(i) {
                    Some(entry) => (&entry.word, entry),
                    None => {
                        let syn = &self.synonyms[i - self.entries.len()];
                        (&syn.word, &self.entries[syn.main_index])
                    }
                };
                Term::new(&self.title, word, word, vec![self.article(entry)])
            })
            .collect()
    }
}

impl ChunkSource for StarDictSource {
    fn summary(&self) -> DictionarySummary {
        let mut summary = DictionarySummary::new(&self.title, &self.ifo.version, 1);
        summary.author = self.ifo.author.clone();
        summary.url = self.ifo.website.clone();
        let description: Vec<&str> = [&self.ifo.bookname, &self.ifo.description]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect();
        summary.description = (!description.is_empty()).then(|| description.join("\n"));
        summary.styles = self.styles.clone();
        summary
    }

    fn job_count(&self) -> usize {
        self.record_count().div_ceil(self.chunk_size)
    }

    fn run_job(&self, index: usize) -> Result<Vec<Chunk>> {
        Ok(vec![Chunk::Terms(self.terms(self.job_range(index)))])
    }

    /// `.idx` is sorted, so equal headwords sit next to each other.
    fn clustered_keys(&self) -> bool {
        true
    }
}

fn read_styles(archive: &Archive, resources: &str) -> Result<Option<String>> {
    let nested = archive.open_nested(resources)?;
    let Some(css) = nested.find(|n| n == "styles.css") else {
        return Ok(None);
    };
    let bytes = nested.read(css)?;
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}
