//! `.ifo` metadata file

use crate::error::{DictError, Result};

const IFO_MAGIC: &str = "StarDict's dict ifo file";

#[derive(Debug, Clone, PartialEq)]
pub struct Ifo {
    pub version: String,
    pub bookname: Option<String>,
    pub wordcount: usize,
    pub synwordcount: usize,
    pub idxfilesize: usize,
    pub dictfilesize: Option<usize>,
    /// Width of `dictOffset` in `.idx`: 32 (default) or 64.
    pub idxoffsetbits: u8,
    pub sametypesequence: String,
    pub author: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
}

impl Default for Ifo {
    fn default() -> Self {
        Self {
            version: String::new(),
            bookname: None,
            wordcount: 0,
            synwordcount: 0,
            idxfilesize: 0,
            dictfilesize: None,
            idxoffsetbits: 32,
            sametypesequence: "h".to_string(),
            author: None,
            email: None,
            website: None,
            description: None,
            date: None,
        }
    }
}

pub fn parse_ifo(file: &str, bytes: &[u8]) -> Result<Ifo> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_start_matches('\u{feff}');
    let mut lines = text.lines();

    match lines.next() {
        Some(first) if first.trim() == IFO_MAGIC => {}
        Some(first) => {
            tracing::warn!("{}: missing ifo magic line, found {:?}", file, first.trim());
            lines = text.lines();
        }
        None => return Err(DictError::invalid_metadata(file, "empty ifo file")),
    }

    let mut ifo = Ifo::default();
    for line in lines {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        let text_value = || (!value.is_empty()).then(|| value.to_string());
        match key.trim() {
            "version" => ifo.version = value.to_string(),
            "bookname" => ifo.bookname = text_value(),
            "wordcount" => ifo.wordcount = parse_count(file, "wordcount", value)?,
            "synwordcount" => ifo.synwordcount = parse_count(file, "synwordcount", value)?,
            "idxfilesize" => ifo.idxfilesize = parse_count(file, "idxfilesize", value)?,
            "dictfilesize" => ifo.dictfilesize = Some(parse_count(file, "dictfilesize", value)?),
            "idxoffsetbits" => {
                ifo.idxoffsetbits = match value {
                    "32" => 32,
                    "64" => 64,
                    other => {
                        return Err(DictError::invalid_metadata(
                            file,
                            format!("unsupported idxoffsetbits {other}"),
                        ));
                    }
                }
            }
            "sametypesequence" => {
                if !value.is_empty() {
                    ifo.sametypesequence = value.to_string();
                }
            }
            "author" => ifo.author = text_value(),
            "email" => ifo.email = text_value(),
            "website" => ifo.website = text_value(),
            "description" => ifo.description = text_value(),
            "date" => ifo.date = text_value(),
            _ => {}
        }
    }

    if ifo.wordcount == 0 {
        return Err(DictError::invalid_metadata(file, "wordcount is missing or zero"));
    }
    if ifo.idxfilesize == 0 {
        return Err(DictError::invalid_metadata(file, "idxfilesize is missing or zero"));
    }
    Ok(ifo)
}

fn parse_count(file: &str, key: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| DictError::invalid_metadata(file, format!("{key} is not a number: {value:?}")))
}
