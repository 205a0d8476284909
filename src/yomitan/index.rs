//! `index.json` metadata

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{DictError, Result};
use crate::model::{DictionarySummary, TagMeta};

pub const INDEX_FILE: &str = "index.json";

const DEFAULT_VERSION: i64 = 3;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum NumOrStr {
    Num(serde_json::Number),
    Str(String),
}

impl NumOrStr {
    fn into_string(self) -> String {
        match self {
            NumOrStr::Num(n) => n.to_string(),
            NumOrStr::Str(s) => s,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawIndex {
    title: Option<String>,
    revision: Option<NumOrStr>,
    version: Option<i64>,
    format: Option<i64>,
    sequenced: Option<bool>,
    author: Option<String>,
    url: Option<String>,
    description: Option<String>,
    attribution: Option<String>,
    source_language: Option<String>,
    target_language: Option<String>,
    tag_meta: BTreeMap<String, RawTagMeta>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTagMeta {
    category: Option<String>,
    order: Option<f64>,
    notes: Option<String>,
    score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YomitanIndex {
    pub title: String,
    pub revision: String,
    pub version: i64,
    pub sequenced: bool,
    pub author: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub attribution: Option<String>,
    pub source_language: Option<String>,
    pub target_language: Option<String>,
    /// Legacy (v1) tag definitions carried inline in the index.
    pub tag_meta: Vec<TagMeta>,
}

pub fn parse_index(bytes: &[u8]) -> Result<YomitanIndex> {
    let raw: RawIndex = serde_json::from_slice(bytes)
        .map_err(|e| DictError::invalid_metadata(INDEX_FILE, e.to_string()))?;

    let title = raw
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| DictError::invalid_metadata(INDEX_FILE, "title is missing"))?;
    let revision = raw
        .revision
        .map(NumOrStr::into_string)
        .ok_or_else(|| DictError::invalid_metadata(INDEX_FILE, "revision is missing"))?;

    let tag_meta = raw
        .tag_meta
        .into_iter()
        .map(|(name, meta)| TagMeta {
            dictionary: title.clone(),
            name,
            category: meta.category.unwrap_or_default(),
            order: meta.order.unwrap_or(0.0) as i64,
            notes: meta.notes.unwrap_or_default(),
            score: meta.score.unwrap_or(0.0) as i64,
        })
        .collect();

    Ok(YomitanIndex {
        version: raw.version.or(raw.format).unwrap_or(DEFAULT_VERSION),
        sequenced: raw.sequenced.unwrap_or(false),
        author: raw.author,
        url: raw.url,
        description: raw.description,
        attribution: raw.attribution,
        source_language: raw.source_language,
        target_language: raw.target_language,
        title,
        revision,
        tag_meta,
    })
}

impl YomitanIndex {
    pub fn summary(&self) -> DictionarySummary {
        let mut summary = DictionarySummary::new(&self.title, &self.revision, self.version);
        summary.sequenced = self.sequenced;
        summary.author = self.author.clone();
        summary.url = self.url.clone();
        summary.description = self.description.clone();
        summary.attribution = self.attribution.clone();
        summary.source_language = self.source_language.clone();
        summary.target_language = self.target_language.clone();
        summary
    }
}
