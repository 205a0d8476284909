//! Yomitan archive parser
//!
//! Every numbered bank file becomes one job. Tag banks are ingested first,
//! then term, term-meta, kanji and kanji-meta banks, each family in lexical
//! file name order.

pub mod banks;
pub mod index;
pub mod structured;

use std::io::Cursor;

use crate::archive::{Archive, basename};
use crate::error::{DictError, Result};
use crate::import::ChunkSource;
use crate::model::{Chunk, DictionarySummary, Media};

use banks::{BankKind, kanji_meta_row, kanji_row, parse_bank, tag_row, term_meta_row, term_row};
use index::{INDEX_FILE, YomitanIndex, parse_index};
use structured::MediaRef;

#[derive(Debug, Clone, PartialEq)]
enum Job {
    IndexTags,
    Bank { kind: BankKind, member: String },
}

#[derive(Debug)]
pub struct YomitanSource {
    archive: Archive,
    index: YomitanIndex,
    jobs: Vec<Job>,
    styles: Option<String>,
    chunk_size: usize,
}

impl YomitanSource {
    pub fn read_index(archive: &Archive) -> Result<YomitanIndex> {
        let member = archive
            .find(|n| n == INDEX_FILE)
            .ok_or_else(|| DictError::invalid_metadata(INDEX_FILE, "index.json is missing"))?;
        parse_index(&archive.read(member)?)
    }

    pub fn new(archive: Archive, index: YomitanIndex, chunk_size: usize) -> Result<Self> {
        let mut banks: Vec<(BankKind, &str)> = archive
            .names()
            .iter()
            .filter_map(|name| BankKind::classify(basename(name)).map(|kind| (kind, name.as_str())))
            .collect();
        banks.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| basename(a.1).cmp(basename(b.1))));

        let mut jobs = Vec::with_capacity(banks.len() + 1);
        if !index.tag_meta.is_empty() {
            jobs.push(Job::IndexTags);
        }
        jobs.extend(banks.into_iter().map(|(kind, member)| Job::Bank {
            kind,
            member: member.to_string(),
        }));

        let styles = match archive.find(|n| n == "styles.css") {
            Some(css) => Some(String::from_utf8_lossy(&archive.read(css)?).into_owned()),
            None => None,
        };

        tracing::debug!("Yomitan {}: {} job(s)", index.title, jobs.len());
        Ok(Self {
            archive,
            index,
            jobs,
            styles,
            chunk_size: chunk_size.max(1),
        })
    }

    fn parse_bank_job(&self, kind: BankKind, member: &str) -> Result<Vec<Chunk>> {
        let file = basename(member);
        let rows = parse_bank(file, &self.archive.read(member)?)?;
        let title = self.index.title.as_str();
        let mut chunks = Vec::new();
        let mut media_refs = Vec::new();

        for (n, rows) in rows.chunks(self.chunk_size).enumerate() {
            let base = n * self.chunk_size;
            let chunk = match kind {
                BankKind::Term => Chunk::Terms(
                    rows.iter()
                        .enumerate()
                        .map(|(i, row)| {
                            term_row(title, file, base + i, row, self.index.version, &mut media_refs)
                        })
                        .collect::<Result<_>>()?,
                ),
                BankKind::TermMeta => Chunk::TermMeta(
                    rows.iter()
                        .enumerate()
                        .map(|(i, row)| term_meta_row(title, file, base + i, row))
                        .collect::<Result<_>>()?,
                ),
                BankKind::Kanji => Chunk::Kanji(
                    rows.iter()
                        .enumerate()
                        .map(|(i, row)| kanji_row(title, file, base + i, row))
                        .collect::<Result<_>>()?,
                ),
                BankKind::KanjiMeta => Chunk::KanjiMeta(
                    rows.iter()
                        .enumerate()
                        .map(|(i, row)| kanji_meta_row(title, file, base + i, row))
                        .collect::<Result<_>>()?,
                ),
                BankKind::Tag => Chunk::TagMeta(
                    rows.iter()
                        .enumerate()
                        .map(|(i, row)| tag_row(title, file, base + i, row))
                        .collect::<Result<_>>()?,
                ),
            };
            chunks.push(chunk);
        }

        let media = self.load_media(media_refs)?;
        if !media.is_empty() {
            chunks.push(Chunk::Media(media));
        }
        Ok(chunks)
    }

    /// Materializes referenced images that actually exist in the archive.
    fn load_media(&self, refs: Vec<MediaRef>) -> Result<Vec<Media>> {
        let mut media = Vec::new();
        for media_ref in refs {
            if !self.archive.contains(&media_ref.path) {
                tracing::warn!(
                    "{}: referenced media {} is not in the archive",
                    self.index.title,
                    media_ref.path
                );
                continue;
            }
            let content = self.archive.read(&media_ref.path)?;
            let (width, height) = match (media_ref.width, media_ref.height) {
                (Some(w), Some(h)) => (w, h),
                _ => image_dimensions(&content).unwrap_or_else(|| {
                    tracing::debug!("Could not read image header of {}", media_ref.path);
                    (0, 0)
                }),
            };
            media.push(Media {
                dictionary: self.index.title.clone(),
                media_type: media_type(&media_ref.path).to_string(),
                path: media_ref.path,
                width,
                height,
                content,
            });
        }
        Ok(media)
    }
}

impl ChunkSource for YomitanSource {
    fn summary(&self) -> DictionarySummary {
        let mut summary = self.index.summary();
        summary.styles = self.styles.clone();
        summary
    }

    fn job_count(&self) -> usize {
        self.jobs.len()
    }

    fn run_job(&self, index: usize) -> Result<Vec<Chunk>> {
        match &self.jobs[index] {
            Job::IndexTags => Ok(vec![Chunk::TagMeta(self.index.tag_meta.clone())]),
            Job::Bank { kind, member } => self.parse_bank_job(*kind, member),
        }
    }

    fn clustered_keys(&self) -> bool {
        false
    }
}

fn image_dimensions(content: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(content))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

pub fn media_type(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}
