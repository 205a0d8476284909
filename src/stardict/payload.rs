//! `.dict` payload: inflation and `sametypesequence` field rendering

use std::io::Read;

use flate2::read::MultiGzDecoder;

use crate::error::{DictError, Result};
use crate::sanitize::{sanitize, text_to_html};

/// Inflates `.gz` / `.dz` members; anything else passes through untouched.
pub fn inflate_member(file: &str, data: Vec<u8>) -> Result<Vec<u8>> {
    if !(file.ends_with(".gz") || file.ends_with(".dz")) {
        return Ok(data);
    }
    let mut decoder = MultiGzDecoder::new(data.as_slice());
    let mut out = Vec::with_capacity(data.len() * 4);
    decoder
        .read_to_end(&mut out)
        .map_err(|source| DictError::Decompress {
            file: file.to_string(),
            source,
        })?;
    tracing::debug!("Inflated {} ({} -> {} bytes)", file, data.len(), out.len());
    Ok(out)
}

/// Renders one article to sanitized HTML according to `sametypesequence`.
///
/// Lowercase field types are NUL-terminated strings, uppercase ones carry a
/// 4-byte big-endian size prefix. The final field has neither and runs to the
/// end of the article.
pub fn render_article(raw: &[u8], sametypesequence: &str) -> String {
    let types: Vec<char> = if sametypesequence.is_empty() {
        vec!['h']
    } else {
        sametypesequence.chars().collect()
    };

    let mut parts = Vec::new();
    let mut rest = raw;
    for (i, &kind) in types.iter().enumerate() {
        if rest.is_empty() {
            break;
        }
        let last = i + 1 == types.len();
        let field;
        if last {
            field = rest;
            rest = &[];
        } else if kind.is_ascii_uppercase() {
            let Some((len_bytes, tail)) = rest.split_first_chunk::<4>() else {
                break;
            };
            let len = (u32::from_be_bytes(*len_bytes) as usize).min(tail.len());
            field = &tail[..len];
            rest = &tail[len..];
        } else {
            match rest.iter().position(|&b| b == 0) {
                Some(nul) => {
                    field = &rest[..nul];
                    rest = &rest[nul + 1..];
                }
                None => {
                    field = rest;
                    rest = &[];
                }
            }
        }

        if let Some(html) = render_field(kind, field) {
            if !html.is_empty() {
                parts.push(html);
            }
        }
    }
    parts.join("<br>")
}

fn render_field(kind: char, field: &[u8]) -> Option<String> {
    if kind.is_ascii_uppercase() {
        return None;
    }
    let text = String::from_utf8_lossy(field);
    let html = match kind {
        'h' | 'g' | 'x' => sanitize(&text),
        _ => sanitize(&text_to_html(&text)),
    };
    Some(html)
}
