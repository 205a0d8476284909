//! `.idx` word table and `.syn` synonym table

use std::cmp::Ordering;

use crate::error::{DictError, Result};

use super::ifo::Ifo;

#[derive(Debug, Clone, PartialEq)]
pub struct IdxEntry {
    pub word: String,
    pub offset: u64,
    pub size: u64,
    /// Byte position of the record inside `.idx`, kept for error reports.
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynEntry {
    pub word: String,
    pub main_index: usize,
}

pub fn parse_idx(file: &str, data: &[u8], ifo: &Ifo) -> Result<Vec<IdxEntry>> {
    let corrupt = |word_number: usize, position: usize, reason: &'static str| {
        DictError::CorruptIndex {
            file: file.to_string(),
            word_number,
            position,
            reason,
        }
    };
    let offset_width = if ifo.idxoffsetbits == 64 { 8 } else { 4 };

    // shortest record: one-byte word, NUL, offset, size
    let max_records = data.len() / (2 + offset_width + 4);
    let mut entries: Vec<IdxEntry> = Vec::with_capacity(ifo.wordcount.min(max_records));
    let mut byte_order_ok = true;
    let mut stardict_order_ok = true;
    let mut pos = 0;

    for word_number in 0..ifo.wordcount {
        let start = pos;
        let Some(nul) = data[pos..].iter().position(|&b| b == 0) else {
            return Err(corrupt(word_number, start, "missing NUL terminator"));
        };
        if nul == 0 {
            return Err(corrupt(word_number, start, "empty headword"));
        }
        let word_bytes = &data[pos..pos + nul];
        pos += nul + 1;

        if pos + offset_width + 4 > data.len() {
            return Err(corrupt(word_number, start, "truncated offset/size fields"));
        }
        let offset = read_be(&data[pos..pos + offset_width]);
        pos += offset_width;
        let size = read_be(&data[pos..pos + 4]);
        pos += 4;

        if let Some(prev) = entries.last() {
            let prev = prev.word.as_bytes();
            byte_order_ok &= prev <= word_bytes;
            stardict_order_ok &= stardict_cmp(prev, word_bytes) != Ordering::Greater;
            if !byte_order_ok && !stardict_order_ok {
                return Err(corrupt(word_number, start, "words are not sorted"));
            }
        }

        entries.push(IdxEntry {
            word: String::from_utf8_lossy(word_bytes).into_owned(),
            offset,
            size,
            position: start,
        });
    }

    if pos != ifo.idxfilesize || pos != data.len() {
        return Err(corrupt(
            ifo.wordcount,
            pos,
            "consumed bytes do not match idxfilesize",
        ));
    }
    Ok(entries)
}

pub fn parse_syn(file: &str, data: &[u8], wordcount: usize) -> Result<Vec<SynEntry>> {
    let mut synonyms = Vec::new();
    let mut pos = 0;
    let mut record = 0;

    while pos < data.len() {
        let start = pos;
        let Some(nul) = data[pos..].iter().position(|&b| b == 0) else {
            return Err(DictError::CorruptIndex {
                file: file.to_string(),
                word_number: record,
                position: start,
                reason: "missing NUL terminator",
            });
        };
        let word = String::from_utf8_lossy(&data[pos..pos + nul]).into_owned();
        pos += nul + 1;
        if pos + 4 > data.len() {
            return Err(DictError::CorruptIndex {
                file: file.to_string(),
                word_number: record,
                position: start,
                reason: "truncated main word index",
            });
        }
        let main_index = read_be(&data[pos..pos + 4]) as usize;
        pos += 4;
        record += 1;

        if main_index >= wordcount {
            tracing::warn!(
                "{}: synonym {:?} points at word #{} of {}, skipped",
                file,
                word,
                main_index,
                wordcount
            );
            continue;
        }
        if word.is_empty() {
            continue;
        }
        synonyms.push(SynEntry { word, main_index });
    }
    Ok(synonyms)
}

fn read_be(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

/// StarDict's own collation: ASCII case-insensitive, ties broken bytewise.
fn stardict_cmp(a: &[u8], b: &[u8]) -> Ordering {
    let folded = a
        .iter()
        .map(u8::to_ascii_lowercase)
        .cmp(b.iter().map(u8::to_ascii_lowercase));
    folded.then_with(|| a.cmp(b))
}


#[cfg(test)]
mod tests {
    use super::test_support::idx_record;
    use super::*;

    fn ifo_for(data: &[u8], wordcount: usize) -> Ifo {
        Ifo {
            wordcount,
            idxfilesize: data.len(),
            ..Ifo::default()
        }
    }

    fn sample() -> Vec<u8> {
        [
            idx_record("apple", 0, 5),
            idx_record("bee", 5, 3),
            idx_record("cat", 8, 3),
        ]
        .concat()
    }

    #[test]
    fn test_parses_big_endian_records() {
        let data = sample();
        let entries = parse_idx("d.idx", &data, &ifo_for(&data, 3)).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].word, "bee");
        assert_eq!(entries[1].offset, 5);
        assert_eq!(entries[1].size, 3);
        assert_eq!(entries[1].position, 14);
    }

    #[test]
    fn test_size_mismatch_reports_position() {
        let data = sample();
        let mut ifo = ifo_for(&data, 3);
        ifo.idxfilesize += 1;
        let err = parse_idx("d.idx", &data, &ifo).unwrap_err();
        assert!(matches!(
            err,
            DictError::CorruptIndex { word_number: 3, position: 38, .. }
        ));
    }

    #[test]
    fn test_wordcount_beyond_data() {
        let data = sample();
        let err = parse_idx("d.idx", &data, &ifo_for(&data, 4)).unwrap_err();
        assert!(matches!(
            err,
            DictError::CorruptIndex { word_number: 3, position: 38, .. }
        ));
    }

    #[test]
    fn test_huge_wordcount_is_corrupt() {
        let data = idx_record("apple", 0, 5);
        let err = parse_idx("d.idx", &data, &ifo_for(&data, 4_000_000_000)).unwrap_err();
        assert!(matches!(
            err,
            DictError::CorruptIndex { word_number: 1, position: 14, .. }
        ));
    }

    #[test]
    fn test_truncated_fields() {
        let mut data = sample();
        data.truncate(data.len() - 2);
        let err = parse_idx("d.idx", &data, &ifo_for(&data, 3)).unwrap_err();
        assert!(matches!(err, DictError::CorruptIndex { word_number: 2, position: 26, .. }));
    }

    #[test]
    fn test_unsorted_rejected() {
        let data = [idx_record("cat", 0, 1), idx_record("bee", 1, 1)].concat();
        let err = parse_idx("d.idx", &data, &ifo_for(&data, 2)).unwrap_err();
        assert!(matches!(err, DictError::CorruptIndex { word_number: 1, .. }));
    }

    #[test]
    fn test_case_insensitive_order_accepted() {
        let data = [idx_record("apple", 0, 1), idx_record("Bee", 1, 1), idx_record("cat", 2, 1)].concat();
        assert!(parse_idx("d.idx", &data, &ifo_for(&data, 3)).is_ok());
    }

    #[test]
    fn test_equal_words_allowed() {
        let data = [idx_record("bee", 0, 1), idx_record("bee", 1, 1)].concat();
        assert_eq!(parse_idx("d.idx", &data, &ifo_for(&data, 2)).unwrap().len(), 2);
    }

    #[test]
    fn test_64_bit_offsets() {
        let mut data = b"x\0".to_vec();
        data.extend_from_slice(&7u64.to_be_bytes());
        data.extend_from_slice(&2u32.to_be_bytes());
        let mut ifo = ifo_for(&data, 1);
        ifo.idxoffsetbits = 64;
        let entries = parse_idx("d.idx", &data, &ifo).unwrap();
        assert_eq!(entries[0].offset, 7);
    }

    #[test]
    fn test_syn_skips_out_of_range() {
        let mut data = b"hornet\0".to_vec();
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(b"ghost\0");
        data.extend_from_slice(&9u32.to_be_bytes());
        let syn = parse_syn("d.syn", &data, 3).unwrap();
        assert_eq!(
            syn,
            vec![SynEntry {
                word: "hornet".to_string(),
                main_index: 1
            }]
        );
    }

    #[test]
    fn test_syn_truncated() {
        let err = parse_syn("d.syn", b"hornet\0\0\0", 3).unwrap_err();
        assert!(matches!(err, DictError::CorruptIndex { word_number: 0, position: 0, .. }));
    }
}
