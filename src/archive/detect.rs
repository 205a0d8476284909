//! Archive format classification from member names alone

use crate::error::{DictError, Result};

use super::basename;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryFormat {
    StarDict,
    Yomitan,
}

impl std::fmt::Display for DictionaryFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DictionaryFormat::StarDict => write!(f, "stardict"),
            DictionaryFormat::Yomitan => write!(f, "yomitan"),
        }
    }
}

pub fn detect_format<S: AsRef<str>>(names: &[S]) -> Result<DictionaryFormat> {
    let any = |pred: &dyn Fn(&str) -> bool| names.iter().any(|n| pred(basename(n.as_ref())));

    let has_ifo = any(&|n| n.ends_with(".ifo"));
    let has_idx = any(&|n| n.ends_with(".idx") || n.ends_with(".idx.gz"));
    let has_dict =
        any(&|n| n.ends_with(".dict") || n.ends_with(".dict.gz") || n.ends_with(".dict.dz"));
    if has_ifo && has_idx && has_dict {
        return Ok(DictionaryFormat::StarDict);
    }

    if any(&|n| n == "index.json" || (n.starts_with("term_bank_") && n.ends_with(".json"))) {
        return Ok(DictionaryFormat::Yomitan);
    }

    Err(DictError::UnrecognizedFormat {
        entries: names.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stardict_needs_all_three() {
        assert_eq!(
            detect_format(&["d.ifo", "d.idx.gz", "d.dict.dz"]).unwrap(),
            DictionaryFormat::StarDict
        );
        assert!(detect_format(&["d.ifo", "d.idx"]).is_err());
    }

    #[test]
    fn test_yomitan_by_index_or_bank() {
        assert_eq!(
            detect_format(&["index.json"]).unwrap(),
            DictionaryFormat::Yomitan
        );
        assert_eq!(
            detect_format(&["sub/term_bank_3.json"]).unwrap(),
            DictionaryFormat::Yomitan
        );
    }

    #[test]
    fn test_stardict_wins_over_yomitan() {
        assert_eq!(
            detect_format(&["index.json", "d.ifo", "d.idx", "d.dict"]).unwrap(),
            DictionaryFormat::StarDict
        );
    }

    #[test]
    fn test_unknown() {
        let err = detect_format(&["readme.txt"]).unwrap_err();
        assert!(matches!(err, DictError::UnrecognizedFormat { entries: 1 }));
    }
}
