//! Yomitan import tests

mod common;

use std::io::Cursor;

use common::{build_zip, import, rows_owned, yomitan_index};
use dictengine::{Engine, ErrorKind};

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image::RgbImage::new(width, height)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

#[test]
fn test_structured_content() {
    let bank = r#"[["走る","はしる",["v5r","vi"],"",12,[{"type":"structured-content","content":{"tag":"div","content":"to run"}}],1,[]]]"#;
    let archive = build_zip(&[
        ("index.json", yomitan_index("JMdict", 3)),
        ("term_bank_1.json", bank.as_bytes().to_vec()),
    ]);
    let mut engine = Engine::open_in_memory().unwrap();
    let summary = import(&mut engine, archive).unwrap();

    assert_eq!(summary.title, "JMdict");
    assert_eq!(summary.revision, "JMdict-1");
    assert!(summary.sequenced);

    let html = engine.lookup("走る", Some("はしる")).unwrap().unwrap();
    assert!(html.contains(r#"<div class="gloss-sc-div">to run</div>"#), "{html}");

    let set = engine
        .lookup_definitions("走る", None, None, None, &dictengine::CancelSignal::new())
        .unwrap();
    let term = &set.definitions[0].terms[0];
    assert_eq!(term.reading, "はしる");
    assert_eq!(term.definition_tags, vec!["v5r", "vi"]);
    assert_eq!(term.score, 12);
}

#[test]
fn test_reading_lookup_fallback() {
    let bank = r#"[["橋","はし","","",0,["bridge"],1,""],["箸","はし","","",0,["chopsticks"],2,""]]"#;
    let archive = build_zip(&[
        ("index.json", yomitan_index("ja", 3)),
        ("term_bank_1.json", bank.as_bytes().to_vec()),
    ]);
    let mut engine = Engine::open_in_memory().unwrap();
    import(&mut engine, archive).unwrap();

    let html = engine.lookup("はし", Some("はし")).unwrap();
    assert_eq!(html, None);
    let html = engine.lookup("端", Some("はし")).unwrap().unwrap();
    assert_eq!(html, "bridge<hr>chopsticks");
}

#[test]
fn test_version_one_layout() {
    let index = br#"{"title":"Old","revision":"1","version":1,"tagMeta":{"n":{"category":"partOfSpeech","order":1,"notes":"noun"}}}"#;
    let bank = r#"[["猫","ねこ","n","",3,"cat","feline"]]"#;
    let archive = build_zip(&[
        ("index.json", index.to_vec()),
        ("term_bank_1.json", bank.as_bytes().to_vec()),
    ]);
    let mut engine = Engine::open_in_memory().unwrap();
    let summary = import(&mut engine, archive).unwrap();

    assert_eq!(summary.version, 1);
    assert_eq!(summary.counts.tag_meta_total, 1);
    assert_eq!(engine.lookup("猫", None).unwrap().as_deref(), Some("cat<hr>feline"));
    let tag = engine.tag_meta("Old", "n").unwrap().unwrap();
    assert_eq!(tag.category, "partOfSpeech");
    assert_eq!(tag.notes, "noun");
}

#[test]
fn test_auxiliary_banks() {
    let archive = build_zip(&[
        ("index.json", yomitan_index("Aux", 3)),
        ("term_bank_1.json", r#"[["日","ひ","","",0,["sun"],1,""]]"#.as_bytes().to_vec()),
        ("term_meta_bank_1.json", r#"[["日","freq",42]]"#.as_bytes().to_vec()),
        (
            "kanji_bank_1.json",
            r#"[["日","ニチ ジツ","ひ か","jouyou",["day","sun"],{"strokes":"4"}]]"#.as_bytes().to_vec(),
        ),
        ("kanji_meta_bank_1.json", r#"[["日","freq",1]]"#.as_bytes().to_vec()),
        ("tag_bank_1.json", br#"[["jouyou","frequent",0,"common kanji",0]]"#.to_vec()),
    ]);
    let mut engine = Engine::open_in_memory().unwrap();
    let summary = import(&mut engine, archive).unwrap();

    let counts = summary.counts;
    assert_eq!(
        (
            counts.terms_total,
            counts.term_meta_total,
            counts.kanji_total,
            counts.kanji_meta_total,
            counts.tag_meta_total
        ),
        (1, 1, 1, 1, 1)
    );

    let meta = engine.term_meta("日", &[]).unwrap();
    assert_eq!(meta[0].mode, "freq");
    assert_eq!(meta[0].data, serde_json::json!(42));

    let kanji = engine.kanji("日", &["Aux".to_string()]).unwrap();
    assert_eq!(kanji[0].onyomi, vec!["ニチ", "ジツ"]);
    assert_eq!(kanji[0].meanings, vec!["day", "sun"]);
    assert_eq!(engine.kanji_meta("日", &[]).unwrap().len(), 1);
    assert_eq!(engine.tag_meta("Aux", "jouyou").unwrap().unwrap().notes, "common kanji");
}

#[test]
fn test_media_and_styles() {
    let bank = r#"[["図","ず","","",0,[{"type":"structured-content","content":[{"tag":"img","path":"img/fig.png"},{"tag":"img","path":"img/missing.png","width":3,"height":3}]}],1,""]]"#;
    let archive = build_zip(&[
        ("index.json", yomitan_index("Pics", 3)),
        ("term_bank_1.json", bank.as_bytes().to_vec()),
        ("img/fig.png", png(8, 6)),
        ("styles.css", b".gloss-sc-div{margin:0}".to_vec()),
    ]);
    let mut engine = Engine::open_in_memory().unwrap();
    let summary = import(&mut engine, archive).unwrap();

    assert_eq!(summary.styles.as_deref(), Some(".gloss-sc-div{margin:0}"));
    assert_eq!(summary.counts.media_total, 1);

    let media = engine.media("Pics", "img/fig.png").unwrap().unwrap();
    assert_eq!(media.media_type, "image/png");
    assert_eq!((media.width, media.height), (8, 6));
    assert_eq!(media.content, png(8, 6));
    assert!(engine.media("Pics", "img/missing.png").unwrap().is_none());
}

#[test]
fn test_repeated_terms_across_banks_merge() {
    let archive = build_zip(&[
        ("index.json", yomitan_index("Split", 3)),
        ("term_bank_1.json", br#"[["a","a",["x"],"",1,["one"],1,""]]"#.to_vec()),
        ("term_bank_2.json", br#"[["a","a",["y","x"],"",5,["two"],2,""]]"#.to_vec()),
    ]);
    let mut engine = Engine::open_in_memory().unwrap();
    let summary = import(&mut engine, archive).unwrap();

    assert_eq!(summary.counts.terms_total, 1);
    let set = engine
        .lookup_definitions("a", None, None, None, &dictengine::CancelSignal::new())
        .unwrap();
    let term = &set.definitions[0].terms[0];
    assert_eq!(term.glossary, vec!["one", "two"]);
    assert_eq!(term.definition_tags, vec!["x", "y"]);
    assert_eq!(term.score, 5);
}

#[test]
fn test_malformed_bank_aborts_import() {
    let archive = build_zip(&[
        ("index.json", yomitan_index("Bad", 3)),
        ("term_bank_1.json", br#"[["ok","ok","","",0,["fine"],1,""]]"#.to_vec()),
        ("term_bank_2.json", b"[[".to_vec()),
    ]);
    let mut engine = Engine::open_in_memory().unwrap();
    let err = import(&mut engine, archive).unwrap_err();

    assert_eq!(err.kind, ErrorKind::MalformedRecord);
    assert!(err.to_string().contains("term_bank_2.json"));
    for table in common::ALL_TABLES {
        assert_eq!(rows_owned(&engine, table, "Bad"), 0, "{table}");
    }
}

#[test]
fn test_index_without_title() {
    let archive = build_zip(&[
        ("index.json", br#"{"revision":"1","format":3}"#.to_vec()),
        ("term_bank_1.json", b"[]".to_vec()),
    ]);
    let mut engine = Engine::open_in_memory().unwrap();
    let err = import(&mut engine, archive).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidMetadata);
}
