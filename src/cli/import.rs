use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use super::ImportArgs;
use dictengine::{CancelSignal, DictionarySummary, Engine, ImportStage};

pub fn run(args: ImportArgs, engine: Engine) -> Result<()> {
    let mut engine = match args.workers {
        Some(workers) => {
            let mut options = engine.import_options().clone();
            options.workers = workers.max(1);
            engine.with_import_options(options)
        }
        None => engine,
    };

    let total = args.archives.len();
    let mut failed = 0;
    for path in &args.archives {
        let cancel = match args.timeout {
            Some(secs) => CancelSignal::with_timeout(Duration::from_secs(secs)),
            None => CancelSignal::new(),
        };
        match import_single(&mut engine, path, &cancel) {
            Ok(summary) => print_summary(&summary),
            Err(e) => {
                failed += 1;
                eprintln!(
                    "{}",
                    format!("[ERROR] Failed to import {}: {:#}", path.display(), e).red()
                );
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} archive(s) failed to import", failed, total);
    }
    Ok(())
}

fn import_single(
    engine: &mut Engine,
    path: &Path,
    cancel: &CancelSignal,
) -> Result<DictionarySummary> {
    println!("{}", format!("[Import] {}", path.display()).green());

    let bytes = std::fs::read(path).context(format!("Failed to read {}", path.display()))?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let result = engine.import_dictionary(
        bytes,
        |progress| {
            pb.set_length(progress.chunks_total as u64);
            pb.set_position(progress.chunks_done as u64);
            let msg = match progress.stage {
                ImportStage::Commit => "committing".to_string(),
                _ => format!("{} rows", progress.rows_written),
            };
            pb.set_message(msg);
        },
        cancel,
    );

    match result {
        Ok(summary) => {
            pb.finish_with_message("done");
            Ok(summary)
        }
        Err(e) => {
            pb.abandon_with_message("failed");
            Err(e.into())
        }
    }
}

fn print_summary(summary: &DictionarySummary) {
    let counts = &summary.counts;
    println!(
        "{}",
        format!(
            "[OK] {} (revision {})",
            summary.title, summary.revision
        )
        .green()
    );
    println!(
        "  Terms: {}, Term meta: {}, Kanji: {}, Kanji meta: {}, Tags: {}, Media: {}",
        counts.terms_total,
        counts.term_meta_total,
        counts.kanji_total,
        counts.kanji_meta_total,
        counts.tag_meta_total,
        counts.media_total
    );
}
