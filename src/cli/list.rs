use anyhow::{Context, Result};
use colored::Colorize;

use super::ListArgs;
use dictengine::Engine;

pub fn run(args: ListArgs, engine: &Engine) -> Result<()> {
    let dictionaries = engine
        .list_dictionaries()
        .context("Failed to list dictionaries")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&dictionaries)?);
        return Ok(());
    }

    if dictionaries.is_empty() {
        println!("{}", "No dictionaries installed".yellow());
        return Ok(());
    }

    for (i, dictionary) in dictionaries.iter().enumerate() {
        println!(
            "{:>3}. {} {}",
            i + 1,
            dictionary.title.green(),
            format!("(revision {})", dictionary.revision).dimmed()
        );
        println!(
            "     {} terms, {} kanji, {} media",
            dictionary.counts.terms_total, dictionary.counts.kanji_total, dictionary.counts.media_total
        );
    }
    Ok(())
}
