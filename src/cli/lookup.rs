//! Query command handlers

use anyhow::{Context, Result};
use colored::Colorize;

use super::{DidYouMeanArgs, LookupArgs, SuggestArgs};
use dictengine::{CancelSignal, Engine};

pub fn run(args: LookupArgs, engine: &Engine) -> Result<()> {
    let selected = (!args.dicts.is_empty()).then_some(args.dicts.as_slice());
    let set = engine
        .lookup_definitions(
            &args.expression,
            args.reading.as_deref(),
            selected,
            selected,
            &CancelSignal::new(),
        )
        .context("Lookup failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&set)?);
        return Ok(());
    }

    if set.is_empty() {
        println!(
            "{}",
            format!("No definitions found for {}", args.expression).yellow()
        );
        return Ok(());
    }

    for definition in &set.definitions {
        println!("{}", format!("[{}]", definition.dictionary).cyan());
        println!("{}", definition.html);
        println!();
    }
    Ok(())
}

pub fn suggest(args: SuggestArgs, engine: &Engine) -> Result<()> {
    let suggestions = engine
        .suggest_prefix(&args.prefix, args.max, &args.dicts)
        .context("Suggest failed")?;
    for suggestion in suggestions {
        println!("{}", suggestion);
    }
    Ok(())
}

pub fn did_you_mean(args: DidYouMeanArgs, engine: &Engine) -> Result<()> {
    let suggestions = engine
        .suggest_did_you_mean(&args.word, &args.next, args.max, &args.dicts)
        .context("Did-you-mean failed")?;
    if suggestions.is_empty() {
        println!("{}", "No suggestions".yellow());
    }
    for suggestion in suggestions {
        println!("{}", suggestion);
    }
    Ok(())
}
