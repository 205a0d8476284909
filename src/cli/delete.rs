use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::ProgressBar;
use std::time::Duration;

use super::DeleteArgs;
use dictengine::{CancelSignal, Engine};

pub fn run(args: DeleteArgs, mut engine: Engine) -> Result<()> {
    println!("{}", format!("[Delete] {}", args.title).green());

    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));

    let report = engine
        .delete_dictionary(
            &args.title,
            |deleted| pb.set_message(format!("{} rows deleted", deleted)),
            &CancelSignal::new(),
        )
        .context(format!("Failed to delete {}", args.title))?;
    pb.finish_and_clear();

    if !report.dictionary_removed && report.total_rows() == 0 {
        anyhow::bail!("Dictionary not installed: {}", args.title);
    }

    for (table, rows) in report.rows.iter().filter(|(_, rows)| *rows > 0) {
        println!("  {}: {}", table, rows);
    }
    println!(
        "{}",
        format!("[OK] Deleted {} ({} rows)", args.title, report.total_rows()).green()
    );
    Ok(())
}
