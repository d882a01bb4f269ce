//! Data import/export command handlers

use std::path::PathBuf;

use anyhow::{Context, Result};

use cadence_core::Tracker;

use crate::output::Output;
use crate::prompt::confirm;

/// Export all data as JSON to a file or stdout
pub async fn export(tracker: &Tracker, file: Option<PathBuf>, output: &Output) -> Result<()> {
    let doc = tracker.export_data().await.context("Failed to export data")?;
    let json = doc.to_json().context("Failed to serialize export")?;

    match file {
        Some(path) => {
            std::fs::write(&path, &json)
                .with_context(|| format!("Failed to write export to {:?}", path))?;
            output.success(&format!(
                "Exported {} habit(s), {} completion(s) to {}",
                doc.habits.len(),
                doc.completions.len(),
                path.display()
            ));
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

/// Import data from a JSON export, replacing all collections
pub async fn import(tracker: &mut Tracker, file: PathBuf, output: &Output) -> Result<()> {
    let json = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read import file {:?}", file))?;

    if output.should_prompt() {
        println!("Importing replaces all existing habits, completions, and preferences.");
        if !confirm("Continue?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let summary = tracker
        .import_data(&json)
        .await
        .context("Failed to import data")?;

    output.success(&format!(
        "Imported {} habit(s), {} completion(s), {} preference record(s)",
        summary.habits, summary.completions, summary.preferences
    ));

    Ok(())
}

/// Remove all stored data
pub async fn clear(tracker: &mut Tracker, output: &Output) -> Result<()> {
    if output.should_prompt() {
        println!("This permanently removes every habit, completion, and preference.");
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    tracker.clear_all().await.context("Failed to clear data")?;
    output.success("All data cleared");

    Ok(())
}

/// Show storage statistics
pub async fn info(tracker: &Tracker, output: &Output) -> Result<()> {
    let stats = tracker.stats().await.context("Failed to read store stats")?;
    output.print_stats(&stats);
    Ok(())
}
