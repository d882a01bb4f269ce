//! Analytics command handlers

use anyhow::Result;

use cadence_core::Tracker;

use crate::output::Output;

/// Show the analytics snapshot
pub fn show(tracker: &Tracker, output: &Output) -> Result<()> {
    output.print_analytics(tracker.analytics());
    Ok(())
}

/// Show per-day progress for the week containing the selected date
pub fn week(tracker: &Tracker, output: &Output) -> Result<()> {
    let days = tracker.week_progress();
    output.print_week(&days);
    Ok(())
}
