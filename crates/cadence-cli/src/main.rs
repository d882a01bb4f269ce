//! Cadence CLI
//!
//! Command-line interface for Cadence - local-first habit tracking.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cadence_core::Tracker;

mod commands;
mod output;
mod prompt;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Cadence - local-first habit tracking")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage habits
    Habit {
        #[command(subcommand)]
        command: HabitCommands,
    },
    /// Toggle a habit's completion for a date
    Done {
        /// Habit ID (full UUID, prefix, or name)
        habit: Option<String>,
        /// Date (YYYY-MM-DD, defaults to the selected date)
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Mark every habit scheduled on that date
        #[arg(long, conflicts_with = "habit")]
        all: bool,
        /// With --all, clear completions instead of setting them
        #[arg(long, requires = "all")]
        undo: bool,
    },
    /// Record a quantitative completion value
    Log {
        /// Habit ID (full UUID, prefix, or name)
        habit: String,
        /// Value between 0 and 100
        value: f64,
        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Note to attach
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Show analytics (streaks, rates, weekly goal progress)
    Stats,
    /// Show per-day progress for the current week
    Week,
    /// Show or change preferences
    Prefs {
        #[command(subcommand)]
        command: Option<PrefsCommands>,
    },
    /// Export, import, or inspect stored data
    Data {
        #[command(subcommand)]
        command: DataCommands,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum HabitCommands {
    /// Create a new habit
    #[command(alias = "add")]
    Create {
        /// Habit name
        name: String,
        /// Icon glyph
        #[arg(short, long, default_value = "●")]
        icon: String,
        /// Hex color (#RRGGBB)
        #[arg(short, long, default_value = "#6366F1")]
        color: String,
        /// Weekly goal, 1-7 completions
        #[arg(short, long, default_value_t = 7)]
        goal: u8,
        /// Scheduled days, comma-separated (mon,tue,...); defaults to every day
        #[arg(short, long)]
        days: Option<String>,
        /// Longer description
        #[arg(long)]
        description: Option<String>,
        /// Category label
        #[arg(long)]
        category: Option<String>,
        /// Tags to add
        #[arg(short, long)]
        tag: Vec<String>,
    },
    /// List habits
    #[command(alias = "ls")]
    List {
        /// Include archived habits
        #[arg(short, long)]
        all: bool,
    },
    /// Show habit details (including streak)
    Show {
        /// Habit ID (full UUID, prefix, or name)
        id: String,
    },
    /// Edit a habit
    Edit {
        /// Habit ID (full UUID, prefix, or name)
        id: String,
    },
    /// Archive or unarchive a habit
    Archive {
        /// Habit ID (full UUID, prefix, or name)
        id: String,
    },
    /// Delete a habit and its history
    #[command(alias = "rm")]
    Delete {
        /// Habit ID (full UUID, prefix, or name)
        id: String,
    },
}

#[derive(Subcommand, Clone)]
enum PrefsCommands {
    /// Show current preferences
    Show,
    /// Set a preference value
    Set {
        /// Preference key (theme, week_start, default_view, notifications,
        /// morning_time, evening_time, quotes, vibration, sound)
        key: String,
        /// Preference value
        value: String,
    },
}

#[derive(Subcommand)]
enum DataCommands {
    /// Export all data as JSON
    Export {
        /// Output file (stdout if omitted)
        file: Option<PathBuf>,
    },
    /// Import data from a JSON export
    Import {
        /// Export file to import
        file: PathBuf,
    },
    /// Remove all stored data
    Clear,
    /// Show storage statistics
    Info,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return commands::config::handle(command.clone(), &output);
    }

    let mut tracker = Tracker::open()?;
    let mut failures = tracker.take_failures();

    let result = match cli.command {
        Commands::Config { .. } => unreachable!(), // Handled above
        Commands::Habit { command } => {
            handle_habit_command(command, &mut tracker, &output).await
        }
        Commands::Done {
            habit,
            date,
            all,
            undo,
        } => commands::completion::done(&mut tracker, habit, date, all, undo, &output).await,
        Commands::Log {
            habit,
            value,
            date,
            notes,
        } => commands::completion::log(&mut tracker, habit, value, date, notes, &output).await,
        Commands::Stats => commands::stats::show(&tracker, &output),
        Commands::Week => commands::stats::week(&tracker, &output),
        Commands::Prefs { command } => commands::prefs::handle(command, &mut tracker, &output).await,
        Commands::Data { command } => handle_data_command(command, &mut tracker, &output).await,
    };

    // Let background writes settle, then surface any persistence failures
    // as non-fatal notices
    tracker.flush().await;
    if let Some(rx) = failures.as_mut() {
        while let Ok(failure) = rx.try_recv() {
            eprintln!("⚠ {}: {}", failure.op_key, failure.error);
        }
    }

    result
}

async fn handle_habit_command(
    command: HabitCommands,
    tracker: &mut Tracker,
    output: &Output,
) -> Result<()> {
    match command {
        HabitCommands::Create {
            name,
            icon,
            color,
            goal,
            days,
            description,
            category,
            tag,
        } => {
            commands::habit::create(
                tracker,
                commands::habit::CreateArgs {
                    name,
                    icon,
                    color,
                    goal,
                    days,
                    description,
                    category,
                    tags: tag,
                },
                output,
            )
            .await
        }
        HabitCommands::List { all } => commands::habit::list(tracker, all, output),
        HabitCommands::Show { id } => commands::habit::show(tracker, id, output),
        HabitCommands::Edit { id } => commands::habit::edit(tracker, id, output).await,
        HabitCommands::Archive { id } => commands::habit::archive(tracker, id, output).await,
        HabitCommands::Delete { id } => commands::habit::delete(tracker, id, output).await,
    }
}

async fn handle_data_command(
    command: DataCommands,
    tracker: &mut Tracker,
    output: &Output,
) -> Result<()> {
    match command {
        DataCommands::Export { file } => commands::data::export(tracker, file, output).await,
        DataCommands::Import { file } => commands::data::import(tracker, file, output).await,
        DataCommands::Clear => commands::data::clear(tracker, output).await,
        DataCommands::Info => commands::data::info(tracker, output).await,
    }
}
