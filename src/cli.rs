//! CLI definition
//!
//! Uses `clap` derive API for argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use task_runner::CONFIG_FILE;

/// Run the tasks defined in task.yml
#[derive(Parser, Debug)]
#[command(name = "task")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The directory to load the task file from
    #[arg(short = 'd', long, value_name = "DIR", env = "TASK_WORKING_DIRECTORY")]
    pub working_directory: Option<PathBuf>,

    /// Name of the configuration file to use
    #[arg(short, long, default_value = CONFIG_FILE, env = "TASK_CONFIG")]
    pub config: String,

    /// Show commands and their captured output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format when listing tasks
    #[arg(short, long, value_enum, default_value_t = ListFormat::Table)]
    pub format: ListFormat,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// The task(s) to run; lists all tasks when empty
    pub tasks: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListFormat {
    #[default]
    Table,
    Json,
    Plain,
}
