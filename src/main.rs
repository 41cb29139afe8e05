//! task - run YAML-defined tasks and their dependencies

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, ListFormat};
use task_runner::{
    ConsoleReporter, Executor, ExecutorConfig, Outcome, Pipeline, Result, RunnerError,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Set up panic handler for nice error messages
    miette::set_panic_hook();

    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    match run(cli).await {
        Ok(Outcome::Ok) => ExitCode::SUCCESS,
        Ok(Outcome::Error) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}: {:?}", style("error").red().bold(), miette::Report::new(e));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if verbose {
        if let Ok(directive) = "task_runner=debug".parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Load the pipeline, then list or run the requested tasks.
///
/// Returns `Outcome::Error` when any requested task failed.
async fn run(cli: Cli) -> Result<Outcome> {
    let cwd = working_directory(cli.working_directory.as_deref())?;
    let (pipeline, _) = Pipeline::load(&cwd, &cli.config)?;

    if cli.tasks.is_empty() {
        print_task_list(&pipeline, cli.format);
        return Ok(Outcome::Ok);
    }

    // Unknown names abort before anything runs
    for name in &cli.tasks {
        pipeline.resolve(name)?;
    }

    let config = ExecutorConfig {
        cwd,
        verbose: cli.verbose,
        progress: console::Term::stderr().is_term(),
    };
    let executor = Executor::new(pipeline, config, Arc::new(ConsoleReporter::new(cli.verbose)));

    let mut outcome = Outcome::Ok;
    for name in &cli.tasks {
        if executor.run(name).await? == Outcome::Error {
            outcome = Outcome::Error;
        }
    }

    Ok(outcome)
}

fn working_directory(dir: Option<&Path>) -> Result<PathBuf> {
    match dir {
        Some(dir) if dir.is_dir() => Ok(std::fs::canonicalize(dir)?),
        Some(dir) => Err(RunnerError::WorkingDirectoryNotFound {
            path: dir.to_path_buf(),
        }),
        None => Ok(std::env::current_dir()?),
    }
}

fn print_task_list(pipeline: &Pipeline, format: ListFormat) {
    match format {
        ListFormat::Table => {
            println!("{}", style("Available tasks:").bold());
            println!();

            let max_name_len = pipeline.task_names().map(str::len).max().unwrap_or(0);

            for task in pipeline.tasks() {
                let desc = task.description.as_deref().unwrap_or("");
                println!(
                    "  {}{}  {}",
                    style(&task.key).cyan().bold(),
                    " ".repeat(max_name_len - task.key.len()),
                    style(desc).dim()
                );
            }
        }

        ListFormat::Json => {
            let tasks: Vec<_> = pipeline
                .tasks()
                .map(|task| {
                    serde_json::json!({
                        "name": task.key,
                        "description": task.description,
                    })
                })
                .collect();

            match serde_json::to_string_pretty(&tasks) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::error!("failed to render task list: {e}"),
            }
        }

        ListFormat::Plain => {
            for name in pipeline.task_names() {
                println!("{name}");
            }
        }
    }
}
