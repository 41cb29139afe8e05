//! Error types for the task runner
//!
//! Uses `miette` for pretty error reporting with help text. Everything in
//! here is fatal: a task whose command fails is not an error, it is an
//! [`Outcome::Error`](crate::executor::Outcome).

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for task runner operations
#[derive(Error, Diagnostic, Debug)]
pub enum RunnerError {
    #[error("Directory does not exist: {}", .path.display())]
    #[diagnostic(
        code(task_runner::working_directory),
        help("Pass an existing directory to --working-directory")
    )]
    WorkingDirectoryNotFound { path: PathBuf },

    #[error("{name} not found in {}", .dir.display())]
    #[diagnostic(
        code(task_runner::config::not_found),
        help("Create the config file, or pick another one with --config")
    )]
    ConfigNotFound { name: String, dir: PathBuf },

    #[error("Error parsing YAML configuration")]
    #[diagnostic(
        code(task_runner::config::parse),
        help("Check that the config file is using valid syntax")
    )]
    ConfigParse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },

    #[error("Invalid YAML configuration file")]
    #[diagnostic(code(task_runner::config::invalid))]
    InvalidPipeline {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },

    #[error("Unknown task: {name}")]
    #[diagnostic(
        code(task_runner::task::not_found),
        help("Run `task` without arguments to see available tasks")
    )]
    UnknownTask { name: String, available: Vec<String> },

    #[error("Circular dependency detected: {cycle}")]
    #[diagnostic(
        code(task_runner::task::cycle),
        help("Check the 'depends' field in your task definitions")
    )]
    CyclicDependency { cycle: String },

    #[error("dotenv file not found: {}", .path.display())]
    #[diagnostic(code(task_runner::dotenv::not_found))]
    DotenvNotFound { path: PathBuf },

    #[error("Failed to load dotenv file {}", .path.display())]
    #[diagnostic(code(task_runner::dotenv::load))]
    Dotenv {
        #[source]
        source: dotenvy::Error,
        path: PathBuf,
    },

    #[error("Failed to create directory {}", .path.display())]
    #[diagnostic(code(task_runner::task::directory))]
    CreateDirectory {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("I/O error")]
    #[diagnostic(code(task_runner::io))]
    Io(#[from] std::io::Error),
}

/// Result type alias for task runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;
