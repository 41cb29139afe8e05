//! task-runner - a declarative task runner
//!
//! Tasks are defined in a YAML file; running a task runs its dependencies
//! first, in order, and skips everything downstream of a failure.
//!
//! # Example
//!
//! ```yaml
//! # task.yml
//! environment:
//!   APP_ENV: test
//!
//! tasks:
//!   download:
//!     name: download source code
//!     directory: build
//!     commands:
//!       - git clone https://example.com/app.git .
//!
//!   install:
//!     description: Install the application
//!     depends: [download]
//!     dotenv: .env
//!     commands:
//!       - make install
//! ```
//!
//! # Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use task_runner::{ConsoleReporter, Executor, ExecutorConfig, Pipeline, CONFIG_FILE};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cwd = std::env::current_dir()?;
//!     let (pipeline, _) = Pipeline::load(&cwd, CONFIG_FILE)?;
//!
//!     let config = ExecutorConfig { cwd, ..Default::default() };
//!     let executor = Executor::new(pipeline, config, Arc::new(ConsoleReporter::new(false)));
//!     executor.run("install").await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod environment;
pub mod error;
pub mod executor;
pub mod report;

// Re-export main types
pub use config::{Pipeline, Task, CONFIG_FILE};
pub use error::{Result, RunnerError};
pub use executor::{Executor, ExecutorConfig, Outcome};
pub use report::{ConsoleReporter, RecordingReporter, Reporter, Status};
