//! Task execution engine
//!
//! Runs a task depth-first: dependencies in declared order, then the task's
//! own commands one at a time. The first failing dependency skips the
//! remaining ones and the task itself.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{FutureExt, LocalBoxFuture};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::process::Command;

use crate::config::{Pipeline, Task};
use crate::environment;
use crate::error::{Result, RunnerError};
use crate::report::{Reporter, Status};

/// Result of running a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Error,
}

/// Executor configuration
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Working directory relative paths are resolved from
    pub cwd: PathBuf,
    /// Verbose output
    pub verbose: bool,
    /// Show a spinner while captured tasks run (ignored when verbose)
    pub progress: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_default(),
            verbose: false,
            progress: false,
        }
    }
}

/// Task executor
pub struct Executor {
    pipeline: Pipeline,
    config: ExecutorConfig,
    reporter: Arc<dyn Reporter>,
}

impl Executor {
    /// Create a new executor
    pub fn new(pipeline: Pipeline, config: ExecutorConfig, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            pipeline,
            config,
            reporter,
        }
    }

    /// Run a task and its dependencies.
    ///
    /// `Ok(Outcome::Error)` means a command failed somewhere in the tree;
    /// `Err` is fatal and aborts the invocation.
    pub async fn run(&self, name: &str) -> Result<Outcome> {
        let task = self.pipeline.resolve(name)?;
        let mut stack = Vec::new();
        self.run_task(task, &mut stack).await
    }

    fn run_task<'a>(
        &'a self,
        task: &'a Task,
        stack: &'a mut Vec<String>,
    ) -> LocalBoxFuture<'a, Result<Outcome>> {
        async move {
            if let Some(start) = stack.iter().position(|key| key == &task.key) {
                let mut cycle = stack[start..].to_vec();
                cycle.push(task.key.clone());
                return Err(RunnerError::CyclicDependency {
                    cycle: cycle.join(" -> "),
                });
            }

            let directory = task
                .directory
                .as_deref()
                .map(|dir| environment::resolve_path(&self.config.cwd, dir));

            if let Some(dir) = &directory {
                if !dir.is_dir() {
                    tracing::debug!(task = %task.key, dir = %dir.display(), "creating directory");
                    tokio::fs::create_dir_all(dir).await.map_err(|source| {
                        RunnerError::CreateDirectory {
                            source,
                            path: dir.clone(),
                        }
                    })?;
                }
            }

            stack.push(task.key.clone());

            let mut failed = false;
            for name in &task.depends {
                let dependency = self.pipeline.resolve(name)?;

                if failed {
                    self.reporter.status(&dependency.name, Status::Skipped, None);
                    continue;
                }

                if self.run_task(dependency, stack).await? == Outcome::Error {
                    failed = true;
                }
            }

            stack.pop();

            if failed {
                self.reporter.status(&task.name, Status::Skipped, None);
                return Ok(Outcome::Error);
            }

            let cwd = directory.as_deref().unwrap_or(&self.config.cwd);
            self.run_commands(task, cwd).await
        }
        .boxed_local()
    }

    /// Run the task's own commands, stopping at the first failure
    async fn run_commands(&self, task: &Task, cwd: &Path) -> Result<Outcome> {
        // Dotenv files are only read once there is a command to pass them to
        let env = if task.commands.is_empty() {
            HashMap::new()
        } else {
            environment::compose(&self.pipeline, task, &self.config.cwd)?
        };
        let spinner = self.spinner(task);
        let start = Instant::now();

        for command in &task.commands {
            spinner.suspend(|| self.reporter.debug(&format!("$ {command}")));

            let success = self
                .execute_command(command, &env, cwd, task.output, &spinner)
                .await?;

            if !success {
                spinner.finish_and_clear();
                self.reporter
                    .status(&task.name, Status::Error, Some(start.elapsed()));
                return Ok(Outcome::Error);
            }
        }

        spinner.finish_and_clear();
        self.reporter
            .status(&task.name, Status::Ok, Some(start.elapsed()));
        Ok(Outcome::Ok)
    }

    /// Execute a single command, returning whether it exited successfully
    async fn execute_command(
        &self,
        command: &str,
        env: &HashMap<String, String>,
        cwd: &Path,
        stream: bool,
        spinner: &ProgressBar,
    ) -> Result<bool> {
        let mut process = shell_command(command);
        process.current_dir(cwd).envs(env);

        if stream {
            let status = process
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .await?;

            tracing::debug!(command, code = ?status.code(), "command finished");
            return Ok(status.success());
        }

        let output = process
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        tracing::debug!(command, code = ?output.status.code(), "command finished");

        for captured in [&output.stdout, &output.stderr] {
            let text = String::from_utf8_lossy(captured);
            let text = text.trim();
            if !text.is_empty() {
                spinner.suspend(|| self.reporter.debug(text));
            }
        }

        Ok(output.status.success())
    }

    fn spinner(&self, task: &Task) -> ProgressBar {
        if task.output || self.config.verbose || !self.config.progress || task.commands.is_empty() {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Running {}", task.name));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

/// Build a command that runs `cmd` through the platform shell
fn shell_command(cmd: &str) -> Command {
    let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
    let mut command = Command::new(shell);
    command.arg(flag).arg(cmd);
    command
}
