//! Environment composition for task commands
//!
//! A command sees the parent process environment plus four layers, each
//! overriding the ones before it:
//!
//! 1. the pipeline dotenv file
//! 2. the pipeline `environment`
//! 3. the task dotenv file
//! 4. the task `environment`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::{Pipeline, Task};
use crate::error::{Result, RunnerError};

/// Merge the environment layers for `task`.
///
/// Relative dotenv paths are resolved against `working_dir`.
pub fn compose(
    pipeline: &Pipeline,
    task: &Task,
    working_dir: &Path,
) -> Result<HashMap<String, String>> {
    let mut env = HashMap::new();

    if let Some(dotenv) = &pipeline.dotenv {
        env.extend(load_dotenv(&resolve_path(working_dir, dotenv))?);
    }
    env.extend(pipeline.environment.clone());

    if let Some(dotenv) = &task.dotenv {
        env.extend(load_dotenv(&resolve_path(working_dir, dotenv))?);
    }
    env.extend(task.environment.clone());

    tracing::debug!(
        task = %task.key,
        vars = ?env.keys().collect::<Vec<_>>(),
        "composed environment"
    );

    Ok(env)
}

/// Join `path` onto `working_dir` unless it is already absolute
pub fn resolve_path(working_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    }
}

/// Read a dotenv file without touching the process environment
pub fn load_dotenv(path: &Path) -> Result<HashMap<String, String>> {
    if !path.is_file() {
        return Err(RunnerError::DotenvNotFound {
            path: path.to_path_buf(),
        });
    }

    let to_error = |source| RunnerError::Dotenv {
        source,
        path: path.to_path_buf(),
    };

    dotenvy::from_path_iter(path)
        .map_err(to_error)?
        .map(|item| item.map_err(to_error))
        .collect()
}
