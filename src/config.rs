//! Configuration parsing for task.yml
//!
//! Loads the pipeline definition and resolves every task's defaults up
//! front, so the [`Pipeline`] handed to the executor is immutable.

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, RunnerError};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "task.yml";

/// Root of the YAML document as written by the user
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PipelineConfig {
    /// Path to a dotenv file loaded for every task
    #[serde(default)]
    dotenv: Option<PathBuf>,

    /// Global environment variables
    #[serde(default, deserialize_with = "string_map")]
    environment: HashMap<String, String>,

    /// Task definitions, in declaration order
    #[serde(default, deserialize_with = "ordered_tasks")]
    tasks: Vec<(String, TaskConfig)>,
}

/// A single task as written in the YAML document
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaskConfig {
    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    description: Option<String>,

    #[serde(default)]
    directory: Option<PathBuf>,

    #[serde(default)]
    output: bool,

    #[serde(default)]
    commands: Vec<String>,

    #[serde(default)]
    depends: Vec<String>,

    #[serde(default)]
    dotenv: Option<PathBuf>,

    #[serde(default, deserialize_with = "string_map")]
    environment: HashMap<String, String>,
}

/// The loaded task pipeline
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    /// Path to the global dotenv file, as written
    pub dotenv: Option<PathBuf>,
    /// Global environment variables
    pub environment: HashMap<String, String>,
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
}

/// A task with all of its defaults resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Key of the task in the pipeline
    pub key: String,
    /// Name shown in status lines, defaults to `key`
    pub name: String,
    pub description: Option<String>,
    /// Directory the commands run in, created if missing
    pub directory: Option<PathBuf>,
    /// Stream command output instead of capturing it
    pub output: bool,
    pub commands: Vec<String>,
    pub depends: Vec<String>,
    pub dotenv: Option<PathBuf>,
    pub environment: HashMap<String, String>,
}

impl Pipeline {
    /// Load `config` from `working_dir`.
    ///
    /// Returns the pipeline and the path it was read from.
    pub fn load(working_dir: &Path, config: &str) -> Result<(Self, PathBuf)> {
        let path = working_dir.join(config);
        if !path.is_file() {
            return Err(RunnerError::ConfigNotFound {
                name: config.to_string(),
                dir: working_dir.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(&path)?;
        let pipeline = Self::from_yaml(&content, &path)?;

        tracing::debug!(
            path = %path.display(),
            tasks = pipeline.tasks.len(),
            "loaded pipeline"
        );

        Ok((pipeline, path))
    }

    /// Parse a pipeline from YAML text; `path` is only used for errors
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        // Syntax errors and shape errors are reported separately
        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| RunnerError::ConfigParse {
                source: e,
                path: path.to_path_buf(),
            })?;

        let config = if value.is_null() {
            PipelineConfig::default()
        } else {
            serde_yaml::from_value(value).map_err(|e| RunnerError::InvalidPipeline {
                source: e,
                path: path.to_path_buf(),
            })?
        };

        Ok(Self::from_config(config))
    }

    fn from_config(config: PipelineConfig) -> Self {
        let mut tasks = Vec::with_capacity(config.tasks.len());
        let mut index = HashMap::with_capacity(config.tasks.len());

        for (key, task) in config.tasks {
            index.insert(key.clone(), tasks.len());
            tasks.push(Task {
                name: task.name.unwrap_or_else(|| key.clone()),
                key,
                description: task.description,
                directory: task.directory,
                output: task.output,
                commands: task.commands,
                depends: task.depends,
                dotenv: task.dotenv,
                environment: task.environment,
            });
        }

        Self {
            dotenv: config.dotenv,
            environment: config.environment,
            tasks,
            index,
        }
    }

    /// Look up a task by its key
    pub fn resolve(&self, name: &str) -> Result<&Task> {
        self.index
            .get(name)
            .map(|&i| &self.tasks[i])
            .ok_or_else(|| RunnerError::UnknownTask {
                name: name.to_string(),
                available: self.task_names().map(str::to_string).collect(),
            })
    }

    /// All tasks in declaration order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// All task keys in declaration order
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.key.as_str())
    }
}

/// Deserialize the `tasks` mapping while keeping declaration order
fn ordered_tasks<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, TaskConfig)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TasksVisitor;

    impl<'de> Visitor<'de> for TasksVisitor {
        type Value = Vec<(String, TaskConfig)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a mapping of task names to tasks")
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut tasks = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, task)) = map.next_entry::<String, Option<TaskConfig>>()? {
                tasks.push((name, task.unwrap_or_default()));
            }
            Ok(tasks)
        }
    }

    deserializer.deserialize_any(TasksVisitor)
}

/// Environment values may be written as numbers or booleans; keep them as text
fn string_map<'de, D>(deserializer: D) -> std::result::Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, serde_yaml::Value>> = Option::deserialize(deserializer)?;

    raw.unwrap_or_default()
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Null => String::new(),
                _ => {
                    return Err(de::Error::custom(format!(
                        "environment variable {key} must be a scalar value"
                    )))
                }
            };
            Ok((key, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<Pipeline> {
        Pipeline::from_yaml(yaml, Path::new("task.yml"))
    }

    #[test]
    fn test_parse_pipeline() {
        let yaml = r#"
dotenv: .env
environment:
  APP_ENV: test
  RETRIES: 3
tasks:
  download:
    name: download source code
    description: Fetch the sources
    directory: build
    commands:
      - git clone repo .
  install:
    description: Install the application
    output: true
    depends: [download]
    dotenv: config/.env
    environment:
      DEBUG: true
    commands:
      - make install
"#;

        let pipeline = parse(yaml).unwrap();
        assert_eq!(pipeline.dotenv, Some(PathBuf::from(".env")));
        assert_eq!(pipeline.environment["APP_ENV"], "test");
        assert_eq!(pipeline.environment["RETRIES"], "3");

        let download = pipeline.resolve("download").unwrap();
        assert_eq!(download.name, "download source code");
        assert_eq!(download.directory, Some(PathBuf::from("build")));
        assert!(!download.output);

        let install = pipeline.resolve("install").unwrap();
        assert_eq!(install.name, "install");
        assert!(install.output);
        assert_eq!(install.depends, vec!["download"]);
        assert_eq!(install.dotenv, Some(PathBuf::from("config/.env")));
        assert_eq!(install.environment["DEBUG"], "true");
    }

    #[test]
    fn test_tasks_keep_declaration_order() {
        let yaml = r#"
tasks:
  zeta: {}
  alpha: {}
  mid:
    commands: [echo mid]
"#;

        let pipeline = parse(yaml).unwrap();
        let names: Vec<_> = pipeline.task_names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_resolve_is_stable() {
        let pipeline = parse("tasks:\n  build:\n    commands: [make]\n").unwrap();

        let first = pipeline.resolve("build").unwrap().clone();
        let second = pipeline.resolve("build").unwrap();
        assert_eq!(first.name, "build");
        assert_eq!(&first, second);
    }

    #[test]
    fn test_resolve_unknown_task() {
        let pipeline = parse("tasks:\n  build: {}\n").unwrap();

        match pipeline.resolve("deploy") {
            Err(RunnerError::UnknownTask { name, available }) => {
                assert_eq!(name, "deploy");
                assert_eq!(available, vec!["build"]);
            }
            other => panic!("expected UnknownTask, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_document() {
        let pipeline = parse("").unwrap();
        assert_eq!(pipeline.tasks().count(), 0);

        let pipeline = parse("tasks:\n").unwrap();
        assert_eq!(pipeline.tasks().count(), 0);
    }

    #[test]
    fn test_task_without_body() {
        let pipeline = parse("tasks:\n  noop:\n").unwrap();
        let noop = pipeline.resolve("noop").unwrap();
        assert!(noop.commands.is_empty());
        assert_eq!(noop.name, "noop");
    }

    #[test]
    fn test_invalid_syntax() {
        let result = parse("tasks: [build");
        assert!(matches!(result, Err(RunnerError::ConfigParse { .. })));
    }

    #[test]
    fn test_duplicate_task_key() {
        let result = parse("tasks:\n  a: {}\n  a:\n    commands: [make]\n");
        assert!(matches!(result, Err(RunnerError::ConfigParse { .. })));
    }

    #[test]
    fn test_invalid_pipeline_shape() {
        assert!(matches!(
            parse("tasks: foo"),
            Err(RunnerError::InvalidPipeline { .. })
        ));
        assert!(matches!(
            parse("tasks:\n  build:\n    commandz: [make]\n"),
            Err(RunnerError::InvalidPipeline { .. })
        ));
        assert!(matches!(
            parse("environment:\n  NESTED: {a: b}\n"),
            Err(RunnerError::InvalidPipeline { .. })
        ));
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let result = Pipeline::load(dir.path(), CONFIG_FILE);
        assert!(matches!(result, Err(RunnerError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_load_from_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("other.yml"), "tasks:\n  a: {}\n").unwrap();

        let (pipeline, path) = Pipeline::load(dir.path(), "other.yml").unwrap();
        assert_eq!(path, dir.path().join("other.yml"));
        assert!(pipeline.resolve("a").is_ok());
    }
}
