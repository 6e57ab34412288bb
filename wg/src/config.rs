// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! Runtime configuration.
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration:
//!
//! ```
//! use wg::config::Config;
//!
//! let config = Config::from_json(r#"{ "task_pool": { "max_threads": 8 } }"#).unwrap();
//! assert_eq!(config.task_pool.max_threads, Some(8));
//! assert_eq!(config.pipeline.container_name, "wg_source");
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::locator::Rank;
use crate::Result;

/// Environment variable naming a JSON configuration file.
pub const CONFIG_ENV: &str = "WG_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub task_pool: TaskPoolConfig,
    pub locator: LocatorConfig,
    pub pipeline: PipelineConfig,
}

/// Thread creation settings for [`crate::TaskPool`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPoolConfig {
    /// Name given to every spawned thread.
    pub thread_name: String,

    /// Stack size in bytes; platform default when unset.
    pub stack_size: Option<usize>,

    /// Maximum number of tasks alive at once. Unbounded when unset, which
    /// leaves admission control to the framework submitting the tasks.
    pub max_threads: Option<usize>,
}

impl Default for TaskPoolConfig {
    fn default() -> Self {
        TaskPoolConfig {
            thread_name: "wg-task".to_owned(),
            stack_size: None,
            max_threads: None,
        }
    }
}

/// Registry query settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Factories ranked below this are never selected.
    pub min_rank: Rank,
}

/// Pipeline builder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name of the container created for each source.
    pub container_name: String,

    /// Bound on the wait for the paused transition, in milliseconds. The
    /// builder waits forever when unset.
    pub state_timeout_ms: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            container_name: "wg_source".to_owned(),
            state_timeout_ms: None,
        }
    }
}

impl PipelineConfig {
    pub fn state_timeout(&self) -> Option<Duration> {
        self.state_timeout_ms.map(Duration::from_millis)
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading configuration");
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Loads the file named by [`CONFIG_ENV`], or the defaults when the
    /// variable is not set.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_yields_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.task_pool.thread_name, "wg-task");
        assert_eq!(config.task_pool.max_threads, None);
        assert_eq!(config.locator.min_rank, Rank::MARGINAL);
        assert_eq!(config.pipeline.state_timeout(), None);
    }

    #[test]
    fn partial_sections_are_merged_with_defaults() {
        let config = Config::from_json(
            r#"{ "locator": { "min_rank": 128 }, "pipeline": { "state_timeout_ms": 250 } }"#,
        )
        .unwrap();
        assert_eq!(config.locator.min_rank, Rank::SECONDARY);
        assert_eq!(config.pipeline.container_name, "wg_source");
        assert_eq!(config.pipeline.state_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            Config::from_json("{ task_pool"),
            Err(crate::Error::Json(_))
        ));
    }

    #[test]
    fn file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "task_pool": {{ "thread_name": "wg-file", "max_threads": 3 }} }}"#)
            .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.task_pool.thread_name, "wg-file");
        assert_eq!(config.task_pool.max_threads, Some(3));
        assert_eq!(config.pipeline, PipelineConfig::default());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::from_file(dir.path().join("absent.json")),
            Err(crate::Error::Io(_))
        ));
    }

    // Only test that touches WG_CONFIG.
    #[test]
    fn environment_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "pipeline": {{ "container_name": "from_env" }} }}"#).unwrap();

        unsafe { std::env::set_var(CONFIG_ENV, file.path()) };
        let loaded = Config::from_env();
        unsafe { std::env::remove_var(CONFIG_ENV) };
        assert_eq!(loaded.unwrap().pipeline.container_name, "from_env");

        assert_eq!(Config::from_env().unwrap(), Config::default());
    }
}
