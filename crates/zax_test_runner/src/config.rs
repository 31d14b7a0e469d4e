//! Runner configuration.
//!
//! Read from the `"zax"` key of the project's `package.json`, or from a
//! standalone JSON file given on the command line. Missing file or key means
//! defaults; unknown keys are rejected.

use crate::affected::graph::DEFAULT_MAX_GRAPH_NODES;
use crate::error::{Error, Result};
use crate::select::CombineMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Key holding runner settings inside `package.json`.
const PACKAGE_JSON_KEY: &str = "zax";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct RunnerConfig {
    /// Replaces the naming convention when set; matched against the
    /// project-relative path.
    pub test_regex: Option<String>,
    /// Matched against the absolute path; matching files are never tests.
    pub test_path_ignore_patterns: Vec<String>,
    /// Extensions the module resolver tries, without the dot.
    pub module_file_extensions: Vec<String>,
    /// Relative paths are taken from the project root.
    pub tsconfig: Option<PathBuf>,
    /// Command run per test file; `{file}` is replaced by the relative path.
    pub test_command: Vec<String>,
    pub max_workers: Option<usize>,
    pub test_timeout_ms: Option<u64>,
    pub combine_mode: CombineMode,
    pub pass_with_no_tests: bool,
    pub max_graph_nodes: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            test_regex: None,
            test_path_ignore_patterns: vec!["/node_modules/".to_string()],
            module_file_extensions: ["js", "mjs", "cjs", "jsx", "ts", "tsx", "mts", "cts", "json"]
                .iter()
                .map(|e| (*e).to_string())
                .collect(),
            tsconfig: None,
            test_command: vec!["node".to_string(), "{file}".to_string()],
            max_workers: None,
            test_timeout_ms: None,
            combine_mode: CombineMode::default(),
            pass_with_no_tests: false,
            max_graph_nodes: DEFAULT_MAX_GRAPH_NODES,
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub max_workers: Option<usize>,
    pub pass_with_no_tests: bool,
    pub combine_mode: Option<CombineMode>,
}

impl RunnerConfig {
    /// Load configuration for `root`.
    ///
    /// With `config_path` the whole file is the configuration; otherwise the
    /// `"zax"` key of `<root>/package.json` is used when present.
    ///
    /// # Errors
    /// Returns `Error::Io` for an unreadable explicit file and `Error::Config`
    /// for malformed JSON, unknown keys or invalid values.
    pub fn load(root: &Path, config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
                serde_json::from_str(&content)
                    .map_err(|e| Error::config(e.to_string(), Some(path.to_path_buf())))?
            }
            None => Self::from_package_json(&root.join("package.json"))?,
        };
        config.validate(config_path)?;
        Ok(config)
    }

    /// Load and apply command-line overrides.
    ///
    /// # Errors
    /// See [`RunnerConfig::load`].
    pub fn load_with(root: &Path, config_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = Self::load(root, config_path)?;
        config.apply(overrides);
        config.validate(config_path)?;
        Ok(config)
    }

    fn from_package_json(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no package.json, using default config");
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::io(path, e)),
        };

        let mut manifest: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| Error::config(e.to_string(), Some(path.to_path_buf())))?;

        match manifest.get_mut(PACKAGE_JSON_KEY).map(serde_json::Value::take) {
            Some(value) => serde_json::from_value(value).map_err(|e| {
                Error::config(format!("\"{PACKAGE_JSON_KEY}\": {e}"), Some(path.to_path_buf()))
            }),
            None => Ok(Self::default()),
        }
    }

    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(workers) = overrides.max_workers {
            self.max_workers = Some(workers);
        }
        if overrides.pass_with_no_tests {
            self.pass_with_no_tests = true;
        }
        if let Some(mode) = overrides.combine_mode {
            self.combine_mode = mode;
        }
    }

    fn validate(&self, path: Option<&Path>) -> Result<()> {
        let path = path.map(Path::to_path_buf);
        if self.test_command.is_empty() {
            return Err(Error::config("testCommand must name a program", path));
        }
        if self.max_workers == Some(0) {
            return Err(Error::config("maxWorkers must be at least 1", path));
        }
        if self.test_timeout_ms == Some(0) {
            return Err(Error::config("testTimeoutMs must be positive", path));
        }
        Ok(())
    }

    /// The tsconfig to consult: configured, else `<root>/tsconfig.json`.
    pub fn tsconfig_path(&self, root: &Path) -> PathBuf {
        match &self.tsconfig {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => root.join(p),
            None => root.join("tsconfig.json"),
        }
    }

    /// Configured worker count, else the machine's parallelism.
    pub fn workers(&self) -> usize {
        self.max_workers.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.test_timeout_ms.map(Duration::from_millis)
    }
}
