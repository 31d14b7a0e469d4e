//! File watcher and dirty tracker using notify-rs.
//!
//! Monitors the project for file changes and hands them to watch mode in
//! debounced batches.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Maximum dirty set size before triggering overflow.
pub const MAX_DIRTY_FILES: usize = 500;
/// Debounce interval in milliseconds.
const DEBOUNCE_MS: u64 = 100;
/// Capacity of the event channel.
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Dirty file tracker with overflow protection.
///
/// Owned by the watch loop, so plain fields suffice.
#[derive(Debug, Default)]
pub struct DirtyTracker {
    dirty: HashSet<PathBuf>,
    overflow: bool,
    config_changed: bool,
    config_hashes: HashMap<PathBuf, blake3::Hash>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dirty file. Returns true if overflow triggered.
    pub fn add_dirty(&mut self, path: PathBuf) -> bool {
        if self.dirty.contains(&path) {
            return self.overflow;
        }

        if self.dirty.len() >= MAX_DIRTY_FILES {
            if !self.overflow {
                warn!("dirty set exceeded {MAX_DIRTY_FILES} files, rerunning requested tests");
                self.overflow = true;
            }
            return true;
        }

        self.dirty.insert(path);
        false
    }

    /// Drain and return all dirty files. Clears the set.
    /// Returns (files, overflow, `config_changed`).
    pub fn drain(&mut self) -> (HashSet<PathBuf>, bool, bool) {
        let files = std::mem::take(&mut self.dirty);
        let was_overflow = std::mem::take(&mut self.overflow);
        let was_config_changed = std::mem::take(&mut self.config_changed);
        (files, was_overflow, was_config_changed)
    }

    /// Mark that a config file has changed.
    pub fn set_config_changed(&mut self) {
        self.config_changed = true;
    }

    /// Record the current hash of a config file without reporting a change.
    pub fn remember_config(&mut self, path: &Path) {
        if let Ok(content) = std::fs::read(path) {
            self.config_hashes.insert(path.to_path_buf(), blake3::hash(&content));
        }
    }

    /// Check if a config file changed by comparing content hashes.
    ///
    /// The first sighting of a file only records its hash.
    pub fn check_config_change(&mut self, path: &Path) -> bool {
        let Ok(content) = std::fs::read(path) else {
            return false;
        };

        let hash = blake3::hash(&content);
        match self.config_hashes.insert(path.to_path_buf(), hash) {
            Some(old) => old != hash,
            None => false,
        }
    }
}

/// Configuration for the file watcher.
#[derive(Clone)]
pub struct WatcherConfig {
    pub workspace_root: PathBuf,
    pub gitignore: Option<Gitignore>,
}

impl WatcherConfig {
    /// Create watcher config with gitignore from workspace root.
    pub fn new(workspace_root: PathBuf) -> Self {
        let gitignore = load_gitignore(&workspace_root);
        Self { workspace_root, gitignore }
    }

    /// Check if a path should be ignored.
    pub fn should_ignore(&self, path: &Path) -> bool {
        if path
            .components()
            .any(|c| c.as_os_str() == "node_modules" || c.as_os_str() == ".git")
        {
            return true;
        }

        let (Some(gi), Ok(relative)) = (&self.gitignore, path.strip_prefix(&self.workspace_root)) else {
            return false;
        };
        gi.matched_path_or_any_parents(relative, path.is_dir()).is_ignore()
    }
}

fn load_gitignore(workspace_root: &Path) -> Option<Gitignore> {
    let gitignore_path = workspace_root.join(".gitignore");
    if !gitignore_path.exists() {
        return None;
    }

    let mut builder = GitignoreBuilder::new(workspace_root);
    if builder.add(&gitignore_path).is_some() {
        return None;
    }

    builder.build().ok()
}

/// A running watcher delivering changed paths.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<PathBuf>,
}

impl FileWatcher {
    /// Start watching `config.workspace_root` recursively.
    ///
    /// # Errors
    /// Returns the notify error if the platform watcher cannot be created.
    pub fn start(config: WatcherConfig) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let root = config.workspace_root.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    for path in event.paths {
                        let canonical = path.canonicalize().unwrap_or(path);
                        if !config.should_ignore(&canonical) {
                            let _ = tx.blocking_send(canonical);
                        }
                    }
                }
                Err(e) => warn!("watcher error: {e}"),
            },
            Config::default().with_poll_interval(Duration::from_millis(DEBOUNCE_MS)),
        )?;

        watcher.watch(&root, RecursiveMode::Recursive)?;
        info!("watching {}", root.display());

        Ok(Self { _watcher: watcher, rx })
    }

    /// Wait for the next change, then collect everything arriving within the
    /// debounce window. Returns None once the watcher has shut down.
    pub async fn next_batch(&mut self) -> Option<Vec<PathBuf>> {
        let first = self.rx.recv().await?;
        tokio::time::sleep(Duration::from_millis(DEBOUNCE_MS)).await;

        let mut batch = vec![first];
        while let Ok(path) = self.rx.try_recv() {
            batch.push(path);
        }
        Some(batch)
    }
}

/// Manifests and lockfiles whose change reruns the requested tests.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "package.json",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "bun.lock",
    "tsconfig.json",
];

/// Check if a path is a config file whose change reruns the requested tests.
pub fn is_config_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| CONFIG_FILE_NAMES.contains(&name))
}
