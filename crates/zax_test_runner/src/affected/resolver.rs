//! Import path resolver using `oxc_resolver`.
//!
//! Resolves import specifiers to canonical absolute paths, handling tsconfig
//! paths, package.json exports, and the usual node resolution rules.

use crate::normalize::truncate_for_log;
use oxc_resolver::{ResolveOptions, Resolver, TsconfigDiscovery, TsconfigOptions, TsconfigReferences};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maximum specifier length for logging.
const MAX_SPECIFIER_LOG_LENGTH: usize = 256;

/// Maps `(importing file, specifier)` to the canonical path of the imported module.
///
/// `None` means the import is not tracked: missing files, bare packages that
/// resolve outside the project, and anything else that fails resolution.
pub trait ModuleResolver {
    fn resolve(&self, from: &Path, specifier: &str) -> Option<PathBuf>;
}

/// Path resolver for TypeScript/JavaScript imports.
pub struct PathResolver {
    resolver: Resolver,
    workspace_root: PathBuf,
}

impl PathResolver {
    /// Create a resolver for `workspace_root`.
    ///
    /// `extensions` are bare extensions (`"js"`, `"ts"`) tried in order.
    /// `tsconfig` is only consulted when the file exists.
    pub fn new(workspace_root: &Path, extensions: &[String], tsconfig: Option<PathBuf>) -> Self {
        let tsconfig = tsconfig.filter(|p| p.is_file());
        let workspace_root = workspace_root
            .canonicalize()
            .unwrap_or_else(|_| workspace_root.to_path_buf());
        Self {
            resolver: Resolver::new(build_resolve_options(extensions, tsconfig)),
            workspace_root,
        }
    }
}

impl ModuleResolver for PathResolver {
    fn resolve(&self, from: &Path, specifier: &str) -> Option<PathBuf> {
        let from_dir = from.parent()?;

        let Ok(resolution) = self.resolver.resolve(from_dir, specifier) else {
            log_unresolvable(from, specifier);
            return None;
        };

        let Ok(canonical) = resolution.into_path_buf().canonicalize() else {
            log_unresolvable(from, specifier);
            return None;
        };

        if !canonical.starts_with(&self.workspace_root) {
            debug!(
                "'{}' from {} resolves outside workspace to {}",
                truncate_str(specifier),
                truncate_for_log(from),
                truncate_for_log(&canonical)
            );
            return None;
        }

        Some(canonical)
    }
}

fn build_resolve_options(extensions: &[String], tsconfig: Option<PathBuf>) -> ResolveOptions {
    ResolveOptions {
        extensions: extensions
            .iter()
            .map(|ext| format!(".{}", ext.trim_start_matches('.')))
            .collect(),
        main_files: vec!["index".into()],
        condition_names: vec![
            "require".into(),
            "import".into(),
            "node".into(),
            "default".into(),
        ],
        tsconfig: tsconfig.map(|config_file| {
            TsconfigDiscovery::Manual(TsconfigOptions {
                config_file,
                references: TsconfigReferences::Disabled,
            })
        }),
        ..Default::default()
    }
}

fn truncate_str(s: &str) -> &str {
    if s.len() <= MAX_SPECIFIER_LOG_LENGTH {
        return s;
    }
    let mut end = MAX_SPECIFIER_LOG_LENGTH;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn log_unresolvable(from: &Path, specifier: &str) {
    debug!(
        "cannot resolve '{}' from {}",
        truncate_str(specifier),
        truncate_for_log(from)
    );
}
