//! Watch mode.
//!
//! Runs the requested criteria once, then reruns the tests related to each
//! debounced batch of changed files. Every batch gets a freshly built project
//! snapshot. Dependents of deleted files are taken from the previous snapshot,
//! since the new one no longer has a node for them.

use crate::affected::transitive_dependents;
use crate::affected::watcher::{is_config_file, DirtyTracker, FileWatcher, WatcherConfig, CONFIG_FILE_NAMES};
use crate::error::Result;
use crate::normalize::relative_display;
use crate::project::Project;
use crate::select::SelectionCriterion;
use crate::session::Session;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Watch until Ctrl-C.
///
/// # Errors
/// Fails if the first snapshot cannot be built or the watcher cannot start.
/// Later snapshot failures are logged and the batch is skipped.
pub async fn watch(session: &Session, criteria: &[SelectionCriterion]) -> Result<()> {
    let mut project = session.load()?;
    run_and_report(session, &project, criteria).await?;

    let mut watcher = FileWatcher::start(WatcherConfig::new(project.root().to_path_buf()))?;
    let mut tracker = DirtyTracker::new();
    let mut config_files = config_candidates(session, &project);
    for path in &config_files {
        tracker.remember_config(path);
    }

    loop {
        if session.is_cancelled() {
            break;
        }

        let batch = tokio::select! {
            batch = watcher.next_batch() => batch,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(batch) = batch else {
            break;
        };

        for path in batch {
            if (is_config_file(&path) || config_files.contains(&path)) && tracker.check_config_change(&path) {
                info!("config file changed: {}", path.display());
                tracker.set_config_changed();
            }
            tracker.add_dirty(path);
        }

        let (dirty, overflow, config_changed) = tracker.drain();
        if dirty.is_empty() {
            continue;
        }

        let orphaned = dependents_of_deleted(&project, &dirty);
        project = match session.load() {
            Ok(project) => project,
            Err(e) => {
                error!("cannot rebuild project: {e}");
                continue;
            }
        };

        let rerun = if overflow || config_changed {
            info!("rerunning requested tests");
            criteria.to_vec()
        } else {
            let changed: HashSet<PathBuf> = dirty.union(&orphaned).cloned().collect();
            changed_file_criteria(criteria, &changed, project.root())
        };

        if config_changed {
            config_files = config_candidates(session, &project);
            for path in &config_files {
                tracker.remember_config(path);
            }
        }

        run_and_report(session, &project, &rerun).await?;
    }

    info!("watch stopped");
    Ok(())
}

async fn run_and_report(session: &Session, project: &Project, criteria: &[SelectionCriterion]) -> Result<()> {
    let executor = Arc::new(session.executor(project)?);
    session.run(project, criteria, executor, io::stdout(), io::stderr()).await?;
    Ok(())
}

/// Criteria for a batch: tests related to the changed files, combined with
/// the caller's path patterns.
pub fn changed_file_criteria(
    requested: &[SelectionCriterion],
    dirty: &HashSet<PathBuf>,
    root: &Path,
) -> Vec<SelectionCriterion> {
    let mut changed: Vec<String> = dirty.iter().map(|p| relative_display(p, root)).collect();
    changed.sort();

    let mut criteria = vec![SelectionCriterion::RelatedToFiles(changed)];
    criteria.extend(
        requested
            .iter()
            .filter(|c| matches!(c, SelectionCriterion::PathPattern(_)))
            .cloned(),
    );
    criteria
}

/// Files that still exist and depended, directly or transitively, on a file
/// in `dirty` that is now gone.
pub fn dependents_of_deleted(previous: &Project, dirty: &HashSet<PathBuf>) -> HashSet<PathBuf> {
    let deleted: HashSet<PathBuf> = dirty.iter().filter(|p| !p.exists()).cloned().collect();
    if deleted.is_empty() {
        return HashSet::new();
    }

    let dependents: HashSet<PathBuf> = transitive_dependents(&deleted, previous.graph())
        .into_iter()
        .filter(|p| p.exists())
        .collect();
    debug!("{} deleted files, {} surviving dependents", deleted.len(), dependents.len());
    dependents
}

fn config_candidates(session: &Session, project: &Project) -> HashSet<PathBuf> {
    let root = project.root();
    let mut files: HashSet<PathBuf> = CONFIG_FILE_NAMES.iter().map(|name| root.join(name)).collect();
    files.insert(project.config().tsconfig_path(root));
    if let Some(path) = session.config_path() {
        files.insert(path.canonicalize().unwrap_or_else(|_| path.to_path_buf()));
    }
    files
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use crate::select::PathMatcher;
    use std::fs;

    #[test]
    fn batch_criteria_relate_changed_files_and_keep_patterns() {
        let requested = vec![
            SelectionCriterion::RelatedToFiles(vec!["ignored.js".into()]),
            SelectionCriterion::PathPattern(PathMatcher::compile("__tests__").unwrap()),
        ];
        let dirty: HashSet<PathBuf> =
            [PathBuf::from("/p/src/b.js"), PathBuf::from("/p/a.js")].into_iter().collect();

        let criteria = changed_file_criteria(&requested, &dirty, Path::new("/p"));
        assert_eq!(criteria.len(), 2);
        match &criteria[0] {
            SelectionCriterion::RelatedToFiles(files) => assert_eq!(files, &vec!["a.js", "src/b.js"]),
            other => panic!("unexpected criterion: {other:?}"),
        }
        assert!(matches!(&criteria[1], SelectionCriterion::PathPattern(m) if m.as_str() == "__tests__"));
    }

    #[test]
    fn batch_criteria_without_patterns() {
        let dirty: HashSet<PathBuf> = [PathBuf::from("/p/a.js")].into_iter().collect();
        let criteria = changed_file_criteria(&[SelectionCriterion::All], &dirty, Path::new("/p"));
        assert_eq!(criteria.len(), 1);
    }

    #[test]
    fn deleted_file_reruns_its_former_dependents() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "module.exports = require('./b');\n").unwrap();
        fs::write(dir.path().join("b.js"), "module.exports = 1;\n").unwrap();
        fs::write(dir.path().join("c.test.js"), "require('./c');\n").unwrap();
        fs::write(dir.path().join("c.js"), "module.exports = 3;\n").unwrap();
        fs::create_dir(dir.path().join("__tests__")).unwrap();
        fs::write(dir.path().join("__tests__/a.test.js"), "require('../a');\n").unwrap();

        let previous = Project::load(dir.path(), RunnerConfig::default()).unwrap();
        let root = previous.root().to_path_buf();
        let deleted = root.join("b.js");
        fs::remove_file(&deleted).unwrap();

        let dirty: HashSet<PathBuf> = [deleted.clone()].into_iter().collect();
        let orphaned = dependents_of_deleted(&previous, &dirty);
        let expected: HashSet<PathBuf> = [root.join("a.js"), root.join("__tests__/a.test.js")].into_iter().collect();
        assert_eq!(orphaned, expected);

        let current = Project::load(&root, RunnerConfig::default()).unwrap();
        let changed: HashSet<PathBuf> = dirty.union(&orphaned).cloned().collect();
        let selection = current.select(&changed_file_criteria(&[SelectionCriterion::All], &changed, &root));
        let names: Vec<String> = selection.tests.iter().map(|p| current.discovery().relative(p)).collect();
        assert_eq!(names, vec!["__tests__/a.test.js"]);
    }

    #[test]
    fn edits_have_no_deleted_dependents() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "").unwrap();
        let project = Project::load(dir.path(), RunnerConfig::default()).unwrap();

        let dirty: HashSet<PathBuf> = [project.root().join("a.js")].into_iter().collect();
        assert!(dependents_of_deleted(&project, &dirty).is_empty());
    }
}
