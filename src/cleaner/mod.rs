//! Cache cleanup: per-project deletion, toolchain-delegated purges and
//! prunes, guarded arbitrary-directory deletion, and the nested cache sweep.
//!
//! Every operation is one-shot with a terminal [`CleanupOutcome`]; partial
//! success across projects is expected and surfaced per request.

mod outcome;

pub use outcome::CleanupOutcome;

use crate::ecosystem::Ecosystem;
use crate::error::SweepError;
use crate::exec::{require_tool, ToolLocator};
use crate::fsops;
use crate::project::Project;
use humansize::{format_size, BINARY};
use rayon::prelude::*;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// System prefixes the arbitrary-directory deletion refuses to touch.
/// `/` is matched exactly; the rest guard their whole subtree.
const PROTECTED_PREFIXES: &[&str] = &[
    "/bin", "/boot", "/dev", "/etc", "/lib", "/proc", "/run", "/sbin", "/sys", "/usr", "/var",
];

/// Result of one nested cache sweep.
#[derive(Debug, Default)]
pub struct NestedSweep {
    /// Bytes reclaimed across all deleted directories.
    pub reclaimed_bytes: u64,
    /// Directories that were deleted.
    pub deleted: Vec<PathBuf>,
    /// Per-directory errors; the sweep continues past them.
    pub errors: Vec<SweepError>,
}

impl NestedSweep {
    /// First deletion failure, if any. An enumeration problem just shrinks
    /// the walk; a matched directory that survived deletion does not.
    pub fn deletion_failure(&self) -> Option<&SweepError> {
        self.errors
            .iter()
            .find(|e| matches!(e, SweepError::Deletion { .. }))
    }
}

/// Aggregate of a batch cleanup run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub reclaimed_bytes: u64,
}

/// Applies per-ecosystem cleanup strategies.
#[derive(Debug, Clone)]
pub struct CacheCleaner {
    locator: ToolLocator,
}

impl CacheCleaner {
    pub fn new(locator: ToolLocator) -> Self {
        Self { locator }
    }

    /// Delete the project-local cache subtrees of one project.
    ///
    /// Measures before deleting so the reported reclaimed size is exact.
    /// Nothing to delete is Skipped, which makes repeated invocations
    /// idempotent; a filesystem error is Failed with the OS error text.
    pub fn clean_project_caches(&self, project: &Project) -> CleanupOutcome {
        let mut reclaimed = 0u64;
        let mut removed = 0usize;

        for dir_name in project.ecosystem.cache_dirs() {
            let cache = project.root.join(dir_name);
            if !cache.is_dir() {
                continue;
            }

            let size = fsops::tree_size_or_zero(&cache);
            if let Err(e) = std::fs::remove_dir_all(&cache) {
                return CleanupOutcome::failed(format!(
                    "failed to delete '{}': {e}",
                    cache.display()
                ));
            }
            tracing::info!(path = %cache.display(), size, "deleted cache directory");
            reclaimed += size;
            removed += 1;
        }

        if let Some(nested) = project.ecosystem.nested_cache_dir() {
            let sweep =
                sweep_nested_dirs(&project.root, nested, project.ecosystem.cache_dirs());
            reclaimed += sweep.reclaimed_bytes;
            removed += sweep.deleted.len();
            if let Some(failure) = sweep.deletion_failure() {
                return CleanupOutcome::failed(failure.to_string());
            }
            for error in &sweep.errors {
                tracing::debug!(%error, "nested sweep skipped a subtree");
            }
        }

        if removed == 0 {
            return CleanupOutcome::skipped(format!(
                "no cache directories present under '{}'",
                project.root.display()
            ));
        }

        CleanupOutcome::success(
            format!(
                "removed {removed} cache director{} ({})",
                if removed == 1 { "y" } else { "ies" },
                format_size(reclaimed, BINARY)
            ),
            reclaimed,
        )
    }

    /// Run the ecosystem's global cache purge through its own toolchain.
    ///
    /// Ecosystems without a global purge are Skipped. Reclaimed bytes are
    /// reported as 0 because the toolchain does not say how much it removed.
    pub fn clean_global_cache(&self, ecosystem: Ecosystem) -> CleanupOutcome {
        let Some(args) = ecosystem.global_purge_args() else {
            return CleanupOutcome::skipped(format!(
                "{} has no global cache purge",
                ecosystem.display_name()
            ));
        };

        self.run_toolchain(ecosystem, args, None, "global cache purged")
    }

    /// Run the ecosystem's unused-dependency prune in the project directory.
    pub fn prune_dependencies(&self, project: &Project) -> CleanupOutcome {
        let Some(args) = project.ecosystem.prune_args() else {
            return CleanupOutcome::skipped(format!(
                "{} has no dependency prune command",
                project.ecosystem.display_name()
            ));
        };

        self.run_toolchain(
            project.ecosystem,
            args,
            Some(&project.root),
            "unused dependencies pruned",
        )
    }

    fn run_toolchain(
        &self,
        ecosystem: Ecosystem,
        args: &[&str],
        working_dir: Option<&Path>,
        success_message: &str,
    ) -> CleanupOutcome {
        let tool = match require_tool(&self.locator, ecosystem.tool()) {
            Ok(path) => path,
            Err(e) => return CleanupOutcome::failed(e.to_string()),
        };

        match self.locator.runner().run(
            &tool.to_string_lossy(),
            args,
            working_dir,
            self.locator.env(),
        ) {
            Ok(_) => CleanupOutcome::success(success_message, 0),
            Err(e) => CleanupOutcome::failed(e.to_string()),
        }
    }

    /// Delete an arbitrary directory chosen by the user.
    ///
    /// Refuses, before any filesystem mutation, paths that resolve to or
    /// under a protected system prefix.
    pub fn delete_directory(&self, path: &Path) -> CleanupOutcome {
        let resolved = match path.canonicalize() {
            Ok(p) => p,
            Err(_) => {
                return CleanupOutcome::skipped(format!(
                    "'{}' does not exist",
                    path.display()
                ))
            }
        };

        if let Some(reason) = protection_reason(&resolved) {
            return CleanupOutcome::failed(reason);
        }

        if !resolved.is_dir() {
            return CleanupOutcome::failed(format!("'{}' is not a directory", resolved.display()));
        }

        let size = fsops::tree_size_or_zero(&resolved);
        match std::fs::remove_dir_all(&resolved) {
            Ok(()) => CleanupOutcome::success(
                format!(
                    "deleted '{}' ({})",
                    resolved.display(),
                    format_size(size, BINARY)
                ),
                size,
            ),
            Err(e) => {
                CleanupOutcome::failed(format!("failed to delete '{}': {e}", resolved.display()))
            }
        }
    }

    /// Clean many projects with a bounded worker pool.
    ///
    /// Each project's cache paths are disjoint by construction, so running
    /// projects in parallel never targets overlapping paths.
    pub fn clean_projects(
        &self,
        projects: &[Project],
        parallelism: usize,
    ) -> Vec<(String, CleanupOutcome)> {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(parallelism.max(1))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                tracing::warn!(error = %e, "thread pool unavailable; cleaning serially");
                return projects
                    .iter()
                    .map(|p| (p.id.clone(), self.clean_project_caches(p)))
                    .collect();
            }
        };

        pool.install(|| {
            projects
                .par_iter()
                .map(|p| (p.id.clone(), self.clean_project_caches(p)))
                .collect()
        })
    }

    /// Aggregate batch results.
    pub fn summarize(outcomes: &[(String, CleanupOutcome)]) -> CleanupSummary {
        let mut summary = CleanupSummary::default();
        for (_, outcome) in outcomes {
            match outcome {
                CleanupOutcome::Success { reclaimed_bytes, .. } => {
                    summary.succeeded += 1;
                    summary.reclaimed_bytes += reclaimed_bytes;
                }
                CleanupOutcome::Failed { .. } => summary.failed += 1,
                CleanupOutcome::Skipped { .. } => summary.skipped += 1,
            }
        }
        summary
    }
}

/// Why a path is protected from arbitrary deletion, if it is.
fn protection_reason(resolved: &Path) -> Option<String> {
    if resolved == Path::new("/") {
        return Some("refusing to delete '/'".to_string());
    }

    for prefix in PROTECTED_PREFIXES {
        if resolved.starts_with(prefix) {
            return Some(format!(
                "refusing to delete '{}': it resolves under the protected prefix '{prefix}'",
                resolved.display()
            ));
        }
    }

    if let Some(home) = dirs::home_dir() {
        if resolved == home {
            return Some(format!(
                "refusing to delete the home directory '{}'",
                home.display()
            ));
        }
    }

    None
}

/// Measure every directory named `dir_name` under `root` without deleting
/// anything. Same traversal shape as [`sweep_nested_dirs`], minus deletion:
/// a matching directory is measured and its children are not visited.
/// `skip_dirs` names subtrees that are accounted elsewhere (the ecosystem's
/// cache directories), so nothing is counted twice.
pub fn measure_nested_dirs(root: &Path, dir_name: &str, skip_dirs: &[&str]) -> u64 {
    let mut total = 0u64;
    let mut queue: VecDeque<PathBuf> = VecDeque::new();
    queue.push_back(root.to_path_buf());

    while let Some(dir) = queue.pop_front() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name == dir_name {
                total += fsops::tree_size_or_zero(&entry.path());
            } else if !name.starts_with('.') && !skip_dirs.contains(&name.as_ref()) {
                queue.push_back(entry.path());
            }
        }
    }

    total
}

/// Delete every directory named `dir_name` under `root`.
///
/// Explicit queue-based traversal: when a directory matches it is measured
/// and deleted, and its children are never enqueued, so the walk cannot
/// enumerate a subtree it just removed. Hidden directories and `skip_dirs`
/// subtrees (handled by cache-directory deletion) are not entered.
pub fn sweep_nested_dirs(root: &Path, dir_name: &str, skip_dirs: &[&str]) -> NestedSweep {
    let mut sweep = NestedSweep::default();
    let mut queue: VecDeque<PathBuf> = VecDeque::new();
    queue.push_back(root.to_path_buf());

    while let Some(dir) = queue.pop_front() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                sweep.errors.push(SweepError::Enumeration {
                    path: dir,
                    source: e,
                });
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();

            if name == dir_name {
                let size = fsops::tree_size_or_zero(&path);
                match std::fs::remove_dir_all(&path) {
                    Ok(()) => {
                        sweep.reclaimed_bytes += size;
                        sweep.deleted.push(path);
                    }
                    Err(e) => {
                        sweep.errors.push(SweepError::Deletion { path, source: e });
                    }
                }
                // Deleted (or failed): either way, do not descend.
                continue;
            }

            if !name.starts_with('.') && !skip_dirs.contains(&name.as_ref()) {
                queue.push_back(path);
            }
        }
    }

    sweep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolConfig;
    use crate::exec::ProcessRunner;
    use std::fs;
    use tempfile::TempDir;

    fn cleaner() -> CacheCleaner {
        CacheCleaner::new(ToolLocator::new(
            ToolConfig::default(),
            ProcessRunner::default(),
        ))
    }

    fn cleaner_without_tools() -> CacheCleaner {
        let tools = ToolConfig {
            auto_detect: false,
            overrides: Default::default(),
        };
        CacheCleaner::new(ToolLocator::new(tools, ProcessRunner::default()))
    }

    fn node_project(tmp: &TempDir) -> Project {
        fs::write(tmp.path().join("package.json"), "{}").unwrap();
        Project::new(tmp.path().to_path_buf(), Ecosystem::Node)
    }

    #[test]
    fn project_cleanup_measures_then_deletes() {
        let tmp = TempDir::new().unwrap();
        let project = node_project(&tmp);

        let modules = tmp.path().join("node_modules");
        fs::create_dir(&modules).unwrap();
        fs::write(modules.join("dep.js"), "x".repeat(1200)).unwrap();

        let outcome = cleaner().clean_project_caches(&project);

        assert_eq!(outcome.reclaimed_bytes(), 1200);
        assert!(!modules.exists());
    }

    #[test]
    fn second_cleanup_is_skipped_not_failed() {
        let tmp = TempDir::new().unwrap();
        let project = node_project(&tmp);

        let modules = tmp.path().join("node_modules");
        fs::create_dir(&modules).unwrap();
        fs::write(modules.join("dep.js"), "x").unwrap();

        let first = cleaner().clean_project_caches(&project);
        assert!(first.is_success());

        let second = cleaner().clean_project_caches(&project);
        assert!(matches!(second, CleanupOutcome::Skipped { .. }));
    }

    #[test]
    fn gradle_cleanup_sums_both_cache_dirs() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("build.gradle"), "").unwrap();
        let project = Project::new(tmp.path().to_path_buf(), Ecosystem::Gradle);

        let build = tmp.path().join("build");
        let dot_gradle = tmp.path().join(".gradle");
        fs::create_dir(&build).unwrap();
        fs::create_dir(&dot_gradle).unwrap();
        fs::write(build.join("out.jar"), "x".repeat(1200)).unwrap();
        fs::write(dot_gradle.join("lock"), "x".repeat(400)).unwrap();

        let outcome = cleaner().clean_project_caches(&project);

        assert_eq!(outcome.reclaimed_bytes(), 1600);
        assert!(!build.exists());
        assert!(!dot_gradle.exists());
    }

    #[test]
    fn python_cleanup_includes_nested_pycache() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("requirements.txt"), "").unwrap();
        let project = Project::new(tmp.path().to_path_buf(), Ecosystem::Python);

        let venv = tmp.path().join("venv");
        fs::create_dir(&venv).unwrap();
        fs::write(venv.join("lib.so"), "x".repeat(500)).unwrap();

        let pkg_cache = tmp.path().join("pkg/__pycache__");
        fs::create_dir_all(&pkg_cache).unwrap();
        fs::write(pkg_cache.join("mod.pyc"), "x".repeat(300)).unwrap();

        let outcome = cleaner().clean_project_caches(&project);

        assert_eq!(outcome.reclaimed_bytes(), 800);
        assert!(!venv.exists());
        assert!(!pkg_cache.exists());
    }

    #[test]
    fn go_project_has_nothing_local_to_clean() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("go.mod"), "module x\n").unwrap();
        let project = Project::new(tmp.path().to_path_buf(), Ecosystem::Go);

        let outcome = cleaner().clean_project_caches(&project);
        assert!(matches!(outcome, CleanupOutcome::Skipped { .. }));
    }

    #[test]
    fn global_purge_without_tool_names_the_tool() {
        let outcome = cleaner_without_tools().clean_global_cache(Ecosystem::Go);
        match outcome {
            CleanupOutcome::Failed { message } => {
                assert!(message.contains("go"));
                assert!(message.contains("not found"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn gradle_global_purge_is_skipped() {
        let outcome = cleaner_without_tools().clean_global_cache(Ecosystem::Gradle);
        assert!(matches!(outcome, CleanupOutcome::Skipped { .. }));
    }

    #[test]
    fn python_prune_is_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("requirements.txt"), "").unwrap();
        let project = Project::new(tmp.path().to_path_buf(), Ecosystem::Python);

        let outcome = cleaner_without_tools().prune_dependencies(&project);
        assert!(matches!(outcome, CleanupOutcome::Skipped { .. }));
    }

    #[test]
    fn protected_prefix_is_refused_before_mutation() {
        let outcome = cleaner().delete_directory(Path::new("/usr"));
        assert!(matches!(outcome, CleanupOutcome::Failed { .. }));
        assert!(Path::new("/usr").exists());
    }

    #[test]
    fn root_is_refused() {
        let outcome = cleaner().delete_directory(Path::new("/"));
        assert!(matches!(outcome, CleanupOutcome::Failed { .. }));
    }

    #[test]
    fn arbitrary_delete_reports_measured_size() {
        let tmp = TempDir::new().unwrap();
        let victim = tmp.path().join("junk");
        fs::create_dir(&victim).unwrap();
        fs::write(victim.join("blob"), "x".repeat(2048)).unwrap();

        let outcome = cleaner().delete_directory(&victim);

        assert_eq!(outcome.reclaimed_bytes(), 2048);
        assert!(!victim.exists());
    }

    #[test]
    fn arbitrary_delete_of_missing_path_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let outcome = cleaner().delete_directory(&tmp.path().join("absent"));
        assert!(matches!(outcome, CleanupOutcome::Skipped { .. }));
    }

    #[test]
    fn nested_sweep_deletes_every_match() {
        let tmp = TempDir::new().unwrap();
        for sub in ["a", "a/b", "c"] {
            let cache = tmp.path().join(sub).join("__pycache__");
            fs::create_dir_all(&cache).unwrap();
            fs::write(cache.join("m.pyc"), "x".repeat(100)).unwrap();
        }

        let sweep = sweep_nested_dirs(tmp.path(), "__pycache__", &[]);

        assert_eq!(sweep.deleted.len(), 3);
        assert_eq!(sweep.reclaimed_bytes, 300);
        assert!(sweep.errors.is_empty());
    }

    #[test]
    fn nested_sweep_does_not_descend_into_deleted_dirs() {
        let tmp = TempDir::new().unwrap();
        // A matching dir containing another matching dir: only the outer one
        // should be counted, since its subtree goes with it.
        let outer = tmp.path().join("pkg/__pycache__");
        let inner = outer.join("deep/__pycache__");
        fs::create_dir_all(&inner).unwrap();
        fs::write(inner.join("m.pyc"), "x".repeat(50)).unwrap();

        let sweep = sweep_nested_dirs(tmp.path(), "__pycache__", &[]);

        assert_eq!(sweep.deleted.len(), 1);
        assert!(!outer.exists());
    }

    #[test]
    fn nested_sweep_stays_out_of_skip_dirs() {
        let tmp = TempDir::new().unwrap();
        let in_venv = tmp.path().join("venv/site-packages/__pycache__");
        let in_src = tmp.path().join("src/__pycache__");
        fs::create_dir_all(&in_venv).unwrap();
        fs::create_dir_all(&in_src).unwrap();
        fs::write(in_venv.join("m.pyc"), "x").unwrap();
        fs::write(in_src.join("m.pyc"), "x").unwrap();

        let sweep = sweep_nested_dirs(tmp.path(), "__pycache__", &["venv", ".venv"]);

        assert_eq!(sweep.deleted.len(), 1);
        assert!(in_venv.exists());
        assert!(!in_src.exists());
    }

    #[test]
    fn only_deletion_errors_fail_a_sweep() {
        use std::io::{Error, ErrorKind};

        let mut sweep = NestedSweep::default();
        sweep.errors.push(SweepError::Enumeration {
            path: PathBuf::from("/work/locked"),
            source: Error::new(ErrorKind::PermissionDenied, "denied"),
        });
        assert!(sweep.deletion_failure().is_none());

        sweep.errors.push(SweepError::Deletion {
            path: PathBuf::from("/work/pkg/__pycache__"),
            source: Error::new(ErrorKind::Other, "busy"),
        });
        let failure = sweep.deletion_failure().unwrap();
        assert!(failure.to_string().contains("failed to delete"));
    }

    #[test]
    fn batch_cleanup_and_summary() {
        let tmp = TempDir::new().unwrap();
        let mut projects = Vec::new();
        for i in 0..4 {
            let root = tmp.path().join(format!("web-{i}"));
            fs::create_dir_all(root.join("node_modules")).unwrap();
            fs::write(root.join("node_modules/dep.js"), "x".repeat(100)).unwrap();
            fs::write(root.join("package.json"), "{}").unwrap();
            projects.push(Project::new(root, Ecosystem::Node));
        }
        // One project with nothing to clean.
        let empty_root = tmp.path().join("empty");
        fs::create_dir(&empty_root).unwrap();
        fs::write(empty_root.join("package.json"), "{}").unwrap();
        projects.push(Project::new(empty_root, Ecosystem::Node));

        let results = cleaner().clean_projects(&projects, 2);
        let summary = CacheCleaner::summarize(&results);

        assert_eq!(results.len(), 5);
        assert_eq!(summary.succeeded, 4);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.reclaimed_bytes, 400);
    }
}
