//! Scan orchestration: discovery across configured roots, concurrent
//! per-project annotation, progress events, and cooperative cancellation.
//!
//! Long-running operations publish a stream of [`ScanEvent`]s plus a
//! terminal [`ScanReport`]; whatever presentation layer is attached consumes
//! the channel. The core never reaches into presentation state.

use crate::cleaner;
use crate::config::ScanSettings;
use crate::deps::DependencyInspector;
use crate::discover::Discoverer;
use crate::ecosystem::Ecosystem;
use crate::exec::ToolLocator;
use crate::fsops;
use crate::project::{CacheEntry, Project};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

/// Cooperative cancellation handle shared between a scan and its caller.
///
/// Cancelling stops new directory walks and subprocess calls; project
/// records that already finished annotation are kept.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Incremental progress notifications for an in-flight scan.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// An ecosystem pass started ( `index` of `total` passes).
    EcosystemStarted {
        ecosystem: Ecosystem,
        index: usize,
        total: usize,
    },
    /// A root could not be enumerated; the scan continues.
    RootFailed { root: PathBuf, message: String },
    /// A project root was found, before annotation.
    ProjectDiscovered { ecosystem: Ecosystem, root: PathBuf },
    /// Fractional completion of the current ecosystem's annotation phase.
    Progress { ecosystem: Ecosystem, fraction: f64 },
    /// The scan finished (or was cancelled) with this many projects.
    Finished { projects: usize, cancelled: bool },
}

/// Terminal result of one scan pass.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub projects: Vec<Project>,
    /// Roots that failed enumeration, with error text.
    pub root_errors: Vec<(PathBuf, String)>,
    /// User-wide per-ecosystem cache entries for global accounting.
    pub global_caches: Vec<CacheEntry>,
    pub cancelled: bool,
}

impl ScanReport {
    pub fn total_cache_size(&self) -> u64 {
        self.projects.iter().map(|p| p.cache_size).sum()
    }
}

/// Runs discovery + annotation over the configured scan roots.
pub struct ScanSession {
    discoverer: Discoverer,
    inspector: DependencyInspector,
    settings: ScanSettings,
}

impl ScanSession {
    pub fn new(locator: ToolLocator, settings: ScanSettings) -> Self {
        Self {
            discoverer: Discoverer::new(settings.max_depth, settings.quick_scan_cap),
            inspector: DependencyInspector::new(locator),
            settings,
        }
    }

    /// Scan `roots` for the given ecosystems.
    ///
    /// Progress events go to `events` when a sender is attached; a full
    /// channel or dropped receiver never blocks the scan.
    pub fn run(
        &self,
        roots: &[PathBuf],
        ecosystems: &[Ecosystem],
        events: Option<Sender<ScanEvent>>,
        cancel: &CancelFlag,
    ) -> ScanReport {
        let mut report = ScanReport::default();

        for (index, &ecosystem) in ecosystems.iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            emit(
                &events,
                ScanEvent::EcosystemStarted {
                    ecosystem,
                    index,
                    total: ecosystems.len(),
                },
            );

            let outcome = self.discoverer.discover(roots, ecosystem);
            for (root, message) in &outcome.root_errors {
                emit(
                    &events,
                    ScanEvent::RootFailed {
                        root: root.clone(),
                        message: message.clone(),
                    },
                );
            }
            report.root_errors.extend(outcome.root_errors);

            for project in &outcome.projects {
                emit(
                    &events,
                    ScanEvent::ProjectDiscovered {
                        ecosystem,
                        root: project.root.clone(),
                    },
                );
            }

            let mut annotated =
                self.annotate(outcome.projects, ecosystem, &events, cancel);
            report.projects.append(&mut annotated);
        }

        if cancel.is_cancelled() {
            report.cancelled = true;
        }

        report.global_caches = collect_global_caches(&report.projects, ecosystems);

        emit(
            &events,
            ScanEvent::Finished {
                projects: report.projects.len(),
                cancelled: report.cancelled,
            },
        );

        report
    }

    /// Attach cache size and dependency list to each discovered project,
    /// bounded by the configured parallelism.
    fn annotate(
        &self,
        projects: Vec<Project>,
        ecosystem: Ecosystem,
        events: &Option<Sender<ScanEvent>>,
        cancel: &CancelFlag,
    ) -> Vec<Project> {
        let total = projects.len();
        if total == 0 {
            return projects;
        }

        let completed = AtomicUsize::new(0);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.parallel_jobs.max(1))
            .build();

        let annotate_one = |mut project: Project| {
            // A cancelled scan issues no further size walks or subprocesses,
            // but projects annotated before the flag flipped stay intact.
            if !cancel.is_cancelled() {
                project.cache_size = measure_project_caches(&project);
                project.dependencies = self.inspector.inspect(&project);
            }

            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            emit(
                events,
                ScanEvent::Progress {
                    ecosystem,
                    fraction: done as f64 / total as f64,
                },
            );
            project
        };

        match pool {
            Ok(pool) => pool.install(|| projects.into_par_iter().map(annotate_one).collect()),
            Err(e) => {
                tracing::warn!(error = %e, "thread pool unavailable; annotating serially");
                projects.into_iter().map(annotate_one).collect()
            }
        }
    }
}

/// Measure all cache subtrees of one project, nested caches included.
///
/// The nested walk stays out of the cache directories measured above, so a
/// `__pycache__` inside a venv is counted exactly once and the reported size
/// matches what cleanup reclaims.
pub fn measure_project_caches(project: &Project) -> u64 {
    let mut total = 0u64;
    for dir_name in project.ecosystem.cache_dirs() {
        let cache = project.root.join(dir_name);
        if cache.is_dir() {
            total += fsops::tree_size_or_zero(&cache);
        }
    }
    if let Some(nested) = project.ecosystem.nested_cache_dir() {
        total += cleaner::measure_nested_dirs(&project.root, nested, project.ecosystem.cache_dirs());
    }
    total
}

/// Build global cache entries for the scanned ecosystems. An entry is
/// orphaned when no discovered project belongs to its ecosystem.
fn collect_global_caches(projects: &[Project], ecosystems: &[Ecosystem]) -> Vec<CacheEntry> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };

    ecosystems
        .iter()
        .filter_map(|&ecosystem| {
            let path = ecosystem.global_cache_dir(&home);
            if !path.is_dir() {
                return None;
            }
            let metadata = path.metadata().ok();
            Some(CacheEntry {
                size: fsops::tree_size_or_zero(&path),
                last_accessed: metadata.and_then(|m| m.accessed().ok()),
                orphaned: !projects.iter().any(|p| p.ecosystem == ecosystem),
                ecosystem,
                path,
            })
        })
        .collect()
}

fn emit(events: &Option<Sender<ScanEvent>>, event: ScanEvent) {
    if let Some(sender) = events {
        // The receiver may already be gone; progress is best-effort.
        let _ = sender.send(event);
    }
}
