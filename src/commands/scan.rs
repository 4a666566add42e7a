//! Scan command implementation.

use crate::cli::ScanArgs;
use crate::config::Config;
use crate::session::{CancelFlag, ScanEvent, ScanReport, ScanSession};
use anyhow::{anyhow, Result};
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::mpsc;

/// Run the scan command.
pub fn run(args: ScanArgs, config: &Config) -> Result<()> {
    let roots = super::resolve_roots(&args.paths, config)?;
    let ecosystems = super::parse_ecosystems(&args.types)?;

    let mut settings = config.scan.clone();
    if let Some(depth) = args.max_depth {
        settings.max_depth = depth;
    }
    if let Some(jobs) = args.jobs {
        settings.parallel_jobs = jobs;
    }

    let session = ScanSession::new(super::locator_from(config), settings);
    let cancel = CancelFlag::new();
    let (tx, rx) = mpsc::channel();

    let report = std::thread::scope(|scope| -> Result<ScanReport> {
        let handle = scope.spawn(|| session.run(&roots, &ecosystems, Some(tx), &cancel));

        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg} [{bar:30}] {percent}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        for event in rx {
            match event {
                ScanEvent::EcosystemStarted { ecosystem, .. } => {
                    bar.set_message(format!("scanning {}", ecosystem.display_name()));
                    bar.set_position(0);
                }
                ScanEvent::Progress { fraction, .. } => {
                    bar.set_position((fraction * 100.0) as u64);
                }
                ScanEvent::RootFailed { root, message } => {
                    bar.suspend(|| eprintln!("warning: {}: {}", root.display(), message));
                }
                ScanEvent::ProjectDiscovered { root, .. } => {
                    bar.set_message(format!("found {}", root.display()));
                }
                ScanEvent::Finished { .. } => {
                    bar.finish_and_clear();
                }
            }
        }

        handle.join().map_err(|_| anyhow!("scan thread panicked"))
    })?;

    print_report(&report, args.deps);
    Ok(())
}

fn print_report(report: &ScanReport, show_deps: bool) {
    if report.projects.is_empty() {
        println!("No projects found.");
    } else {
        println!("  {:<8} {:<50} {:>10} {:>6}", "TYPE", "PATH", "CACHE", "DEPS");
        println!("  {}", "-".repeat(78));

        for project in &report.projects {
            println!(
                "  {:<8} {:<50} {:>10} {:>6}",
                project.ecosystem.id(),
                super::truncate_path(&project.root.display().to_string(), 48),
                format_size(project.cache_size, BINARY),
                project.dependencies.len(),
            );

            if show_deps {
                for dep in &project.dependencies {
                    println!("             {} {}", dep.name, dep.version);
                }
            }
        }

        println!(
            "\nTotal: {} of caches in {} project{}",
            format_size(report.total_cache_size(), BINARY),
            report.projects.len(),
            if report.projects.len() == 1 { "" } else { "s" }
        );
    }

    if !report.global_caches.is_empty() {
        println!("\nGlobal caches:");
        for entry in &report.global_caches {
            println!(
                "  {:<8} {:<50} {:>10}{}",
                entry.ecosystem.id(),
                super::truncate_path(&entry.path.display().to_string(), 48),
                format_size(entry.size, BINARY),
                if entry.orphaned { "  (no live projects)" } else { "" },
            );
        }
    }

    for (root, message) in &report.root_errors {
        eprintln!("warning: could not scan {}: {}", root.display(), message);
    }

    if report.cancelled {
        println!("\nScan was cancelled; results are partial.");
    }
}
