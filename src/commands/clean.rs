//! Clean command implementation.

use crate::cleaner::{CacheCleaner, CleanupOutcome};
use crate::cli::CleanArgs;
use crate::config::Config;
use crate::project::Project;
use crate::session::{CancelFlag, ScanSession};
use anyhow::Result;
use humansize::{format_size, BINARY};
use std::io::{self, Write};

/// Run the clean command.
pub fn run(args: CleanArgs, config: &Config) -> Result<()> {
    let cleaner = CacheCleaner::new(super::locator_from(config));

    // Arbitrary-directory deletion bypasses discovery entirely.
    if let Some(dir) = &args.dir {
        if !args.force && !args.dry_run && !confirm(&format!("Delete '{}'?", dir.display()))? {
            println!("Aborted.");
            return Ok(());
        }
        if args.dry_run {
            println!("[DRY RUN] Would delete {}", dir.display());
            return Ok(());
        }
        let outcome = cleaner.delete_directory(dir);
        print_outcome(&dir.display().to_string(), &outcome);
        if matches!(outcome, CleanupOutcome::Failed { .. }) {
            std::process::exit(5);
        }
        return Ok(());
    }

    let ecosystems = super::parse_ecosystems(&args.types)?;

    if args.global {
        let mut failed = 0;
        for &ecosystem in &ecosystems {
            let label = format!("{} global cache", ecosystem.display_name());
            if args.dry_run {
                println!("[DRY RUN] Would purge {label}");
                continue;
            }
            let outcome = cleaner.clean_global_cache(ecosystem);
            if matches!(outcome, CleanupOutcome::Failed { .. }) {
                failed += 1;
            }
            print_outcome(&label, &outcome);
        }
        if failed > 0 {
            std::process::exit(5);
        }
        return Ok(());
    }

    let roots = super::resolve_roots(&args.paths, config)?;
    let session = ScanSession::new(super::locator_from(config), config.scan.clone());

    println!("Scanning for projects...");
    let report = session.run(&roots, &ecosystems, None, &CancelFlag::new());

    let projects: Vec<Project> = if args.prune {
        report.projects
    } else {
        // Only projects with something to delete.
        report
            .projects
            .into_iter()
            .filter(|p| p.cache_size > 0)
            .collect()
    };

    if projects.is_empty() {
        println!("No projects with cleanable caches found.");
        return Ok(());
    }

    print_projects_table(&projects);
    let total: u64 = projects.iter().map(|p| p.cache_size).sum();

    if args.dry_run {
        println!(
            "\n[DRY RUN] Would reclaim up to {} from {} project{}",
            format_size(total, BINARY),
            projects.len(),
            if projects.len() == 1 { "" } else { "s" }
        );
        return Ok(());
    }

    let prompt = if args.prune {
        "Run dependency pruning?"
    } else {
        "Proceed with cleanup?"
    };
    if !args.force && !confirm(prompt)? {
        println!("Aborted.");
        return Ok(());
    }

    let results: Vec<(String, CleanupOutcome)> = if args.prune {
        projects
            .iter()
            .map(|p| (p.id.clone(), cleaner.prune_dependencies(p)))
            .collect()
    } else {
        let jobs = args.jobs.unwrap_or(config.scan.parallel_jobs);
        cleaner.clean_projects(&projects, jobs)
    };

    let summary = CacheCleaner::summarize(&results);

    println!("\nResults:");
    println!("  Succeeded: {}", summary.succeeded);
    if summary.failed > 0 {
        println!("  Failed:    {}", summary.failed);
    }
    if summary.skipped > 0 {
        println!("  Skipped:   {}", summary.skipped);
    }
    println!(
        "  Reclaimed: {}",
        format_size(summary.reclaimed_bytes, BINARY)
    );

    for (id, outcome) in &results {
        if let CleanupOutcome::Failed { message } = outcome {
            eprintln!("  error: {id}: {message}");
        }
    }

    if summary.failed > 0 {
        std::process::exit(5); // Partial failure
    }

    Ok(())
}

fn print_projects_table(projects: &[Project]) {
    println!("\n  {:<8} {:<50} {:>10}", "TYPE", "PATH", "CACHE");
    println!("  {}", "-".repeat(70));
    for project in projects {
        let path = super::truncate_path(&project.root.display().to_string(), 48);
        println!(
            "  {:<8} {:<50} {:>10}",
            project.ecosystem.id(),
            path,
            format_size(project.cache_size, BINARY),
        );
    }
}

fn print_outcome(label: &str, outcome: &CleanupOutcome) {
    match outcome {
        CleanupOutcome::Success {
            message,
            reclaimed_bytes,
        } => println!(
            "{label}: {message} ({} reclaimed)",
            format_size(*reclaimed_bytes, BINARY)
        ),
        CleanupOutcome::Failed { message } => eprintln!("{label}: FAILED: {message}"),
        CleanupOutcome::Skipped { reason } => println!("{label}: skipped: {reason}"),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("\n{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
