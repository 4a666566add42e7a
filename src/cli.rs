use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Devsweep - discover development projects and reclaim their caches
#[derive(Parser, Debug)]
#[command(name = "devsweep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover projects and report their cache sizes
    Scan(ScanArgs),

    /// Clean project caches, purge global caches, or prune dependencies
    Clean(CleanArgs),

    /// Show resolved toolchain paths, versions, and availability
    Tools(ToolsArgs),

    /// Manage the persisted set of scan root directories
    Roots(RootsArgs),

    /// Check whether a directory is worth scanning
    Validate(ValidateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Directories to scan (defaults to the configured root set)
    pub paths: Vec<PathBuf>,

    /// Ecosystems to scan (comma-separated: go,node,python,gradle)
    #[arg(short, long, value_delimiter = ',', value_name = "TYPES")]
    pub types: Option<Vec<String>>,

    /// Maximum recursion depth
    #[arg(short = 'd', long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Parallel annotation jobs
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Also list each project's dependencies
    #[arg(long)]
    pub deps: bool,
}

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Directories to scan for cleanable projects (defaults to configured roots)
    pub paths: Vec<PathBuf>,

    /// Ecosystems to clean (comma-separated: go,node,python,gradle)
    #[arg(short, long, value_delimiter = ',', value_name = "TYPES")]
    pub types: Option<Vec<String>>,

    /// Purge the toolchains' global caches instead of project caches
    #[arg(long, conflicts_with_all = ["prune", "dir"])]
    pub global: bool,

    /// Run each toolchain's unused-dependency prune instead of deleting caches
    #[arg(long, conflicts_with = "dir")]
    pub prune: bool,

    /// Delete one arbitrary directory (refuses protected system paths)
    #[arg(long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Show what would be cleaned without doing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip confirmation prompts
    #[arg(short, long)]
    pub force: bool,

    /// Parallel clean jobs
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ToolsArgs {}

#[derive(Args, Debug)]
pub struct RootsArgs {
    #[command(subcommand)]
    pub action: RootsAction,
}

#[derive(Subcommand, Debug)]
pub enum RootsAction {
    /// Add a directory to the scan-root set
    Add { path: PathBuf },
    /// Remove a directory from the scan-root set
    Remove { path: PathBuf },
    /// List the configured scan roots
    List,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Directory to validate
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Validates the CLI definition is correct
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_scan_command() {
        let cli = Cli::parse_from(["devsweep", "scan", "/home/dev"]);
        match cli.command {
            Command::Scan(args) => {
                assert_eq!(args.paths, vec![PathBuf::from("/home/dev")]);
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn parse_clean_with_options() {
        let cli = Cli::parse_from([
            "devsweep",
            "clean",
            "--dry-run",
            "--types",
            "node,python",
            "/projects",
        ]);
        match cli.command {
            Command::Clean(args) => {
                assert!(args.dry_run);
                assert_eq!(
                    args.types,
                    Some(vec!["node".to_string(), "python".to_string()])
                );
            }
            _ => panic!("Expected Clean command"),
        }
    }

    #[test]
    fn global_and_prune_conflict() {
        let result = Cli::try_parse_from(["devsweep", "clean", "--global", "--prune"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_roots_add() {
        let cli = Cli::parse_from(["devsweep", "roots", "add", "/work"]);
        match cli.command {
            Command::Roots(args) => {
                assert!(matches!(args.action, RootsAction::Add { .. }));
            }
            _ => panic!("Expected Roots command"),
        }
    }

    #[test]
    fn global_verbose_flag() {
        let cli = Cli::parse_from(["devsweep", "-vvv", "tools"]);
        assert_eq!(cli.verbose, 3);
    }
}
