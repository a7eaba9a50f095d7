use clap::{Parser, Subcommand};
use clap_complete::Shell;
use marquee_core::RenameMode;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "marquee")]
#[command(about = "Organize movie and TV files into a media server layout", long_about = None)]
pub struct Cli {
    /// Tracing filter, e.g. `debug` or `marquee_core=trace`
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "log_level")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve files under the given paths and link or copy them into place
    Rename {
        /// Root paths to scan, replacing the configured ones
        paths: Vec<PathBuf>,
        /// Output root (defaults to each root's parent directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// How files are placed at their destination
        #[arg(short, long)]
        mode: Option<RenameMode>,
        /// Apply the plan (without it nothing is written)
        #[arg(short, long)]
        write: bool,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show what every entry under the given paths resolves to
    Scan {
        /// Root paths to scan, replacing the configured ones
        paths: Vec<PathBuf>,
    },
    /// Display the number of cached provider responses
    CacheStatus,
    /// Delete every cached provider response
    ClearCache,
    /// Print configuration values
    PrintConfig,
    /// Generate a shell completion script on stdout
    Completion {
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["marquee", "scan", "/media", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(!cli.quiet);
        assert!(matches!(cli.command, Some(Commands::Scan { ref paths }) if paths.len() == 1));
    }

    #[test]
    fn test_quiet_conflicts_with_log_level() {
        assert!(Cli::try_parse_from(["marquee", "-q", "--log-level", "debug", "scan"]).is_err());
    }

    #[test]
    fn test_completion_shell() {
        let cli = Cli::try_parse_from(["marquee", "completion", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Completion { shell: Shell::Bash })
        ));
    }
}
