//! Command-line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reposcan")]
#[command(about = "Repository security scanner: secrets and vulnerable dependencies")]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Log level
    #[arg(long = "log-level", value_name = "LEVEL", global = true, value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", global = true, value_parser = ["text", "json"])]
    pub log_format: Option<String>,

    /// Log file path
    #[arg(long = "log-file", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Clone a repository and scan it for secrets and vulnerable dependencies
    Scan {
        /// Repository URL (http, https, git or ssh)
        repo_url: String,

        /// Worker pool size for parallel file scanning
        #[arg(long = "workers", value_name = "N")]
        workers: Option<usize>,

        /// Clone and per-tool timeout in seconds
        #[arg(long = "timeout", value_name = "SECONDS")]
        timeout: Option<u64>,

        /// Maximum directory depth to scan
        #[arg(long = "depth", value_name = "N")]
        depth: Option<usize>,

        /// Scan files one at a time instead of using the worker pool
        #[arg(long = "sequential")]
        sequential: bool,

        /// Emit raw secret values instead of masked ones
        #[arg(long = "no-redact")]
        no_redact: bool,

        /// Skip common source-code files, scan only sensitive files
        #[arg(long = "no-source-files")]
        no_source_files: bool,

        /// Skip all external tools (trufflehog, dependency and quality scanners)
        #[arg(long = "no-external-tools")]
        no_external_tools: bool,

        /// Output format
        #[arg(long = "format", value_name = "FORMAT", default_value = "table", value_parser = ["table", "json"])]
        format: String,
    },

    /// List a GitHub user's repositories as candidate scan targets
    Repos {
        /// GitHub username
        username: String,

        /// Repositories per page (max 100)
        #[arg(long = "per-page", value_name = "N", default_value_t = 30)]
        per_page: u32,

        /// Sort order
        #[arg(long = "sort", value_name = "FIELD", default_value = "updated", value_parser = ["created", "updated", "pushed", "full_name"])]
        sort: String,

        /// Include forked repositories
        #[arg(long = "include-forks")]
        include_forks: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_scan_arguments_parse() {
        let cli = Cli::try_parse_from([
            "reposcan",
            "scan",
            "https://github.com/acme/widget.git",
            "--workers",
            "8",
            "--timeout",
            "60",
            "--no-redact",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Command::Scan {
                repo_url,
                workers,
                timeout,
                no_redact,
                format,
                ..
            } => {
                assert_eq!(repo_url, "https://github.com/acme/widget.git");
                assert_eq!(workers, Some(8));
                assert_eq!(timeout, Some(60));
                assert!(no_redact);
                assert_eq!(format, "json");
            }
            _ => panic!("expected scan command"),
        }
    }

    #[test]
    fn test_repos_arguments_parse() {
        let cli = Cli::try_parse_from(["reposcan", "repos", "octocat", "--include-forks"]).unwrap();
        match cli.command {
            Command::Repos {
                username,
                per_page,
                sort,
                include_forks,
            } => {
                assert_eq!(username, "octocat");
                assert_eq!(per_page, 30);
                assert_eq!(sort, "updated");
                assert!(include_forks);
            }
            _ => panic!("expected repos command"),
        }
    }

    #[test]
    fn test_invalid_format_rejected() {
        assert!(Cli::try_parse_from(["reposcan", "scan", "u", "--format", "yaml"]).is_err());
    }
}
