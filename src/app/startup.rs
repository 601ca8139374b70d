//! Application startup
//!
//! Parses the command line, initialises logging and configuration, and
//! dispatches the requested command on a fresh tokio runtime.

use crate::app::cli::{Cli, Command};
use crate::app::display;
use crate::core::config::ScanConfig;
use crate::core::logging::init_logging;
use crate::github::GithubClient;
use crate::scanner::coordinator::ScanCoordinator;
use crate::scanner::types::ResultStatus;
use clap::Parser;

/// Entry point for the binary; returns the process exit code
pub fn startup() -> i32 {
    let cli = Cli::parse();

    let use_color = !cli.no_color;
    if let Err(e) = init_logging(
        cli.log_level.as_deref(),
        cli.log_format.as_deref(),
        cli.log_file.as_deref().and_then(|p| p.to_str()),
        use_color,
    ) {
        eprintln!("Failed to initialise logging: {}", e);
        return 1;
    }
    log::info!("{}", crate::version_string());

    let config = match ScanConfig::load(cli.config_file.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return 1;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Cannot start async runtime: {}", e);
            return 1;
        }
    };

    runtime.block_on(dispatch(cli.command, config))
}

async fn dispatch(command: Command, base_config: ScanConfig) -> i32 {
    match command {
        Command::Scan {
            repo_url,
            workers,
            timeout,
            depth,
            sequential,
            no_redact,
            no_source_files,
            no_external_tools,
            format,
        } => {
            let mut config = base_config;
            if let Some(workers) = workers {
                config.max_workers = workers;
            }
            if let Some(timeout) = timeout {
                config.default_timeout = timeout;
            }
            if let Some(depth) = depth {
                config.scan_depth = depth;
            }
            if sequential {
                config.enable_parallel = false;
            }
            if no_redact {
                config.redact_secrets = false;
            }
            if no_source_files {
                config.scan_source_files = false;
            }
            if no_external_tools {
                config.enable_trufflehog = false;
                config.enable_pip_audit = false;
                config.enable_safety = false;
                config.enable_npm_audit = false;
                config.enable_snyk = false;
                config.enable_semgrep = false;
                config.enable_bandit = false;
            }
            if let Err(e) = config.validate() {
                log::error!("{}", e);
                return 1;
            }

            let coordinator = ScanCoordinator::new(config);
            let result = coordinator.run(&repo_url).await;

            if format == "json" {
                match serde_json::to_string_pretty(&result) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        log::error!("Cannot serialize scan result: {}", e);
                        return 1;
                    }
                }
            } else {
                print!("{}", display::render_result(&result));
            }

            match result.status {
                ResultStatus::Completed => 0,
                _ => 1,
            }
        }

        Command::Repos {
            username,
            per_page,
            sort,
            include_forks,
        } => {
            let client = GithubClient::new();
            match client
                .list_user_repos(&username, per_page, &sort, include_forks)
                .await
            {
                Ok(repos) => {
                    for repo in &repos {
                        println!(
                            "{}  {}  [{}{}]",
                            repo.name,
                            repo.url,
                            repo.language.as_deref().unwrap_or("unknown"),
                            if repo.stars > 0 {
                                format!(", {} stars", repo.stars)
                            } else {
                                String::new()
                            }
                        );
                    }
                    log::info!("{} repositories listed", repos.len());
                    0
                }
                Err(e) => {
                    log::error!("{}", e);
                    1
                }
            }
        }
    }
}
