mod commands;
mod logging;
mod progress;

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use marquee_core::plan::execute_plan;
use marquee_core::provider::{configured_providers, open_cache};
use marquee_core::{AppConfig, FsExecutor, Provider, RenameEngine, RenameMode, RenamePlan};
use progress::CliReporter;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Cli::parse();
    let config = marquee_core::config::load_configuration();

    let configured_level = config.as_ref().ok().and_then(|c| c.log_level.clone());
    let _guard = logging::init_logger(
        args.quiet,
        args.log_level.as_deref(),
        configured_level.as_deref(),
    );

    let config = match config {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    match args.command {
        Some(Commands::Rename {
            paths,
            output,
            mode,
            write,
            yes,
        }) => {
            let config = with_overrides(config, paths, output);
            let mode = mode.unwrap_or(config.rename_mode);
            if let Err(err) = run_rename(&config, mode, write, yes) {
                error!("Error: {:#}", err);
                process::exit(1);
            }
        }
        Some(Commands::Scan { paths }) => {
            let config = with_overrides(config, paths, None);
            if let Err(err) = run_scan(&config) {
                error!("Error: {:#}", err);
                process::exit(1);
            }
        }
        Some(Commands::CacheStatus) => {
            let cache = open_cache(&config)
                .with_context(|| format!("opening response cache {}", config.cache_path))?;
            println!(
                "{} cached responses in {}",
                cache.count_keys()?.to_string().cyan(),
                config.cache_path
            );
        }
        Some(Commands::ClearCache) => {
            if prompt_confirm("Delete every cached provider response?", Some(false))? {
                let removed = open_cache(&config)
                    .with_context(|| format!("opening response cache {}", config.cache_path))?
                    .clear_all()?;
                println!("{} cached responses deleted", removed);
            }
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", redacted(config));
        }
        Some(Commands::Completion { shell }) => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut io::stdout());
        }
        None => {
            Cli::command().print_long_help()?;
        }
    }

    Ok(())
}

/// Command line paths replace the configured roots.
fn with_overrides(mut config: AppConfig, paths: Vec<PathBuf>, output: Option<PathBuf>) -> AppConfig {
    if !paths.is_empty() {
        config.root_paths = paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
    }
    if let Some(output) = output {
        config.output = Some(output.to_string_lossy().into_owned());
    }
    config
}

fn redacted(mut config: AppConfig) -> AppConfig {
    if config.tmdb_api_key.is_some() {
        config.tmdb_api_key = Some("********".to_string());
    }
    config
}

/// The TMDB key falls back to the `TMDB_API_KEY` environment variable.
fn build_providers(config: &AppConfig) -> anyhow::Result<Vec<Arc<dyn Provider>>> {
    let mut config = config.clone();
    if config.tmdb_api_key.is_none() {
        config.tmdb_api_key = env::var("TMDB_API_KEY").ok();
    }
    configured_providers(&config)
        .context("set MARQUEE_TMDB_API_KEY or TMDB_API_KEY and check the cache path")
}

fn run_rename(config: &AppConfig, mode: RenameMode, write: bool, yes: bool) -> anyhow::Result<()> {
    let engine = RenameEngine::new(config.clone(), build_providers(config)?);
    let reporter = CliReporter::new();

    let scans = engine.scan(&reporter)?;
    for scan in &scans {
        if let Err(err) = &scan.nodes {
            eprintln!("  {} {}: {}", "✗".red(), scan.root.display(), err);
        }
    }
    let plan = engine.plan(&scans, &reporter);
    print_plan(&plan);

    let planned = plan.planned().count();
    if planned == 0 {
        info!("Nothing to rename");
        return Ok(());
    }

    let executor = FsExecutor::new(mode, write);
    if executor.is_dry_run() {
        info!("Dry run, pass --write to {} {} file(s)", mode, planned);
    } else if !yes {
        let prompt = format!("About to {} {} file(s). Proceed?", mode, planned);
        if !prompt_confirm(&prompt, Some(false))? {
            println!("Stopping");
            return Ok(());
        }
    }

    let report = execute_plan(&executor, &plan, &reporter)?;
    for failure in &report.failures {
        eprintln!(
            "  {} {} -> {}: {}",
            "✗".red(),
            failure.source.display(),
            failure.destination.display(),
            failure.error
        );
    }

    println!();
    info!(
        "{} applied, {} failed, {} unresolved, {} excluded",
        format!("{}", report.applied.len()).green(),
        format!("{}", report.failures.len()).red(),
        format!("{}", plan.failures().count()).yellow(),
        format!("{}", plan.excluded.len()).dimmed(),
    );

    if !report.failures.is_empty() {
        bail!("{} operation(s) failed", report.failures.len());
    }
    Ok(())
}

fn print_plan(plan: &RenamePlan) {
    for dir in &plan.directories {
        println!("{} {}", "mkdir".cyan(), dir.display());
    }
    for (source, destination) in plan.planned() {
        println!(
            "{} {} {}",
            source.display().to_string().dimmed(),
            "->".cyan(),
            destination.display().to_string().green()
        );
    }
    for (source, err) in plan.failures() {
        println!("{} {}: {}", "✗".red(), source.display(), err.to_string().red());
    }
    if !plan.excluded.is_empty() {
        println!(
            "{} entries skipped, their names could not be parsed",
            plan.excluded.len().to_string().yellow()
        );
    }
}

fn run_scan(config: &AppConfig) -> anyhow::Result<()> {
    let engine = RenameEngine::new(config.clone(), build_providers(config)?);
    let reporter = CliReporter::new();

    for scan in engine.scan(&reporter)? {
        println!("{}", scan.root.display().to_string().bold());
        let nodes = match scan.nodes {
            Ok(nodes) => nodes,
            Err(err) => {
                println!("  {} {}", "✗".red(), err);
                continue;
            }
        };
        for node in nodes {
            let hint = node
                .info
                .language
                .as_deref()
                .map(|l| format!(" [{}]", l))
                .unwrap_or_default();
            match &node.outcome {
                Ok(identity) => println!(
                    "  {} {} {} {}{}",
                    node.path().display(),
                    "=>".cyan(),
                    identity.kind().to_string().dimmed(),
                    identity.to_string().green(),
                    hint
                ),
                Err(err) => println!(
                    "  {} {} {}{}",
                    node.path().display(),
                    "=>".cyan(),
                    err.to_string().red(),
                    hint
                ),
            }
        }
    }
    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(default.unwrap_or(false));
        }

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
