//! Pre-flight launcher for the hamster monitor server.
//!
//! With no arguments, checks the interpreter, environment, entry point, and
//! model file, then runs the entry point and relays its exit status.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use launcher::check::{render_report, run_preflight};
use launcher::exit_codes;
use launcher::io::config::{CONFIG_FILE_NAME, LauncherConfig, load_config, load_named_config};
use launcher::io::console::TerminalConsole;
use launcher::io::entry_point::ProcessSpawner;
use launcher::io::environment::SystemActivator;
use launcher::io::init::{InitOptions, init_config};
use launcher::io::interpreter::SystemInterpreterProbe;
use launcher::launch::run_launch;
use launcher::logging;

#[derive(Parser)]
#[command(
    name = "launcher",
    version,
    about = "Pre-flight checks and launch for the hamster monitor server"
)]
struct Cli {
    /// Config file (defaults to `launcher.toml` in the working directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Never wait for Enter after a failure.
    #[arg(long, global = true)]
    no_pause: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pre-flight checks, then start the entry point (default).
    Launch,
    /// Run the pre-flight checks only and print a report.
    Check {
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Write a default `launcher.toml`.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let root = std::env::current_dir().context("resolve working directory")?;
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| root.join(CONFIG_FILE_NAME));
    // The implicit `launcher.toml` may be absent; a path named with `--config` may not.
    let read_config = || -> Result<LauncherConfig> {
        match &cli.config {
            Some(path) => load_named_config(path),
            None => load_config(&config_path),
        }
    };

    match cli.command.unwrap_or(Command::Launch) {
        Command::Init { force } => {
            let path = init_config(&config_path, &InitOptions { force })?;
            println!("init: wrote {}", path.display());
            Ok(exit_codes::OK)
        }
        Command::Check { json } => {
            let config = read_config()?;
            let outcome = run_preflight(&root, &config, &SystemInterpreterProbe, &SystemActivator);
            if json {
                let payload =
                    serde_json::to_string_pretty(&outcome.report).context("serialize report")?;
                println!("{payload}");
            } else {
                print!("{}", render_report(&outcome.report));
            }
            if outcome.report.passed() {
                Ok(exit_codes::OK)
            } else {
                Ok(exit_codes::INVALID)
            }
        }
        Command::Launch => {
            let config = read_config()?;
            let console = TerminalConsole::new(config.pause_on_failure && !cli.no_pause);
            let outcome = run_launch(
                &root,
                &config,
                &SystemInterpreterProbe,
                &SystemActivator,
                &ProcessSpawner,
                &console,
            )?;
            Ok(outcome.exit_code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_means_launch() {
        let cli = Cli::parse_from(["launcher"]);
        assert!(cli.command.is_none());
        assert!(!cli.no_pause);
    }

    #[test]
    fn parse_check_json() {
        let cli = Cli::parse_from(["launcher", "check", "--json"]);
        assert!(matches!(cli.command, Some(Command::Check { json: true })));
    }

    #[test]
    fn parse_init_force_with_global_flags() {
        let cli = Cli::parse_from(["launcher", "init", "--force", "--config", "x.toml"]);
        assert!(matches!(cli.command, Some(Command::Init { force: true })));
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn parse_no_pause() {
        let cli = Cli::parse_from(["launcher", "--no-pause", "launch"]);
        assert!(cli.no_pause);
        assert!(matches!(cli.command, Some(Command::Launch)));
    }
}
