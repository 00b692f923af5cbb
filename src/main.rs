mod canvas;
mod cities;
mod config;
mod ctl;
mod ipc;
mod locale;
mod renderer;
mod scheduler;
mod state;
mod time_utils;
mod wayland;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::locale::Language;

#[derive(Parser, Debug)]
#[command(name = "chronomap", version, about = "Wayland layer-shell world-clock widget with a clickable city map")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override startup city (see `chronomapctl cities` for ids)
    #[arg(long)]
    city: Option<String>,

    /// Override startup UI language: ko-KR | en-US | ja-JP
    #[arg(long)]
    lang: Option<String>,

    /// Override IPC socket path
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Generate shell completions and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Control a running chronomap instance
    Ctl(ctl::CtlArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(CliCommand::Ctl(args)) => ctl::run(args),
        None => run_daemon(cli),
    }
}

fn run_daemon(args: Cli) -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Some(shell) = args.completions {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "chronomap", &mut std::io::stdout());
        return Ok(());
    }

    let config_path = args.config.unwrap_or_else(config::default_config_path);
    let mut config = config::load_config(&config_path)?;

    // Apply CLI overrides
    if let Some(city) = &args.city {
        if cities::find(city).is_none() {
            anyhow::bail!(
                "Unknown city: {}. Valid ids: {}",
                city,
                cities::CITIES.iter().map(|c| c.id).collect::<Vec<_>>().join(", ")
            );
        }
        config.widget.default_city = city.clone();
    }
    if let Some(lang) = &args.lang {
        // Unknown codes degrade to en-US at runtime, but a typo on the
        // command line should be caught up front.
        let resolved = Language::from_code(lang);
        if !resolved.code().eq_ignore_ascii_case(lang) {
            anyhow::bail!("Unknown language: {}. Use ko-KR, en-US, or ja-JP", lang);
        }
        config.widget.default_language = lang.clone();
    }

    log::info!(
        "Starting chronomap with city={}, language={}",
        config.widget.default_city,
        config.widget.default_language
    );

    wayland::run(config, config_path, args.socket)?;

    Ok(())
}
