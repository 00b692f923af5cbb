use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

use crate::ipc;

#[derive(Parser, Debug)]
#[command(name = "ctl", about = "Control a running chronomap instance")]
pub struct CtlArgs {
    /// Override socket path
    #[arg(long)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Select the active city by id (see `cities`)
    City {
        /// City id, e.g. seoul, tokyo, newyork
        id: String,
    },
    /// Switch UI language: "next" to cycle, or a code (ko-KR, en-US, ja-JP)
    Lang {
        mode: String,
    },
    /// List the selectable cities
    Cities,
    /// Reload configuration file
    Reload,
    /// Print current state as JSON
    State,
    /// Shut down chronomap
    Quit,
    /// Generate shell completions for the ctl subcommand
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn send_command(socket: &PathBuf, cmd: serde_json::Value) -> Result<serde_json::Value> {
    let mut stream = UnixStream::connect(socket)
        .with_context(|| format!("Failed to connect to chronomap at {}", socket.display()))?;

    let msg = serde_json::to_string(&cmd)? + "\n";
    stream.write_all(msg.as_bytes())?;
    stream.flush()?;

    let mut reader = BufReader::new(&stream);
    let mut response = String::new();
    reader.read_line(&mut response)?;

    let resp: serde_json::Value = serde_json::from_str(&response)
        .context("Failed to parse response from chronomap")?;
    Ok(resp)
}

pub fn run(args: CtlArgs) -> Result<()> {
    // Handle completions before connecting to socket
    if let Commands::Completions { shell } = &args.command {
        let mut cmd = crate::Cli::command();
        clap_complete::generate(*shell, &mut cmd, "chronomap", &mut std::io::stdout());
        return Ok(());
    }

    let sock = ipc::socket_path(args.socket.as_ref());

    let cmd = match &args.command {
        Commands::City { id } => json!({"cmd": "select-city", "city": id}),
        Commands::Lang { mode } => match mode.as_str() {
            "next" => json!({"cmd": "next-language"}),
            code => json!({"cmd": "set-language", "lang": code}),
        },
        Commands::Cities => json!({"cmd": "list-cities"}),
        Commands::Reload => json!({"cmd": "reload-config"}),
        Commands::State => json!({"cmd": "get-state"}),
        Commands::Quit => json!({"cmd": "quit"}),
        Commands::Completions { .. } => unreachable!("handled above"),
    };

    let resp = send_command(&sock, cmd)?;

    if let Some(true) = resp.get("ok").and_then(|v| v.as_bool()) {
        match &args.command {
            Commands::State => println!("{}", serde_json::to_string_pretty(&resp)?),
            Commands::Cities => print_cities(&resp),
            _ => {}
        }
    } else {
        let err = resp.get("error").and_then(|v| v.as_str()).unwrap_or("Unknown error");
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }

    Ok(())
}

fn print_cities(resp: &serde_json::Value) {
    let Some(cities) = resp.get("cities").and_then(|v| v.as_array()) else { return };
    for city in cities {
        println!(
            "{:<12} {:<4} {:<20} {}",
            city.get("id").and_then(|v| v.as_str()).unwrap_or("?"),
            city.get("abbr").and_then(|v| v.as_str()).unwrap_or("?"),
            city.get("timezone").and_then(|v| v.as_str()).unwrap_or("?"),
            city.get("name").and_then(|v| v.as_str()).unwrap_or("?"),
        );
    }
}
