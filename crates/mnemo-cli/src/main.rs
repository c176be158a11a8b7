//! `mnemo-cli` – Mnemo Command Line Interface
//!
//! This binary is an interactive shell over the memory engine.  It:
//!
//! 1. Loads `~/.mnemo/config.toml`, writing the defaults on first run.
//! 2. Opens the SQLite database and probes the Ollama embedding model.
//! 3. Drops the user into a **REPL** with slash-commands (`/store`,
//!    `/recall`, `/context`, `/relate`, `/todo`, … see `/help`).
//! 4. Intercepts **Ctrl-C**: exits at once from the prompt, or after the
//!    command that is running.

mod commands;
mod config;
mod ollama;
mod repl;
mod telemetry;

use colored::Colorize;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use mnemo_memory::MemoryEngine;
use mnemo_memory::embedding::OllamaEmbedder;
use mnemo_memory::sqlite::SqliteStore;

use crate::ollama::ProbeStatus;
use crate::repl::{Interrupt, Session};

fn main() -> ExitCode {
    let _telemetry = telemetry::init_tracing("mnemo");

    print_banner();

    let session = Arc::new(Session::default());
    let handler_session = session.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        match handler_session.interrupt() {
            Interrupt::ExitNow => {
                println!("{}", "Goodbye.".green());
                std::process::exit(130);
            }
            Interrupt::AfterCommand => println!(
                "{}",
                "⚠  Ctrl-C received – exiting after the current command …"
                    .yellow()
                    .bold()
            ),
        }
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    let cfg = load_or_init_config();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start the async runtime");
            return ExitCode::FAILURE;
        }
    };

    if let Some(dir) = cfg.db_path.parent()
        && !dir.as_os_str().is_empty()
        && let Err(e) = config::ensure_private_dir(dir)
    {
        println!("{}: {}", "Database directory error".red(), e);
        return ExitCode::FAILURE;
    }
    let store = match SqliteStore::open(&cfg.db_path) {
        Ok(store) => store,
        Err(e) => {
            println!(
                "{} {}: {}",
                "Cannot open database".red(),
                cfg.db_path.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    };
    println!("  Database  {}", cfg.db_path.display().to_string().bold());
    info!(db = %cfg.db_path.display(), "record store opened");

    print!(
        "  Embedding {} at {} … ",
        cfg.embedding_model.bold(),
        cfg.ollama_url.dimmed()
    );
    match runtime.block_on(ollama::probe(&cfg.ollama_url, &cfg.embedding_model)) {
        ProbeStatus::Ready => println!("{}", "ready".green()),
        ProbeStatus::ModelMissing { available } => {
            println!("{}", "model missing".yellow());
            println!(
                "  Run `{}` to download it ({} other model(s) available).",
                format!("ollama pull {}", cfg.embedding_model).bold(),
                available.len()
            );
        }
        ProbeStatus::Offline(reason) => {
            println!("{}", "offline".yellow());
            println!("  {}", reason.dimmed());
            println!(
                "  {}  Commands that embed text will fail until `{}` is running.",
                "No Ollama instance detected.".dimmed(),
                "ollama serve".bold()
            );
        }
    }

    let embedder = OllamaEmbedder::new(cfg.ollama_url.clone(), cfg.embedding_model.clone())
        .with_api_key(cfg.embedding_api_key.clone());
    let engine = MemoryEngine::new(Arc::new(store), Arc::new(embedder), cfg.memory.clone());

    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    repl::run(&engine, &runtime, session);
    ExitCode::SUCCESS
}

fn load_or_init_config() -> config::Config {
    match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config    {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

fn print_banner() {
    println!();
    println!("{}", r#"  _ __ ___  _ __   ___ _ __ ___   ___ "#.bold().cyan());
    println!("{}", r#" | '_ ` _ \| '_ \ / _ \ '_ ` _ \ / _ \"#.bold().cyan());
    println!("{}", r#" | | | | | | | | |  __/ | | | | | (_) |"#.bold().cyan());
    println!("{}", r#" |_| |_| |_|_| |_|\___|_| |_| |_|\___/"#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "Mnemo".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Semantic memory for conversational agents");
    println!();
}
