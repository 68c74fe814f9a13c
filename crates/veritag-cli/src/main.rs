//! `veritag-cli` – operator console for the veritag core.
//!
//! Companion binary for the asset-tracking console: inspects the
//! capability and role catalogs, evaluates authorization questions, prints
//! the flagged-asset remediation queue, and runs a scripted lifecycle demo
//! against the in-memory reference ledger.
//!
//! ```text
//! veritag init                      write a default config file
//! veritag capabilities              list the capability catalog
//! veritag roles                     list roles and their default bundles
//! veritag check <role|none> <cap>   evaluate the authorization engine
//! veritag triage <snapshot.json>    print the ordered remediation queue
//! veritag demo                      scripted mint→…→flag→clear run
//! ```

mod commands;
mod config;

use colored::Colorize;

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // Initialise tracing-subscriber using RUST_LOG (defaults to "info").
    // Set VERITAG_LOG_FORMAT=json to emit newline-delimited JSON logs
    // suitable for log aggregators.  The CLI's user-facing output still
    // uses println! for UX consistency.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("VERITAG_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => cfg,
        Ok(None) => config::Config::default(),
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            eprintln!("  Using default configuration.");
            config::Config::default()
        }
    };

    // ── Command dispatch ──────────────────────────────────────────────────
    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        Some("init") => commands::init(),
        Some("capabilities") => commands::capabilities(),
        Some("roles") => commands::roles(),
        Some("check") => commands::check(&args[1..]),
        Some("triage") => match args.get(1) {
            Some(path) => commands::triage_queue(path, &cfg),
            None => Err("usage: veritag triage <snapshot.json>".to_string()),
        },
        Some("demo") => commands::demo(&cfg),
        Some(other) => Err(format!("Unknown command '{other}'.\n\n{USAGE}")),
        None => {
            println!("{USAGE}");
            Ok(())
        }
    };

    if let Err(message) = result {
        eprintln!("{} {message}", "error:".red().bold());
        std::process::exit(1);
    }
}

const USAGE: &str = "veritag – asset lifecycle, authorization, and triage console

usage:
  veritag init                      write a default config file
  veritag capabilities              list the capability catalog
  veritag roles                     list roles and their default bundles
  veritag check <role|none> <cap>   evaluate the authorization engine
  veritag triage <snapshot.json>    print the ordered remediation queue
  veritag demo                      scripted lifecycle run";
