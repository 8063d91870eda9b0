//!
//! dicri console binary
//! --------------------
//! Interactive console for the DICRI case-management backend. Keeps the
//! session on disk between runs, gates every location through the same route
//! guards as the web client, and renders list responses as tables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use dicri_console::app::App;
use dicri_console::cli::{execute, parse_command, table, Reply, HELP};
use dicri_console::config::{ClientConfig, API_URL_ENV, SESSION_FILE_ENV};
use dicri_console::identity::token_slice;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--api <url>] [--session-file <path>] [--no-persist]\n\nFlags:\n  --api <url>              Backend base URL (env {API_URL_ENV}, default http://localhost:3000/api)\n  --session-file <path>    Where the session is kept between runs (env {SESSION_FILE_ENV})\n  --no-persist             Keep the session in memory only\n  -h, --help               Show this help\n\n{HELP}"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("invalid log filter")?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);
    let mut cfg = ClientConfig::from_env();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--api" => {
                if i + 1 >= args.len() { eprintln!("--api requires a URL"); print_usage(&program); std::process::exit(2); }
                cfg = cfg.with_base_url(args[i + 1].clone());
                i += 2;
            }
            "--session-file" => {
                if i + 1 >= args.len() { eprintln!("--session-file requires a path"); print_usage(&program); std::process::exit(2); }
                cfg.session_file = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--no-persist" => { cfg = cfg.without_persistence(); i += 1; }
            "-h" | "--help" => { print_usage(&program); return Ok(()); }
            other => { eprintln!("unknown argument: {}", other); print_usage(&program); std::process::exit(2); }
        }
    }

    info!(
        target: "app",
        "dicri console starting: api='{}', session_file={}",
        cfg.base_url,
        cfg.session_file.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "<memory>".into())
    );
    let app = App::new(cfg)?;

    let mut watcher = app.store().subscribe();
    tokio::spawn(async move {
        while let Some(token) = watcher.changed_slice(token_slice).await {
            match token {
                Some(_) => info!(target: "session", "session started"),
                None => info!(target: "session", "session ended"),
            }
        }
    });

    let route = app.settle()?;
    println!("DICRI consola. Escriba help para ver los comandos.");
    println!("{} [{}]", route.view.title(), route.location);

    let mut rl = DefaultEditor::new()?;
    loop {
        let prompt = format!("dicri {}> ", app.location());
        let line = match rl.readline(&prompt) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if !line.trim().is_empty() {
            let _ = rl.add_history_entry(line.as_str());
        }
        let cmd = match parse_command(&line) {
            Ok(c) => c,
            Err(msg) => { eprintln!("{}", msg); continue; }
        };
        let epoch = app.navigator().reload_epoch();
        match execute(&app, cmd).await {
            Ok(Reply::Quit) => break,
            Ok(Reply::Nothing) => {}
            Ok(Reply::Text(t)) => println!("{}", t),
            Ok(Reply::Data { heading, data }) => {
                println!("{}", heading);
                if !table::print_table(&data) {
                    println!("{}", serde_json::to_string_pretty(&data)?);
                }
            }
            Err(e) => eprintln!("error: {}", e),
        }
        // A hard navigation during the command already moved the location;
        // run the guards there so the prompt shows what would render.
        if app.navigator().reload_epoch() != epoch {
            match app.settle() {
                Ok(route) => println!("-> {} [{}]", route.view.title(), route.location),
                Err(e) => warn!(target: "app", "could not settle after reload: {}", e),
            }
        }
    }
    Ok(())
}
