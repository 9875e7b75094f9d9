mod aggregate;
mod config;
mod error;
mod export;
mod ipc;
mod record;
mod roster;
mod store;

use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};
use std::io::{self, BufRead, Write};

/// Logs go to stderr; stdout carries responses only.
fn init_logging(level: LevelFilter) {
    let log_cfg = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("studentd")
        .build();
    if TermLogger::init(level, log_cfg, TerminalMode::Stderr, ColorChoice::Never).is_err() {
        eprintln!("studentd: logger already initialised");
    }
}

fn main() {
    let cfg = config::Cfg::from_env();
    init_logging(cfg.log_level);
    for note in &cfg.ignored {
        log::warn!("ignoring setting: {}", note);
    }

    let mut state = ipc::AppState::new(cfg);
    if let Some(path) = state.cfg.workspace.clone() {
        match ipc::open_workspace(&mut state, &path) {
            Ok(()) => {
                let ipc::AppState { store, roster, .. } = &mut state;
                if let Some(store) = store.as_ref() {
                    // A failed first load leaves an empty roster; records.list retries.
                    let _ = roster.refresh(store);
                }
            }
            Err(e) => log::error!("{:#}", e),
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                log::error!("stdin closed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                log::warn!("unparsable request: {}", e);
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
