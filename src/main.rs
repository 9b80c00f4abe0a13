mod cache;
mod config;
mod db;
mod error;
mod events;
mod ipc;
mod logging;
mod model;
mod report;
mod service;
mod stats;
mod store;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use tracing::{error, info, warn};

fn main() -> ExitCode {
    logging::init();

    let config = match config::Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let startup_workspace = config.workspace.clone();
    let mut state = ipc::AppState::new(config);
    if let Some(path) = startup_workspace {
        if let Err(e) = ipc::select_workspace(&mut state, &path) {
            warn!(path = %path.to_string_lossy(), error = %e, "startup workspace not opened");
        }
    }
    info!(version = env!("CARGO_PKG_VERSION"), "attendanced ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
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
    ExitCode::SUCCESS
}
