use orientd::ipc;
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How long to wait for a request when no workspace is open.
const IDLE_WAIT: Duration = Duration::from_secs(60);

fn main() {
    // stdout carries responses; logs go to stderr.
    let filter = EnvFilter::try_from_env("ORIENTD_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let mut state = ipc::AppState::default();

    let (tx, rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut stdout = io::stdout();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "orientd started");

    loop {
        let wait = state
            .office
            .as_ref()
            .map_or(IDLE_WAIT, |o| o.autosave_wait(Instant::now()));

        let line = match rx.recv_timeout(wait) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => {
                if let Some(office) = state.office.as_mut() {
                    office.tick(Instant::now());
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            Err(e) => {
                // Can't reply without id.
                tracing::warn!(error = %e, "unparsable request");
                serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                })
            }
        };
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();

        // A request may have been slow enough to cross the deadline.
        if let Some(office) = state.office.as_mut() {
            office.tick(Instant::now());
        }
    }

    state.close();
    tracing::info!("stdin closed, exiting");
}
