//! Poll loop: drives a session on a fixed interval, publishes stdin
//! commands, and prints what other participants send.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, bail};
use focusguard_collab::{CollaborationSession, Event, SessionCursor};
use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior, interval};

use crate::cli::{OutputFormat, WatchOpts};
use crate::context::{format_event, parse_publish_line, short_sender};

/// Run a connected session until stdin closes or a shutdown signal arrives,
/// then disconnect.
pub async fn run_session(mut session: CollaborationSession, opts: WatchOpts) -> anyhow::Result<()> {
    let mut ticker = interval(Duration::from_millis(opts.poll_interval_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut input = spawn_stdin_reader();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let result = loop {
        tokio::select! {
            _ = ticker.tick() => {
                let events = session.poll_events();
                log_peer_presence(&events);
                if let Err(e) = print_events(&events, opts.format) {
                    break Err(e);
                }
            }
            line = input.recv() => match line {
                Some(line) => {
                    if let Some((event_type, payload)) = parse_publish_line(&line) {
                        if !session.publish_event(&event_type, payload) {
                            tracing::warn!(event_type = %event_type, "event was not published");
                        }
                    }
                }
                None => {
                    tracing::info!("stdin closed, leaving session");
                    break Ok(());
                }
            },
            () = &mut shutdown => break Ok(()),
        }
    };

    session.disconnect();
    result
}

/// Follow a session file without joining it: no sender id, no announcements,
/// no self-filtering.
pub async fn run_tail(path: PathBuf, from_start: bool, opts: WatchOpts) -> anyhow::Result<()> {
    if !path.exists() {
        bail!("no session file at {}", path.display());
    }
    let mut cursor = if from_start {
        SessionCursor::new(path)
    } else {
        SessionCursor::at_end(path)
    };

    let mut ticker = interval(Duration::from_millis(opts.poll_interval_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => match cursor.read_new() {
                Ok(read) => {
                    if read.reset {
                        tracing::info!(path = %cursor.path().display(), "session file shrank, reading from start");
                    }
                    if read.malformed > 0 {
                        tracing::debug!(skipped = read.malformed, "skipped malformed session lines");
                    }
                    print_events(&read.events, opts.format)?;
                }
                Err(e) => tracing::warn!(error = %e, "failed to read session file"),
            },
            () = &mut shutdown => return Ok(()),
        }
    }
}

/// Note peers arriving and leaving in the log; stdout still gets every event.
fn log_peer_presence(events: &[Event]) {
    for event in events.iter().filter(|e| e.is_lifecycle()) {
        tracing::info!(
            peer = %short_sender(&event.sender),
            event_type = %event.event_type,
            "peer session announcement"
        );
    }
}

fn print_events(events: &[Event], format: OutputFormat) -> anyhow::Result<()> {
    if events.is_empty() {
        return Ok(());
    }
    let mut out = std::io::stdout().lock();
    for event in events {
        let line = format_event(event, format).context("failed to render event")?;
        writeln!(out, "{line}").context("failed to write to stdout")?;
    }
    out.flush().context("failed to flush stdout")
}

/// Read stdin lines on a dedicated thread; the channel closes at EOF.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("failed to read stdin: {e}");
                    break;
                }
            }
        }
    });
    rx
}

/// Resolves on ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!("failed to register SIGTERM handler: {e}");
                ctrl_c.await.ok();
                tracing::info!("received ctrl-c, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        tracing::info!("received ctrl-c, shutting down");
    }
}
