//! focusguard: command-line host for collaboration sessions.
//! Creates or joins a session in a shared folder and relays events
//! between stdin/stdout and the session file.

use anyhow::Context;
use clap::Parser;
use focusguard_collab::{CollabConfig, CollaborationSession, session_file_path};

mod cli;
mod context;
mod poll_loop;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // stdout carries events; logs go to stderr.
    let filter = std::env::var("FOCUSGUARD_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let dir = args.dir.unwrap_or_else(cli::default_collab_dir);

    match args.command {
        cli::Command::Host(opts) => {
            let code = opts
                .code
                .as_deref()
                .map(context::normalize_code)
                .transpose()?;
            let mut session = CollaborationSession::new(
                CollabConfig::default().with_code_length(opts.code_length),
            );
            let code = session
                .create_session(&dir, code.as_deref())
                .with_context(|| format!("failed to create session in {}", dir.display()))?;
            eprintln!("session code: {code}");
            poll_loop::run_session(session, opts.watch).await?;
        }
        cli::Command::Join(opts) => {
            let code = context::normalize_code(&opts.code)?;
            let mut session = CollaborationSession::default();
            if !session.join_session(&dir, &code) {
                eprintln!("no session {code} in {}", dir.display());
                std::process::exit(1);
            }
            poll_loop::run_session(session, opts.watch).await?;
        }
        cli::Command::Tail(opts) => {
            let code = context::normalize_code(&opts.code)?;
            let path = session_file_path(&dir, &code);
            poll_loop::run_tail(path, opts.from_start, opts.watch).await?;
        }
    }

    Ok(())
}
