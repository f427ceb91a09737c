//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use focusguard_collab::DEFAULT_CODE_LENGTH;

#[derive(Parser)]
#[command(name = "focusguard", about = "focus_guard collaboration over a shared folder")]
pub struct Cli {
    /// Shared directory holding session files
    /// (default: $XDG_DATA_HOME/focus_guard/collab)
    #[arg(long, short = 'd', global = true, env = "FOCUSGUARD_COLLAB_DIR")]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a session, print its code, and stay connected
    Host(HostOpts),
    /// Join an existing session and stay connected
    Join(JoinOpts),
    /// Follow a session file without joining or announcing
    Tail(TailOpts),
}

#[derive(clap::Args)]
pub struct HostOpts {
    /// Session code to use instead of a random one
    #[arg(long)]
    pub code: Option<String>,

    /// Length of generated session codes (minimum 4)
    #[arg(long, default_value_t = DEFAULT_CODE_LENGTH)]
    pub code_length: usize,

    #[command(flatten)]
    pub watch: WatchOpts,
}

#[derive(clap::Args)]
pub struct JoinOpts {
    /// Session code shared by the host
    pub code: String,

    #[command(flatten)]
    pub watch: WatchOpts,
}

#[derive(clap::Args)]
pub struct TailOpts {
    /// Session code to follow
    pub code: String,

    /// Print existing records before following new ones
    #[arg(long)]
    pub from_start: bool,

    #[command(flatten)]
    pub watch: WatchOpts,
}

#[derive(clap::Args, Clone)]
pub struct WatchOpts {
    /// Poll interval in milliseconds
    #[arg(long, default_value = "1000")]
    pub poll_interval_ms: u64,

    /// Output format for received events
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON record per line
    Json,
    /// Time, sender, type and payload on one line
    Text,
}

/// Default shared directory: `$XDG_DATA_HOME/focus_guard/collab`, then
/// `$HOME/.local/share/focus_guard/collab`, then `./focus_guard_collab`.
pub fn default_collab_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("XDG_DATA_HOME") {
        if !dir.is_empty() {
            return PathBuf::from(dir).join("focus_guard").join("collab");
        }
    }
    match std::env::var("HOME") {
        Ok(home) if !home.is_empty() => PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("focus_guard")
            .join("collab"),
        _ => PathBuf::from("focus_guard_collab"),
    }
}
