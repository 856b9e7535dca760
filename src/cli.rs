use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Personal task tracker.
/// Tasks live in ~/.taskflow/todos.json unless --data-dir says otherwise.
#[derive(Parser)]
#[command(name = "taskflow", version, about = "Personal task tracker with a terminal dashboard")]
pub struct Cli {
    /// Directory holding the task collection and logs.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Defaults to `ui` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}
