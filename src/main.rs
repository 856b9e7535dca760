//! # TaskFlow - personal task tracker
//!
//! A small task tracker with a terminal dashboard, a filterable task list and
//! an editor that can touch up a task's image through an AI image service.
//!
//! ## Key Features
//!
//! - **Dashboard**: task totals with per-status progress and per-priority counts
//! - **Task List**: filter by status and priority, open any task for editing
//! - **Editor**: validated create/update/delete with optional image attachment
//! - **AI Image Editing**: describe a change and the image service applies it
//! - **CLI**: every operation is also scriptable from the shell
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the terminal UI
//! taskflow
//!
//! # Add a task
//! taskflow add "Book flights" --due "next friday" --priority high
//!
//! # List tasks in progress
//! taskflow list --status in-progress
//!
//! # Edit a task's image (needs TASKFLOW_API_KEY or GEMINI_API_KEY)
//! taskflow edit-image "Book flights" --prompt "add a sunset"
//! ```
//!
//! Data lives in `~/.taskflow/todos.json`. Settings are read from
//! `~/.taskflow/config.toml` or `./taskflow.toml`, and logs go to
//! `~/.taskflow/logs/taskflow.log`.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

pub mod cli;
pub mod cmd;
pub mod config;
pub mod dashboard;
pub mod editor;
pub mod error;
pub mod fields;
pub mod filter;
pub mod format;
pub mod image;
pub mod image_edit;
pub mod logging;
pub mod router;
pub mod storage;
pub mod store;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use error::AppError;
use image_edit::{GeminiImageEditor, ImageEditor};
use storage::FileStorage;
use store::TaskStore;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = real_main(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn real_main(cli: Cli) -> Result<(), AppError> {
    let mut config = config::load_default()?;
    if let Some(dir) = cli.data_dir.as_ref() {
        config.data_dir = Some(dir.display().to_string());
    }

    let command = cli.command.unwrap_or(Commands::Ui);
    if let Commands::Completions { shell } = &command {
        cmd_completions(*shell);
        return Ok(());
    }

    // The UI owns the terminal, so it only logs to file.
    let is_ui = matches!(command, Commands::Ui);
    logging::init_tracing(&config.logging, &config.log_dir(), !is_ui)?;

    let data_dir = config.data_dir();
    info!(data_dir = %data_dir.display(), "starting taskflow");
    let storage = FileStorage::open(&data_dir)?;
    let mut store = TaskStore::open(Box::new(storage));

    let image_backend = || -> Option<Arc<dyn ImageEditor>> {
        GeminiImageEditor::from_config(&config.image_edit).map(|e| Arc::new(e) as Arc<dyn ImageEditor>)
    };
    let runtime = || {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
    };

    match command {
        Commands::Ui => {
            let rt = runtime()?;
            tui::run::run_tui(store, image_backend(), rt.handle().clone())?;
        }

        Commands::List { status, priority } => cmd_list(&store, status, priority),

        Commands::Stats => cmd_stats(&store),

        Commands::View { id } => cmd_view(&store, id)?,

        Commands::Add { title, desc, due, priority, status, image } => {
            cmd_add(&mut store, title, desc, due, priority, status, image)?;
        }

        Commands::Update { id, title, desc, due, priority, status, image, clear_due, clear_image } => {
            cmd_update(&mut store, id, title, desc, due, priority, status, image, clear_due, clear_image)?
        }

        Commands::Delete { id, yes } => cmd_delete(&mut store, id, yes)?,

        Commands::EditImage { id, prompt } => {
            let rt = runtime()?;
            cmd_edit_image(&mut store, &rt, image_backend(), id, prompt)?;
        }

        Commands::Completions { .. } => unreachable!("completions handled above"),
    }
    Ok(())
}
