//! Command implementations for the CLI interface.
//!
//! Every command that changes a task goes through a `TaskEditor`, so the CLI
//! applies the same validation as the terminal UI.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::dashboard::DashboardStats;
use crate::editor::TaskEditor;
use crate::error::{AppError, DraftField};
use crate::fields::*;
use crate::filter::TaskFilter;
use crate::format::*;
use crate::image_edit::ImageEditor;
use crate::store::TaskStore;
use crate::task::{Task, TaskId};

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive terminal UI (default).
    Ui,

    /// List tasks, optionally filtered by status and priority.
    List {
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
    },

    /// Show dashboard statistics.
    Stats,

    /// View a single task by ID, ID prefix or title.
    View {
        id: String,
    },

    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "in Nd", "next friday", ...
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        #[arg(long, value_enum, default_value_t = Status::NotStarted)]
        status: Status,
        /// Attach an image file.
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Update fields on a task.
    Update {
        /// Task ID, ID prefix or title.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Replace the image with a file.
        #[arg(long, conflicts_with = "clear_image")]
        image: Option<PathBuf>,
        /// Clear the due date.
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,
        /// Remove the image.
        #[arg(long)]
        clear_image: bool,
    },

    /// Delete a task.
    Delete {
        /// Task ID, ID prefix or title.
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// Edit a task's image with an AI instruction.
    EditImage {
        /// Task ID, ID prefix or title.
        id: String,
        /// What to change, e.g. "make the background blue".
        #[arg(long)]
        prompt: String,
    },

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Find a task by exact id, unique id prefix or case-insensitive title.
pub fn resolve_task(identifier: &str, store: &TaskStore) -> Result<TaskId, AppError> {
    let identifier = identifier.trim();
    let exact = TaskId::new(identifier);
    if store.get(&exact).is_some() {
        return Ok(exact);
    }

    let by_prefix: Vec<&Task> = store
        .list()
        .iter()
        .filter(|t| identifier.len() >= 4 && t.id.as_str().starts_with(identifier))
        .collect();
    let matches: Vec<&Task> = if by_prefix.is_empty() {
        let wanted = identifier.to_lowercase();
        store.list().iter().filter(|t| t.title.to_lowercase() == wanted).collect()
    } else {
        by_prefix
    };

    match matches.as_slice() {
        [] => Err(AppError::Command(format!("No task found with id or title '{}'", identifier))),
        [task] => Ok(task.id.clone()),
        many => {
            let mut msg = format!("Multiple tasks match '{}':\n", identifier);
            for task in many {
                msg.push_str(&format!("  {}  {}\n", task.id, task.title));
            }
            msg.push_str("Please use the full ID instead.");
            Err(AppError::Command(msg))
        }
    }
}

fn short_id(id: &TaskId) -> String {
    id.as_str().chars().take(8).collect()
}

pub fn print_table(tasks: &[&Task]) {
    println!("{:<9} {:<12} {:<7} {:<10} {}", "ID", "Status", "Pri", "Due", "Title");
    let today = Local::now().date_naive();
    for t in tasks {
        let image = if t.image.is_some() { " [img]" } else { "" };
        println!(
            "{:<9} {:<12} {:<7} {:<10} {}{}",
            short_id(&t.id),
            format_status(t.status),
            format_priority(t.priority),
            format_due_relative(t.due_date, today),
            truncate(&t.title, 48),
            image
        );
    }
}

/// Print the tasks matching the filter, in store order.
pub fn cmd_list(store: &TaskStore, status: Option<Status>, priority: Option<Priority>) {
    let filter = TaskFilter::new(status.into(), priority.into());
    let tasks = filter.apply(store.list());
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    print_table(&tasks);
    if !filter.is_unfiltered() {
        println!("\n{} of {} tasks", tasks.len(), store.len());
    }
}

pub fn cmd_stats(store: &TaskStore) {
    let stats = DashboardStats::compute(store.list());
    println!("Total tasks:  {}", stats.total);
    println!();
    for status in Status::ALL {
        println!(
            "  {:<12} {:>4}  {:>5.1}%",
            format_status(status),
            stats.status(status),
            stats.ratio(status) * 100.0
        );
    }
    println!();
    for priority in Priority::ALL {
        println!("  {:<12} {:>4}", format_priority(priority), stats.priority(priority));
    }
}

/// View detailed information about a specific task.
pub fn cmd_view(store: &TaskStore, id: String) -> Result<(), AppError> {
    let task_id = resolve_task(&id, store)?;
    let Some(task) = store.get(&task_id) else {
        return Err(AppError::Command(format!("Task {} not found.", task_id)));
    };
    let today = Local::now().date_naive();
    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Status:       {}", format_status(task.status));
    println!("Priority:     {}", format_priority(task.priority));
    println!(
        "Due:          {}",
        match task.due_date {
            Some(d) => format!("{d} ({})", format_due_relative(Some(d), today)),
            None => "-".into(),
        }
    );
    println!("Image:        {}", task.image.as_ref().map(|i| i.to_string()).unwrap_or_else(|| "-".into()));
    println!(
        "Description:\n{}\n",
        if task.description.is_empty() { "-" } else { task.description.as_str() }
    );
    Ok(())
}

/// Add a new task through the editor.
pub fn cmd_add(
    store: &mut TaskStore,
    title: String,
    desc: Option<String>,
    due: Option<String>,
    priority: Priority,
    status: Status,
    image: Option<PathBuf>,
) -> Result<TaskId, AppError> {
    let mut editor = TaskEditor::new();
    editor.set_title(title);
    if let Some(desc) = desc {
        editor.set_description(desc);
    }
    if let Some(due) = due {
        editor.set_due_date(due);
    }
    editor.set_priority(Some(priority));
    editor.set_status(Some(status));
    if let Some(path) = image {
        load_image(&mut editor, &path)?;
    }

    let id = editor.save(store, Local::now().date_naive())?;
    println!("Added task {}.", id);
    Ok(id)
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_update(
    store: &mut TaskStore,
    id: String,
    title: Option<String>,
    desc: Option<String>,
    due: Option<String>,
    priority: Option<Priority>,
    status: Option<Status>,
    image: Option<PathBuf>,
    clear_due: bool,
    clear_image: bool,
) -> Result<(), AppError> {
    let task_id = resolve_task(&id, store)?;
    let Some(task) = store.get(&task_id) else {
        return Err(AppError::Command(format!("Task {} not found.", task_id)));
    };
    let mut editor = TaskEditor::for_task(task);

    if let Some(title) = title {
        editor.set_title(title);
    }
    if let Some(desc) = desc {
        editor.set_description(desc);
    }
    if let Some(due) = due {
        editor.set_due_date(due);
    }
    if clear_due {
        editor.set_due_date("");
    }
    if let Some(p) = priority {
        editor.set_priority(Some(p));
    }
    if let Some(s) = status {
        editor.set_status(Some(s));
    }
    if let Some(path) = image {
        load_image(&mut editor, &path)?;
    }
    if clear_image {
        editor.remove_image();
    }

    editor.save(store, Local::now().date_naive())?;
    println!("Updated task {}.", task_id);
    Ok(())
}

fn load_image(editor: &mut TaskEditor, path: &std::path::Path) -> Result<(), AppError> {
    editor.load_image_file(path).map_err(|e| {
        let msg = editor.error(DraftField::Image).unwrap_or("Failed to read the file.");
        AppError::Command(format!("{} ({}: {})", msg, path.display(), e))
    })
}

/// Delete a task, asking for confirmation unless `yes` is set.
pub fn cmd_delete(store: &mut TaskStore, id: String, yes: bool) -> Result<(), AppError> {
    let task_id = resolve_task(&id, store)?;
    let Some(task) = store.get(&task_id) else {
        return Err(AppError::Command(format!("Task {} not found.", task_id)));
    };
    let mut editor = TaskEditor::for_task(task);
    editor.request_delete()?;

    if !yes {
        let prompt = format!("Delete task {} \"{}\"? [y/N] ", short_id(&task_id), task.title);
        if !confirm(&prompt, &mut io::stdin().lock())? {
            editor.cancel_delete();
            println!("Cancelled.");
            return Ok(());
        }
    }

    editor.confirm_delete(store)?;
    println!("Deleted.");
    Ok(())
}

/// Ask a yes/no question on stdout and read the answer from `input`.
fn confirm(prompt: &str, input: &mut impl BufRead) -> io::Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Run an AI edit on a task's image and save the result.
pub fn cmd_edit_image(
    store: &mut TaskStore,
    runtime: &tokio::runtime::Runtime,
    backend: Option<Arc<dyn ImageEditor>>,
    id: String,
    prompt: String,
) -> Result<(), AppError> {
    let task_id = resolve_task(&id, store)?;
    let Some(task) = store.get(&task_id) else {
        return Err(AppError::Command(format!("Task {} not found.", task_id)));
    };
    let mut editor = TaskEditor::for_task(task);
    editor.set_edit_prompt(prompt);

    let pending = editor
        .begin_image_edit()
        .map_err(|e| AppError::Command(e.user_message().to_string()))?;
    println!("Editing image...");
    let outcome = runtime.block_on(pending.run(backend));
    editor.complete_image_edit(outcome);
    if let Some(msg) = editor.error(DraftField::Image) {
        return Err(AppError::Command(msg.to_string()));
    }

    editor.save(store, Local::now().date_naive())?;
    if let Some(image) = store.get(&task_id).and_then(|t| t.image.as_ref()) {
        println!("Image updated: {}", image);
    }
    Ok(())
}

pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut io::stdout());
}
