//! Main application logic for the terminal user interface.
//!
//! `App` owns the session (sign-in flag and current view), the task store,
//! the list filter and, while a task is being edited, the `TaskForm`. Key
//! events are handled one at a time. Image edits run on the tokio runtime and
//! report back over a channel that the event loop drains between key events.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::dashboard::StatsCache;
use crate::editor::ImageEditOutcome;
use crate::error::{DeleteError, DraftField, SaveError};
use crate::fields::*;
use crate::filter::TaskFilter;
use crate::format::*;
use crate::image_edit::ImageEditor;
use crate::router::{Screen, Session, View};
use crate::store::TaskStore;
use crate::task::{Task, TaskId};
use crate::tui::{
    colors::{priority_color, status_color, DARK_GREEN, DARK_RED, GOLD, SLATE},
    enums::Overlay,
    task_form::{
        TaskForm, DESCRIPTION_GLOBAL_ORDER, DUE_GLOBAL_ORDER, IMAGE_PATH_GLOBAL_ORDER,
        PRIORITY_GLOBAL_ORDER, PROMPT_GLOBAL_ORDER, STATUS_GLOBAL_ORDER, TITLE_GLOBAL_ORDER,
    },
    utils::centered_rect,
};

pub struct App {
    session: Session,
    store: TaskStore,
    filter: TaskFilter,
    filtered_tasks: Vec<TaskId>,
    task_list_state: TableState,
    stats: StatsCache,
    form: Option<TaskForm>,
    overlay: Overlay,
    status_message: String,
    image_editor: Option<Arc<dyn ImageEditor>>,
    runtime: Handle,
    outcome_tx: UnboundedSender<ImageEditOutcome>,
    outcome_rx: UnboundedReceiver<ImageEditOutcome>,
}

impl App {
    pub fn new(store: TaskStore, image_editor: Option<Arc<dyn ImageEditor>>, runtime: Handle) -> Self {
        let (outcome_tx, outcome_rx) = unbounded_channel();
        let mut app = App {
            session: Session::new(),
            store,
            filter: TaskFilter::default(),
            filtered_tasks: Vec::new(),
            task_list_state: TableState::default(),
            stats: StatsCache::default(),
            form: None,
            overlay: Overlay::None,
            status_message: String::new(),
            image_editor,
            runtime,
            outcome_tx,
            outcome_rx,
        };
        app.update_filtered_tasks();
        app
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn form(&self) -> Option<&TaskForm> {
        self.form.as_ref()
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Ids of the tasks passing the current filter, in store order.
    pub fn filtered_tasks(&self) -> &[TaskId] {
        &self.filtered_tasks
    }

    fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    /// Recompute the filtered list and keep the selection in range.
    fn update_filtered_tasks(&mut self) {
        let selected_id = self.selected_task_id();
        self.filtered_tasks = self.filter.apply(self.store.list()).into_iter().map(|t| t.id.clone()).collect();

        let index = selected_id
            .and_then(|id| self.filtered_tasks.iter().position(|t| *t == id))
            .or(if self.filtered_tasks.is_empty() { None } else { Some(0) });
        self.task_list_state.select(index);
    }

    fn selected_task_id(&self) -> Option<TaskId> {
        self.task_list_state
            .selected()
            .and_then(|i| self.filtered_tasks.get(i))
            .cloned()
    }

    fn select_task(&mut self, id: &TaskId) {
        if let Some(i) = self.filtered_tasks.iter().position(|t| t == id) {
            self.task_list_state.select(Some(i));
        }
    }

    fn open_new_task(&mut self) {
        match self.session.open_new() {
            Ok(()) => self.form = Some(TaskForm::new()),
            Err(e) => self.set_status_message(format!("Error: {}", e)),
        }
    }

    fn open_selected_task(&mut self) {
        let Some(id) = self.selected_task_id() else {
            self.set_status_message("No task selected");
            return;
        };
        let Some(task) = self.store.get(&id) else {
            return;
        };
        let form = TaskForm::from_task(task);
        match self.session.open_edit(id) {
            Ok(()) => self.form = Some(form),
            Err(e) => self.set_status_message(format!("Error: {}", e)),
        }
    }

    /// Leave the editor for the list, dropping the form.
    fn close_editor(&mut self) {
        if let Err(e) = self.session.close_editor() {
            warn!(error = %e, "closing editor from unexpected view");
        }
        self.form = None;
        self.update_filtered_tasks();
    }

    fn logout(&mut self) {
        self.session.logout();
        self.form = None;
        self.overlay = Overlay::None;
        self.set_status_message("Signed out");
    }

    fn save_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let is_new = form.editor().is_new();
        match form.editor_mut().save(&mut self.store, Local::now().date_naive()) {
            Ok(id) => {
                self.close_editor();
                self.select_task(&id);
                self.set_status_message(if is_new { "Task created" } else { "Task updated" });
            }
            Err(SaveError::Invalid(errors)) => {
                self.set_status_message(format!("Cannot save: {}", errors));
            }
            Err(e @ SaveError::Persist { .. }) => {
                self.close_editor();
                self.set_status_message(format!("Error: {}", e));
            }
        }
    }

    fn confirm_delete(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match form.editor_mut().confirm_delete(&mut self.store) {
            Ok(_) => {
                self.close_editor();
                self.set_status_message("Task deleted");
            }
            Err(e @ DeleteError::Persist { .. }) => {
                self.close_editor();
                self.set_status_message(format!("Error: {}", e));
            }
            Err(e) => self.set_status_message(format!("Error: {}", e)),
        }
    }

    /// Hand the draft image and prompt to the image editor in the background.
    fn start_image_edit(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match form.editor_mut().begin_image_edit() {
            Ok(pending) => {
                let tx = self.outcome_tx.clone();
                let backend = self.image_editor.clone();
                self.runtime.spawn(async move {
                    let outcome = pending.run(backend).await;
                    // The receiver only goes away when the app exits.
                    let _ = tx.send(outcome);
                });
                self.set_status_message("Editing image...");
            }
            Err(e) => self.set_status_message(e.user_message()),
        }
    }

    /// Apply finished image edits to the open form, if they belong to it.
    pub fn drain_image_outcomes(&mut self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            let Some(form) = self.form.as_mut() else {
                debug!(session = outcome.session, "image edit finished after editor closed");
                continue;
            };
            let succeeded = outcome.result.is_ok();
            if form.editor_mut().complete_image_edit(outcome) {
                self.set_status_message(if succeeded { "Image updated" } else { "Image edit failed" });
            }
        }
    }

    fn handle_landing_input(&mut self, key: KeyCode, _modifiers: KeyModifiers) -> io::Result<bool> {
        match key {
            KeyCode::Enter | KeyCode::Char('l') => {
                self.session.login();
                self.set_status_message("Welcome back");
            }
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            _ => {}
        }
        Ok(false)
    }

    fn handle_dashboard_input(&mut self, key: KeyCode, _modifiers: KeyModifiers) -> io::Result<bool> {
        match key {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Tab | KeyCode::Char('l') | KeyCode::Char('t') => {
                if let Err(e) = self.session.show_list() {
                    self.set_status_message(format!("Error: {}", e));
                }
            }
            KeyCode::Char('a') | KeyCode::Char('n') => self.open_new_task(),
            KeyCode::Char('o') => self.logout(),
            KeyCode::Char('h') | KeyCode::Char('?') => self.overlay = Overlay::Help,
            _ => {}
        }
        Ok(false)
    }

    fn handle_task_list_input(&mut self, key: KeyCode, _modifiers: KeyModifiers) -> io::Result<bool> {
        match key {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(selected) = self.task_list_state.selected() {
                    if selected > 0 {
                        self.task_list_state.select(Some(selected - 1));
                    }
                } else if !self.filtered_tasks.is_empty() {
                    self.task_list_state.select(Some(0));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(selected) = self.task_list_state.selected() {
                    if selected + 1 < self.filtered_tasks.len() {
                        self.task_list_state.select(Some(selected + 1));
                    }
                } else if !self.filtered_tasks.is_empty() {
                    self.task_list_state.select(Some(0));
                }
            }
            KeyCode::Enter | KeyCode::Char('e') => self.open_selected_task(),
            KeyCode::Char('a') | KeyCode::Char('n') => self.open_new_task(),
            KeyCode::Char('s') => {
                self.filter.cycle_status();
                self.update_filtered_tasks();
            }
            KeyCode::Char('p') => {
                self.filter.cycle_priority();
                self.update_filtered_tasks();
            }
            KeyCode::Char('r') => {
                self.filter = TaskFilter::default();
                self.update_filtered_tasks();
                self.set_status_message("Filters cleared");
            }
            KeyCode::Tab | KeyCode::Char('d') => {
                if let Err(e) = self.session.show_dashboard() {
                    self.set_status_message(format!("Error: {}", e));
                }
            }
            KeyCode::Char('o') => self.logout(),
            KeyCode::Char('h') | KeyCode::Char('?') => self.overlay = Overlay::Help,
            _ => {}
        }
        Ok(false)
    }

    fn handle_form_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> io::Result<bool> {
        let Some(form) = self.form.as_mut() else {
            return Ok(false);
        };

        if form.editor().is_confirming_delete() {
            match key {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => self.confirm_delete(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => form.editor_mut().cancel_delete(),
                _ => {}
            }
            return Ok(false);
        }

        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        match key {
            KeyCode::Esc => {
                self.close_editor();
                self.set_status_message("Edit cancelled");
            }
            KeyCode::Char('s') if ctrl => self.save_form(),
            KeyCode::Char('d') if ctrl => {
                if let Err(e) = form.editor_mut().request_delete() {
                    self.set_status_message(format!("Error: {}", e));
                }
            }
            KeyCode::Char('x') if ctrl => {
                form.editor_mut().remove_image();
                self.set_status_message("Image removed");
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Left => form.handle_left_right(false),
            KeyCode::Right => form.handle_left_right(true),
            KeyCode::Backspace => form.handle_backspace(),
            KeyCode::Delete => form.handle_delete(),
            KeyCode::Enter => match form.current_field {
                IMAGE_PATH_GLOBAL_ORDER => {
                    if form.load_image() {
                        self.set_status_message("Image loaded");
                    }
                }
                PROMPT_GLOBAL_ORDER => self.start_image_edit(),
                _ => self.save_form(),
            },
            KeyCode::Char(c) if !ctrl => form.handle_char(c),
            _ => {}
        }
        Ok(false)
    }

    /// Dispatch one key press. Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> io::Result<bool> {
        if key.kind != KeyEventKind::Press {
            return Ok(false);
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }
        self.status_message.clear();

        if self.overlay == Overlay::Help {
            self.overlay = Overlay::None;
            return Ok(false);
        }

        match self.session.screen() {
            Screen::Landing => self.handle_landing_input(key.code, key.modifiers),
            Screen::Dashboard => self.handle_dashboard_input(key.code, key.modifiers),
            Screen::List => self.handle_task_list_input(key.code, key.modifiers),
            Screen::Editor => self.handle_form_input(key.code, key.modifiers),
        }
    }

    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                return self.handle_key(key);
            }
        }
        Ok(false)
    }

    fn render_header(&mut self, f: &mut Frame, area: Rect) {
        let tab = |label: &'static str, active: bool| {
            if active {
                Span::styled(label, Style::default().fg(Color::Black).bg(GOLD).add_modifier(Modifier::BOLD))
            } else {
                Span::raw(label)
            }
        };
        let view = self.session.view();
        let line = Line::from(vec![
            Span::styled("TASKFLOW", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("   "),
            tab(" Dashboard ", *view == View::Dashboard),
            Span::raw(" "),
            tab(" Tasks ", *view == View::List),
            Span::raw(" "),
            tab(" Editor ", matches!(view, View::Editor(_))),
        ]);
        let header = Paragraph::new(line)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_landing(&mut self, f: &mut Frame, area: Rect) {
        let area = centered_rect(60, 40, area);
        let text = vec![
            Line::from(""),
            Line::from(Span::styled("TaskFlow", Style::default().fg(GOLD).add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from("Organize your work and life, finally."),
            Line::from("Track tasks, see progress at a glance and touch up task images with AI."),
            Line::from(""),
            Line::from("Press Enter to sign in, q to quit"),
        ];
        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Welcome"))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_dashboard(&mut self, f: &mut Frame, area: Rect) {
        let stats = self.stats.get(self.store.revision(), self.store.list());

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(11), Constraint::Min(0)])
            .split(area);

        let total = Paragraph::new(Line::from(vec![
            Span::styled("Total tasks: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(stats.total.to_string()),
        ]))
        .block(Block::default().borders(Borders::ALL).title("Overview"));
        f.render_widget(total, chunks[0]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        let block = Block::default().borders(Borders::ALL).title("By status");
        let inner = block.inner(columns[0]);
        f.render_widget(block, columns[0]);
        let gauges = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Length(3)])
            .split(inner);
        for (status, slot) in Status::ALL.iter().zip(gauges.iter()) {
            let ratio = stats.ratio(*status);
            let gauge = Gauge::default()
                .block(Block::default().title(format_status(*status)))
                .gauge_style(Style::default().fg(status_color(*status)))
                .ratio(ratio)
                .label(format!("{} ({:.0}%)", stats.status(*status), ratio * 100.0));
            f.render_widget(gauge, *slot);
        }

        let priority_lines: Vec<Line> = Priority::ALL
            .iter()
            .map(|p| {
                Line::from(vec![
                    Span::styled(
                        format!("{:<8}", format_priority(*p)),
                        Style::default().fg(priority_color(*p)).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!("{:>4}", stats.priority(*p))),
                ])
            })
            .collect();
        let priorities = Paragraph::new(priority_lines)
            .block(Block::default().borders(Borders::ALL).title("By priority"));
        f.render_widget(priorities, columns[1]);

        let help = Paragraph::new("Tab: task list | a: new task | o: sign out | h: help | q: quit")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(help, chunks[2]);
    }

    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let today = Local::now().date_naive();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let filter_line = Line::from(vec![
            Span::styled("Status: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format_selection(self.filter.status, format_status), Style::default().fg(Color::Cyan)),
            Span::raw("   "),
            Span::styled("Priority: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format_selection(self.filter.priority, format_priority), Style::default().fg(Color::Cyan)),
            Span::styled("   (s/p to change, r to reset)", Style::default().fg(Color::DarkGray)),
        ]);
        f.render_widget(
            Paragraph::new(filter_line).block(Block::default().borders(Borders::ALL).title("Filters")),
            chunks[0],
        );

        let header = Row::new(["Status", "Priority", "Due", "Img", "Title"].map(|h| {
            Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(DARK_GREEN).fg(Color::White))
        .height(1);

        let rows: Vec<Row> = self
            .filtered_tasks
            .iter()
            .filter_map(|id| self.store.get(id))
            .map(|task: &Task| {
                let style = match task.status {
                    Status::Completed => Style::default().fg(Color::DarkGray),
                    Status::InProgress => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                    Status::NotStarted => Style::default().fg(Color::White),
                };
                Row::new(vec![
                    Cell::from(format_status(task.status)).style(Style::default().fg(status_color(task.status))),
                    Cell::from(format_priority(task.priority)).style(Style::default().fg(priority_color(task.priority))),
                    Cell::from(format_due_relative(task.due_date, today)),
                    Cell::from(if task.image.is_some() { "*" } else { "" }),
                    Cell::from(task.title.clone()),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(10),
            Constraint::Length(4),
            Constraint::Min(20),
        ];

        let title = if self.filtered_tasks.is_empty() {
            "Tasks - none match the current filters (a to add)".to_string()
        } else {
            format!("Tasks ({}/{}) - Enter to edit, a to add", self.filtered_tasks.len(), self.store.len())
        };
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, chunks[1], &mut self.task_list_state);
    }

    fn render_task_form(&mut self, f: &mut Frame, area: Rect) {
        let Some(form) = self.form.as_ref() else {
            return;
        };

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let left_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(6), // Description
                Constraint::Length(3), // Due date
                Constraint::Length(3), // Priority
                Constraint::Length(3), // Status
                Constraint::Min(0),
            ])
            .split(main_chunks[0]);

        let right_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Image preview
                Constraint::Length(3), // Image path
                Constraint::Length(3), // Prompt
                Constraint::Min(1),    // Instructions
            ])
            .split(main_chunks[1]);

        let block_for = |field: usize, label: &str| {
            let error = form.error_for(field);
            let border = if error.is_some() {
                Style::default().fg(Color::Red)
            } else if form.current_field == field {
                Style::default().fg(GOLD)
            } else {
                Style::default()
            };
            let title = match error {
                Some(msg) => format!("{} - {}", label, msg),
                None => label.to_string(),
            };
            Block::default().borders(Borders::ALL).title(title).border_style(border)
        };

        f.render_widget(
            Paragraph::new(form.title.display()).block(block_for(TITLE_GLOBAL_ORDER, "Title *")),
            left_chunks[0],
        );
        f.render_widget(
            Paragraph::new(form.description.display())
                .block(block_for(DESCRIPTION_GLOBAL_ORDER, "Description"))
                .wrap(Wrap { trim: false }),
            left_chunks[1],
        );
        f.render_widget(
            Paragraph::new(form.due.display())
                .block(block_for(DUE_GLOBAL_ORDER, "Due date (YYYY-MM-DD, tomorrow, next fri...)")),
            left_chunks[2],
        );
        let priority = form.selected_priority();
        f.render_widget(
            Paragraph::new(Span::styled(
                format!("< {} >", format_priority(priority)),
                Style::default().fg(priority_color(priority)),
            ))
            .block(block_for(PRIORITY_GLOBAL_ORDER, "Priority")),
            left_chunks[3],
        );
        let status = form.selected_status();
        f.render_widget(
            Paragraph::new(Span::styled(
                format!("< {} >", format_status(status)),
                Style::default().fg(status_color(status)),
            ))
            .block(block_for(STATUS_GLOBAL_ORDER, "Status")),
            left_chunks[4],
        );

        let editor = form.editor();
        let image_text = match (&editor.draft().image, editor.is_image_edit_running()) {
            (_, true) => "Editing image...".to_string(),
            (Some(image), false) => image.to_string(),
            (None, false) => "No image attached".to_string(),
        };
        let image_title = match editor.error(DraftField::Image) {
            Some(msg) => format!("Image - {}", msg),
            None => "Image".to_string(),
        };
        let image_border = if editor.error(DraftField::Image).is_some() {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        f.render_widget(
            Paragraph::new(image_text)
                .block(Block::default().borders(Borders::ALL).title(image_title).border_style(image_border))
                .wrap(Wrap { trim: true }),
            right_chunks[0],
        );

        let focus = |field: usize| {
            if form.current_field == field {
                Style::default().fg(GOLD)
            } else {
                Style::default()
            }
        };
        f.render_widget(
            Paragraph::new(form.image_path.display()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Image file (Enter to load)")
                    .border_style(focus(IMAGE_PATH_GLOBAL_ORDER)),
            ),
            right_chunks[1],
        );
        f.render_widget(
            Paragraph::new(form.prompt.display()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("AI edit prompt (Enter to apply)")
                    .border_style(focus(PROMPT_GLOBAL_ORDER)),
            ),
            right_chunks[2],
        );

        let mut instructions = vec![
            Line::from("Tab/Shift+Tab: move between fields"),
            Line::from("Left/Right: change priority and status"),
            Line::from("Enter or Ctrl+S: save    Esc: cancel"),
            Line::from("Ctrl+X: remove image"),
        ];
        if !editor.is_new() {
            instructions.push(Line::from("Ctrl+D: delete task"));
        }
        if self.image_editor.is_none() {
            instructions.push(Line::from(Span::styled(
                "AI image editing is off (no API key configured)",
                Style::default().fg(Color::DarkGray),
            )));
        }
        let title = if editor.is_new() { "New Task" } else { "Edit Task" };
        f.render_widget(
            Paragraph::new(instructions).block(Block::default().borders(Borders::ALL).title(title)),
            right_chunks[3],
        );
    }

    fn render_confirm(&mut self, f: &mut Frame, area: Rect) {
        let title = self.form.as_ref().map(|form| form.title.value.clone()).unwrap_or_default();
        let block = Block::default()
            .title("Confirm Action")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));

        let area = centered_rect(50, 30, area);
        f.render_widget(Clear, area);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Are you sure you want to delete this task?",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(title),
            Line::from(""),
            Line::from("This action cannot be undone."),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];
        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_help(&mut self, f: &mut Frame, area: Rect) {
        let area = centered_rect(60, 70, area);
        f.render_widget(Clear, area);
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let text = vec![
            Line::from(Span::styled("Dashboard", bold)),
            Line::from("  Tab / l     task list"),
            Line::from("  a           new task"),
            Line::from(""),
            Line::from(Span::styled("Task list", bold)),
            Line::from("  Up/Down     select"),
            Line::from("  Enter / e   edit selected"),
            Line::from("  a           new task"),
            Line::from("  s / p       cycle status / priority filter"),
            Line::from("  r           reset filters"),
            Line::from("  Tab / d     dashboard"),
            Line::from(""),
            Line::from(Span::styled("Anywhere", bold)),
            Line::from("  o           sign out"),
            Line::from("  q / Ctrl+C  quit"),
            Line::from(""),
            Line::from("Press any key to close"),
        ];
        f.render_widget(
            Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Help")),
            area,
        );
    }

    fn render_status_bar(&mut self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.session.screen() {
                Screen::Landing => "Signed out".to_string(),
                Screen::Dashboard => format!("Dashboard | {} tasks | Press 'h' for help", self.store.len()),
                Screen::List => format!("Tasks: {} | Press 'h' for help", self.filtered_tasks.len()),
                Screen::Editor => match self.form.as_ref() {
                    Some(form) if form.editor().is_new() => "Add New Task".to_string(),
                    _ => "Edit Task".to_string(),
                },
            }
        };
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(SLATE).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    pub fn render(&mut self, f: &mut Frame) {
        let screen = self.session.screen();
        if screen == Screen::Landing {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(1)])
                .split(f.area());
            self.render_landing(f, chunks[0]);
            self.render_status_bar(f, chunks[1]);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        self.render_header(f, chunks[0]);
        match screen {
            Screen::Dashboard => self.render_dashboard(f, chunks[1]),
            Screen::List => self.render_task_list(f, chunks[1]),
            Screen::Editor => {
                self.render_task_form(f, chunks[1]);
                if self.form.as_ref().is_some_and(|form| form.editor().is_confirming_delete()) {
                    self.render_confirm(f, chunks[1]);
                }
            }
            Screen::Landing => {}
        }
        if self.overlay == Overlay::Help {
            self.render_help(f, chunks[1]);
        }
        self.render_status_bar(f, chunks[2]);
    }

    /// Main event loop. Handles rendering and input until the user exits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.drain_image_outcomes();
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}
