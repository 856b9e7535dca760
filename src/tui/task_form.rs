//! Task form handling for the terminal user interface.
//!
//! `TaskForm` is the on-screen face of a `TaskEditor`: text inputs with
//! cursors plus two selectors. Every keystroke is pushed into the editor's
//! draft straight away, which also clears that field's validation error.

use std::path::Path;

use crate::editor::TaskEditor;
use crate::error::DraftField;
use crate::fields::{Priority, Status};
use crate::task::Task;
use crate::tui::input::InputField;

/// Global order constants for task form fields.
pub const TITLE_GLOBAL_ORDER: usize = 0;
pub const DESCRIPTION_GLOBAL_ORDER: usize = 1;
pub const DUE_GLOBAL_ORDER: usize = 2;
pub const PRIORITY_GLOBAL_ORDER: usize = 3;
pub const STATUS_GLOBAL_ORDER: usize = 4;
pub const IMAGE_PATH_GLOBAL_ORDER: usize = 5;
pub const PROMPT_GLOBAL_ORDER: usize = 6;

const FIELD_COUNT: usize = 7;

pub struct TaskForm {
    pub title: InputField,
    pub description: InputField,
    pub due: InputField,
    pub image_path: InputField,
    pub prompt: InputField,
    pub priority: usize,
    pub status: usize,
    pub current_field: usize,
    editor: TaskEditor,
}

impl TaskForm {
    /// Empty form for a new task.
    pub fn new() -> Self {
        Self::from_editor(TaskEditor::new())
    }

    /// Form populated from an existing task.
    pub fn from_task(task: &Task) -> Self {
        Self::from_editor(TaskEditor::for_task(task))
    }

    fn from_editor(editor: TaskEditor) -> Self {
        let draft = editor.draft();
        let priority = draft.priority.unwrap_or_default().index();
        let status = draft.status.unwrap_or_default().index();
        let mut form = Self {
            title: InputField::with_value(&draft.title),
            description: InputField::with_value(&draft.description),
            due: InputField::with_value(&draft.due_date),
            image_path: InputField::new(),
            prompt: InputField::new(),
            priority,
            status,
            current_field: TITLE_GLOBAL_ORDER,
            editor,
        };
        form.update_active_field();
        form
    }

    pub fn editor(&self) -> &TaskEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut TaskEditor {
        &mut self.editor
    }

    pub fn selected_priority(&self) -> Priority {
        Priority::ALL[self.priority % Priority::ALL.len()]
    }

    pub fn selected_status(&self) -> Status {
        Status::ALL[self.status % Status::ALL.len()]
    }

    /// Validation or image message for a form field, if any.
    pub fn error_for(&self, field: usize) -> Option<&'static str> {
        let draft_field = match field {
            TITLE_GLOBAL_ORDER => DraftField::Title,
            DESCRIPTION_GLOBAL_ORDER => DraftField::Description,
            DUE_GLOBAL_ORDER => DraftField::DueDate,
            PRIORITY_GLOBAL_ORDER => DraftField::Priority,
            STATUS_GLOBAL_ORDER => DraftField::Status,
            IMAGE_PATH_GLOBAL_ORDER | PROMPT_GLOBAL_ORDER => DraftField::Image,
            _ => return None,
        };
        self.editor.error(draft_field)
    }

    fn fields_mut(&mut self) -> [&mut InputField; 5] {
        [
            &mut self.title,
            &mut self.description,
            &mut self.due,
            &mut self.image_path,
            &mut self.prompt,
        ]
    }

    fn current_input(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            TITLE_GLOBAL_ORDER => Some(&mut self.title),
            DESCRIPTION_GLOBAL_ORDER => Some(&mut self.description),
            DUE_GLOBAL_ORDER => Some(&mut self.due),
            IMAGE_PATH_GLOBAL_ORDER => Some(&mut self.image_path),
            PROMPT_GLOBAL_ORDER => Some(&mut self.prompt),
            _ => None,
        }
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = if self.current_field == 0 {
            FIELD_COUNT - 1
        } else {
            self.current_field - 1
        };
        self.update_active_field();
    }

    /// Update which text field shows a cursor.
    pub fn update_active_field(&mut self) {
        for field in self.fields_mut() {
            field.active = false;
        }
        if let Some(field) = self.current_input() {
            field.active = true;
        }
    }

    /// Copy the focused input into the editor draft.
    fn sync_current(&mut self) {
        match self.current_field {
            TITLE_GLOBAL_ORDER => self.editor.set_title(self.title.value.clone()),
            DESCRIPTION_GLOBAL_ORDER => self.editor.set_description(self.description.value.clone()),
            DUE_GLOBAL_ORDER => self.editor.set_due_date(self.due.value.clone()),
            PROMPT_GLOBAL_ORDER => self.editor.set_edit_prompt(self.prompt.value.clone()),
            PRIORITY_GLOBAL_ORDER => self.editor.set_priority(Some(self.selected_priority())),
            STATUS_GLOBAL_ORDER => self.editor.set_status(Some(self.selected_status())),
            _ => {}
        }
    }

    pub fn handle_char(&mut self, c: char) {
        if let Some(field) = self.current_input() {
            field.handle_char(c);
            self.sync_current();
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.current_input() {
            field.handle_backspace();
            self.sync_current();
        }
    }

    pub fn handle_delete(&mut self) {
        if let Some(field) = self.current_input() {
            field.handle_delete();
            self.sync_current();
        }
    }

    /// Left/right moves the cursor in text fields and cycles selectors.
    pub fn handle_left_right(&mut self, right: bool) {
        let step = |i: usize, len: usize| if right { (i + 1) % len } else { (i + len - 1) % len };
        match self.current_field {
            PRIORITY_GLOBAL_ORDER => {
                self.priority = step(self.priority, Priority::ALL.len());
                self.sync_current();
            }
            STATUS_GLOBAL_ORDER => {
                self.status = step(self.status, Status::ALL.len());
                self.sync_current();
            }
            _ => {
                if let Some(field) = self.current_input() {
                    if right {
                        field.move_cursor_right()
                    } else {
                        field.move_cursor_left()
                    }
                }
            }
        }
    }

    /// Load the file named in the image path field into the draft.
    pub fn load_image(&mut self) -> bool {
        let raw = self.image_path.value.trim().to_string();
        if raw.is_empty() {
            return false;
        }
        let path = expand_home(&raw);
        if self.editor.load_image_file(Path::new(&path)).is_ok() {
            self.image_path.clear();
            true
        } else {
            false
        }
    }
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path.to_string(),
    }
}
