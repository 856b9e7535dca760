//! Task editor and validator.
//!
//! A `TaskEditor` holds a draft of every task field except the id. Edits land
//! in the draft immediately; nothing reaches the store until `save` passes
//! validation. Each editor gets a process-unique session number so that an
//! image edit finishing after the editor was closed can be recognized and
//! dropped.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::{DeleteError, DraftField, ImageEditError, SaveError, ValidationErrors};
use crate::fields::{Priority, Status};
use crate::format::{format_due_input, parse_due_input};
use crate::image::ImagePayload;
use crate::image_edit::{edit_image, ImageEditor};
use crate::store::TaskStore;
use crate::task::{Task, TaskId};

pub const TITLE_REQUIRED: &str = "Title is required.";
pub const PRIORITY_REQUIRED: &str = "Priority is required.";
pub const STATUS_REQUIRED: &str = "Status is required.";
pub const DUE_DATE_INVALID: &str = "Due date is not a valid date.";
pub const FILE_READ_FAILED: &str = "Failed to read the file.";

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Every task field except the id. The due date is kept as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub image: Option<ImagePayload>,
}

impl Default for TaskDraft {
    fn default() -> Self {
        TaskDraft {
            title: String::new(),
            description: String::new(),
            due_date: String::new(),
            priority: Some(Priority::default()),
            status: Some(Status::default()),
            image: None,
        }
    }
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        TaskDraft {
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: format_due_input(task.due_date),
            priority: Some(task.priority),
            status: Some(task.status),
            image: task.image.clone(),
        }
    }
}

/// An image edit handed out by [`TaskEditor::begin_image_edit`].
#[derive(Debug, Clone)]
pub struct PendingImageEdit {
    pub session: u64,
    pub image: ImagePayload,
    pub prompt: String,
}

impl PendingImageEdit {
    pub async fn run(self, editor: Option<Arc<dyn ImageEditor>>) -> ImageEditOutcome {
        let result = edit_image(editor.as_deref(), Some(&self.image), &self.prompt).await;
        ImageEditOutcome { session: self.session, result }
    }
}

/// Result of an image edit, tagged with the editor session that asked for it.
#[derive(Debug)]
pub struct ImageEditOutcome {
    pub session: u64,
    pub result: Result<ImagePayload, ImageEditError>,
}

#[derive(Debug)]
pub struct TaskEditor {
    session: u64,
    target: Option<TaskId>,
    draft: TaskDraft,
    errors: ValidationErrors,
    edit_prompt: String,
    confirming_delete: bool,
    image_edit_running: bool,
}

impl TaskEditor {
    /// Editor for a new task with default fields.
    pub fn new() -> Self {
        Self::with_draft(None, TaskDraft::default())
    }

    /// Editor for an existing task.
    pub fn for_task(task: &Task) -> Self {
        Self::with_draft(Some(task.id.clone()), TaskDraft::from(task))
    }

    fn with_draft(target: Option<TaskId>, draft: TaskDraft) -> Self {
        TaskEditor {
            session: NEXT_SESSION.fetch_add(1, Ordering::Relaxed),
            target,
            draft,
            errors: ValidationErrors::default(),
            edit_prompt: String::new(),
            confirming_delete: false,
            image_edit_running: false,
        }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    /// Id of the task being edited, `None` while creating.
    pub fn target(&self) -> Option<&TaskId> {
        self.target.as_ref()
    }

    pub fn is_new(&self) -> bool {
        self.target.is_none()
    }

    pub fn draft(&self) -> &TaskDraft {
        &self.draft
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn error(&self, field: DraftField) -> Option<&'static str> {
        self.errors.get(field)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.draft.title = title.into();
        self.errors.remove(DraftField::Title);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.draft.description = description.into();
        self.errors.remove(DraftField::Description);
    }

    pub fn set_due_date(&mut self, due_date: impl Into<String>) {
        self.draft.due_date = due_date.into();
        self.errors.remove(DraftField::DueDate);
    }

    pub fn set_priority(&mut self, priority: Option<Priority>) {
        self.draft.priority = priority;
        self.errors.remove(DraftField::Priority);
    }

    pub fn set_status(&mut self, status: Option<Status>) {
        self.draft.status = status;
        self.errors.remove(DraftField::Status);
    }

    pub fn set_image(&mut self, image: Option<ImagePayload>) {
        self.draft.image = image;
        self.errors.remove(DraftField::Image);
    }

    pub fn remove_image(&mut self) {
        self.set_image(None);
    }

    /// Replace the draft image with the contents of `path`.
    ///
    /// On failure the draft keeps its previous image and the image field shows
    /// "Failed to read the file.".
    pub fn load_image_file(&mut self, path: &Path) -> std::io::Result<()> {
        match ImagePayload::from_file(path) {
            Ok(image) => {
                debug!(path = %path.display(), %image, "loaded image");
                self.set_image(Some(image));
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read image file");
                self.errors.insert(DraftField::Image, FILE_READ_FAILED);
                Err(e)
            }
        }
    }

    pub fn edit_prompt(&self) -> &str {
        &self.edit_prompt
    }

    pub fn set_edit_prompt(&mut self, prompt: impl Into<String>) {
        self.edit_prompt = prompt.into();
    }

    /// Check the draft. `today` anchors relative due dates.
    pub fn validate(&self, today: NaiveDate) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        if self.draft.title.trim().is_empty() {
            errors.insert(DraftField::Title, TITLE_REQUIRED);
        }
        if self.draft.priority.is_none() {
            errors.insert(DraftField::Priority, PRIORITY_REQUIRED);
        }
        if self.draft.status.is_none() {
            errors.insert(DraftField::Status, STATUS_REQUIRED);
        }
        if self.parse_due(today).is_err() {
            errors.insert(DraftField::DueDate, DUE_DATE_INVALID);
        }
        errors
    }

    fn parse_due(&self, today: NaiveDate) -> Result<Option<NaiveDate>, ()> {
        let text = self.draft.due_date.trim();
        if text.is_empty() {
            return Ok(None);
        }
        parse_due_input(text, today).map(Some).ok_or(())
    }

    /// Validate and write the draft into `store`.
    ///
    /// An existing task is replaced in place under its id; a new one gets a
    /// fresh id. After a successful save the editor targets that id, so saving
    /// again updates rather than duplicates. A persistence failure still
    /// leaves the task in the store.
    pub fn save(&mut self, store: &mut TaskStore, today: NaiveDate) -> Result<TaskId, SaveError> {
        let errors = self.validate(today);
        let (Some(priority), Some(status), Ok(due_date), true) =
            (self.draft.priority, self.draft.status, self.parse_due(today), errors.is_empty())
        else {
            self.errors = errors.clone();
            return Err(SaveError::Invalid(errors));
        };
        self.errors = errors;

        let id = match &self.target {
            Some(id) => id.clone(),
            None => store.fresh_id(),
        };
        let task = Task {
            id: id.clone(),
            title: self.draft.title.trim().to_string(),
            description: self.draft.description.clone(),
            due_date,
            priority,
            status,
            image: self.draft.image.clone(),
        };
        let created = self.target.is_none();
        self.target = Some(id.clone());

        store
            .upsert(task)
            .map_err(|source| SaveError::Persist { id: id.clone(), source })?;
        info!(%id, created, "saved task");
        Ok(id)
    }

    /// Ask for confirmation before deleting. Only existing tasks can be deleted.
    pub fn request_delete(&mut self) -> Result<(), DeleteError> {
        if self.target.is_none() {
            return Err(DeleteError::NotEditing);
        }
        self.confirming_delete = true;
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        self.confirming_delete = false;
    }

    pub fn is_confirming_delete(&self) -> bool {
        self.confirming_delete
    }

    /// Delete the edited task after `request_delete`.
    pub fn confirm_delete(&mut self, store: &mut TaskStore) -> Result<TaskId, DeleteError> {
        let Some(id) = self.target.clone() else {
            return Err(DeleteError::NotEditing);
        };
        if !self.confirming_delete {
            return Err(DeleteError::NotConfirmed);
        }
        self.confirming_delete = false;
        let removed = store
            .delete(&id)
            .map_err(|source| DeleteError::Persist { id: id.clone(), source })?;
        info!(%id, removed, "deleted task");
        Ok(id)
    }

    pub fn is_image_edit_running(&self) -> bool {
        self.image_edit_running
    }

    /// Start an image edit of the draft image with the current prompt.
    ///
    /// Refused while another edit from this editor is running. Missing image
    /// or prompt is reported on the image field without starting anything.
    pub fn begin_image_edit(&mut self) -> Result<PendingImageEdit, ImageEditError> {
        if self.image_edit_running {
            return Err(ImageEditError::InFlight);
        }
        let prompt = self.edit_prompt.trim();
        let image = match &self.draft.image {
            Some(image) if !prompt.is_empty() => image.clone(),
            _ => {
                let err = ImageEditError::MissingInput;
                self.errors.insert(DraftField::Image, err.user_message());
                return Err(err);
            }
        };
        self.errors.remove(DraftField::Image);
        self.image_edit_running = true;
        Ok(PendingImageEdit { session: self.session, image, prompt: prompt.to_string() })
    }

    /// Apply a finished image edit. Returns `false` if it belongs to another
    /// editor session and was ignored.
    pub fn complete_image_edit(&mut self, outcome: ImageEditOutcome) -> bool {
        if outcome.session != self.session {
            debug!(session = outcome.session, "discarding stale image edit");
            return false;
        }
        self.image_edit_running = false;
        match outcome.result {
            Ok(image) => self.set_image(Some(image)),
            Err(e) => self.errors.insert(DraftField::Image, e.user_message()),
        }
        true
    }
}

impl Default for TaskEditor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::DashboardStats;
    use crate::error::{IMAGE_EDIT_FAILED, IMAGE_EDIT_MISSING_INPUT};
    use crate::storage::MemoryStorage;
    use crate::store::TASKS_SLOT;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 14).unwrap()
    }

    fn store_with(tasks: &[Task]) -> TaskStore {
        let storage = MemoryStorage::with_slot(TASKS_SLOT, &serde_json::to_string(tasks).unwrap());
        TaskStore::open(Box::new(storage))
    }

    fn task(id: &str, title: &str, status: Status, priority: Priority) -> Task {
        let mut t = Task::new(TaskId::new(id), title);
        t.status = status;
        t.priority = priority;
        t
    }

    struct FailingEditor;

    #[async_trait]
    impl ImageEditor for FailingEditor {
        async fn edit(&self, _: &ImagePayload, _: &str) -> Result<ImagePayload, ImageEditError> {
            Err(ImageEditError::Service { status: 503, body: "overloaded".into() })
        }
    }

    struct InvertingEditor;

    #[async_trait]
    impl ImageEditor for InvertingEditor {
        async fn edit(&self, _: &ImagePayload, _: &str) -> Result<ImagePayload, ImageEditError> {
            Ok(ImagePayload::from_base64("image/png", "SU5WRVJURUQ="))
        }
    }

    #[test]
    fn new_draft_has_defaults() {
        let editor = TaskEditor::new();
        let draft = editor.draft();
        assert_eq!(draft.title, "");
        assert_eq!(draft.due_date, "");
        assert_eq!(draft.priority, Some(Priority::Medium));
        assert_eq!(draft.status, Some(Status::NotStarted));
        assert!(draft.image.is_none());
        assert!(editor.is_new());
    }

    #[test]
    fn sessions_are_unique() {
        assert_ne!(TaskEditor::new().session(), TaskEditor::new().session());
    }

    #[test]
    fn blank_title_reports_one_error_and_leaves_store_alone() {
        let mut store = store_with(&[task("1", "A", Status::NotStarted, Priority::Low)]);
        let before = store.list().to_vec();
        let mut editor = TaskEditor::new();
        editor.set_title("   ");

        let err = editor.save(&mut store, today()).unwrap_err();
        let SaveError::Invalid(errors) = err else { panic!("expected validation error") };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get(DraftField::Title), Some(TITLE_REQUIRED));
        assert_eq!(editor.error(DraftField::Title), Some(TITLE_REQUIRED));
        assert_eq!(store.list(), before.as_slice());
    }

    #[test]
    fn editing_a_field_clears_its_error() {
        let mut store = store_with(&[]);
        let mut editor = TaskEditor::new();
        editor.set_priority(None);
        assert!(editor.save(&mut store, today()).is_err());
        assert_eq!(editor.errors().len(), 2);

        editor.set_title("Now titled");
        assert_eq!(editor.error(DraftField::Title), None);
        assert_eq!(editor.error(DraftField::Priority), Some(PRIORITY_REQUIRED));
    }

    #[test]
    fn missing_status_and_bad_due_date_are_reported() {
        let mut editor = TaskEditor::new();
        editor.set_title("T");
        editor.set_status(None);
        editor.set_due_date("the thirty-second");
        let errors = editor.validate(today());
        assert_eq!(errors.get(DraftField::Status), Some(STATUS_REQUIRED));
        assert_eq!(errors.get(DraftField::DueDate), Some(DUE_DATE_INVALID));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn out_of_range_relative_due_date_is_invalid() {
        let mut store = store_with(&[task("1", "A", Status::NotStarted, Priority::Low)]);
        let mut editor = TaskEditor::new();
        editor.set_title("T");
        editor.set_due_date("in 999999999d");

        let err = editor.save(&mut store, today()).unwrap_err();
        let SaveError::Invalid(errors) = err else { panic!("expected validation error") };
        assert_eq!(errors.get(DraftField::DueDate), Some(DUE_DATE_INVALID));
        assert_eq!(errors.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn create_assigns_fresh_id_and_appends() {
        let mut store = store_with(&[task("1", "A", Status::NotStarted, Priority::Low)]);
        let mut editor = TaskEditor::new();
        editor.set_title("  Buy milk ");
        editor.set_due_date("tomorrow");

        let id = editor.save(&mut store, today()).unwrap();
        assert_ne!(id.as_str(), "1");
        assert_eq!(store.len(), 2);
        let saved = store.get(&id).unwrap();
        assert_eq!(saved.title, "Buy milk");
        assert_eq!(saved.due_date, NaiveDate::from_ymd_opt(2024, 8, 15));
        assert_eq!(store.list()[1].id, id);

        // A second save updates the same task.
        editor.set_description("2 litres");
        assert_eq!(editor.save(&mut store, today()).unwrap(), id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn edit_replaces_in_place_and_updates_dashboard() {
        let mut store = store_with(&[task("1", "A", Status::NotStarted, Priority::Low)]);
        let mut editor = TaskEditor::for_task(store.get(&TaskId::new("1")).unwrap());
        editor.set_status(Some(Status::Completed));
        editor.save(&mut store, today()).unwrap();

        assert_eq!(store.list(), &[task("1", "A", Status::Completed, Priority::Low)]);
        let stats = DashboardStats::compute(store.list());
        assert_eq!(stats.status(Status::Completed), 1);
        assert_eq!(stats.status(Status::NotStarted), 0);
    }

    #[test]
    fn edit_keeps_other_tasks_intact() {
        let tasks = [
            task("1", "A", Status::NotStarted, Priority::Low),
            task("2", "B", Status::InProgress, Priority::High),
            task("3", "C", Status::Completed, Priority::Medium),
        ];
        let mut store = store_with(&tasks);
        let mut editor = TaskEditor::for_task(&tasks[1]);
        editor.set_title("B2");
        editor.save(&mut store, today()).unwrap();

        assert_eq!(store.list()[0], tasks[0]);
        assert_eq!(store.list()[1].title, "B2");
        assert_eq!(store.list()[1].id.as_str(), "2");
        assert_eq!(store.list()[2], tasks[2]);
    }

    #[test]
    fn delete_requires_confirmation() {
        let tasks = [task("1", "A", Status::NotStarted, Priority::Low), task("2", "B", Status::NotStarted, Priority::Low)];
        let mut store = store_with(&tasks);
        let mut editor = TaskEditor::for_task(&tasks[0]);

        assert!(matches!(editor.confirm_delete(&mut store), Err(DeleteError::NotConfirmed)));
        assert_eq!(store.len(), 2);

        editor.request_delete().unwrap();
        editor.cancel_delete();
        assert!(!editor.is_confirming_delete());

        editor.request_delete().unwrap();
        assert_eq!(editor.confirm_delete(&mut store).unwrap().as_str(), "1");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn new_task_cannot_be_deleted() {
        let mut editor = TaskEditor::new();
        assert!(matches!(editor.request_delete(), Err(DeleteError::NotEditing)));
    }

    #[test]
    fn load_image_file_sets_or_reports() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.png");
        std::fs::write(&path, b"meow").unwrap();

        let mut editor = TaskEditor::new();
        editor.load_image_file(&path).unwrap();
        let image = editor.draft().image.clone().unwrap();
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.decode().unwrap(), b"meow");

        assert!(editor.load_image_file(&dir.path().join("missing.png")).is_err());
        assert_eq!(editor.error(DraftField::Image), Some(FILE_READ_FAILED));
        assert_eq!(editor.draft().image.as_ref(), Some(&image));

        editor.remove_image();
        assert!(editor.draft().image.is_none());
        assert_eq!(editor.error(DraftField::Image), None);
    }

    #[test]
    fn image_edit_without_image_fails_locally() {
        let mut editor = TaskEditor::new();
        editor.set_edit_prompt("add a hat");
        let err = editor.begin_image_edit().unwrap_err();
        assert!(matches!(err, ImageEditError::MissingInput));
        assert_eq!(editor.error(DraftField::Image), Some(IMAGE_EDIT_MISSING_INPUT));
        assert!(!editor.is_image_edit_running());
    }

    #[tokio::test]
    async fn failed_image_edit_keeps_image_and_shows_generic_message() {
        let original = ImagePayload::from_base64("image/jpeg", "T1JJRw==");
        let mut editor = TaskEditor::new();
        editor.set_image(Some(original.clone()));
        editor.set_edit_prompt("make it pop");

        let pending = editor.begin_image_edit().unwrap();
        assert!(editor.is_image_edit_running());
        assert!(matches!(editor.begin_image_edit(), Err(ImageEditError::InFlight)));

        let backend: Arc<dyn ImageEditor> = Arc::new(FailingEditor);
        let outcome = pending.run(Some(backend)).await;
        assert!(editor.complete_image_edit(outcome));

        assert_eq!(editor.draft().image.as_ref(), Some(&original));
        assert_eq!(editor.error(DraftField::Image), Some(IMAGE_EDIT_FAILED));
        assert!(!editor.is_image_edit_running());
    }

    #[tokio::test]
    async fn successful_image_edit_replaces_image() {
        let mut editor = TaskEditor::new();
        editor.set_image(Some(ImagePayload::from_base64("image/jpeg", "T1JJRw==")));
        editor.set_edit_prompt("invert");
        let pending = editor.begin_image_edit().unwrap();
        let backend: Arc<dyn ImageEditor> = Arc::new(InvertingEditor);
        assert!(editor.complete_image_edit(pending.run(Some(backend)).await));
        assert_eq!(editor.draft().image.as_ref().unwrap().as_str(), "data:image/png;base64,SU5WRVJURUQ=");
    }

    #[tokio::test]
    async fn outcome_for_closed_editor_is_discarded() {
        let mut first = TaskEditor::new();
        first.set_image(Some(ImagePayload::from_base64("image/jpeg", "T1JJRw==")));
        first.set_edit_prompt("invert");
        let pending = first.begin_image_edit().unwrap();
        drop(first);

        let mut second = TaskEditor::new();
        let backend: Arc<dyn ImageEditor> = Arc::new(InvertingEditor);
        assert!(!second.complete_image_edit(pending.run(Some(backend)).await));
        assert!(second.draft().image.is_none());
    }
}
