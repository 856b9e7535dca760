//! The task store.
//!
//! An ordered in-memory collection of tasks backed by one storage slot. The
//! collection is read once when the store is opened and written back in full
//! after every mutation.

use tracing::{debug, error, info, warn};

use crate::error::StoreError;
use crate::storage::Storage;
use crate::task::{seed_tasks, Task, TaskId};

/// Storage slot holding the serialized collection.
pub const TASKS_SLOT: &str = "todos";

pub struct TaskStore {
    tasks: Vec<Task>,
    storage: Box<dyn Storage>,
    revision: u64,
}

impl TaskStore {
    /// Load the collection from `storage`.
    ///
    /// An empty slot yields the seed tasks. Unreadable or malformed contents
    /// also fall back to the seed tasks, with a warning in the log.
    pub fn open(storage: Box<dyn Storage>) -> Self {
        let tasks = match storage.get(TASKS_SLOT) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Task>>(&raw) {
                Ok(tasks) => {
                    debug!(count = tasks.len(), "loaded tasks");
                    tasks
                }
                Err(e) => {
                    warn!(error = %e, "stored tasks are malformed, falling back to seed data");
                    seed_tasks()
                }
            },
            Ok(None) => {
                info!("no stored tasks, starting from seed data");
                seed_tasks()
            }
            Err(e) => {
                warn!(error = %e, "cannot read stored tasks, falling back to seed data");
                seed_tasks()
            }
        };

        let mut store = TaskStore { tasks, storage, revision: 0 };
        if let Err(e) = store.persist() {
            error!(error = %e, "failed to write initial task collection");
        }
        store
    }

    /// Tasks in store order.
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Get a task by ID.
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Position of a task in store order.
    pub fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }

    /// Counter bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// A new identifier not used by any task in the store.
    pub fn fresh_id(&self) -> TaskId {
        loop {
            let id = TaskId::generate();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    /// Replace the task with the same id in place, or append it if the id is new.
    ///
    /// The in-memory change stands even if persisting fails.
    pub fn upsert(&mut self, task: Task) -> Result<(), StoreError> {
        match self.position(&task.id) {
            Some(idx) => {
                debug!(id = %task.id, "updating task");
                self.tasks[idx] = task;
            }
            None => {
                debug!(id = %task.id, "adding task");
                self.tasks.push(task);
            }
        }
        self.mutated()
    }

    /// Remove the task with `id`. Returns whether a task was removed; removing
    /// an unknown id is a no-op and does not touch storage.
    pub fn delete(&mut self, id: &TaskId) -> Result<bool, StoreError> {
        let Some(idx) = self.position(id) else {
            return Ok(false);
        };
        self.tasks.remove(idx);
        debug!(%id, "deleted task");
        self.mutated().map(|_| true)
    }

    fn mutated(&mut self) -> Result<(), StoreError> {
        self.revision += 1;
        self.persist().map_err(|e| {
            error!(error = %e, "failed to persist tasks");
            e
        })
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(&self.tasks)?;
        self.storage.set(TASKS_SLOT, &data).map_err(StoreError::Persist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Priority, Status};
    use crate::storage::MemoryStorage;
    use pretty_assertions::assert_eq;

    fn task(id: &str, title: &str) -> Task {
        Task::new(TaskId::new(id), title)
    }

    fn store_with(tasks: &[Task]) -> (TaskStore, MemoryStorage) {
        let storage = MemoryStorage::with_slot(TASKS_SLOT, &serde_json::to_string(tasks).unwrap());
        (TaskStore::open(Box::new(storage.clone())), storage)
    }

    fn stored(storage: &MemoryStorage) -> Vec<Task> {
        serde_json::from_str(&storage.get(TASKS_SLOT).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn empty_storage_seeds_and_persists() {
        let storage = MemoryStorage::new();
        let store = TaskStore::open(Box::new(storage.clone()));
        assert_eq!(store.list(), seed_tasks().as_slice());
        assert_eq!(stored(&storage), seed_tasks());
    }

    #[test]
    fn malformed_storage_falls_back_to_seed() {
        let storage = MemoryStorage::with_slot(TASKS_SLOT, "{not json");
        let store = TaskStore::open(Box::new(storage));
        assert_eq!(store.list(), seed_tasks().as_slice());
    }

    #[test]
    fn unreadable_due_date_keeps_the_collection() {
        let raw = r#"[
            {"id":"a","title":"Mine","description":"","dueDate":"next week","priority":"High","status":"In Progress"},
            {"id":"b","title":"Other","description":"","dueDate":"2024-09-01","priority":"Low","status":"Completed"}
        ]"#;
        let storage = MemoryStorage::with_slot(TASKS_SLOT, raw);
        let store = TaskStore::open(Box::new(storage.clone()));

        let titles: Vec<_> = store.list().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Mine", "Other"]);
        assert_eq!(store.get(&TaskId::new("a")).unwrap().due_date, None);
        assert_eq!(
            store.get(&TaskId::new("b")).unwrap().due_date,
            chrono::NaiveDate::from_ymd_opt(2024, 9, 1)
        );
        assert_eq!(stored(&storage), store.list().to_vec());
    }

    #[test]
    fn stored_empty_collection_is_respected() {
        let (store, _) = store_with(&[]);
        assert!(store.is_empty());
    }

    #[test]
    fn upsert_new_id_appends() {
        let (mut store, storage) = store_with(&[task("1", "A")]);
        store.upsert(task("2", "B")).unwrap();
        let ids: Vec<_> = store.list().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(stored(&storage).len(), 2);
    }

    #[test]
    fn upsert_existing_id_replaces_in_place() {
        let (mut store, storage) = store_with(&[task("1", "A"), task("2", "B"), task("3", "C")]);
        let mut changed = task("2", "B2");
        changed.status = Status::Completed;
        changed.priority = Priority::High;
        store.upsert(changed.clone()).unwrap();

        assert_eq!(store.list(), &[task("1", "A"), changed.clone(), task("3", "C")]);
        assert_eq!(stored(&storage), store.list().to_vec());
    }

    #[test]
    fn delete_removes_exactly_one() {
        let (mut store, _) = store_with(&[task("1", "A"), task("2", "B")]);
        assert!(store.delete(&TaskId::new("1")).unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].id.as_str(), "2");
    }

    #[test]
    fn delete_unknown_id_is_noop() {
        let (mut store, _) = store_with(&[task("1", "A")]);
        let before = store.revision();
        assert!(!store.delete(&TaskId::new("nope")).unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(store.revision(), before);
    }

    #[test]
    fn fresh_id_is_unused() {
        let (store, _) = store_with(&[task("1", "A"), task("2", "B")]);
        let id = store.fresh_id();
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn failed_write_keeps_memory_change() {
        let storage = MemoryStorage::with_slot(TASKS_SLOT, "[]").read_only();
        let mut store = TaskStore::open(Box::new(storage));
        let err = store.upsert(task("1", "A")).unwrap_err();
        assert!(matches!(err, StoreError::Persist(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn revision_tracks_mutations() {
        let (mut store, _) = store_with(&[]);
        assert_eq!(store.revision(), 0);
        store.upsert(task("1", "A")).unwrap();
        store.upsert(task("1", "A2")).unwrap();
        assert_eq!(store.revision(), 2);
    }
}
