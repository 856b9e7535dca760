//! Error types.
//!
//! Each concern has its own enum. None of them is fatal to a running UI:
//! validation and image-edit errors are shown inline, store errors in the
//! status bar. `AppError` is only used by `main` for startup failures.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::task::TaskId;

/// Generic message shown for any failure of the image edit service.
pub const IMAGE_EDIT_FAILED: &str = "Failed to process image. Please check the logs for details.";
/// Message shown when an edit is requested without an image or prompt.
pub const IMAGE_EDIT_MISSING_INPUT: &str = "Please upload an image and provide an editing prompt.";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to write task collection: {0}")]
    Persist(#[source] std::io::Error),
    #[error("failed to serialize task collection: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Editable fields of a draft, used as validation error keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DraftField {
    Title,
    Description,
    DueDate,
    Priority,
    Status,
    Image,
}

/// Field-keyed validation messages from a failed save attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<DraftField, &'static str>);

impl ValidationErrors {
    pub fn insert(&mut self, field: DraftField, message: &'static str) {
        self.0.insert(field, message);
    }

    pub fn remove(&mut self, field: DraftField) {
        self.0.remove(&field);
    }

    pub fn get(&self, field: DraftField) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = DraftField> + '_ {
        self.0.keys().copied()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.values().copied().collect();
        f.write_str(&messages.join(" "))
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Error, Debug)]
pub enum SaveError {
    /// The draft was rejected; the store was not touched.
    #[error("{0}")]
    Invalid(ValidationErrors),
    /// The store was updated in memory but writing it out failed.
    #[error("task {id} saved but not persisted: {source}")]
    Persist {
        id: TaskId,
        #[source]
        source: StoreError,
    },
}

#[derive(Error, Debug)]
pub enum DeleteError {
    #[error("only existing tasks can be deleted")]
    NotEditing,
    #[error("deletion has not been confirmed")]
    NotConfirmed,
    #[error("task {id} deleted but not persisted: {source}")]
    Persist {
        id: TaskId,
        #[source]
        source: StoreError,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("sign in first")]
    NotAuthenticated,
    #[error("cannot go from {from} to {to}")]
    Invalid { from: &'static str, to: &'static str },
}

#[derive(Error, Debug)]
pub enum ImageEditError {
    #[error("missing image or prompt")]
    MissingInput,
    #[error("an image edit is already in progress")]
    InFlight,
    #[error("image editing is not configured (no API key)")]
    NotConfigured,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service returned {status}: {body}")]
    Service { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("No image was returned")]
    NoImage,
}

impl ImageEditError {
    /// Text safe to show to the user. Service-side causes collapse into one
    /// generic message; the cause itself only goes to the log.
    pub fn user_message(&self) -> &'static str {
        match self {
            ImageEditError::MissingInput => IMAGE_EDIT_MISSING_INPUT,
            ImageEditError::InFlight => "An image edit is already running.",
            ImageEditError::NotConfigured
            | ImageEditError::Transport(_)
            | ImageEditError::Service { .. }
            | ImageEditError::Malformed(_)
            | ImageEditError::NoImage => IMAGE_EDIT_FAILED,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid log filter '{0}'")]
    LogFilter(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Save(#[from] SaveError),
    #[error("{0}")]
    Delete(#[from] DeleteError),
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("image edit failed: {0}")]
    ImageEdit(#[from] ImageEditError),
    #[error("{0}")]
    Command(String),
}
