#![forbid(unsafe_code)]

use folio_core::{TreeError, ValidationError};
use rusqlite::ErrorCode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Profile,
    Collection,
    Folder,
    Request,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Profile => "profile",
            RecordKind::Collection => "collection",
            RecordKind::Folder => "folder",
            RecordKind::Request => "request",
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Validation(ValidationError),
    /// `id = None` is a lookup by role rather than identity (the default profile).
    NotFound {
        kind: RecordKind,
        id: Option<i64>,
    },
    ConstraintViolation(String),
    MultipleDefaultsNotAllowed,
    SelfParent,
    CircularReference {
        folder_id: i64,
    },
    InconsistentSnapshot(TreeError),
    /// The database was busy or locked. Produced with `attempts = 1` by the
    /// store; the retry policy rewrites `attempts` once it gives up.
    /// `op` names the store operation once the error leaves its transaction.
    StorageContention {
        op: Option<&'static str>,
        attempts: u32,
        source: rusqlite::Error,
    },
    StorageFailure {
        op: Option<&'static str>,
        source: rusqlite::Error,
    },
}

impl StoreError {
    pub(crate) fn not_found(kind: RecordKind, id: impl Into<i64>) -> Self {
        Self::NotFound {
            kind,
            id: Some(id.into()),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StorageContention { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The store operation a storage-level failure happened in, when known.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::StorageContention { op, .. } | Self::StorageFailure { op, .. } => *op,
            _ => None,
        }
    }

    /// Tags storage-level failures with `label`; typed domain errors already
    /// say what went wrong and pass through unchanged.
    pub(crate) fn in_operation(mut self, label: &'static str) -> Self {
        if let Self::StorageContention { op, .. } | Self::StorageFailure { op, .. } = &mut self
            && op.is_none()
        {
            *op = Some(label);
        }
        self
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Validation(err) => write!(f, "invalid input: {err}"),
            Self::NotFound { kind, id: Some(id) } => {
                write!(f, "{} {id} not found", kind.as_str())
            }
            Self::NotFound { kind, id: None } => {
                write!(f, "no default {} configured", kind.as_str())
            }
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::MultipleDefaultsNotAllowed => write!(
                f,
                "a default profile already exists; promote this profile explicitly instead"
            ),
            Self::SelfParent => write!(f, "folder cannot be its own parent"),
            Self::CircularReference { folder_id } => write!(
                f,
                "moving folder {folder_id} would create a circular reference"
            ),
            Self::InconsistentSnapshot(err) => write!(f, "inconsistent hierarchy: {err}"),
            Self::StorageContention {
                op,
                attempts,
                source,
            } => {
                if let Some(op) = op {
                    write!(f, "{op}: ")?;
                }
                write!(f, "storage busy after {attempts} attempt(s): {source}")
            }
            Self::StorageFailure { op, source } => {
                if let Some(op) = op {
                    write!(f, "{op}: ")?;
                }
                write!(f, "sqlite: {source}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::InconsistentSnapshot(err) => Some(err),
            Self::StorageContention { source, .. } => Some(source),
            Self::StorageFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<TreeError> for StoreError {
    fn from(value: TreeError) -> Self {
        Self::InconsistentSnapshot(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        if is_contention(&value) {
            Self::StorageContention {
                op: None,
                attempts: 1,
                source: value,
            }
        } else {
            Self::StorageFailure {
                op: None,
                source: value,
            }
        }
    }
}

fn is_contention(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, _) => matches!(
            code.code,
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
        ),
        _ => false,
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, _) => code.code == ErrorCode::ConstraintViolation,
        _ => false,
    }
}

/// Maps uniqueness and key failures on insert/update to `ConstraintViolation`.
pub(crate) fn map_write_conflict(err: rusqlite::Error) -> StoreError {
    if is_constraint_violation(&err) {
        let message = match &err {
            rusqlite::Error::SqliteFailure(_, Some(message)) => message.clone(),
            other => other.to_string(),
        };
        return StoreError::ConstraintViolation(message);
    }
    StoreError::from(err)
}
