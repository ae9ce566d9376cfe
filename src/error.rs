use std::fmt::Debug;

use uuid::Uuid;

#[derive(Debug)]
pub struct Error {
    pub kind: Kind,
    pub message: String,
}

/// Error classes callers are expected to discriminate on.
/// `Concurrency` and `StorageUnavailable` may be worth a retry by the
/// caller; everything else is definitive for the request as issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Validation,
    NotFound,
    InvalidState,
    CapacityExceeded,
    AlreadyClaimed,
    Concurrency,
    StorageUnavailable,
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        storage_unavailable_error(err)
    }
}

pub fn validation_error(field: &str, reason: &str) -> Error {
    Error {
        kind: Kind::Validation,
        message: format!("invalid {field}: {reason}"),
    }
}

pub fn not_found_error(id: Uuid) -> Error {
    Error {
        kind: Kind::NotFound,
        message: format!("no such entity: {id}"),
    }
}

pub fn invalid_state_error(status: &str) -> Error {
    Error {
        kind: Kind::InvalidState,
        message: format!("operation not permitted while {status}"),
    }
}

pub fn capacity_exceeded_error(requested: u32, remaining: u32) -> Error {
    Error {
        kind: Kind::CapacityExceeded,
        message: format!("requested {requested} seats, {remaining} remaining"),
    }
}

pub fn already_claimed_error(driver_id: Uuid) -> Error {
    Error {
        kind: Kind::AlreadyClaimed,
        message: format!("ride already claimed by driver {driver_id}"),
    }
}

pub fn concurrency_error(id: Uuid) -> Error {
    Error {
        kind: Kind::Concurrency,
        message: format!("conflicting writes on ride {id}, retry budget exhausted"),
    }
}

pub fn storage_unavailable_error<T: Debug>(err: T) -> Error {
    Error {
        kind: Kind::StorageUnavailable,
        message: format!("storage error: {err:?}"),
    }
}
