//! Input validation shared by every mutating operation.
//!
//! Text is trimmed before it is measured; the returned `&str` is the trimmed
//! slice callers should store.

use crate::error::{LanesError, Result};
use crate::model::{ColumnId, LabelId, ProjectId, TaskId};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 10_000;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_COMMENT_LEN: usize = 5_000;

/// Ids that can be checked for positivity.
pub trait RowId: Copy {
    const ENTITY: &'static str;
    fn raw(self) -> i64;
}

macro_rules! impl_row_id {
    ($($ty:ty),*) => {
        $(impl RowId for $ty {
            const ENTITY: &'static str = <$ty>::LABEL;
            fn raw(self) -> i64 {
                self.get()
            }
        })*
    };
}

impl_row_id!(ProjectId, ColumnId, TaskId, LabelId);

/// Reject non-positive ids.
///
/// # Errors
///
/// [`LanesError::InvalidId`] when `id <= 0`.
pub fn id<T: RowId>(id: T) -> Result<T> {
    if id.raw() > 0 {
        Ok(id)
    } else {
        Err(LanesError::InvalidId {
            entity: T::ENTITY,
            value: id.raw(),
        })
    }
}

/// Non-empty text no longer than `max` characters.
///
/// # Errors
///
/// [`LanesError::EmptyField`] or [`LanesError::FieldTooLong`].
pub fn required<'a>(field: &'static str, value: &'a str, max: usize) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LanesError::EmptyField { field });
    }
    bounded(field, trimmed, max)
}

/// Possibly empty text no longer than `max` characters.
///
/// # Errors
///
/// [`LanesError::FieldTooLong`].
pub fn optional<'a>(field: &'static str, value: &'a str, max: usize) -> Result<&'a str> {
    bounded(field, value.trim(), max)
}

fn bounded<'a>(field: &'static str, value: &'a str, max: usize) -> Result<&'a str> {
    let len = value.chars().count();
    if len > max {
        return Err(LanesError::FieldTooLong { field, len, max });
    }
    Ok(value)
}

/// # Errors
///
/// See [`required`].
pub fn title(value: &str) -> Result<&str> {
    required("title", value, MAX_TITLE_LEN)
}

/// # Errors
///
/// See [`optional`].
pub fn description(value: &str) -> Result<&str> {
    optional("description", value, MAX_DESCRIPTION_LEN)
}

/// Project, column and label names.
///
/// # Errors
///
/// See [`required`].
pub fn name<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    required(field, value, MAX_NAME_LEN)
}

/// # Errors
///
/// See [`required`].
pub fn comment(value: &str) -> Result<&str> {
    required("comment", value, MAX_COMMENT_LEN)
}
