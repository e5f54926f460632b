//! Core types for observable arrays.

use crate::error::{ArrayError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Full copy of an array's contents at one point in time.
///
/// Shared between every snapshot subscriber, so publishing costs one copy
/// regardless of subscriber count.
pub type Snapshot<T> = Arc<[T]>;

/// Net effect of one mutation.
///
/// At least one of the three slices is non-empty. `removed` lists elements
/// in ascending original position; `inserted` is a contiguous run in the
/// array's new contents; `updated` is only produced by single-index
/// overwrites.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(
    try_from = "ChangeEventParts<T>",
    bound(deserialize = "T: Deserialize<'de>")
)]
pub struct ChangeEvent<T> {
    inserted: Vec<T>,
    removed: Vec<T>,
    updated: Vec<T>,
}

impl<T> ChangeEvent<T> {
    /// Build an event, rejecting one that carries nothing.
    pub fn new(inserted: Vec<T>, removed: Vec<T>, updated: Vec<T>) -> Result<Self> {
        if inserted.is_empty() && removed.is_empty() && updated.is_empty() {
            return Err(ArrayError::InvalidEvent);
        }

        Ok(Self {
            inserted,
            removed,
            updated,
        })
    }

    /// Event for elements newly added to the array.
    pub fn inserted(values: Vec<T>) -> Result<Self> {
        Self::new(values, Vec::new(), Vec::new())
    }

    /// Event for elements no longer present.
    pub fn removed(values: Vec<T>) -> Result<Self> {
        Self::new(Vec::new(), values, Vec::new())
    }

    /// Event for elements overwritten in place.
    pub fn updated(values: Vec<T>) -> Result<Self> {
        Self::new(Vec::new(), Vec::new(), values)
    }

    /// Event for a range replacement.
    pub fn replaced(removed: Vec<T>, inserted: Vec<T>) -> Result<Self> {
        Self::new(inserted, removed, Vec::new())
    }

    pub fn inserted_values(&self) -> &[T] {
        &self.inserted
    }

    pub fn removed_values(&self) -> &[T] {
        &self.removed
    }

    pub fn updated_values(&self) -> &[T] {
        &self.updated
    }

    /// True if the event only adds elements.
    pub fn is_insertion(&self) -> bool {
        !self.inserted.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }

    /// True if the event only drops elements.
    pub fn is_removal(&self) -> bool {
        self.inserted.is_empty() && !self.removed.is_empty() && self.updated.is_empty()
    }

    /// True if the event only overwrites elements.
    pub fn is_update(&self) -> bool {
        self.inserted.is_empty() && self.removed.is_empty() && !self.updated.is_empty()
    }

    /// Total number of elements carried across all three slices.
    pub fn len(&self) -> usize {
        self.inserted.len() + self.removed.len() + self.updated.len()
    }

    /// Always false for a constructed event; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split into `(inserted, removed, updated)`.
    pub fn into_parts(self) -> (Vec<T>, Vec<T>, Vec<T>) {
        (self.inserted, self.removed, self.updated)
    }
}

/// Wire form of a change event, validated on the way in.
#[derive(Deserialize)]
struct ChangeEventParts<T> {
    #[serde(default = "Vec::new")]
    inserted: Vec<T>,
    #[serde(default = "Vec::new")]
    removed: Vec<T>,
    #[serde(default = "Vec::new")]
    updated: Vec<T>,
}

impl<T> TryFrom<ChangeEventParts<T>> for ChangeEvent<T> {
    type Error = ArrayError;

    fn try_from(parts: ChangeEventParts<T>) -> Result<Self> {
        ChangeEvent::new(parts.inserted, parts.removed, parts.updated)
    }
}
