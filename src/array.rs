//! The observable array tying storage and both channels together.

use crate::error::{ArrayError, Result};
use crate::subscriptions::{Broadcast, SubscriptionConfig, SubscriptionHandle, SubscriptionId};
use crate::types::{ChangeEvent, Snapshot};
use parking_lot::RwLock;
use std::fmt;
use std::ops::{Bound, Index, Range, RangeBounds};
use std::sync::{Arc, OnceLock};

/// Array configuration.
#[derive(Clone, Debug, Default)]
pub struct ArrayConfig {
    /// Default config for change event subscriptions.
    pub events: SubscriptionConfig,

    /// Default config for snapshot subscriptions.
    pub snapshots: SubscriptionConfig,
}

/// Explicit shared-ownership handle for an array mutated from several places.
pub type Shared<T> = Arc<RwLock<ObservableArray<T>>>;

/// An ordered, indexable container that reports every mutation.
///
/// Each mutation with an observable effect:
/// - applies the change to the backing `Vec`
/// - publishes exactly one [`ChangeEvent`] to event subscribers
/// - republishes the full contents to snapshot subscribers
///
/// Both channels are created on their first subscribe call. Until then
/// mutations only touch the backing storage.
pub struct ObservableArray<T> {
    elements: Vec<T>,

    config: ArrayConfig,

    /// Live-only channel of change events.
    events: OnceLock<Broadcast<ChangeEvent<T>>>,

    /// Replay-latest channel of full contents.
    snapshots: OnceLock<Broadcast<Snapshot<T>>>,
}

impl<T> ObservableArray<T> {
    /// Create an empty array.
    pub fn new() -> Self {
        Self::from_vec(Vec::new(), ArrayConfig::default())
    }

    /// Create an empty array with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_vec(Vec::with_capacity(capacity), ArrayConfig::default())
    }

    /// Create an empty array with custom subscription defaults.
    pub fn with_config(config: ArrayConfig) -> Self {
        Self::from_vec(Vec::new(), config)
    }

    fn from_vec(elements: Vec<T>, config: ArrayConfig) -> Self {
        Self {
            elements,
            config,
            events: OnceLock::new(),
            snapshots: OnceLock::new(),
        }
    }

    // --- Reads ---

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Capacity of the backing storage.
    pub fn capacity(&self) -> usize {
        self.elements.capacity()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    /// Like [`get`](Self::get), but reports the failing index.
    pub fn at(&self, index: usize) -> Result<&T> {
        self.elements.get(index).ok_or(ArrayError::IndexOutOfBounds {
            index,
            len: self.elements.len(),
        })
    }

    /// Borrow a contiguous subrange.
    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> Result<&[T]> {
        let range = resolve_range(range, self.elements.len())?;
        Ok(&self.elements[range])
    }

    pub fn first(&self) -> Option<&T> {
        self.elements.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.elements.last()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }

    /// Take the contents, dropping both channels and closing every handle.
    pub fn into_vec(self) -> Vec<T> {
        self.elements
    }

    pub fn config(&self) -> &ArrayConfig {
        &self.config
    }

    /// Wrap in a [`Shared`] handle.
    pub fn into_shared(self) -> Shared<T> {
        Arc::new(RwLock::new(self))
    }

    // --- Capacity ---

    pub fn reserve(&mut self, additional: usize) {
        self.elements.reserve(additional);
    }

    pub fn shrink_to_fit(&mut self) {
        self.elements.shrink_to_fit();
    }

    fn is_observed(&self) -> bool {
        self.events.get().is_some() || self.snapshots.get().is_some()
    }
}

impl<T: Clone> ObservableArray<T> {
    /// Create an array holding `count` copies of `value`.
    pub fn repeating(value: T, count: usize) -> Self {
        Self::from_vec(vec![value; count], ArrayConfig::default())
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Snapshot<T> {
        Arc::from(self.elements.as_slice())
    }

    // --- Subscriptions ---

    /// Receive every change event published from now on.
    pub fn subscribe_to_events(&self) -> SubscriptionHandle<ChangeEvent<T>> {
        self.event_channel().subscribe()
    }

    pub fn subscribe_to_events_with(
        &self,
        config: SubscriptionConfig,
    ) -> SubscriptionHandle<ChangeEvent<T>> {
        self.event_channel().subscribe_with(config)
    }

    /// Receive the current contents immediately, then the new contents
    /// after every mutation.
    pub fn subscribe_to_snapshots(&self) -> SubscriptionHandle<Snapshot<T>> {
        self.snapshot_channel().subscribe()
    }

    pub fn subscribe_to_snapshots_with(
        &self,
        config: SubscriptionConfig,
    ) -> SubscriptionHandle<Snapshot<T>> {
        self.snapshot_channel().subscribe_with(config)
    }

    pub fn unsubscribe_events(&self, id: SubscriptionId) -> bool {
        self.events.get().is_some_and(|channel| channel.unsubscribe(id))
    }

    pub fn unsubscribe_snapshots(&self, id: SubscriptionId) -> bool {
        self.snapshots.get().is_some_and(|channel| channel.unsubscribe(id))
    }

    pub fn event_subscription_count(&self) -> usize {
        self.events.get().map_or(0, |channel| channel.subscription_count())
    }

    pub fn snapshot_subscription_count(&self) -> usize {
        self.snapshots.get().map_or(0, |channel| channel.subscription_count())
    }

    fn event_channel(&self) -> &Broadcast<ChangeEvent<T>> {
        self.events.get_or_init(|| {
            tracing::debug!("creating event channel");
            Broadcast::live("events", self.config.events.clone())
        })
    }

    fn snapshot_channel(&self) -> &Broadcast<Snapshot<T>> {
        self.snapshots.get_or_init(|| {
            tracing::debug!(len = self.elements.len(), "creating snapshot channel");
            Broadcast::replay_latest("snapshots", self.snapshot(), self.config.snapshots.clone())
        })
    }

    // --- Mutations ---

    /// Add `value` at the end.
    pub fn append(&mut self, value: T) {
        let start = self.elements.len();
        self.elements.push(value);
        self.notify(start..start + 1, Vec::new(), 0..0);
    }

    /// Add every value of `values` at the end. Publishes nothing if `values`
    /// is empty.
    pub fn append_all<I: IntoIterator<Item = T>>(&mut self, values: I) {
        let start = self.elements.len();
        self.elements.extend(values);
        self.notify(start..self.elements.len(), Vec::new(), 0..0);
    }

    /// Insert `value` so that it ends up at `index`.
    pub fn insert(&mut self, value: T, index: usize) -> Result<()> {
        self.check_position(index)?;
        self.elements.insert(index, value);
        self.notify(index..index + 1, Vec::new(), 0..0);
        Ok(())
    }

    /// Insert `values` as a contiguous run starting at `index`. Publishes
    /// nothing if `values` is empty.
    pub fn insert_all<I: IntoIterator<Item = T>>(&mut self, values: I, index: usize) -> Result<()> {
        self.check_position(index)?;
        self.splice(index..index, values);
        Ok(())
    }

    /// Remove and return the element at `index`.
    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        if index >= self.elements.len() {
            return Err(ArrayError::IndexOutOfBounds {
                index,
                len: self.elements.len(),
            });
        }

        let value = self.elements.remove(index);
        self.notify_removed(&value);
        Ok(value)
    }

    /// Remove and return the first element.
    pub fn remove_first(&mut self) -> Result<T> {
        if self.elements.is_empty() {
            return Err(ArrayError::EmptyContainer);
        }
        self.remove_at(0)
    }

    /// Remove and return the last element.
    pub fn remove_last(&mut self) -> Result<T> {
        self.pop_last().ok_or(ArrayError::EmptyContainer)
    }

    /// Remove and return the last element, or `None` without publishing if
    /// the array is empty.
    pub fn pop_last(&mut self) -> Option<T> {
        let value = self.elements.pop()?;
        self.notify_removed(&value);
        Some(value)
    }

    /// Remove every element. Publishes nothing if already empty.
    pub fn remove_all(&mut self, keep_capacity: bool) {
        let removed = if keep_capacity {
            self.elements.drain(..).collect()
        } else {
            std::mem::take(&mut self.elements)
        };
        self.notify(0..0, removed, 0..0);
    }

    /// Shorten to `len` elements. Publishes nothing if already that short.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.elements.len() {
            return;
        }
        let removed = self.elements.split_off(len);
        self.notify(0..0, removed, 0..0);
    }

    /// Write `value` at `index`.
    ///
    /// `index == len` appends and reports an insertion; any smaller index
    /// overwrites and reports an update.
    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        let len = self.elements.len();
        if index == len {
            self.append(value);
        } else if index < len {
            self.elements[index] = value;
            self.notify(0..0, Vec::new(), index..index + 1);
        } else {
            return Err(ArrayError::IndexOutOfBounds { index, len });
        }
        Ok(())
    }

    /// Replace the elements in `range` with `values`.
    ///
    /// The event carries the replaced elements as `removed` and the
    /// replacement as `inserted`, even when both have the same length.
    pub fn replace_range<R, I>(&mut self, range: R, values: I) -> Result<()>
    where
        R: RangeBounds<usize>,
        I: IntoIterator<Item = T>,
    {
        let range = resolve_range(range, self.elements.len())?;
        self.splice(range, values);
        Ok(())
    }

    /// Remove the elements in `range`.
    pub fn remove_range<R: RangeBounds<usize>>(&mut self, range: R) -> Result<()> {
        self.replace_range(range, std::iter::empty())
    }

    // --- Internals ---

    fn check_position(&self, index: usize) -> Result<()> {
        if index > self.elements.len() {
            return Err(ArrayError::IndexOutOfBounds {
                index,
                len: self.elements.len(),
            });
        }
        Ok(())
    }

    /// Splice an already validated range and publish the net-growth event.
    fn splice<I: IntoIterator<Item = T>>(&mut self, range: Range<usize>, values: I) {
        let old_len = self.elements.len();
        let start = range.start;
        let removed: Vec<T> = self.elements.splice(range, values).collect();

        // Never underflows: removed elements were part of old_len.
        let inserted_count = self.elements.len() + removed.len() - old_len;
        self.notify(start..start + inserted_count, removed, 0..0);
    }

    fn notify_removed(&self, value: &T) {
        if self.is_observed() {
            self.notify(0..0, vec![value.clone()], 0..0);
        }
    }

    /// Build and publish the event for a mutation that already happened.
    ///
    /// `inserted` and `updated` index into the new contents.
    fn notify(&self, inserted: Range<usize>, removed: Vec<T>, updated: Range<usize>) {
        if !self.is_observed() {
            return;
        }

        let inserted = self.elements[inserted].to_vec();
        let updated = self.elements[updated].to_vec();

        // Zero-effect mutations produce no event and no snapshot.
        let Ok(event) = ChangeEvent::new(inserted, removed, updated) else {
            return;
        };

        tracing::trace!(
            inserted = event.inserted_values().len(),
            removed = event.removed_values().len(),
            updated = event.updated_values().len(),
            len = self.elements.len(),
            "array changed"
        );

        if let Some(events) = self.events.get() {
            events.publish(event);
        }
        if let Some(snapshots) = self.snapshots.get() {
            snapshots.publish(self.snapshot());
        }
    }
}

/// Turn any range expression into a half-open range within `0..=len`.
fn resolve_range<R: RangeBounds<usize>>(range: R, len: usize) -> Result<Range<usize>> {
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => e.saturating_add(1),
        Bound::Excluded(&e) => e,
        Bound::Unbounded => len,
    };

    if start > end || end > len {
        return Err(ArrayError::RangeOutOfBounds { start, end, len });
    }
    Ok(start..end)
}

impl<T> Default for ObservableArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableArray")
            .field("elements", &self.elements)
            .field("observed", &self.is_observed())
            .finish()
    }
}

impl<T> Index<usize> for ObservableArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.elements[index]
    }
}

impl<T> AsRef<[T]> for ObservableArray<T> {
    fn as_ref(&self) -> &[T] {
        &self.elements
    }
}

impl<'a, T> IntoIterator for &'a ObservableArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<T> FromIterator<T> for ObservableArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect(), ArrayConfig::default())
    }
}

impl<T> From<Vec<T>> for ObservableArray<T> {
    fn from(elements: Vec<T>) -> Self {
        Self::from_vec(elements, ArrayConfig::default())
    }
}

impl<T, const N: usize> From<[T; N]> for ObservableArray<T> {
    fn from(elements: [T; N]) -> Self {
        Self::from_vec(Vec::from(elements), ArrayConfig::default())
    }
}

impl<T: Clone> From<&[T]> for ObservableArray<T> {
    fn from(elements: &[T]) -> Self {
        Self::from_vec(elements.to_vec(), ArrayConfig::default())
    }
}
