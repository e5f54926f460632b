//! Subscription types for change and snapshot channels.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvError, RecvTimeoutError, TryRecvError};

/// Configuration for a subscription.
#[derive(Clone, Debug, Default)]
pub struct SubscriptionConfig {
    /// Max buffered values before the subscriber is dropped.
    /// Default: None (unbounded, every value is delivered).
    /// A bound is clamped to at least 1.
    pub buffer_size: Option<usize>,
}

impl SubscriptionConfig {
    /// Bounded queue; the subscriber is dropped when it overflows.
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size: Some(buffer_size),
        }
    }
}

/// Why a subscription was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// Bounded buffer overflowed (slow consumer).
    BufferOverflow,
    /// Handle was dropped.
    Disconnected,
    /// Explicitly unsubscribed.
    Unsubscribed,
    /// The channel itself went away with its owning array.
    ChannelClosed,
}

/// Unique identifier for a subscription within one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// State shared between a channel's entry and the subscriber's handle.
pub(crate) type DropSlot = Arc<OnceLock<DropReason>>;

/// Receiving end of a subscription.
///
/// The handle is closed (receive calls return an error once drained) when
/// the subscriber is dropped from its channel or the owning array goes
/// away. [`drop_reason`](Self::drop_reason) tells which.
pub struct SubscriptionHandle<E> {
    pub id: SubscriptionId,
    /// Channel to receive values.
    pub receiver: Receiver<E>,
    pub(crate) dropped: DropSlot,
}

impl<E> SubscriptionHandle<E> {
    /// Receive the next value (blocking).
    pub fn recv(&self) -> Result<E, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a value (non-blocking).
    pub fn try_recv(&self) -> Result<E, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<E, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Blocking iterator that ends when the handle is closed.
    pub fn iter(&self) -> crossbeam_channel::Iter<'_, E> {
        self.receiver.iter()
    }

    /// Drain whatever is buffered right now.
    pub fn try_iter(&self) -> crossbeam_channel::TryIter<'_, E> {
        self.receiver.try_iter()
    }

    /// Number of values waiting in the buffer.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Why the subscription ended, or `None` while it is still live.
    pub fn drop_reason(&self) -> Option<DropReason> {
        self.dropped.get().copied()
    }
}

impl<E> std::fmt::Debug for SubscriptionHandle<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("pending", &self.receiver.len())
            .field("dropped", &self.drop_reason())
            .finish()
    }
}
