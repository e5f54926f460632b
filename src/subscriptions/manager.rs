//! Broadcast channel fanning values out to per-subscriber queues.

use crossbeam_channel::{bounded, unbounded, Sender, TrySendError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::types::{DropReason, DropSlot, SubscriptionConfig, SubscriptionHandle, SubscriptionId};

/// Whether new subscribers get the most recent value on arrival.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelMode {
    /// Only values published after subscribing.
    Live,
    /// Latest value immediately, then live values.
    ReplayLatest,
}

/// Internal subscription state.
struct Subscription<E> {
    sender: Sender<E>,
    dropped: DropSlot,
}

impl<E> Subscription<E> {
    /// Try to send a value. Fails if a bounded buffer is full or the handle is gone.
    fn try_send(&self, value: E) -> Result<(), DropReason> {
        match self.sender.try_send(value) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(DropReason::BufferOverflow),
            Err(TrySendError::Disconnected(_)) => Err(DropReason::Disconnected),
        }
    }

    /// True once the handle sharing `dropped` has been dropped.
    fn is_abandoned(&self) -> bool {
        Arc::strong_count(&self.dropped) == 1
    }

    /// Record why the subscription ended; dropping `self` closes the handle.
    fn close(self, reason: DropReason) {
        let _ = self.dropped.set(reason);
    }
}

struct ChannelState<E> {
    subscriptions: HashMap<SubscriptionId, Subscription<E>>,
    /// Most recent value (ReplayLatest only).
    latest: Option<E>,
}

/// Multi-subscriber, in-order broadcast channel.
///
/// Publishing never blocks. By default each subscriber owns an unbounded
/// queue and sees every value. A subscriber created with a bounded
/// `buffer_size` is dropped (closing its handle) when that queue
/// overflows. Subscribers whose handle was dropped are pruned on the next
/// publish or subscribe. Publishing with no subscribers is a no-op apart
/// from updating the replayed value.
pub struct Broadcast<E> {
    name: &'static str,
    mode: ChannelMode,
    state: Mutex<ChannelState<E>>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
    /// Used by `subscribe`.
    default_config: SubscriptionConfig,
}

impl<E: Clone> Broadcast<E> {
    /// Channel delivering only values published after each subscribe call.
    pub fn live(name: &'static str, default_config: SubscriptionConfig) -> Self {
        Self::with_state(name, ChannelMode::Live, None, default_config)
    }

    /// Channel holding `initial` and replaying the latest value to every new
    /// subscriber.
    pub fn replay_latest(
        name: &'static str,
        initial: E,
        default_config: SubscriptionConfig,
    ) -> Self {
        Self::with_state(name, ChannelMode::ReplayLatest, Some(initial), default_config)
    }

    fn with_state(
        name: &'static str,
        mode: ChannelMode,
        latest: Option<E>,
        default_config: SubscriptionConfig,
    ) -> Self {
        Self {
            name,
            mode,
            state: Mutex::new(ChannelState {
                subscriptions: HashMap::new(),
                latest,
            }),
            next_id: AtomicU64::new(1),
            default_config,
        }
    }

    pub fn mode(&self) -> ChannelMode {
        self.mode
    }

    /// Subscribe with the channel's default config.
    pub fn subscribe(&self) -> SubscriptionHandle<E> {
        self.subscribe_with(self.default_config.clone())
    }

    /// Create a new subscription.
    ///
    /// In `ReplayLatest` mode the current value is queued before the handle
    /// is returned, so the first `recv` yields it.
    pub fn subscribe_with(&self, config: SubscriptionConfig) -> SubscriptionHandle<E> {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let buffer_size = config.buffer_size.map(|size| size.max(1));
        let (sender, receiver) = match buffer_size {
            Some(size) => bounded(size),
            None => unbounded(),
        };
        let dropped = DropSlot::default();
        let subscription = Subscription {
            sender,
            dropped: dropped.clone(),
        };

        let mut state = self.state.lock();

        let before = state.subscriptions.len();
        state.subscriptions.retain(|_, sub| {
            if sub.is_abandoned() {
                let _ = sub.dropped.set(DropReason::Disconnected);
                return false;
            }
            true
        });
        let pruned = before - state.subscriptions.len();

        if let Some(latest) = state.latest.as_ref() {
            // Fresh queue has room for at least one value.
            let _ = subscription.try_send(latest.clone());
        }
        state.subscriptions.insert(id, subscription);

        tracing::debug!(
            channel = self.name,
            subscription = id.0,
            buffer_size = ?buffer_size,
            pruned,
            "subscribed"
        );

        SubscriptionHandle {
            id,
            receiver,
            dropped,
        }
    }

    /// Unsubscribe and close the handle. Returns false if `id` was unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Some(sub) = self.state.lock().subscriptions.remove(&id) else {
            return false;
        };
        sub.close(DropReason::Unsubscribed);
        tracing::debug!(
            channel = self.name,
            subscription = id.0,
            reason = ?DropReason::Unsubscribed,
            "subscription dropped"
        );
        true
    }

    /// Get subscription count.
    pub fn subscription_count(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    /// Value a new `ReplayLatest` subscriber would receive first.
    pub fn latest(&self) -> Option<E> {
        self.state.lock().latest.clone()
    }

    /// Deliver `value` to every subscriber, dropping those that fail to receive.
    pub fn publish(&self, value: E) {
        let mut state = self.state.lock();
        let mut to_remove = Vec::new();

        for (id, sub) in state.subscriptions.iter() {
            if let Err(reason) = sub.try_send(value.clone()) {
                to_remove.push((*id, reason));
            }
        }

        tracing::trace!(
            channel = self.name,
            subscribers = state.subscriptions.len(),
            dropped = to_remove.len(),
            "published"
        );

        for (id, reason) in to_remove {
            if let Some(sub) = state.subscriptions.remove(&id) {
                sub.close(reason);
            }
            match reason {
                DropReason::BufferOverflow => tracing::warn!(
                    channel = self.name,
                    subscription = id.0,
                    "dropping slow subscriber after buffer overflow"
                ),
                _ => tracing::debug!(
                    channel = self.name,
                    subscription = id.0,
                    reason = ?reason,
                    "subscription dropped"
                ),
            }
        }

        if self.mode == ChannelMode::ReplayLatest {
            state.latest = Some(value);
        }
    }
}

impl<E> Drop for Broadcast<E> {
    fn drop(&mut self) {
        for (_, sub) in self.state.get_mut().subscriptions.drain() {
            sub.close(DropReason::ChannelClosed);
        }
    }
}
