//! Subscription system for live array updates.
//!
//! Two channel flavours back an [`ObservableArray`](crate::ObservableArray):
//! - Live: change events published after the subscribe call
//! - Replay-latest: current snapshot on subscribe, then every new snapshot
//!
//! Queues are unbounded unless a subscription opts into a bounded buffer,
//! in which case overflowing it drops the subscriber. Dropped handles are
//! pruned on the next publish or subscribe, and a closed handle reports
//! why through [`SubscriptionHandle::drop_reason`].
//!
//! # Example
//!
//! ```ignore
//! let channel = Broadcast::live("events", SubscriptionConfig::default());
//! let handle = channel.subscribe();
//!
//! channel.publish(42);
//! assert_eq!(handle.recv().unwrap(), 42);
//! ```

mod manager;
mod types;

pub use manager::{Broadcast, ChannelMode};
pub use types::{DropReason, SubscriptionConfig, SubscriptionHandle, SubscriptionId};
