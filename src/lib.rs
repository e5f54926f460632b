//! # Observable Array
//!
//! An ordered, indexable container that tells observers about every
//! structural change it undergoes, so derived state (a rendered list, a
//! cache, a remote mirror) can follow along without diffing snapshots.
//!
//! ## Core Concepts
//!
//! - **Change events**: One [`ChangeEvent`] per mutation, split into
//!   inserted, removed and updated elements
//! - **Event channel**: Live-only broadcast of change events
//! - **Snapshot channel**: Replays the current contents on subscribe, then
//!   every new version
//! - **Lazy channels**: Nothing is allocated for observers until the first
//!   subscribe call
//!
//! ## Example
//!
//! ```ignore
//! use observable_array::observable;
//!
//! let mut items = observable![1, 2, 3];
//! let events = items.subscribe_to_events();
//! let snapshots = items.subscribe_to_snapshots();
//!
//! items.append(4);
//! items.replace_range(0..2, [7, 8, 9])?;
//!
//! let event = events.recv()?;
//! assert_eq!(event.inserted_values(), &[4]);
//! ```

pub mod array;
pub mod error;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use array::{ArrayConfig, ObservableArray, Shared};
pub use error::{ArrayError, Result};
pub use subscriptions::{
    Broadcast, ChannelMode, DropReason, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
};
pub use types::{ChangeEvent, Snapshot};

/// Build an [`ObservableArray`] from a literal list, like `vec!`.
#[macro_export]
macro_rules! observable {
    () => {
        $crate::ObservableArray::new()
    };
    ($elem:expr; $n:expr) => {
        $crate::ObservableArray::repeating($elem, $n)
    };
    ($($x:expr),+ $(,)?) => {
        $crate::ObservableArray::from(::std::vec![$($x),+])
    };
}
