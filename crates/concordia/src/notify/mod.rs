//! # Change Notification
//!
//! Two logical feeds leave every collection:
//!
//! ```text
//!   mutation committed
//!          │
//!          ├──> Property(Count)     (only when the count changed)
//!          ├──> Property(Items)     ("Item[]" sentinel)
//!          └──> Change(...)         (Add / Remove / Replace / Move / Reset)
//! ```
//!
//! Subscribers register explicitly and get a [`Subscription`] back. There are
//! no weak event handlers: the subscription lives exactly as long as the
//! handle does.

mod event;
mod feed;

pub use event::{
    ChangeKind, CollectionChange, Notification, PropertyName, SequenceEvent, SetChange, SetEvent,
};
pub use feed::{ChangeFeed, Subscription};
