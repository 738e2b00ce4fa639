//! Subscriber registry with explicit registration handles.

use std::sync::{Arc, Weak};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;

use super::event::{Notification, PropertyName};

type Handler<C> = Arc<dyn Fn(&Notification<C>) + Send + Sync>;

/// Where a notification is delivered.
enum Sink<C> {
    Handler(Handler<C>),
    Channel(Sender<Notification<C>>),
}

impl<C> Clone for Sink<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Handler(handler) => Self::Handler(Arc::clone(handler)),
            Self::Channel(sender) => Self::Channel(sender.clone()),
        }
    }
}

struct Entry<C> {
    id: u64,
    sink: Sink<C>,
}

struct Registry<C> {
    label: String,
    state: Mutex<RegistryState<C>>,
}

struct RegistryState<C> {
    next_id: u64,
    entries: Vec<Entry<C>>,
}

/// Type-erased removal, so [`Subscription`] does not carry the event type.
trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self, id: u64) -> bool;
    fn is_registered(&self, id: u64) -> bool;
}

impl<C: Send + 'static> Unsubscribe for Registry<C> {
    fn unsubscribe(&self, id: u64) -> bool {
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|entry| entry.id != id);
        state.entries.len() != before
    }

    fn is_registered(&self, id: u64) -> bool {
        self.state.lock().entries.iter().any(|entry| entry.id == id)
    }
}

/// Registration handle returned by every `subscribe*` call.
///
/// Dropping the handle (or calling [`unsubscribe`](Self::unsubscribe))
/// removes the subscriber. Keep it alive for as long as notifications are
/// wanted. The handle does not keep the collection alive.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<dyn Unsubscribe>,
}

impl Subscription {
    /// Identifier of this registration, unique within its feed.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns whether the subscriber is still registered.
    ///
    /// `false` once the collection is gone, disposed, or a channel
    /// subscriber's receiver was dropped.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.is_registered(self.id))
    }

    /// Removes the subscriber now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unsubscribe(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Ordered fan-out of notifications to registered subscribers.
///
/// Subscribers are called synchronously, on the emitting thread, in
/// registration order. The registry lock is not held while a handler runs, so
/// handlers may subscribe or unsubscribe freely.
pub struct ChangeFeed<C> {
    registry: Arc<Registry<C>>,
}

impl<C: Send + 'static> ChangeFeed<C> {
    /// Creates an empty feed. `label` tags warnings about channel subscribers.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            registry: Arc::new(Registry {
                label: label.into(),
                state: Mutex::new(RegistryState {
                    next_id: 1,
                    entries: Vec::new(),
                }),
            }),
        }
    }

    fn register(&self, sink: Sink<C>) -> Subscription {
        let id = {
            let mut state = self.registry.state.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.entries.push(Entry { id, sink });
            id
        };

        let registry: Arc<dyn Unsubscribe> = self.registry.clone();
        Subscription {
            id,
            registry: Arc::downgrade(&registry),
        }
    }

    /// Subscribes to the combined stream (properties and structural changes).
    pub fn subscribe_all<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Notification<C>) + Send + Sync + 'static,
    {
        self.register(Sink::Handler(Arc::new(handler)))
    }

    /// Subscribes to structural changes only.
    pub fn subscribe_changes<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&C) + Send + Sync + 'static,
    {
        self.subscribe_all(move |notification| {
            if let Notification::Change(change) = notification {
                handler(change);
            }
        })
    }

    /// Subscribes to named-property notices only.
    pub fn subscribe_properties<F>(&self, handler: F) -> Subscription
    where
        F: Fn(PropertyName) + Send + Sync + 'static,
    {
        self.subscribe_all(move |notification| {
            if let Notification::Property(name) = notification {
                handler(*name);
            }
        })
    }

    /// Subscribes a bounded channel to the combined stream.
    ///
    /// When the channel is full the notification is dropped for this
    /// subscriber only. When the receiver is dropped the subscriber is removed.
    /// A `capacity` of 0 yields a channel that never receives; the collections
    /// refuse it before calling here.
    pub fn subscribe_channel(&self, capacity: usize) -> (Subscription, Receiver<Notification<C>>) {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        (self.register(Sink::Channel(sender)), receiver)
    }

    /// Returns whether anyone is subscribed.
    ///
    /// Emitters check this first so nothing is cloned for an empty feed.
    #[inline]
    #[must_use]
    pub fn has_subscribers(&self) -> bool {
        !self.registry.state.lock().entries.is_empty()
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.state.lock().entries.len()
    }

    /// Removes every subscriber.
    pub fn clear(&self) {
        self.registry.state.lock().entries.clear();
    }

    /// Delivers `notification` to every subscriber.
    pub fn emit(&self, notification: &Notification<C>)
    where
        C: Clone,
    {
        let targets: Vec<(u64, Sink<C>)> = {
            let state = self.registry.state.lock();
            state
                .entries
                .iter()
                .map(|entry| (entry.id, entry.sink.clone()))
                .collect()
        };

        let mut disconnected = Vec::new();
        for (id, sink) in targets {
            match sink {
                Sink::Handler(handler) => handler(notification),
                Sink::Channel(sender) => match sender.try_send(notification.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(
                            collection = %self.registry.label,
                            subscriber = id,
                            "channel subscriber full, notification dropped"
                        );
                    }
                    Err(TrySendError::Disconnected(_)) => disconnected.push(id),
                },
            }
        }

        for id in disconnected {
            tracing::warn!(
                collection = %self.registry.label,
                subscriber = id,
                "channel subscriber disconnected, removing"
            );
            self.registry.unsubscribe(id);
        }
    }

    /// Emits the property notices followed by the structural change.
    pub fn emit_all(&self, properties: &[PropertyName], change: C)
    where
        C: Clone,
    {
        for name in properties {
            self.emit(&Notification::Property(*name));
        }
        self.emit(&Notification::Change(change));
    }
}

impl<C> std::fmt::Debug for ChangeFeed<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("label", &self.registry.label)
            .field("subscribers", &self.registry.state.lock().entries.len())
            .finish_non_exhaustive()
    }
}
