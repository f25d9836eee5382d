//! Notification bus decoupling state changes from rendering.
//!
//! An explicit observer registry: each event kind keeps an ordered list of
//! callbacks, and every registration hands back a [`Subscription`] token so
//! the caller controls its own lifetime. Consumers must tolerate events that
//! reference a stale or absent active count and treat them as no-ops.

use crate::model::CountField;
use crate::store::{CountViewStyle, View};
use std::collections::HashMap;

/// Everything the store announces to its observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Startup finished: migration ran, theme and counts are loaded.
    Initialized,
    /// The set of counts changed (create, delete, restore, navigation).
    CountsUpdated,
    ViewChanged {
        view: View,
    },
    /// The active count's item list needs a full re-render.
    ItemsChanged,
    StatsUpdated,
    /// Targeted delta for O(1) patching of a single cell, instead of a full
    /// list re-render.
    ItemValueChanged {
        item_index: usize,
        field: CountField,
        value: u32,
    },
    /// Transient user-facing toast ("Undo", "Redo", "Restored", ...).
    Notification {
        text: String,
    },
    /// Every item in the active count just became completed.
    Celebration,
    ThemeChanged {
        theme: String,
    },
    CountViewStyleChanged {
        view: CountViewStyle,
    },
}

/// The subscription key: one discriminant per [`StoreEvent`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Initialized,
    CountsUpdated,
    ViewChanged,
    ItemsChanged,
    StatsUpdated,
    ItemValueChanged,
    Notification,
    Celebration,
    ThemeChanged,
    CountViewStyleChanged,
}

impl StoreEvent {
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Initialized => EventKind::Initialized,
            Self::CountsUpdated => EventKind::CountsUpdated,
            Self::ViewChanged { .. } => EventKind::ViewChanged,
            Self::ItemsChanged => EventKind::ItemsChanged,
            Self::StatsUpdated => EventKind::StatsUpdated,
            Self::ItemValueChanged { .. } => EventKind::ItemValueChanged,
            Self::Notification { .. } => EventKind::Notification,
            Self::Celebration => EventKind::Celebration,
            Self::ThemeChanged { .. } => EventKind::ThemeChanged,
            Self::CountViewStyleChanged { .. } => EventKind::CountViewStyleChanged,
        }
    }
}

type Callback = Box<dyn FnMut(&StoreEvent)>;

/// Deregistration handle returned by [`EventBus::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    kind: EventKind,
    id: u64,
}

/// Single-threaded publish/subscribe registry.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    handlers: HashMap<EventKind, Vec<(u64, Callback)>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for one event kind. Callbacks for a kind run in
    /// registration order.
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&StoreEvent) + 'static,
    ) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.handlers
            .entry(kind)
            .or_default()
            .push((id, Box::new(callback)));
        Subscription { kind, id }
    }

    /// Remove exactly the callback named by `subscription`. Unsubscribing
    /// twice is impossible because the token is consumed.
    pub fn unsubscribe(&mut self, subscription: Subscription) {
        if let Some(callbacks) = self.handlers.get_mut(&subscription.kind) {
            callbacks.retain(|(id, _)| *id != subscription.id);
        }
    }

    /// Deliver `event` to every callback registered for its kind.
    pub fn emit(&mut self, event: &StoreEvent) {
        if let Some(callbacks) = self.handlers.get_mut(&event.kind()) {
            for (_, callback) in callbacks.iter_mut() {
                callback(event);
            }
        }
    }

    /// Number of live callbacks for `kind`.
    #[must_use]
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}
