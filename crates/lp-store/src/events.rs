//! Observer registry for store notifications.
//!
//! Callbacks run synchronously inside the store call that triggered them.
//! They receive a shared view of the event and cannot reach the store
//! mutably while it is dispatching.

use lp_core::SourceId;

use crate::model::DataModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SourceOpened,
    /// `on_close`: the model is still readable during dispatch.
    Closed,
    TimeChanged,
    SignalAdded,
    SignalRemoved,
}

#[derive(Debug, Clone, Copy)]
pub enum StoreEvent<'a> {
    SourceOpened {
        source_id: &'a SourceId,
    },
    Closed {
        source_id: &'a SourceId,
        model: &'a DataModel,
    },
    TimeChanged {
        source_id: &'a SourceId,
        offset: f64,
    },
    SignalAdded {
        source_id: &'a SourceId,
        name: &'a str,
    },
    SignalRemoved {
        source_id: &'a SourceId,
        name: &'a str,
    },
}

impl StoreEvent<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            StoreEvent::SourceOpened { .. } => EventKind::SourceOpened,
            StoreEvent::Closed { .. } => EventKind::Closed,
            StoreEvent::TimeChanged { .. } => EventKind::TimeChanged,
            StoreEvent::SignalAdded { .. } => EventKind::SignalAdded,
            StoreEvent::SignalRemoved { .. } => EventKind::SignalRemoved,
        }
    }

    pub fn source_id(&self) -> &SourceId {
        match self {
            StoreEvent::SourceOpened { source_id }
            | StoreEvent::Closed { source_id, .. }
            | StoreEvent::TimeChanged { source_id, .. }
            | StoreEvent::SignalAdded { source_id, .. }
            | StoreEvent::SignalRemoved { source_id, .. } => source_id,
        }
    }
}

/// Returned by `subscribe`; pass it back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(u64);

pub type Callback = Box<dyn FnMut(&StoreEvent<'_>)>;

struct Subscription {
    handle: SubscriptionHandle,
    kind: EventKind,
    callback: Callback,
}

#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    subscriptions: Vec<Subscription>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self, kind: EventKind, callback: Callback) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            handle,
            kind,
            callback,
        });
        handle
    }

    pub(crate) fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.handle != handle);
        self.subscriptions.len() != before
    }

    /// Deliver to matching subscribers in subscription order.
    pub(crate) fn emit(&mut self, event: &StoreEvent<'_>) {
        let kind = event.kind();
        for sub in self.subscriptions.iter_mut().filter(|s| s.kind == kind) {
            (sub.callback)(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.subscriptions.len()
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
