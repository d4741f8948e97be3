//! Synchronous observer registry for interaction lifecycle events.

use std::fmt;

use serde::Serialize;

use crate::placement::{ModelId, ObjectId, Transform};
use crate::plane::PlaneId;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractionEvent {
    Spawned {
        id: ObjectId,
        model: ModelId,
        plane: PlaneId,
    },
    Destroyed {
        id: ObjectId,
    },
    Transformed {
        id: ObjectId,
        transform: Transform,
    },
    FloatingChanged {
        id: ObjectId,
        floating: bool,
    },
    /// Tracking should restart; plane ids seen so far may be stale.
    SessionReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&InteractionEvent)>;

/// Listeners run in registration order on the emitting thread. Emitting with
/// no listeners only queues the event for the current frame's output.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    pending: Vec<InteractionEvent>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("pending", &self.pending)
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&InteractionEvent) + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        before != self.listeners.len()
    }

    pub fn emit(&mut self, event: InteractionEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
        self.pending.push(event);
    }

    /// Events emitted since the last drain, oldest first.
    pub fn drain(&mut self) -> Vec<InteractionEvent> {
        std::mem::take(&mut self.pending)
    }
}
