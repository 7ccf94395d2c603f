//! Event sink trait

use crate::event::VaultEvent;

/// Observer of vault notifications.
///
/// Delivery is fire-and-forget: a sink cannot fail the operation that
/// produced the event. Sinks that can fail must record the failure
/// themselves (see [`crate::JournalStore::take_error`]).
pub trait EventSink {
    /// Sink name (for logging)
    fn name(&self) -> &str;

    fn emit(&mut self, event: &VaultEvent);

    /// Deliver the notifications of one operation together.
    ///
    /// Sinks that persist events should override this so an operation is
    /// never recorded in part.
    fn emit_all(&mut self, events: &[VaultEvent]) {
        for event in events {
            self.emit(event);
        }
    }
}

/// Sink that keeps every event in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    events: Vec<VaultEvent>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[VaultEvent] {
        &self.events
    }

    /// Drain everything received so far
    pub fn take(&mut self) -> Vec<VaultEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn emit(&mut self, event: &VaultEvent) {
        self.events.push(event.clone());
    }
}
