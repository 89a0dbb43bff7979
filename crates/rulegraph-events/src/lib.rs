use crossbeam_channel::{unbounded, Receiver, Sender};
use rulegraph_core::RuleId;
use serde::{Deserialize, Serialize};

pub mod telemetry;

/// What caused a recomputation of the components graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecomputeReason {
    RulesetChanged,
    CatalogChanged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Ruleset selection
    RulesetSelected {
        ruleset_id: String,
        request: u64,
    },
    RulesetLoaded {
        ruleset_id: String,
        request: u64,
        rule_count: usize,
    },
    RulesetLoadFailed {
        ruleset_id: String,
        request: u64,
        error: String,
    },
    /// A response arrived after a newer request was issued and was dropped.
    StaleResponseDiscarded {
        ruleset_id: String,
        request: u64,
        latest: u64,
    },

    // Group catalog
    GroupCatalogChanged {
        group_count: usize,
    },
    /// The catalog collaborator failed; the fixed default list is in use.
    GroupCatalogFallback {
        reason: String,
    },

    // Graph
    GraphRecomputed {
        reason: RecomputeReason,
        node_count: usize,
        edge_count: usize,
        layer_count: usize,
    },
    DependencyCyclesDetected {
        cycles: Vec<Vec<String>>,
    },

    // Selection
    NodeSelected {
        id: RuleId,
    },
    SelectionCleared,

    // Preferences
    PreferenceSaveFailed {
        error: String,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    pub fn publish(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    /// Dispatch all pending events to a listener.
    pub fn dispatch_to<L: EventListener>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }

    /// Drain pending events without a listener.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }
}

/// Trait for components that respond to events.
pub trait EventListener {
    fn handle_event(&mut self, event: &Event);
}
