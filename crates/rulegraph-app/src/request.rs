use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Handle for one ruleset fetch. Only the ticket matching the most recent
/// request may apply its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    pub id: u64,
    pub ruleset_id: String,
    pub issued_at: Instant,
}

/// Monotonic request counter shared between the controller and whatever
/// performs the fetches.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, ruleset_id: &str) -> RequestTicket {
        RequestTicket {
            id: self.invalidate(),
            ruleset_id: ruleset_id.to_string(),
            issued_at: Instant::now(),
        }
    }

    /// Supersede every outstanding ticket and return the new latest id.
    pub fn invalidate(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.latest() == ticket.id
    }
}
