//! Capacity-1 admission control for backend requests.
//!
//! Both controllers allow a single outstanding request of their kind.
//! Extra attempts are rejected outright; nothing is queued and nobody waits.

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SingleFlight {
    busy: bool,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot. Returns `false` when a request is already in flight.
    pub fn try_enter(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    /// Release the slot. Safe to call when idle.
    pub fn leave(&mut self) {
        self.busy = false;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }
}
