use tokio::task::AbortHandle;

use super::state::SliderId;

struct Pending {
    ticket: u64,
    abort: AbortHandle,
}

/// One cancellable trailing-edge timer per slider.
///
/// Each armed timer carries a ticket; a timer task that wakes up only acts if
/// its ticket is still the current one for its slider, so a timer that lost a
/// race with a re-arm or a cancel does nothing.
#[derive(Default)]
pub struct DebounceTable {
    slots: [Option<Pending>; SliderId::COUNT],
    next_ticket: u64,
}

impl DebounceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    /// Install a timer for `id`, aborting the one it replaces.
    pub fn arm(&mut self, id: SliderId, ticket: u64, abort: AbortHandle) {
        if let Some(previous) = self.slots[id.index()].replace(Pending { ticket, abort }) {
            previous.abort.abort();
        }
    }

    /// Called by a timer that fired. Returns whether it is still current,
    /// clearing the slot if so.
    pub fn complete(&mut self, id: SliderId, ticket: u64) -> bool {
        let slot = &mut self.slots[id.index()];
        match slot {
            Some(pending) if pending.ticket == ticket => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self, id: SliderId) -> bool {
        match self.slots[id.index()].take() {
            Some(pending) => {
                pending.abort.abort();
                true
            }
            None => false,
        }
    }

    /// Cancel every armed timer; returns how many there were.
    pub fn cancel_all(&mut self) -> usize {
        SliderId::ALL.iter().filter(|id| self.cancel(**id)).count()
    }

    pub fn is_armed(&self, id: SliderId) -> bool {
        self.slots[id.index()].is_some()
    }
}
