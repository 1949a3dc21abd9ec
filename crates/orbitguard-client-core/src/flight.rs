//! Single-flight slots.
//!
//! Each slot holds at most one live request. Beginning a new request cancels
//! the previous token and bumps the generation; a completion is only accepted
//! if its ticket still carries the current generation, so a reply that lands
//! after its successor started is dropped even when the transport ignored the
//! cancellation.

use std::sync::{Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

use crate::query::Channel;

#[derive(Debug, Default)]
struct SlotState {
    generation: u64,
    active: Option<CancellationToken>,
}

#[derive(Debug)]
pub struct SingleFlightSlot {
    channel: Channel,
    state: Mutex<SlotState>,
}

#[derive(Debug, Clone)]
pub struct FlightTicket {
    generation: u64,
    token: CancellationToken,
}

impl FlightTicket {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once a successor (or an explicit cancel) supersedes this ticket.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

impl SingleFlightSlot {
    #[must_use]
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            state: Mutex::new(SlotState::default()),
        }
    }

    #[must_use]
    pub fn channel(&self) -> Channel {
        self.channel
    }

    fn state(&self) -> MutexGuard<'_, SlotState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Supersedes whatever is in flight and hands out the new current ticket.
    pub fn begin(&self) -> FlightTicket {
        let mut state = self.state();
        if let Some(previous) = state.active.take() {
            previous.cancel();
            tracing::debug!(
                channel = self.channel.as_str(),
                generation = state.generation,
                "superseding in-flight request"
            );
        }
        state.generation = state.generation.wrapping_add(1);
        let token = CancellationToken::new();
        state.active = Some(token.clone());
        FlightTicket {
            generation: state.generation,
            token,
        }
    }

    #[must_use]
    pub fn is_current(&self, ticket: &FlightTicket) -> bool {
        let state = self.state();
        state.generation == ticket.generation && !ticket.token.is_cancelled()
    }

    /// Releases the slot if `ticket` still owns it.
    pub fn finish(&self, ticket: &FlightTicket) {
        let mut state = self.state();
        if state.generation == ticket.generation {
            state.active = None;
        }
    }

    /// Cancels the in-flight request, if any. Returns whether one existed.
    pub fn cancel(&self) -> bool {
        let mut state = self.state();
        match state.active.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.state().active.is_some()
    }
}
