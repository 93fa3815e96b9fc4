//! Face event subscription state machine.
//!
//! The forwarder publishes face events as a stream of Data packets named
//! `/localhost/nfd/faces/events/<seq>`. The subscriber long-polls that
//! stream one Interest at a time.
//!
//! # State Machine
//!
//! ```text
//!             success(seq) / emit
//!   ┌─────────┐ ──────────────────> ┌──────────────────────┐
//!   │ Syncing │                     │ Tracking { seq + 1 } │ ──┐ success(seq)
//!   └─────────┘ <────────────────── └──────────────────────┘ <─┘ / emit
//!     │     ^    timeout, nack or
//!     └─────┘    undecodable data
//!   timeout, nack or undecodable data
//! ```
//!
//! - **Syncing**: ask for the freshest event under the prefix
//!   (`CanBePrefix`, `MustBeFresh`).
//! - **Tracking**: ask for exactly the next sequence number.
//!
//! Any failure drops back to Syncing, so a forwarder restart or a gap in
//! the stream costs one resynchronisation rather than a stuck cursor. Every
//! iteration, successful or not, ends with a short pause.
//!
//! Like the rest of this crate the machine does no I/O: the caller sends
//! [`Subscriber::next_interest`], feeds the outcome to
//! [`Subscriber::on_outcome`] and executes the returned actions.

use std::time::Duration;

use ndncc_proto::{FaceEventNotification, Interest, Name, decode_face_event};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::face::ExchangeOutcome;

/// Subscription parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberConfig {
    /// Name prefix of the event stream.
    pub prefix: Name,
    /// Lifetime of each long-poll Interest.
    pub lifetime: Duration,
    /// Pause after every iteration.
    pub backoff: Duration,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        let prefix = ["localhost", "nfd", "faces", "events"]
            .into_iter()
            .fold(Name::new(), |name, component| name.append_generic(component.as_bytes().to_vec()));
        Self { prefix, lifetime: Duration::from_secs(60), backoff: Duration::from_millis(100) }
    }
}

/// Position of the subscription cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    /// Cursor unset; fetching the freshest event.
    Syncing,
    /// Cursor set; fetching exactly `next_seq`.
    Tracking {
        /// Sequence number requested next.
        next_seq: u64,
    },
}

/// Actions returned by the subscriber for its driver to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriberAction {
    /// Deliver this notification to the event sink.
    Emit(FaceEventNotification),
    /// Sleep before issuing the next Interest.
    Pause(Duration),
}

/// Face event subscriber.
#[derive(Debug, Clone)]
pub struct Subscriber {
    config: SubscriberConfig,
    state: SubscriberState,
}

impl Subscriber {
    /// Subscriber in [`SubscriberState::Syncing`].
    pub fn new(config: SubscriberConfig) -> Self {
        Self { config, state: SubscriberState::Syncing }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SubscriberState {
        self.state
    }

    /// Configuration in use.
    pub fn config(&self) -> &SubscriberConfig {
        &self.config
    }

    /// Forget the cursor.
    pub fn reset(&mut self) {
        self.state = SubscriberState::Syncing;
    }

    /// Interest for the current state.
    pub fn next_interest(&self) -> Interest {
        match self.state {
            SubscriberState::Syncing => Interest::new(self.config.prefix.clone())
                .with_can_be_prefix(true)
                .with_must_be_fresh(true)
                .with_lifetime(self.config.lifetime),
            SubscriberState::Tracking { next_seq } => {
                Interest::new(self.config.prefix.clone().append_sequence_number(next_seq))
                    .with_lifetime(self.config.lifetime)
            },
        }
    }

    /// Advance on the resolution of the last Interest.
    pub fn on_outcome(&mut self, outcome: &ExchangeOutcome) -> Vec<SubscriberAction> {
        let mut actions = Vec::with_capacity(2);

        match outcome {
            ExchangeOutcome::Data(data) => {
                let seq = data.name.last().and_then(|component| component.to_sequence_number());
                match (seq, decode_face_event(&data.content)) {
                    (Some(seq), Ok(event)) => {
                        debug!(seq, face_id = event.face_id, kind = event.kind, "face event");
                        self.state = SubscriberState::Tracking { next_seq: seq.saturating_add(1) };
                        actions.push(SubscriberAction::Emit(event));
                    },
                    (None, _) => {
                        warn!(name = %data.name, "face event without sequence number, resyncing");
                        self.reset();
                    },
                    (Some(seq), Err(e)) => {
                        warn!(seq, error = %e, "undecodable face event, resyncing");
                        self.reset();
                    },
                }
            },
            ExchangeOutcome::Timeout => {
                if self.state != SubscriberState::Syncing {
                    debug!(state = ?self.state, "face event fetch timed out, resyncing");
                }
                self.reset();
            },
            ExchangeOutcome::Nack(reason) => {
                debug!(?reason, "face event fetch nacked, resyncing");
                self.reset();
            },
        }

        actions.push(SubscriberAction::Pause(self.config.backoff));
        actions
    }
}
