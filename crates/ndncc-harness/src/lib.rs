//! Deterministic test harness for the NFD management client.
//!
//! [`SimForwarder`] answers management commands, face queries and the face
//! event stream the way a local NFD does, entirely in memory, with
//! injectable faults. [`SimEnv`] pairs it with a seeded RNG and tokio's
//! virtual clock so tests with paused time are reproducible.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod sim_env;
pub mod sim_forwarder;

pub use sim_env::SimEnv;
pub use sim_forwarder::{Fault, RecordedCommand, SimForwarder};
