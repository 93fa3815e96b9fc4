//! NFD management client core logic
//!
//! Protocol logic for talking to a local NDN forwarder's management
//! interface, decoupled from sockets and from the async runtime that drives
//! it.
//!
//! # Architecture
//!
//! The pieces here either build packets, match packets, or consume packets.
//! None of them own a socket. Transport is reached through the [`face::Face`]
//! trait, time and randomness through [`env::Environment`], and the
//! notification subscriber is a state machine that returns declarative
//! [`subscriber::SubscriberAction`]s for its caller to execute. The same code
//! therefore runs against a real forwarder and against the in-memory
//! forwarder used in tests.
//!
//! # Components
//!
//! - [`command`]: Control command construction and required-field table
//! - [`signer`]: Signed command components (timestamp, nonce, signature)
//! - [`exchange`]: Pending-interest table and request/response matching
//! - [`subscriber`]: Face event subscription state machine
//! - [`record`]: Symbolic key-value rendering and the event sink
//! - [`face`]: Transport abstraction
//! - [`mod@env`]: Environment abstraction (time, RNG)
//! - [`error`]: Encoding and transport error types

pub mod command;
pub mod env;
pub mod error;
pub mod exchange;
pub mod face;
pub mod record;
pub mod signer;
pub mod subscriber;

pub use command::{ControlCommand, required_fields};
pub use env::{Environment, SystemEnv};
pub use error::{EncodingError, FaceError};
pub use exchange::{Exchange, PendingTable};
pub use face::{ExchangeOutcome, Face};
pub use record::{EventPayload, EventSink, FACE_EVENT, control_response_record, face_event_record};
pub use signer::{CommandSigner, CommandStamper, DigestSigner, Ed25519Signer};
pub use subscriber::{Subscriber, SubscriberAction, SubscriberConfig, SubscriberState};
