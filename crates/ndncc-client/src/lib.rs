//! NFD management client
//!
//! High-level operations over [`ndncc_core`]: face and route management,
//! face queries, hub auto-configuration and the runtime that keeps the
//! transport pumped while the face event subscription runs.
//!
//! # Layout
//!
//! - [`controller`]: One method per management transaction
//! - [`discovery`]: Locating a nearby hub for auto-configuration
//! - [`runtime`]: Driver tick and subscriber loop on one task
//! - [`config`]: Client configuration
//! - [`error`]: Client error type
//!
//! With the `transport` feature, `unix_face` provides the production face
//! over the forwarder's Unix socket.

pub mod config;
pub mod controller;
pub mod discovery;
pub mod error;
pub mod runtime;
#[cfg(feature = "transport")]
pub mod unix_face;

pub use config::{AutoconfConfig, ClientConfig};
pub use controller::{AutoconfOutcome, Controller, normalize_face_uri};
pub use discovery::{Discovery, DiscoveryError, FchDiscovery, StaticDiscovery};
pub use error::ClientError;
pub use runtime::{Runtime, StopHandle};
#[cfg(feature = "transport")]
pub use unix_face::UnixFace;
