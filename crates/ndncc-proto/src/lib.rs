//! Wire format for NDN management traffic.
//!
//! Everything the control-plane client puts on or takes off the wire lives
//! here: the TLV primitives of the NDN packet format (v0.3), names, the
//! Interest/Data packets, the NDNLPv2 wrapper used by the forwarder to
//! deliver Nacks, and the NFD management structures (control parameters,
//! control responses, face notifications and face datasets).
//!
//! The crate has no I/O, no async and no clock. Encoders emit only populated
//! fields; decoders report malformed input as [`DecodeError`] and never
//! substitute defaults for missing required fields.
//!
//! # Security
//!
//! Decoders bound every length by the input they were given. A declared
//! length that overruns the buffer is rejected as truncated, and stream
//! framing refuses elements larger than [`MAX_PACKET_SIZE`].
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod mgmt;
pub mod name;
pub mod packet;
pub mod tlv;

pub use errors::{DecodeError, Result};
pub use mgmt::{
    ControlParameters, ControlResponse, FaceEventKind, FaceEventNotification, FaceFlags,
    FacePersistency, FaceQueryFilter, FaceScope, FaceStatus, LinkType, ParameterField,
    decode_control_response, decode_face_event, decode_face_status_list,
};
pub use name::{Name, NameComponent};
pub use packet::{Data, Interest, NackReason, Packet};

/// Largest packet the forwarder accepts on a face.
pub const MAX_PACKET_SIZE: usize = 8800;
