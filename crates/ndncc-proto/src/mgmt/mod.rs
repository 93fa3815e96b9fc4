//! NFD management structures.
//!
//! Control commands carry a [`ControlParameters`] block in their name and are
//! answered with a [`ControlResponse`]. The face manager additionally
//! publishes a [`FaceEventNotification`] stream and a [`FaceStatus`] dataset
//! that can be filtered with a [`FaceQueryFilter`].

mod control;
mod face;

pub use control::{ControlParameters, ControlResponse, ParameterField, decode_control_response};
pub use face::{
    FaceEventKind, FaceEventNotification, FaceFlags, FacePersistency, FaceQueryFilter, FaceScope,
    FaceStatus, LinkType, decode_face_event, decode_face_status_list,
};
