//! Face manager structures: event notifications, status dataset, query filter.
//!
//! Enumerated fields are stored as raw codes so that values introduced by a
//! newer forwarder survive decoding. The typed enums below cover the codes
//! this crate knows about.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::{
    errors::{DecodeError, Result},
    tlv::{self, Element, Elements, types},
};

/// Kind of a face event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceEventKind {
    /// Face was created.
    Created,
    /// Face was destroyed.
    Destroyed,
    /// Face went up.
    Up,
    /// Face went down.
    Down,
}

impl FaceEventKind {
    /// Map a wire code.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            1 => Some(Self::Created),
            2 => Some(Self::Destroyed),
            3 => Some(Self::Up),
            4 => Some(Self::Down),
            _ => None,
        }
    }

    /// Wire code.
    pub fn code(self) -> u64 {
        match self {
            Self::Created => 1,
            Self::Destroyed => 2,
            Self::Up => 3,
            Self::Down => 4,
        }
    }

    /// Symbolic name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Destroyed => "DESTROYED",
            Self::Up => "UP",
            Self::Down => "DOWN",
        }
    }
}

/// Whether a face reaches a local application or the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceScope {
    /// Face to another host.
    NonLocal,
    /// Face to a local application.
    Local,
}

impl FaceScope {
    /// Map a wire code.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::NonLocal),
            1 => Some(Self::Local),
            _ => None,
        }
    }

    /// Wire code.
    pub fn code(self) -> u64 {
        match self {
            Self::NonLocal => 0,
            Self::Local => 1,
        }
    }

    /// Symbolic name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NonLocal => "non-local",
            Self::Local => "local",
        }
    }
}

/// Lifetime policy of a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacePersistency {
    /// Kept until explicitly destroyed or failed.
    Persistent,
    /// Created on demand, closed when idle.
    OnDemand,
    /// Kept even across failures.
    Permanent,
}

impl FacePersistency {
    /// Map a wire code.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Persistent),
            1 => Some(Self::OnDemand),
            2 => Some(Self::Permanent),
            _ => None,
        }
    }

    /// Wire code.
    pub fn code(self) -> u64 {
        match self {
            Self::Persistent => 0,
            Self::OnDemand => 1,
            Self::Permanent => 2,
        }
    }

    /// Symbolic name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Persistent => "persistent",
            Self::OnDemand => "on-demand",
            Self::Permanent => "permanent",
        }
    }
}

/// Link-layer topology of a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    /// Exactly one remote peer.
    PointToPoint,
    /// Broadcast medium.
    MultiAccess,
    /// Wireless ad hoc network.
    AdHoc,
}

impl LinkType {
    /// Map a wire code.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::PointToPoint),
            1 => Some(Self::MultiAccess),
            2 => Some(Self::AdHoc),
            _ => None,
        }
    }

    /// Wire code.
    pub fn code(self) -> u64 {
        match self {
            Self::PointToPoint => 0,
            Self::MultiAccess => 1,
            Self::AdHoc => 2,
        }
    }

    /// Symbolic name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PointToPoint => "point-to-point",
            Self::MultiAccess => "multi-access",
            Self::AdHoc => "ad-hoc",
        }
    }
}

bitflags! {
    /// Face feature bits carried in the `Flags` field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct FaceFlags: u64 {
        /// NDNLPv2 local fields are enabled.
        const LOCAL_FIELDS = 1;
        /// NDNLPv2 reliability is enabled.
        const LP_RELIABILITY = 1 << 1;
        /// Congestion marking is enabled.
        const CONGESTION_MARKING = 1 << 2;
    }
}

/// One entry of the face event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceEventNotification {
    /// Event kind code (see [`FaceEventKind`]).
    pub kind: u64,
    /// Face identifier.
    pub face_id: u64,
    /// Remote URI.
    pub uri: String,
    /// Local URI.
    pub local_uri: String,
    /// Scope code (see [`FaceScope`]).
    pub face_scope: u64,
    /// Persistency code (see [`FacePersistency`]).
    pub face_persistency: u64,
    /// Link type code (see [`LinkType`]).
    pub link_type: u64,
    /// Flag bits (see [`FaceFlags`]).
    pub flags: u64,
}

impl FaceEventNotification {
    /// Complete FaceEventNotification element.
    pub fn encode(&self) -> Vec<u8> {
        let mut value = Vec::new();
        tlv::write_nonneg(&mut value, types::FACE_EVENT_KIND, self.kind);
        tlv::write_nonneg(&mut value, types::FACE_ID, self.face_id);
        tlv::write_element(&mut value, types::URI, self.uri.as_bytes());
        tlv::write_element(&mut value, types::LOCAL_URI, self.local_uri.as_bytes());
        tlv::write_nonneg(&mut value, types::FACE_SCOPE, self.face_scope);
        tlv::write_nonneg(&mut value, types::FACE_PERSISTENCY, self.face_persistency);
        tlv::write_nonneg(&mut value, types::LINK_TYPE, self.link_type);
        tlv::write_nonneg(&mut value, types::FLAGS, self.flags);

        let mut wire = Vec::with_capacity(value.len() + 4);
        tlv::write_element(&mut wire, types::FACE_EVENT_NOTIFICATION, &value);
        wire
    }
}

/// Decode the content of a face event notification.
///
/// Every field is required.
pub fn decode_face_event(wire: &[u8]) -> Result<FaceEventNotification> {
    let element = Element::read_exact(wire, types::FACE_EVENT_NOTIFICATION)?;

    let mut kind = None;
    let mut face_id = None;
    let mut uri = None;
    let mut local_uri = None;
    let mut face_scope = None;
    let mut face_persistency = None;
    let mut link_type = None;
    let mut flags = None;

    for child in element.children() {
        let child = child?;
        match child.typ {
            types::FACE_EVENT_KIND => kind = Some(child.as_nonneg()?),
            types::FACE_ID => face_id = Some(child.as_nonneg()?),
            types::URI => uri = Some(child.as_utf8("Uri")?),
            types::LOCAL_URI => local_uri = Some(child.as_utf8("LocalUri")?),
            types::FACE_SCOPE => face_scope = Some(child.as_nonneg()?),
            types::FACE_PERSISTENCY => face_persistency = Some(child.as_nonneg()?),
            types::LINK_TYPE => link_type = Some(child.as_nonneg()?),
            types::FLAGS => flags = Some(child.as_nonneg()?),
            _ => {},
        }
    }

    Ok(FaceEventNotification {
        kind: kind.ok_or(DecodeError::MissingField("FaceEventKind"))?,
        face_id: face_id.ok_or(DecodeError::MissingField("FaceId"))?,
        uri: uri.ok_or(DecodeError::MissingField("Uri"))?,
        local_uri: local_uri.ok_or(DecodeError::MissingField("LocalUri"))?,
        face_scope: face_scope.ok_or(DecodeError::MissingField("FaceScope"))?,
        face_persistency: face_persistency.ok_or(DecodeError::MissingField("FacePersistency"))?,
        link_type: link_type.ok_or(DecodeError::MissingField("LinkType"))?,
        flags: flags.ok_or(DecodeError::MissingField("Flags"))?,
    })
}

/// Criteria for a face dataset query. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceQueryFilter {
    /// Face identifier.
    pub face_id: Option<u64>,
    /// URI scheme, e.g. `udp4`.
    pub uri_scheme: Option<String>,
    /// Remote URI.
    pub uri: Option<String>,
    /// Local URI.
    pub local_uri: Option<String>,
    /// Scope code.
    pub face_scope: Option<u64>,
    /// Persistency code.
    pub face_persistency: Option<u64>,
    /// Link type code.
    pub link_type: Option<u64>,
}

impl FaceQueryFilter {
    /// Filter matching the face with remote URI `uri`.
    pub fn by_uri(uri: impl Into<String>) -> Self {
        Self { uri: Some(uri.into()), ..Self::default() }
    }

    /// Complete FaceQueryFilter element.
    pub fn encode(&self) -> Vec<u8> {
        let mut value = Vec::new();
        if let Some(v) = self.face_id {
            tlv::write_nonneg(&mut value, types::FACE_ID, v);
        }
        if let Some(scheme) = &self.uri_scheme {
            tlv::write_element(&mut value, types::URI_SCHEME, scheme.as_bytes());
        }
        if let Some(uri) = &self.uri {
            tlv::write_element(&mut value, types::URI, uri.as_bytes());
        }
        if let Some(local_uri) = &self.local_uri {
            tlv::write_element(&mut value, types::LOCAL_URI, local_uri.as_bytes());
        }
        if let Some(v) = self.face_scope {
            tlv::write_nonneg(&mut value, types::FACE_SCOPE, v);
        }
        if let Some(v) = self.face_persistency {
            tlv::write_nonneg(&mut value, types::FACE_PERSISTENCY, v);
        }
        if let Some(v) = self.link_type {
            tlv::write_nonneg(&mut value, types::LINK_TYPE, v);
        }

        let mut wire = Vec::with_capacity(value.len() + 4);
        tlv::write_element(&mut wire, types::FACE_QUERY_FILTER, &value);
        wire
    }

    /// Decode a complete FaceQueryFilter element.
    pub fn decode(wire: &[u8]) -> Result<Self> {
        let element = Element::read_exact(wire, types::FACE_QUERY_FILTER)?;
        let mut filter = Self::default();
        for child in element.children() {
            let child = child?;
            match child.typ {
                types::FACE_ID => filter.face_id = Some(child.as_nonneg()?),
                types::URI_SCHEME => filter.uri_scheme = Some(child.as_utf8("UriScheme")?),
                types::URI => filter.uri = Some(child.as_utf8("Uri")?),
                types::LOCAL_URI => filter.local_uri = Some(child.as_utf8("LocalUri")?),
                types::FACE_SCOPE => filter.face_scope = Some(child.as_nonneg()?),
                types::FACE_PERSISTENCY => filter.face_persistency = Some(child.as_nonneg()?),
                types::LINK_TYPE => filter.link_type = Some(child.as_nonneg()?),
                _ => {},
            }
        }
        Ok(filter)
    }

    /// True if `status` satisfies every populated criterion.
    pub fn matches(&self, status: &FaceStatus) -> bool {
        let scheme_matches = self.uri_scheme.as_ref().is_none_or(|scheme| {
            status.uri.split_once("://").is_some_and(|(s, _)| s == scheme)
        });

        scheme_matches
            && self.face_id.is_none_or(|id| id == status.face_id)
            && self.uri.as_ref().is_none_or(|uri| *uri == status.uri)
            && self.local_uri.as_ref().is_none_or(|uri| *uri == status.local_uri)
            && self.face_scope.is_none_or(|v| v == status.face_scope)
            && self.face_persistency.is_none_or(|v| v == status.face_persistency)
            && self.link_type.is_none_or(|v| v == status.link_type)
    }
}

/// One entry of the face status dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceStatus {
    /// Face identifier.
    pub face_id: u64,
    /// Remote URI.
    pub uri: String,
    /// Local URI.
    pub local_uri: String,
    /// Remaining lifetime of an on-demand face, in milliseconds.
    pub expiration_period: Option<u64>,
    /// Scope code.
    pub face_scope: u64,
    /// Persistency code.
    pub face_persistency: u64,
    /// Link type code.
    pub link_type: u64,
    /// Base congestion marking interval in nanoseconds.
    pub base_cong_mark: Option<u64>,
    /// Default congestion threshold in bytes.
    pub def_cong_thres: Option<u64>,
    /// Effective MTU.
    pub mtu: Option<u64>,
    /// Interests received.
    pub n_in_interests: u64,
    /// Data received.
    pub n_in_data: u64,
    /// Nacks received.
    pub n_in_nacks: u64,
    /// Interests sent.
    pub n_out_interests: u64,
    /// Data sent.
    pub n_out_data: u64,
    /// Nacks sent.
    pub n_out_nacks: u64,
    /// Bytes received.
    pub n_in_bytes: u64,
    /// Bytes sent.
    pub n_out_bytes: u64,
    /// Flag bits.
    pub flags: u64,
}

impl FaceStatus {
    /// Complete FaceStatus element.
    pub fn encode(&self) -> Vec<u8> {
        let mut value = Vec::new();
        tlv::write_nonneg(&mut value, types::FACE_ID, self.face_id);
        tlv::write_element(&mut value, types::URI, self.uri.as_bytes());
        tlv::write_element(&mut value, types::LOCAL_URI, self.local_uri.as_bytes());
        if let Some(v) = self.expiration_period {
            tlv::write_nonneg(&mut value, types::EXPIRATION_PERIOD, v);
        }
        tlv::write_nonneg(&mut value, types::FACE_SCOPE, self.face_scope);
        tlv::write_nonneg(&mut value, types::FACE_PERSISTENCY, self.face_persistency);
        tlv::write_nonneg(&mut value, types::LINK_TYPE, self.link_type);
        for (typ, field) in [
            (types::BASE_CONG_MARK, self.base_cong_mark),
            (types::DEF_CONG_THRES, self.def_cong_thres),
            (types::MTU, self.mtu),
        ] {
            if let Some(v) = field {
                tlv::write_nonneg(&mut value, typ, v);
            }
        }
        for (typ, v) in [
            (types::N_IN_INTERESTS, self.n_in_interests),
            (types::N_IN_DATA, self.n_in_data),
            (types::N_IN_NACKS, self.n_in_nacks),
            (types::N_OUT_INTERESTS, self.n_out_interests),
            (types::N_OUT_DATA, self.n_out_data),
            (types::N_OUT_NACKS, self.n_out_nacks),
            (types::N_IN_BYTES, self.n_in_bytes),
            (types::N_OUT_BYTES, self.n_out_bytes),
        ] {
            tlv::write_nonneg(&mut value, typ, v);
        }
        tlv::write_nonneg(&mut value, types::FLAGS, self.flags);

        let mut wire = Vec::with_capacity(value.len() + 4);
        tlv::write_element(&mut wire, types::FACE_STATUS, &value);
        wire
    }

    fn decode_element(element: &Element<'_>) -> Result<Self> {
        let mut status = Self::default();
        let mut face_id = None;
        let mut uri = None;
        let mut local_uri = None;

        for child in element.children() {
            let child = child?;
            match child.typ {
                types::FACE_ID => face_id = Some(child.as_nonneg()?),
                types::URI => uri = Some(child.as_utf8("Uri")?),
                types::LOCAL_URI => local_uri = Some(child.as_utf8("LocalUri")?),
                types::EXPIRATION_PERIOD => status.expiration_period = Some(child.as_nonneg()?),
                types::FACE_SCOPE => status.face_scope = child.as_nonneg()?,
                types::FACE_PERSISTENCY => status.face_persistency = child.as_nonneg()?,
                types::LINK_TYPE => status.link_type = child.as_nonneg()?,
                types::BASE_CONG_MARK => status.base_cong_mark = Some(child.as_nonneg()?),
                types::DEF_CONG_THRES => status.def_cong_thres = Some(child.as_nonneg()?),
                types::MTU => status.mtu = Some(child.as_nonneg()?),
                types::N_IN_INTERESTS => status.n_in_interests = child.as_nonneg()?,
                types::N_IN_DATA => status.n_in_data = child.as_nonneg()?,
                types::N_IN_NACKS => status.n_in_nacks = child.as_nonneg()?,
                types::N_OUT_INTERESTS => status.n_out_interests = child.as_nonneg()?,
                types::N_OUT_DATA => status.n_out_data = child.as_nonneg()?,
                types::N_OUT_NACKS => status.n_out_nacks = child.as_nonneg()?,
                types::N_IN_BYTES => status.n_in_bytes = child.as_nonneg()?,
                types::N_OUT_BYTES => status.n_out_bytes = child.as_nonneg()?,
                types::FLAGS => status.flags = child.as_nonneg()?,
                _ => {},
            }
        }

        status.face_id = face_id.ok_or(DecodeError::MissingField("FaceId"))?;
        status.uri = uri.ok_or(DecodeError::MissingField("Uri"))?;
        status.local_uri = local_uri.ok_or(DecodeError::MissingField("LocalUri"))?;
        Ok(status)
    }
}

/// Decode a face status dataset: zero or more concatenated FaceStatus
/// elements.
pub fn decode_face_status_list(wire: &[u8]) -> Result<Vec<FaceStatus>> {
    Elements::new(wire)
        .map(|element| {
            let element = element?;
            if element.typ != types::FACE_STATUS {
                return Err(DecodeError::UnexpectedType {
                    expected: types::FACE_STATUS,
                    actual: element.typ,
                });
            }
            FaceStatus::decode_element(&element)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    fn sample_event() -> FaceEventNotification {
        FaceEventNotification {
            kind: 1,
            face_id: 262,
            uri: "udp4://192.0.2.1:6363".into(),
            local_uri: "udp4://192.0.2.9:6363".into(),
            face_scope: 0,
            face_persistency: 0,
            link_type: 0,
            flags: 0,
        }
    }

    fn sample_status(face_id: u64, uri: &str) -> FaceStatus {
        FaceStatus {
            face_id,
            uri: uri.into(),
            local_uri: "udp4://192.0.2.9:6363".into(),
            mtu: Some(8800),
            n_in_interests: 12,
            n_out_bytes: 4096,
            flags: FaceFlags::CONGESTION_MARKING.bits(),
            ..FaceStatus::default()
        }
    }

    #[test]
    fn symbolic_tables() {
        assert_eq!(FaceEventKind::from_code(1).map(FaceEventKind::as_str), Some("CREATED"));
        assert_eq!(FaceEventKind::from_code(4).map(FaceEventKind::as_str), Some("DOWN"));
        assert_eq!(FaceEventKind::from_code(0), None);
        assert_eq!(FaceScope::from_code(1).map(FaceScope::as_str), Some("local"));
        assert_eq!(FacePersistency::from_code(1).map(FacePersistency::as_str), Some("on-demand"));
        assert_eq!(LinkType::from_code(2).map(LinkType::as_str), Some("ad-hoc"));
        assert_eq!(LinkType::from_code(3), None);
    }

    #[test]
    fn codes_map_back() {
        for code in 1..=4 {
            assert_eq!(FaceEventKind::from_code(code).map(FaceEventKind::code), Some(code));
        }
        for code in 0..=2 {
            assert_eq!(FacePersistency::from_code(code).map(FacePersistency::code), Some(code));
            assert_eq!(LinkType::from_code(code).map(LinkType::code), Some(code));
        }
    }

    #[test]
    fn face_event_decodes() {
        let event = sample_event();
        assert_eq!(decode_face_event(&event.encode()).unwrap(), event);
    }

    #[test]
    fn face_event_keeps_unknown_codes() {
        let event = FaceEventNotification { kind: 9, link_type: 77, ..sample_event() };
        let decoded = decode_face_event(&event.encode()).unwrap();
        assert_eq!(decoded.kind, 9);
        assert_eq!(decoded.link_type, 77);
    }

    #[test]
    fn face_event_missing_field() {
        // Kind and FaceId only
        let wire = hex!("c006 c10101 690101");
        assert_eq!(decode_face_event(&wire), Err(DecodeError::MissingField("Uri")));
    }

    #[test]
    fn face_event_wrong_outer_type() {
        let wire = hex!("6500");
        assert!(matches!(
            decode_face_event(&wire),
            Err(DecodeError::UnexpectedType { expected: 0xc0, .. })
        ));
    }

    #[test]
    fn status_dataset_decodes() {
        let first = sample_status(256, "udp4://192.0.2.1:6363");
        let second = sample_status(257, "tcp4://192.0.2.2:6363");
        let mut wire = first.encode();
        wire.extend_from_slice(&second.encode());

        assert_eq!(decode_face_status_list(&wire).unwrap(), vec![first, second]);
        assert!(decode_face_status_list(&[]).unwrap().is_empty());
    }

    #[test]
    fn status_dataset_rejects_foreign_elements() {
        let mut wire = sample_status(256, "udp4://192.0.2.1:6363").encode();
        wire.extend_from_slice(&hex!("6500"));
        assert!(decode_face_status_list(&wire).is_err());
    }

    #[test]
    fn query_filter_matching() {
        let status = sample_status(300, "udp4://192.0.2.1:6363");

        assert!(FaceQueryFilter::default().matches(&status));
        assert!(FaceQueryFilter::by_uri("udp4://192.0.2.1:6363").matches(&status));
        assert!(!FaceQueryFilter::by_uri("udp4://192.0.2.2:6363").matches(&status));

        let scheme = FaceQueryFilter { uri_scheme: Some("udp4".into()), ..Default::default() };
        assert!(scheme.matches(&status));
        let scheme = FaceQueryFilter { uri_scheme: Some("tcp4".into()), ..Default::default() };
        assert!(!scheme.matches(&status));
    }

    #[test]
    fn query_filter_wire() {
        let filter = FaceQueryFilter::by_uri("udp4://a:1");
        assert_eq!(filter.encode(), hex!("960c 720a 756470343a2f2f613a31"));
        assert_eq!(FaceQueryFilter::decode(&filter.encode()).unwrap(), filter);
    }

    #[test]
    fn flags_bits() {
        let flags = FaceFlags::from_bits_truncate(0b101);
        assert!(flags.contains(FaceFlags::LOCAL_FIELDS));
        assert!(flags.contains(FaceFlags::CONGESTION_MARKING));
        assert!(!flags.contains(FaceFlags::LP_RELIABILITY));
    }
}
