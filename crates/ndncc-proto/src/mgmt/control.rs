//! ControlParameters and ControlResponse.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    errors::{DecodeError, Result},
    name::Name,
    tlv::{self, Element, types},
};

/// Parameters of a control command.
///
/// Every field is optional. Only populated fields are encoded, so an absent
/// field is never confused with a zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlParameters {
    /// Name prefix (routes, strategies, content store).
    pub name: Option<Name>,
    /// Face identifier.
    pub face_id: Option<u64>,
    /// Remote face URI.
    pub uri: Option<String>,
    /// Local face URI.
    pub local_uri: Option<String>,
    /// Route origin.
    pub origin: Option<u64>,
    /// Route cost.
    pub cost: Option<u64>,
    /// Content store capacity.
    pub capacity: Option<u64>,
    /// Entry count.
    pub count: Option<u64>,
    /// Base congestion marking interval in nanoseconds.
    pub base_cong_mark: Option<u64>,
    /// Default congestion threshold in bytes.
    pub def_cong_thres: Option<u64>,
    /// Face MTU override.
    pub mtu: Option<u64>,
    /// Flag bits.
    pub flags: Option<u64>,
    /// Which flag bits `flags` sets.
    pub mask: Option<u64>,
    /// Forwarding strategy name.
    pub strategy: Option<Name>,
    /// Expiration period in milliseconds.
    pub exp_period: Option<u64>,
    /// Face persistency code.
    pub face_persistency: Option<u64>,
}

/// Identifies one [`ControlParameters`] field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterField {
    /// `name`
    Name,
    /// `face_id`
    FaceId,
    /// `uri`
    Uri,
    /// `local_uri`
    LocalUri,
    /// `origin`
    Origin,
    /// `cost`
    Cost,
    /// `capacity`
    Capacity,
    /// `count`
    Count,
    /// `base_cong_mark`
    BaseCongMark,
    /// `def_cong_thres`
    DefCongThres,
    /// `mtu`
    Mtu,
    /// `flags`
    Flags,
    /// `mask`
    Mask,
    /// `strategy`
    Strategy,
    /// `exp_period`
    ExpPeriod,
    /// `face_persistency`
    FacePersistency,
}

impl ParameterField {
    /// Field name as used in logs and errors.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::FaceId => "face_id",
            Self::Uri => "uri",
            Self::LocalUri => "local_uri",
            Self::Origin => "origin",
            Self::Cost => "cost",
            Self::Capacity => "capacity",
            Self::Count => "count",
            Self::BaseCongMark => "base_cong_mark",
            Self::DefCongThres => "def_cong_thres",
            Self::Mtu => "mtu",
            Self::Flags => "flags",
            Self::Mask => "mask",
            Self::Strategy => "strategy",
            Self::ExpPeriod => "exp_period",
            Self::FacePersistency => "face_persistency",
        }
    }
}

impl fmt::Display for ParameterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ControlParameters {
    /// Empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `field` is populated.
    pub fn contains(&self, field: ParameterField) -> bool {
        match field {
            ParameterField::Name => self.name.is_some(),
            ParameterField::FaceId => self.face_id.is_some(),
            ParameterField::Uri => self.uri.is_some(),
            ParameterField::LocalUri => self.local_uri.is_some(),
            ParameterField::Origin => self.origin.is_some(),
            ParameterField::Cost => self.cost.is_some(),
            ParameterField::Capacity => self.capacity.is_some(),
            ParameterField::Count => self.count.is_some(),
            ParameterField::BaseCongMark => self.base_cong_mark.is_some(),
            ParameterField::DefCongThres => self.def_cong_thres.is_some(),
            ParameterField::Mtu => self.mtu.is_some(),
            ParameterField::Flags => self.flags.is_some(),
            ParameterField::Mask => self.mask.is_some(),
            ParameterField::Strategy => self.strategy.is_some(),
            ParameterField::ExpPeriod => self.exp_period.is_some(),
            ParameterField::FacePersistency => self.face_persistency.is_some(),
        }
    }

    /// Complete ControlParameters element.
    ///
    /// Fields are written in the order the management protocol defines.
    pub fn encode(&self) -> Vec<u8> {
        let mut value = Vec::new();
        if let Some(name) = &self.name {
            name.encode(&mut value);
        }
        if let Some(v) = self.face_id {
            tlv::write_nonneg(&mut value, types::FACE_ID, v);
        }
        if let Some(uri) = &self.uri {
            tlv::write_element(&mut value, types::URI, uri.as_bytes());
        }
        if let Some(local_uri) = &self.local_uri {
            tlv::write_element(&mut value, types::LOCAL_URI, local_uri.as_bytes());
        }

        let numeric = [
            (types::ORIGIN, self.origin),
            (types::COST, self.cost),
            (types::CAPACITY, self.capacity),
            (types::COUNT, self.count),
            (types::BASE_CONG_MARK, self.base_cong_mark),
            (types::DEF_CONG_THRES, self.def_cong_thres),
            (types::MTU, self.mtu),
            (types::FLAGS, self.flags),
            (types::MASK, self.mask),
        ];
        for (typ, field) in numeric {
            if let Some(v) = field {
                tlv::write_nonneg(&mut value, typ, v);
            }
        }
        if let Some(strategy) = &self.strategy {
            let mut inner = Vec::new();
            strategy.encode(&mut inner);
            tlv::write_element(&mut value, types::STRATEGY, &inner);
        }
        if let Some(v) = self.exp_period {
            tlv::write_nonneg(&mut value, types::EXPIRATION_PERIOD, v);
        }
        if let Some(v) = self.face_persistency {
            tlv::write_nonneg(&mut value, types::FACE_PERSISTENCY, v);
        }

        let mut wire = Vec::with_capacity(value.len() + 4);
        tlv::write_element(&mut wire, types::CONTROL_PARAMETERS, &value);
        wire
    }

    /// Decode a complete ControlParameters element.
    pub fn decode(wire: &[u8]) -> Result<Self> {
        let element = Element::read_exact(wire, types::CONTROL_PARAMETERS)?;
        Self::decode_element(&element)
    }

    pub(crate) fn decode_element(element: &Element<'_>) -> Result<Self> {
        let mut params = Self::new();
        for child in element.children() {
            let child = child?;
            match child.typ {
                types::NAME => params.name = Some(Name::decode_value(child.value)?),
                types::FACE_ID => params.face_id = Some(child.as_nonneg()?),
                types::URI => params.uri = Some(child.as_utf8("Uri")?),
                types::LOCAL_URI => params.local_uri = Some(child.as_utf8("LocalUri")?),
                types::ORIGIN => params.origin = Some(child.as_nonneg()?),
                types::COST => params.cost = Some(child.as_nonneg()?),
                types::CAPACITY => params.capacity = Some(child.as_nonneg()?),
                types::COUNT => params.count = Some(child.as_nonneg()?),
                types::BASE_CONG_MARK => params.base_cong_mark = Some(child.as_nonneg()?),
                types::DEF_CONG_THRES => params.def_cong_thres = Some(child.as_nonneg()?),
                types::MTU => params.mtu = Some(child.as_nonneg()?),
                types::FLAGS => params.flags = Some(child.as_nonneg()?),
                types::MASK => params.mask = Some(child.as_nonneg()?),
                types::STRATEGY => {
                    params.strategy = Some(Name::decode(child.value)?);
                },
                types::EXPIRATION_PERIOD => params.exp_period = Some(child.as_nonneg()?),
                types::FACE_PERSISTENCY => params.face_persistency = Some(child.as_nonneg()?),
                _ => {},
            }
        }
        Ok(params)
    }
}

/// Outcome of a control command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlResponse {
    /// HTTP-like status code.
    pub status_code: u64,
    /// Human-readable status.
    pub status_text: String,
    /// Parameters echoed back by the forwarder, if any.
    pub body: Option<ControlParameters>,
}

impl ControlResponse {
    /// Response without a body.
    pub fn new(status_code: u64, status_text: impl Into<String>) -> Self {
        Self { status_code, status_text: status_text.into(), body: None }
    }

    /// Attach echoed parameters.
    #[must_use]
    pub fn with_body(mut self, body: ControlParameters) -> Self {
        self.body = Some(body);
        self
    }

    /// True for 2xx status codes.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Complete ControlResponse element.
    pub fn encode(&self) -> Vec<u8> {
        let mut value = Vec::new();
        tlv::write_nonneg(&mut value, types::STATUS_CODE, self.status_code);
        tlv::write_element(&mut value, types::STATUS_TEXT, self.status_text.as_bytes());
        if let Some(body) = &self.body {
            value.extend_from_slice(&body.encode());
        }

        let mut wire = Vec::with_capacity(value.len() + 4);
        tlv::write_element(&mut wire, types::CONTROL_RESPONSE, &value);
        wire
    }
}

/// Decode the content of a control command reply.
pub fn decode_control_response(wire: &[u8]) -> Result<ControlResponse> {
    let element = Element::read_exact(wire, types::CONTROL_RESPONSE)?;

    let mut status_code = None;
    let mut status_text = None;
    let mut body = None;
    for child in element.children() {
        let child = child?;
        match child.typ {
            types::STATUS_CODE => status_code = Some(child.as_nonneg()?),
            types::STATUS_TEXT => status_text = Some(child.as_utf8("StatusText")?),
            types::CONTROL_PARAMETERS => body = Some(ControlParameters::decode_element(&child)?),
            _ => {},
        }
    }

    Ok(ControlResponse {
        status_code: status_code.ok_or(DecodeError::MissingField("StatusCode"))?,
        status_text: status_text.ok_or(DecodeError::MissingField("StatusText"))?,
        body,
    })
}
