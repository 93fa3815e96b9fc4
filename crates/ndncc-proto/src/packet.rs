//! Interest and Data packets, plus the NDNLPv2 wrapper that carries Nacks.
//!
//! Only the fields a management client reads or writes are modelled. Other
//! elements are skipped on decode. Data signatures are not verified here.

use std::time::Duration;

use bytes::Bytes;

use crate::{
    errors::{DecodeError, Result},
    name::Name,
    tlv::{self, Element, types},
};

/// Interest lifetime used when none is set explicitly.
pub const DEFAULT_INTEREST_LIFETIME: Duration = Duration::from_millis(4000);

/// A named request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interest {
    /// Requested name.
    pub name: Name,
    /// Whether a Data whose name extends `name` satisfies the Interest.
    pub can_be_prefix: bool,
    /// Whether cached Data past its freshness period is unacceptable.
    pub must_be_fresh: bool,
    /// Loop-detection nonce.
    pub nonce: Option<[u8; 4]>,
    /// How long the forwarder keeps the Interest pending.
    pub lifetime: Duration,
}

impl Interest {
    /// Interest for `name` with default selectors and lifetime.
    pub fn new(name: Name) -> Self {
        Self {
            name,
            can_be_prefix: false,
            must_be_fresh: false,
            nonce: None,
            lifetime: DEFAULT_INTEREST_LIFETIME,
        }
    }

    /// Set CanBePrefix.
    #[must_use]
    pub fn with_can_be_prefix(mut self, can_be_prefix: bool) -> Self {
        self.can_be_prefix = can_be_prefix;
        self
    }

    /// Set MustBeFresh.
    #[must_use]
    pub fn with_must_be_fresh(mut self, must_be_fresh: bool) -> Self {
        self.must_be_fresh = must_be_fresh;
        self
    }

    /// Set the lifetime.
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Set the nonce.
    #[must_use]
    pub fn with_nonce(mut self, nonce: [u8; 4]) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// True if `data` satisfies this Interest by name.
    pub fn matches_data(&self, data: &Data) -> bool {
        if self.can_be_prefix { self.name.is_prefix_of(&data.name) } else { self.name == data.name }
    }

    /// Wire encoding.
    pub fn encode(&self) -> Bytes {
        let mut value = Vec::new();
        self.name.encode(&mut value);
        if self.can_be_prefix {
            tlv::write_element(&mut value, types::CAN_BE_PREFIX, &[]);
        }
        if self.must_be_fresh {
            tlv::write_element(&mut value, types::MUST_BE_FRESH, &[]);
        }
        if let Some(nonce) = self.nonce {
            tlv::write_element(&mut value, types::NONCE, &nonce);
        }
        let lifetime_ms = u64::try_from(self.lifetime.as_millis()).unwrap_or(u64::MAX);
        tlv::write_nonneg(&mut value, types::INTEREST_LIFETIME, lifetime_ms);

        let mut wire = Vec::with_capacity(value.len() + 4);
        tlv::write_element(&mut wire, types::INTEREST, &value);
        Bytes::from(wire)
    }

    /// Decode a complete Interest element.
    pub fn decode(wire: &[u8]) -> Result<Self> {
        let element = Element::read_exact(wire, types::INTEREST)?;
        Self::decode_element(&element)
    }

    fn decode_element(element: &Element<'_>) -> Result<Self> {
        let mut name = None;
        let mut interest = Self::new(Name::new());

        for child in element.children() {
            let child = child?;
            match child.typ {
                types::NAME => name = Some(Name::decode_value(child.value)?),
                types::CAN_BE_PREFIX => interest.can_be_prefix = true,
                types::MUST_BE_FRESH => interest.must_be_fresh = true,
                types::NONCE => {
                    let nonce: [u8; 4] =
                        child.value.try_into().map_err(|_| DecodeError::InvalidField {
                            field: "Nonce",
                            reason: format!("expected 4 bytes, got {}", child.value.len()),
                        })?;
                    interest.nonce = Some(nonce);
                },
                types::INTEREST_LIFETIME => {
                    interest.lifetime = Duration::from_millis(child.as_nonneg()?);
                },
                _ => {},
            }
        }

        interest.name = name.ok_or(DecodeError::MissingField("Name"))?;
        Ok(interest)
    }
}

/// A named response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
    /// Data name.
    pub name: Name,
    /// Payload.
    pub content: Bytes,
    /// How long the Data counts as fresh in caches.
    pub freshness_period: Option<Duration>,
}

impl Data {
    /// Data with `name` and `content`.
    pub fn new(name: Name, content: impl Into<Bytes>) -> Self {
        Self { name, content: content.into(), freshness_period: None }
    }

    /// Set the freshness period.
    #[must_use]
    pub fn with_freshness_period(mut self, period: Duration) -> Self {
        self.freshness_period = Some(period);
        self
    }

    /// Wire encoding with a DigestSha256 SignatureInfo.
    ///
    /// The SignatureValue is zero-filled: signing Data is the producer's
    /// business, and this encoder exists for loopback and test traffic.
    pub fn encode(&self) -> Bytes {
        let mut value = Vec::new();
        self.name.encode(&mut value);

        if let Some(period) = self.freshness_period {
            let mut meta = Vec::new();
            let ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
            tlv::write_nonneg(&mut meta, types::FRESHNESS_PERIOD, ms);
            tlv::write_element(&mut value, types::META_INFO, &meta);
        }
        tlv::write_element(&mut value, types::CONTENT, &self.content);

        let mut sig_info = Vec::new();
        tlv::write_nonneg(&mut sig_info, types::SIGNATURE_TYPE, 0);
        tlv::write_element(&mut value, types::SIGNATURE_INFO, &sig_info);
        tlv::write_element(&mut value, types::SIGNATURE_VALUE, &[0u8; 32]);

        let mut wire = Vec::with_capacity(value.len() + 4);
        tlv::write_element(&mut wire, types::DATA, &value);
        Bytes::from(wire)
    }

    /// Decode a complete Data element.
    pub fn decode(wire: &[u8]) -> Result<Self> {
        let element = Element::read_exact(wire, types::DATA)?;
        Self::decode_element(&element)
    }

    fn decode_element(element: &Element<'_>) -> Result<Self> {
        let mut name = None;
        let mut data = Self::new(Name::new(), Bytes::new());

        for child in element.children() {
            let child = child?;
            match child.typ {
                types::NAME => name = Some(Name::decode_value(child.value)?),
                types::META_INFO => {
                    for meta in child.children() {
                        let meta = meta?;
                        if meta.typ == types::FRESHNESS_PERIOD {
                            data.freshness_period = Some(Duration::from_millis(meta.as_nonneg()?));
                        }
                    }
                },
                types::CONTENT => data.content = Bytes::copy_from_slice(child.value),
                _ => {},
            }
        }

        data.name = name.ok_or(DecodeError::MissingField("Name"))?;
        Ok(data)
    }
}

/// Why the forwarder refused an Interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NackReason {
    /// Upstream is congested.
    Congestion,
    /// Interest loop detected.
    Duplicate,
    /// No route toward the name.
    NoRoute,
    /// Reason absent or not recognised.
    Unspecified,
}

impl NackReason {
    /// Map a wire reason code.
    pub fn from_code(code: u64) -> Self {
        match code {
            50 => Self::Congestion,
            100 => Self::Duplicate,
            150 => Self::NoRoute,
            _ => Self::Unspecified,
        }
    }

    /// Wire reason code.
    pub fn code(self) -> u64 {
        match self {
            Self::Congestion => 50,
            Self::Duplicate => 100,
            Self::NoRoute => 150,
            Self::Unspecified => 0,
        }
    }
}

/// A packet received from the forwarder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// An Interest.
    Interest(Interest),
    /// A Data.
    Data(Data),
    /// An Interest bounced back with a Nack header.
    Nack {
        /// The refused Interest.
        interest: Interest,
        /// Why it was refused.
        reason: NackReason,
    },
}

impl Packet {
    /// Decode one complete network-layer or NDNLPv2 element.
    pub fn decode(wire: &[u8]) -> Result<Self> {
        let (element, consumed) = Element::read(wire)?;
        if consumed != wire.len() {
            return Err(DecodeError::TrailingBytes(wire.len() - consumed));
        }

        match element.typ {
            types::INTEREST => Ok(Self::Interest(Interest::decode_element(&element)?)),
            types::DATA => Ok(Self::Data(Data::decode_element(&element)?)),
            types::LP_PACKET => Self::decode_lp(&element),
            actual => Err(DecodeError::UnexpectedType { expected: types::DATA, actual }),
        }
    }

    /// Wire encoding of an Interest or Data; a Nack is wrapped in an LpPacket.
    pub fn encode(&self) -> Bytes {
        match self {
            Self::Interest(interest) => interest.encode(),
            Self::Data(data) => data.encode(),
            Self::Nack { interest, reason } => {
                let mut nack = Vec::new();
                if *reason != NackReason::Unspecified {
                    tlv::write_nonneg(&mut nack, types::LP_NACK_REASON, reason.code());
                }
                let mut value = Vec::new();
                tlv::write_element(&mut value, types::LP_NACK, &nack);
                tlv::write_element(&mut value, types::LP_FRAGMENT, &interest.encode());

                let mut wire = Vec::new();
                tlv::write_element(&mut wire, types::LP_PACKET, &value);
                Bytes::from(wire)
            },
        }
    }

    fn decode_lp(element: &Element<'_>) -> Result<Self> {
        let mut nack = None;
        let mut fragment = None;

        for child in element.children() {
            let child = child?;
            match child.typ {
                types::LP_NACK => {
                    let mut reason = NackReason::Unspecified;
                    for field in child.children() {
                        let field = field?;
                        if field.typ == types::LP_NACK_REASON {
                            reason = NackReason::from_code(field.as_nonneg()?);
                        }
                    }
                    nack = Some(reason);
                },
                types::LP_FRAGMENT => fragment = Some(child.value),
                _ => {},
            }
        }

        let fragment = fragment.ok_or(DecodeError::MissingField("Fragment"))?;
        let (inner, _) = Element::read(fragment)?;
        match (nack, inner.typ) {
            (Some(reason), types::INTEREST) => {
                Ok(Self::Nack { interest: Interest::decode_element(&inner)?, reason })
            },
            (None, types::INTEREST) => Ok(Self::Interest(Interest::decode_element(&inner)?)),
            (None, types::DATA) => Ok(Self::Data(Data::decode_element(&inner)?)),
            (_, actual) => Err(DecodeError::UnexpectedType { expected: types::INTEREST, actual }),
        }
    }
}
