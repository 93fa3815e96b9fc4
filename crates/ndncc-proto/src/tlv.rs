//! TLV primitives.
//!
//! Every NDN structure is a Type-Length-Value element whose type and length
//! are VAR-NUMBERs:
//!
//! ```text
//! first byte < 253   value is the byte itself
//! first byte = 253   value is the following u16 (big-endian)
//! first byte = 254   value is the following u32
//! first byte = 255   value is the following u64
//! ```
//!
//! Integer fields use the NonNegativeInteger encoding: the shortest of 1, 2,
//! 4 or 8 big-endian bytes.

use bytes::BufMut;

use crate::errors::{DecodeError, Result};

/// TLV type numbers used by this crate.
pub mod types {
    /// Interest packet.
    pub const INTEREST: u64 = 0x05;
    /// Data packet.
    pub const DATA: u64 = 0x06;
    /// Name.
    pub const NAME: u64 = 0x07;
    /// Generic name component.
    pub const GENERIC_COMPONENT: u64 = 0x08;
    /// Implicit SHA-256 digest component.
    pub const IMPLICIT_DIGEST_COMPONENT: u64 = 0x01;
    /// Parameters SHA-256 digest component.
    pub const PARAMETERS_DIGEST_COMPONENT: u64 = 0x02;
    /// Sequence number component (naming conventions rev3).
    pub const SEQUENCE_NUM_COMPONENT: u64 = 0x3a;
    /// Interest nonce.
    pub const NONCE: u64 = 0x0a;
    /// Interest lifetime in milliseconds.
    pub const INTEREST_LIFETIME: u64 = 0x0c;
    /// MustBeFresh flag.
    pub const MUST_BE_FRESH: u64 = 0x12;
    /// CanBePrefix flag.
    pub const CAN_BE_PREFIX: u64 = 0x21;
    /// Data MetaInfo.
    pub const META_INFO: u64 = 0x14;
    /// Data Content.
    pub const CONTENT: u64 = 0x15;
    /// SignatureInfo.
    pub const SIGNATURE_INFO: u64 = 0x16;
    /// SignatureValue.
    pub const SIGNATURE_VALUE: u64 = 0x17;
    /// MetaInfo ContentType.
    pub const CONTENT_TYPE: u64 = 0x18;
    /// MetaInfo FreshnessPeriod.
    pub const FRESHNESS_PERIOD: u64 = 0x19;
    /// SignatureInfo SignatureType.
    pub const SIGNATURE_TYPE: u64 = 0x1b;
    /// SignatureInfo KeyLocator.
    pub const KEY_LOCATOR: u64 = 0x1c;

    /// NDNLPv2 packet.
    pub const LP_PACKET: u64 = 0x64;
    /// NDNLPv2 fragment.
    pub const LP_FRAGMENT: u64 = 0x50;
    /// NDNLPv2 Nack header.
    pub const LP_NACK: u64 = 0x0320;
    /// NDNLPv2 Nack reason.
    pub const LP_NACK_REASON: u64 = 0x0321;

    /// ControlParameters.
    pub const CONTROL_PARAMETERS: u64 = 0x68;
    /// ControlResponse.
    pub const CONTROL_RESPONSE: u64 = 0x65;
    /// ControlResponse StatusCode.
    pub const STATUS_CODE: u64 = 0x66;
    /// ControlResponse StatusText.
    pub const STATUS_TEXT: u64 = 0x67;
    /// FaceId.
    pub const FACE_ID: u64 = 0x69;
    /// Route cost.
    pub const COST: u64 = 0x6a;
    /// Forwarding strategy (wraps a Name).
    pub const STRATEGY: u64 = 0x6b;
    /// Flags.
    pub const FLAGS: u64 = 0x6c;
    /// ExpirationPeriod.
    pub const EXPIRATION_PERIOD: u64 = 0x6d;
    /// Route origin.
    pub const ORIGIN: u64 = 0x6f;
    /// Flags mask.
    pub const MASK: u64 = 0x70;
    /// Remote URI.
    pub const URI: u64 = 0x72;
    /// FaceStatus.
    pub const FACE_STATUS: u64 = 0x80;
    /// LocalUri.
    pub const LOCAL_URI: u64 = 0x81;
    /// Content store capacity (ControlParameters only).
    pub const CAPACITY: u64 = 0x83;
    /// UriScheme (FaceQueryFilter only; shares the number with Capacity).
    pub const URI_SCHEME: u64 = 0x83;
    /// Count (ControlParameters only).
    pub const COUNT: u64 = 0x84;
    /// FaceScope (face structures only; shares the number with Count).
    pub const FACE_SCOPE: u64 = 0x84;
    /// FacePersistency.
    pub const FACE_PERSISTENCY: u64 = 0x85;
    /// LinkType.
    pub const LINK_TYPE: u64 = 0x86;
    /// BaseCongestionMarkingInterval.
    pub const BASE_CONG_MARK: u64 = 0x87;
    /// DefaultCongestionThreshold.
    pub const DEF_CONG_THRES: u64 = 0x88;
    /// Mtu.
    pub const MTU: u64 = 0x89;
    /// NInInterests counter.
    pub const N_IN_INTERESTS: u64 = 0x90;
    /// NInData counter.
    pub const N_IN_DATA: u64 = 0x91;
    /// NOutInterests counter.
    pub const N_OUT_INTERESTS: u64 = 0x92;
    /// NOutData counter.
    pub const N_OUT_DATA: u64 = 0x93;
    /// NInBytes counter.
    pub const N_IN_BYTES: u64 = 0x94;
    /// NOutBytes counter.
    pub const N_OUT_BYTES: u64 = 0x95;
    /// FaceQueryFilter.
    pub const FACE_QUERY_FILTER: u64 = 0x96;
    /// NInNacks counter.
    pub const N_IN_NACKS: u64 = 0x97;
    /// NOutNacks counter.
    pub const N_OUT_NACKS: u64 = 0x98;
    /// FaceEventNotification.
    pub const FACE_EVENT_NOTIFICATION: u64 = 0xc0;
    /// FaceEventKind.
    pub const FACE_EVENT_KIND: u64 = 0xc1;
}

/// Number of bytes `n` occupies as a VAR-NUMBER.
pub fn varnum_len(n: u64) -> usize {
    match n {
        0..=252 => 1,
        253..=0xFFFF => 3,
        0x1_0000..=0xFFFF_FFFF => 5,
        _ => 9,
    }
}

/// Append `n` as a VAR-NUMBER.
pub fn write_varnum(buf: &mut impl BufMut, n: u64) {
    match n {
        0..=252 => buf.put_u8(n as u8),
        253..=0xFFFF => {
            buf.put_u8(253);
            buf.put_u16(n as u16);
        },
        0x1_0000..=0xFFFF_FFFF => {
            buf.put_u8(254);
            buf.put_u32(n as u32);
        },
        _ => {
            buf.put_u8(255);
            buf.put_u64(n);
        },
    }
}

/// Read a VAR-NUMBER from the front of `buf`.
///
/// Returns the value and the number of bytes consumed.
pub fn read_varnum(buf: &[u8]) -> Result<(u64, usize)> {
    let Some(&first) = buf.first() else {
        return Err(DecodeError::Truncated { needed: 1, available: 0 });
    };

    let width = match first {
        0..=252 => return Ok((u64::from(first), 1)),
        253 => 2,
        254 => 4,
        255 => 8,
    };

    let needed = 1 + width;
    if buf.len() < needed {
        return Err(DecodeError::Truncated { needed, available: buf.len() });
    }

    let value = buf[1..needed].iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
    Ok((value, needed))
}

/// Shortest NonNegativeInteger encoding of `value`.
pub fn nonneg_bytes(value: u64) -> Vec<u8> {
    if let Ok(v) = u8::try_from(value) {
        vec![v]
    } else if let Ok(v) = u16::try_from(value) {
        v.to_be_bytes().to_vec()
    } else if let Ok(v) = u32::try_from(value) {
        v.to_be_bytes().to_vec()
    } else {
        value.to_be_bytes().to_vec()
    }
}

/// Decode a NonNegativeInteger value.
pub fn decode_nonneg(value: &[u8]) -> Result<u64> {
    match value.len() {
        1 | 2 | 4 | 8 => Ok(value.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b))),
        len => Err(DecodeError::InvalidInteger(len)),
    }
}

/// Append a complete element.
pub fn write_element(buf: &mut impl BufMut, typ: u64, value: &[u8]) {
    write_varnum(buf, typ);
    write_varnum(buf, value.len() as u64);
    buf.put_slice(value);
}

/// Append a NonNegativeInteger element.
pub fn write_nonneg(buf: &mut impl BufMut, typ: u64, value: u64) {
    write_element(buf, typ, &nonneg_bytes(value));
}

/// A borrowed TLV element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element<'a> {
    /// TLV type.
    pub typ: u64,
    /// TLV value.
    pub value: &'a [u8],
}

impl<'a> Element<'a> {
    /// Read one element from the front of `buf`.
    ///
    /// Returns the element and the total number of bytes it spans.
    pub fn read(buf: &'a [u8]) -> Result<(Self, usize)> {
        let (typ, type_len) = read_varnum(buf)?;
        let (len, len_len) = read_varnum(&buf[type_len..])?;
        let header = type_len + len_len;

        let available = buf.len() - header;
        let len = usize::try_from(len).map_err(|_| DecodeError::Truncated {
            needed: usize::MAX,
            available,
        })?;
        if len > available {
            return Err(DecodeError::Truncated { needed: len, available });
        }

        Ok((Self { typ, value: &buf[header..header + len] }, header + len))
    }

    /// Read exactly one element of type `expected` spanning all of `buf`.
    pub fn read_exact(buf: &'a [u8], expected: u64) -> Result<Self> {
        let (element, consumed) = Self::read(buf)?;
        if element.typ != expected {
            return Err(DecodeError::UnexpectedType { expected, actual: element.typ });
        }
        if consumed != buf.len() {
            return Err(DecodeError::TrailingBytes(buf.len() - consumed));
        }
        Ok(element)
    }

    /// Interpret the value as a NonNegativeInteger.
    pub fn as_nonneg(&self) -> Result<u64> {
        decode_nonneg(self.value)
    }

    /// Interpret the value as a UTF-8 string.
    pub fn as_utf8(&self, field: &'static str) -> Result<String> {
        std::str::from_utf8(self.value)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8(field))
    }

    /// Iterate over the nested elements of this element's value.
    pub fn children(&self) -> Elements<'a> {
        Elements::new(self.value)
    }
}

/// Iterator over a sequence of sibling elements.
///
/// Yields an error once and then stops if the sequence is malformed.
#[derive(Debug, Clone)]
pub struct Elements<'a> {
    rest: &'a [u8],
    failed: bool,
}

impl<'a> Elements<'a> {
    /// Iterate over the elements packed in `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { rest: buf, failed: false }
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = Result<Element<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.rest.is_empty() {
            return None;
        }

        match Element::read(self.rest) {
            Ok((element, consumed)) => {
                self.rest = &self.rest[consumed..];
                Some(Ok(element))
            },
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            },
        }
    }
}

/// Size of the first element in `buf` if it is completely buffered.
///
/// Returns `None` while the header or the value is still incomplete. Used to
/// frame packets arriving on a stream socket.
pub fn element_len(buf: &[u8]) -> Option<usize> {
    let (_, type_len) = read_varnum(buf).ok()?;
    let (len, len_len) = read_varnum(&buf[type_len..]).ok()?;
    let total = usize::try_from(len).ok()?.checked_add(type_len + len_len)?;
    (buf.len() >= total).then_some(total)
}

/// Declared size of the first element in `buf`, available as soon as its
/// header is buffered.
pub fn declared_len(buf: &[u8]) -> Option<u64> {
    let (_, type_len) = read_varnum(buf).ok()?;
    let (len, len_len) = read_varnum(&buf[type_len..]).ok()?;
    len.checked_add((type_len + len_len) as u64)
}
