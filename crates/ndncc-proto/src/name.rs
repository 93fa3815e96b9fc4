//! Hierarchical names.
//!
//! A [`Name`] is an ordered sequence of typed, opaque byte components. The
//! URI form percent-encodes every byte outside the unreserved set and writes
//! sequence-number components as `seq=N`.

use std::{fmt, str::FromStr};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{
    errors::{DecodeError, Result},
    tlv::{self, Element, types},
};

/// Marker byte of the legacy (rev1) sequence-number convention.
const LEGACY_SEQUENCE_MARKER: u8 = 0xFE;

/// One name component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NameComponent {
    typ: u64,
    value: Bytes,
}

impl NameComponent {
    /// Component with an explicit TLV type.
    pub fn new(typ: u64, value: impl Into<Bytes>) -> Self {
        Self { typ, value: value.into() }
    }

    /// Generic component (type 8).
    pub fn generic(value: impl Into<Bytes>) -> Self {
        Self::new(types::GENERIC_COMPONENT, value)
    }

    /// Sequence-number component in the typed convention.
    pub fn sequence_number(seq: u64) -> Self {
        Self::new(types::SEQUENCE_NUM_COMPONENT, tlv::nonneg_bytes(seq))
    }

    /// TLV type of this component.
    pub fn typ(&self) -> u64 {
        self.typ
    }

    /// Raw component value.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Interpret the component as a sequence number.
    ///
    /// Accepts the typed form and the legacy marker form (a generic component
    /// whose first byte is `0xFE`).
    pub fn to_sequence_number(&self) -> Option<u64> {
        match self.typ {
            types::SEQUENCE_NUM_COMPONENT => tlv::decode_nonneg(&self.value).ok(),
            types::GENERIC_COMPONENT => match self.value.split_first() {
                Some((&LEGACY_SEQUENCE_MARKER, rest)) => tlv::decode_nonneg(rest).ok(),
                _ => None,
            },
            _ => None,
        }
    }

    /// Append the component element.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        tlv::write_element(buf, self.typ, &self.value);
    }

    fn parse_uri(text: &str) -> Result<Self> {
        if let Some(seq) = text.strip_prefix("seq=") {
            let seq = seq.parse::<u64>().map_err(|_| DecodeError::InvalidUri(text.to_owned()))?;
            return Ok(Self::sequence_number(seq));
        }

        let value = percent_decode(text)?;
        if !value.is_empty() && value.iter().all(|b| *b == b'.') {
            if value.len() < 3 {
                return Err(DecodeError::InvalidUri(text.to_owned()));
            }
            return Ok(Self::generic(value[3..].to_vec()));
        }
        Ok(Self::generic(value))
    }
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.typ == types::SEQUENCE_NUM_COMPONENT {
            if let Ok(seq) = tlv::decode_nonneg(&self.value) {
                return write!(f, "seq={seq}");
            }
        }
        if self.typ != types::GENERIC_COMPONENT {
            write!(f, "{}=", self.typ)?;
        }
        if self.value.iter().all(|b| *b == b'.') {
            f.write_str("...")?;
        }
        for &b in self.value.iter() {
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "%{b:02X}")?;
            }
        }
        Ok(())
    }
}

fn percent_decode(text: &str) -> Result<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = text
                .get(i + 1..i + 3)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| DecodeError::InvalidUri(text.to_owned()))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Hierarchical name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Name {
    components: Vec<NameComponent>,
}

impl Name {
    /// The empty name `/`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name made of the given components.
    pub fn from_components(components: Vec<NameComponent>) -> Self {
        Self { components }
    }

    /// Components in order.
    pub fn components(&self) -> &[NameComponent] {
        &self.components
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True for the empty name.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component at `index`.
    pub fn get(&self, index: usize) -> Option<&NameComponent> {
        self.components.get(index)
    }

    /// Last component.
    pub fn last(&self) -> Option<&NameComponent> {
        self.components.last()
    }

    /// Builder-style append.
    #[must_use]
    pub fn append(mut self, component: NameComponent) -> Self {
        self.components.push(component);
        self
    }

    /// Builder-style append of a generic component.
    #[must_use]
    pub fn append_generic(self, value: impl Into<Bytes>) -> Self {
        self.append(NameComponent::generic(value))
    }

    /// Builder-style append of a sequence-number component.
    #[must_use]
    pub fn append_sequence_number(self, seq: u64) -> Self {
        self.append(NameComponent::sequence_number(seq))
    }

    /// Append in place.
    pub fn push(&mut self, component: NameComponent) {
        self.components.push(component);
    }

    /// First `n` components.
    #[must_use]
    pub fn prefix(&self, n: usize) -> Self {
        Self { components: self.components.iter().take(n).cloned().collect() }
    }

    /// True if `self` is a prefix of (or equal to) `other`.
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.components.len() <= other.components.len()
            && self.components.iter().zip(&other.components).all(|(a, b)| a == b)
    }

    /// Concatenated component elements (the value of the Name element).
    pub fn encode_value(&self) -> Vec<u8> {
        let mut value = Vec::new();
        for component in &self.components {
            component.encode(&mut value);
        }
        value
    }

    /// Append the Name element.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        tlv::write_element(buf, types::NAME, &self.encode_value());
    }

    /// Decode from the value of a Name element.
    pub fn decode_value(value: &[u8]) -> Result<Self> {
        let components = tlv::Elements::new(value)
            .map(|element| {
                let element = element?;
                Ok(NameComponent::new(element.typ, element.value.to_vec()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { components })
    }

    /// Decode a complete Name element.
    pub fn decode(wire: &[u8]) -> Result<Self> {
        let element = Element::read_exact(wire, types::NAME)?;
        Self::decode_value(element.value)
    }
}

impl FromStr for Name {
    type Err = DecodeError;

    fn from_str(uri: &str) -> Result<Self> {
        let path = uri.strip_prefix("ndn:").unwrap_or(uri);
        let Some(path) = path.strip_prefix('/') else {
            return Err(DecodeError::InvalidUri(uri.to_owned()));
        };

        let components = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(NameComponent::parse_uri)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { components })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return f.write_str("/");
        }
        for component in &self.components {
            write!(f, "/{component}")?;
        }
        Ok(())
    }
}

impl From<Vec<NameComponent>> for Name {
    fn from(components: Vec<NameComponent>) -> Self {
        Self::from_components(components)
    }
}
