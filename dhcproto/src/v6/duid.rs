use std::net::Ipv6Addr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Decodable, Decoder, DecodeResult, Encodable, Encoder, EncodeResult};

/// ARP hardware type, as registered with IANA; used by the link-layer DUID
/// variants. Only the types actually seen on DHCPv6 links are named --
/// anything else round-trips through `Unknown`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HType {
    /// Ethernet (10Mb)
    Eth,
    /// IEEE 802
    Ieee802,
    /// FDDI
    Fddi,
    /// unknown/unimplemented hardware type
    Unknown(u16),
}

impl From<u16> for HType {
    fn from(n: u16) -> Self {
        use HType::*;
        match n {
            1 => Eth,
            6 => Ieee802,
            8 => Fddi,
            n => Unknown(n),
        }
    }
}

impl From<HType> for u16 {
    fn from(h: HType) -> Self {
        use HType::*;
        match h {
            Eth => 1,
            Ieee802 => 6,
            Fddi => 8,
            Unknown(n) => n,
        }
    }
}

/// The parsed shape of a [`Duid`], as laid out in RFC 8415 §11.
///
/// `Duid` itself keeps the raw octets so every DUID -- known or not --
/// round-trips exactly; `kind()` parses that buffer lazily for callers
/// that need to branch on the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuidKind<'a> {
    /// DUID-LLT: link-layer address plus a timestamp
    LinkLayerTime {
        htype: HType,
        time: u32,
        link_layer: &'a [u8],
    },
    /// DUID-EN: vendor enterprise number plus an opaque identifier
    Enterprise { enterprise: u32, id: &'a [u8] },
    /// DUID-LL: link-layer address only
    LinkLayer { htype: HType, link_layer: &'a [u8] },
    /// DUID-UUID (RFC 6355)
    Uuid(&'a [u8; 16]),
    /// a type code this crate does not parse further
    Unknown { duid_type: u16, data: &'a [u8] },
}

/// Duid helper type
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duid(Vec<u8>);

impl Duid {
    /// new DUID link layer address with time
    pub fn link_layer_time(htype: HType, time: u32, addr: Ipv6Addr) -> Self {
        let mut buf = Vec::new();
        let mut e = Encoder::new(&mut buf);
        e.write_u16(1).unwrap(); // duid type
        e.write_u16(u16::from(htype)).unwrap();
        e.write_u32(time).unwrap();
        e.write_u128(addr.into()).unwrap();
        Self(buf)
    }
    /// new DUID enterprise number
    pub fn enterprise(enterprise: u32, id: &[u8]) -> Self {
        let mut buf = Vec::new();
        let mut e = Encoder::new(&mut buf);
        e.write_u16(2).unwrap(); // duid type
        e.write_u32(enterprise).unwrap();
        e.write_slice(id).unwrap();
        Self(buf)
    }
    /// new link layer DUID
    pub fn link_layer(htype: HType, addr: Ipv6Addr) -> Self {
        let mut buf = Vec::new();
        let mut e = Encoder::new(&mut buf);
        e.write_u16(3).unwrap(); // duid type
        e.write_u16(u16::from(htype)).unwrap();
        e.write_u128(addr.into()).unwrap();
        Self(buf)
    }
    /// new DUID-UUID
    /// `uuid` must be 16 bytes long
    pub fn uuid(uuid: &[u8]) -> Self {
        assert!(uuid.len() == 16);
        let mut buf = Vec::new();
        let mut e = Encoder::new(&mut buf);
        e.write_u16(4).unwrap(); // duid type
        e.write_slice(uuid).unwrap();
        Self(buf)
    }
    /// create a DUID of unknown type
    pub fn unknown(duid: &[u8]) -> Self {
        Self(duid.to_vec())
    }
    /// total length of contained DUID
    pub fn len(&self) -> usize {
        self.0.len()
    }
    /// is contained DUID empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// parse the raw octets into a [`DuidKind`]; never fails since any type
    /// this crate doesn't recognize falls back to `DuidKind::Unknown`.
    pub fn kind(&self) -> DuidKind<'_> {
        let buf = &self.0;
        if buf.len() < 2 {
            return DuidKind::Unknown {
                duid_type: 0,
                data: buf,
            };
        }
        let duid_type = u16::from_be_bytes([buf[0], buf[1]]);
        let rest = &buf[2..];
        match duid_type {
            1 if rest.len() >= 6 => DuidKind::LinkLayerTime {
                htype: u16::from_be_bytes([rest[0], rest[1]]).into(),
                time: u32::from_be_bytes([rest[2], rest[3], rest[4], rest[5]]),
                link_layer: &rest[6..],
            },
            2 if rest.len() >= 4 => DuidKind::Enterprise {
                enterprise: u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]),
                id: &rest[4..],
            },
            3 if rest.len() >= 2 => DuidKind::LinkLayer {
                htype: u16::from_be_bytes([rest[0], rest[1]]).into(),
                link_layer: &rest[2..],
            },
            4 if rest.len() == 16 => {
                DuidKind::Uuid(rest.try_into().expect("length checked above"))
            }
            duid_type => DuidKind::Unknown { duid_type, data: rest },
        }
    }
}

impl AsRef<[u8]> for Duid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Duid {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl Decodable for Duid {
    fn decode(decoder: &mut Decoder<'_>) -> DecodeResult<Self> {
        // a Duid only ever appears inside the length-prefixed body of
        // ClientId/ServerId, so it consumes whatever is left of that slice.
        let mut buf = Vec::new();
        while let Ok(b) = decoder.read_u8() {
            buf.push(b);
        }
        Ok(Duid(buf))
    }
}

impl Encodable for Duid {
    fn encode(&self, e: &mut Encoder<'_>) -> EncodeResult<()> {
        e.write_slice(&self.0)
    }
}
