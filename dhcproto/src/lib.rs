//! `dhcproto` is a DHCPv6 message/option parser and encoder.
//!
//! It is organized as a registry-driven wire codec: every message and option
//! type implements [`Decodable`]/[`Encodable`], unknown codes round-trip through
//! an opaque variant rather than failing to parse, and relay encapsulation is
//! modeled as ordinary nested messages rather than a special case.
//!
//! ```rust
//! use dhcproto::{v6, Decodable, Decoder, Encodable, Encoder};
//!
//! let mut msg = v6::Solicit::new();
//! msg.opts_mut().insert(v6::ClientId {
//!     id: v6::Duid::link_layer(v6::HType::Eth, "FE80::1".parse().unwrap()),
//! });
//!
//! let mut buf = Vec::new();
//! msg.encode(&mut Encoder::new(&mut buf)).unwrap();
//!
//! let decoded = v6::Message::decode(&mut Decoder::new(&buf)).unwrap();
//! assert_eq!(v6::Message::from(msg), decoded);
//! ```

extern crate alloc;

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod v6;

pub use decoder::{Decodable, Decoder};
pub use encoder::{Encodable, Encoder};
pub use error::{DecodeError, DecodeResult, EncodeError, EncodeResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A presentation-preserving domain name, used by options that carry DNS
/// label sequences on the wire (RFC 8415 §10, RFC 3646).
///
/// Wraps [`hickory_proto::rr::Name`], which already draws the
/// absolute/relative and A-label/U-label distinctions the wire format needs:
/// a name with a trailing empty label is absolute, internationalized labels
/// are stored and emitted as A-labels, and `to_utf8()` recovers the U-label
/// presentation form without losing the original bytes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Domain(pub hickory_proto::rr::Name);

impl Domain {
    /// Parse a presentation-format domain name (`example.com` or `example.com.`).
    pub fn parse(s: &str) -> Result<Self, hickory_proto::ProtoError> {
        use std::str::FromStr;
        hickory_proto::rr::Name::from_str(s).map(Domain)
    }

    /// `true` if this name was written with a trailing root label (`example.com.`).
    pub fn is_absolute(&self) -> bool {
        self.0.is_fqdn()
    }

    /// U-label presentation form, e.g. `bücher.example` rather than `xn--...`.
    pub fn to_utf8(&self) -> String {
        self.0.to_utf8()
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<hickory_proto::rr::Name> for Domain {
    fn from(n: hickory_proto::rr::Name) -> Self {
        Domain(n)
    }
}
