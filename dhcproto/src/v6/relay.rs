//! Recursive relay-forward unwrapping (RFC 8415 §7.1, §19).
//!
//! `RelayMsg` stores the encapsulated PDU as opaque bytes -- decoding it
//! into a concrete `Message` is a second pass, done here, so that a chain of
//! relays can be bounded before it is fully parsed.

use crate::{
    error::{DecodeError, DecodeResult},
    v6::{Message, RelayForw},
    Decodable, Decoder,
};

/// Default ceiling on relay-forward nesting.
pub const DEFAULT_MAX_HOPS: u8 = 32;

/// Descend through zero or more `RelayForw` shells wrapping `msg`, returning
/// the chain (outermost first) and the innermost non-relay message.
///
/// A chain of exactly `max_hops` relays succeeds; one more fails with
/// `RelayTooDeep`.
pub fn unwrap_relay_chain(msg: Message, max_hops: u8) -> DecodeResult<(Vec<RelayForw>, Message)> {
    let mut relays = Vec::new();
    let mut current = msg;
    loop {
        match current {
            Message::RelayForw(relay) => {
                if relays.len() >= max_hops as usize {
                    return Err(DecodeError::RelayTooDeep(max_hops));
                }
                let inner = relay.opts().get::<crate::v6::RelayMsg>().ok_or(
                    DecodeError::InvalidData(9, "relay-forward missing relay-message option"),
                )?;
                let inner_msg = Message::decode(&mut Decoder::new(&inner.msg))?;
                relays.push(relay);
                current = inner_msg;
            }
            other => return Ok((relays, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{v6::*, Encodable, Encoder};
    use std::net::Ipv6Addr;

    fn wrap(inner: Message, hop_count: u8) -> Message {
        let mut buf = Vec::new();
        inner.encode(&mut Encoder::new(&mut buf)).unwrap();
        let mut opts = RelayMessageOptions::new();
        opts.insert(RelayMsg { msg: buf });
        Message::RelayForw(RelayForw {
            hop_count,
            link_address: Ipv6Addr::UNSPECIFIED,
            peer_address: Ipv6Addr::UNSPECIFIED,
            opts,
        })
    }

    fn nested(depth: u8) -> Message {
        let mut msg = Message::Solicit(Solicit::new());
        for i in 0..depth {
            msg = wrap(msg, i);
        }
        msg
    }

    #[test]
    fn exactly_max_hops_succeeds() {
        let (relays, inner) = unwrap_relay_chain(nested(DEFAULT_MAX_HOPS), DEFAULT_MAX_HOPS)
            .expect("32 relays should parse");
        assert_eq!(relays.len(), DEFAULT_MAX_HOPS as usize);
        assert!(matches!(inner, Message::Solicit(_)));
    }

    #[test]
    fn one_more_than_max_hops_fails() {
        let err = unwrap_relay_chain(nested(DEFAULT_MAX_HOPS + 1), DEFAULT_MAX_HOPS)
            .expect_err("33 relays should fail");
        assert!(matches!(err, DecodeError::RelayTooDeep(_)));
    }
}
