//! Declared containment rules and the explicit, opt-in `validate()` pass.
//!
//! The codec itself never rejects a message for an out-of-cardinality or
//! unexpected child option -- `parse` always succeeds on anything that is
//! structurally well-formed, and an unknown code simply becomes
//! `DhcpOption::Unknown`. Parsing was measured (in the reference
//! implementation this crate follows) to spend most of its time validating
//! nested options that callers never actually cared about, so cardinality
//! checks live in this separate, explicitly-invoked pass instead.
//!
//! Containment is modeled as a flat `(parent, child) -> (min, max)` table
//! rather than as trait objects or parent/child references, which would
//! otherwise have to describe a graph with cycles (an `IA_NA` contains
//! `StatusCode`, and in principle nothing stops a future option from
//! containing an `IA_NA` in turn).

use std::ops::RangeInclusive;

use crate::v6::{options::StatusCode, Message, MessageType, OptionCode};

/// One parent/child occurrence-count rule.
#[derive(Debug, Clone, Copy)]
pub struct ContainmentRule {
    pub parent: OptionCode,
    pub child: OptionCode,
    pub range: RangeInclusive<u32>,
}

/// Cardinality rules for options nested inside other options.
///
/// Unlisted (parent, child) pairs are unconstrained -- the rule table only
/// needs to describe the handful of contracts the RFCs actually narrow.
/// `IAPrefix` is absent: it carries no `StatusCode` slot in this codec.
pub const OPTION_CONTAINMENT: &[ContainmentRule] = &[
    ContainmentRule {
        parent: OptionCode::IANA,
        child: OptionCode::StatusCode,
        range: 0..=1,
    },
    ContainmentRule {
        parent: OptionCode::IATA,
        child: OptionCode::StatusCode,
        range: 0..=1,
    },
    ContainmentRule {
        parent: OptionCode::IAPD,
        child: OptionCode::StatusCode,
        range: 0..=1,
    },
    ContainmentRule {
        parent: OptionCode::IAAddr,
        child: OptionCode::StatusCode,
        range: 0..=1,
    },
];

/// Which top-level message types a given option may appear directly under,
/// and how many times. Absence from this table means "unconstrained" --
/// most options (and certainly any vendor-specific or not-yet-modeled code)
/// are fine appearing anywhere.
pub const MESSAGE_CONTAINMENT: &[(MessageType, OptionCode, RangeInclusive<u32>)] = &[
    (MessageType::Solicit, OptionCode::ClientId, 1..=1),
    (MessageType::Solicit, OptionCode::ServerId, 0..=0),
    (MessageType::Request, OptionCode::ClientId, 1..=1),
    (MessageType::Request, OptionCode::ServerId, 1..=1),
    (MessageType::Reply, OptionCode::ServerId, 1..=1),
    (MessageType::Advertise, OptionCode::ServerId, 1..=1),
];

/// A containment or shape violation found by [`validate`].
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidateError {
    #[error("{child:?} appears {actual} times under {parent:?}, expected {min}..={max}")]
    Cardinality {
        parent: OptionCode,
        child: OptionCode,
        actual: u32,
        min: u32,
        max: u32,
    },
    #[error("{option:?} appears {actual} times in a {msg:?}, expected {min}..={max}")]
    MessageCardinality {
        msg: MessageType,
        option: OptionCode,
        actual: u32,
        min: u32,
        max: u32,
    },
}

fn checked(
    msg: MessageType,
    option: OptionCode,
    actual: u32,
    range: &RangeInclusive<u32>,
) -> Result<(), ValidateError> {
    if range.contains(&actual) {
        Ok(())
    } else {
        Err(ValidateError::MessageCardinality {
            msg,
            option,
            actual,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

fn rule(mtype: MessageType, code: OptionCode) -> Option<&'static RangeInclusive<u32>> {
    MESSAGE_CONTAINMENT
        .iter()
        .find(|(m, c, _)| *m == mtype && *c == code)
        .map(|(_, _, r)| r)
}

/// Check the `ClientId`/`ServerId` cardinality of `msg` against
/// [`MESSAGE_CONTAINMENT`]. `parse` never calls this -- callers that want
/// strict input validation call it explicitly.
pub fn validate_message(msg: &Message) -> Result<(), ValidateError> {
    use crate::v6::{ClientId, Message::*, ServerId};

    let mtype = msg.msg_type();
    macro_rules! check {
        ($opts:expr) => {{
            let client = $opts.get_all::<ClientId>().map(|s| s.len()).unwrap_or(0) as u32;
            let server = $opts.get_all::<ServerId>().map(|s| s.len()).unwrap_or(0) as u32;
            if let Some(r) = rule(mtype, OptionCode::ClientId) {
                checked(mtype, OptionCode::ClientId, client, r)?;
            }
            if let Some(r) = rule(mtype, OptionCode::ServerId) {
                checked(mtype, OptionCode::ServerId, server, r)?;
            }
        }};
    }
    match msg {
        Solicit(m) => check!(m.opts()),
        Advertise(m) => check!(m.opts()),
        Request(m) => check!(m.opts()),
        Confirm(m) => check!(m.opts()),
        Renew(m) => check!(m.opts()),
        Rebind(m) => check!(m.opts()),
        Reply(m) => check!(m.opts()),
        Release(m) => check!(m.opts()),
        Decline(m) => check!(m.opts()),
        InformationRequest(m) => check!(m.opts()),
        _ => {}
    }
    Ok(())
}

fn check_status_code<T>(parent: OptionCode, statuses: Option<&[T]>) -> Result<(), ValidateError> {
    let actual = statuses.map(|s| s.len()).unwrap_or(0) as u32;
    if let Some(r) = OPTION_CONTAINMENT
        .iter()
        .find(|rule| rule.parent == parent && rule.child == OptionCode::StatusCode)
        .map(|rule| &rule.range)
    {
        if !r.contains(&actual) {
            return Err(ValidateError::Cardinality {
                parent,
                child: OptionCode::StatusCode,
                actual,
                min: *r.start(),
                max: *r.end(),
            });
        }
    }
    Ok(())
}

/// Walk the top-level `IA_NA`/`IA_TA`/`IA_PD`/`IAAddr` options nested
/// directly under `msg` and check their `StatusCode` cardinality against
/// [`OPTION_CONTAINMENT`].
pub fn validate_option_containment(msg: &Message) -> Result<(), ValidateError> {
    use crate::v6::{DhcpOption, Message::*};

    let opts: Vec<DhcpOption> = match msg {
        Solicit(m) => m.opts().iter().map(DhcpOption::from).collect(),
        Advertise(m) => m.opts().iter().map(DhcpOption::from).collect(),
        Request(m) => m.opts().iter().map(DhcpOption::from).collect(),
        Confirm(m) => m.opts().iter().map(DhcpOption::from).collect(),
        Renew(m) => m.opts().iter().map(DhcpOption::from).collect(),
        Rebind(m) => m.opts().iter().map(DhcpOption::from).collect(),
        Reply(m) => m.opts().iter().map(DhcpOption::from).collect(),
        Release(m) => m.opts().iter().map(DhcpOption::from).collect(),
        Decline(m) => m.opts().iter().map(DhcpOption::from).collect(),
        InformationRequest(m) => m.opts().iter().map(DhcpOption::from).collect(),
        _ => Vec::new(),
    };
    for dhcp_opt in opts {
        match dhcp_opt {
            DhcpOption::IANA(ia) => {
                check_status_code(OptionCode::IANA, ia.opts.get_all::<StatusCode>())?
            }
            DhcpOption::IATA(ia) => {
                check_status_code(OptionCode::IATA, ia.opts.get_all::<StatusCode>())?
            }
            DhcpOption::IAPD(ia) => {
                check_status_code(OptionCode::IAPD, ia.opts.get_all::<StatusCode>())?
            }
            DhcpOption::IAAddr(ia) => {
                check_status_code(OptionCode::IAAddr, ia.opts.get_all::<StatusCode>())?
            }
            _ => {}
        }
    }
    Ok(())
}
