//! The transaction bundle: per-request mutable state threaded through the
//! pipeline.
//!
//! Each per-message-type container the codec generates (`SolicitOptions`,
//! `ReplyOptions`, ...) is a distinct Rust type, so a bundle under
//! construction — whose final message shape isn't fixed until rapid-commit
//! or a handler decides it — can't hold options in any one of them. Instead
//! the bundle keeps `response_opts` as a flat `Vec<DhcpOption>` and only
//! converts into the concrete per-message container when the worker is
//! ready to encode (see `finalize`).

use std::collections::{HashSet, VecDeque};

use dhcproto::v6::{
    options::{IAAddr, IAPrefix, StatusCode, IANA, IAPD, IATA},
    DhcpOption, Message, MessageType, OptionCode, RelayForw, RelayRepl,
};

use crate::error::BundleError;

/// Which kind of IA (identity association) an unanswered entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IaKind {
    NonTemporary,
    Temporary,
    PrefixDelegation,
}

/// Stand-in for "IA option identity": `handled` tracks IA options by
/// identity, but since options here are values, not object references,
/// identity is (kind, IAID) — two IA options from the same request can
/// never share an IAID for the same kind (RFC 8415 §21.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IaKey {
    pub kind: IaKind,
    pub iaid: u32,
}

/// One of the request's IA options, detached from its container for
/// inspection by assignment handlers.
#[derive(Debug, Clone)]
pub enum UnhandledIa {
    NonTemporary(IANA),
    Temporary(IATA),
    PrefixDelegation(IAPD),
}

impl UnhandledIa {
    pub fn key(&self) -> IaKey {
        match self {
            UnhandledIa::NonTemporary(ia) => IaKey {
                kind: IaKind::NonTemporary,
                iaid: ia.id,
            },
            UnhandledIa::Temporary(ia) => IaKey {
                kind: IaKind::Temporary,
                iaid: ia.id,
            },
            UnhandledIa::PrefixDelegation(ia) => IaKey {
                kind: IaKind::PrefixDelegation,
                iaid: ia.id,
            },
        }
    }
}

/// The message shape a bundle's response will take once finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Advertise,
    Reply,
}

/// Decide the initial response shape for a request message type.
/// `None` means there is no Advertise/Reply shape for this message type:
/// either there is no
/// response at all (`Reconfigure`, which the worker never even builds a
/// bundle for), or the response is built entirely through
/// `TransactionBundle::add_response` instead of `finalize` (the
/// LeaseQuery family -- see `crate::handlers::leasequery`).
pub fn initial_response_kind(request_type: MessageType) -> Option<ResponseKind> {
    use MessageType::*;
    match request_type {
        Solicit => Some(ResponseKind::Advertise),
        Request | Renew | Rebind | Confirm | InformationRequest | Release | Decline => {
            Some(ResponseKind::Reply)
        }
        _ => None,
    }
}

pub struct TransactionBundle {
    /// outermost message as received (always a `RelayForw`, synthesizing a
    /// virtual one-hop relay around directly-contacted clients so handlers
    /// never need to special-case "no relay").
    pub incoming: Message,
    /// the innermost client message.
    pub request: Message,
    /// outermost-to-innermost relay chain.
    pub relays: Vec<RelayForw>,
    /// listener- and filter-attached tags.
    pub marks: HashSet<String>,

    response_kind: Option<ResponseKind>,
    response_opts: Vec<DhcpOption>,
    /// per-relay-depth options to place in the matching `RelayRepl` shell,
    /// index matches `relays`.
    relay_response_opts: Vec<Vec<DhcpOption>>,
    /// extra complete messages queued for stream (TCP bulk leasequery)
    /// listeners.
    pub responses: VecDeque<Message>,

    handled: HashSet<IaKey>,
    pub allow_rapid_commit: bool,
}

impl TransactionBundle {
    /// Build a bundle from an already-unwrapped relay chain and innermost
    /// request. `incoming` is reconstructed as the outermost relay (or the
    /// request itself if `relays` is empty, which callers should avoid by
    /// synthesizing a virtual relay first — see `dhcproto::v6::relay`).
    pub fn new(incoming: Message, relays: Vec<RelayForw>, request: Message) -> Self {
        let rapid_commit_requested = request_options(&request)
            .iter()
            .any(|o| matches!(o, DhcpOption::RapidCommit(_)));
        let response_kind = initial_response_kind(request.msg_type());
        let n = relays.len();
        TransactionBundle {
            incoming,
            relays,
            allow_rapid_commit: rapid_commit_requested,
            response_kind,
            response_opts: Vec::new(),
            relay_response_opts: vec![Vec::new(); n],
            responses: VecDeque::new(),
            handled: HashSet::new(),
            marks: HashSet::new(),
            request,
        }
    }

    pub fn response_kind(&self) -> Option<ResponseKind> {
        self.response_kind
    }

    /// Upgrade `Advertise` to `Reply` (rapid commit) or vice versa. A
    /// no-op if the bundle's message type doesn't carry a response at all.
    pub fn set_response_kind(&mut self, kind: ResponseKind) {
        if self.response_kind.is_some() {
            self.response_kind = Some(kind);
        }
    }

    /// IA options of `kind` from the request not yet in `handled`.
    pub fn get_unhandled_options(&self, kind: IaKind) -> Vec<UnhandledIa> {
        request_options(&self.request)
            .into_iter()
            .filter_map(|opt| match (kind, opt) {
                (IaKind::NonTemporary, DhcpOption::IANA(ia)) => Some(UnhandledIa::NonTemporary(ia)),
                (IaKind::Temporary, DhcpOption::IATA(ia)) => Some(UnhandledIa::Temporary(ia)),
                (IaKind::PrefixDelegation, DhcpOption::IAPD(ia)) => {
                    Some(UnhandledIa::PrefixDelegation(ia))
                }
                _ => None,
            })
            .filter(|ia| !self.handled.contains(&ia.key()))
            .collect()
    }

    /// Idempotent: marks an IA as claimed so later handlers and the
    /// unanswered-IA fallback skip it.
    pub fn mark_handled(&mut self, key: IaKey) {
        self.handled.insert(key);
    }

    pub fn is_handled(&self, key: IaKey) -> bool {
        self.handled.contains(&key)
    }

    /// Append to the response body unless an identical option is already
    /// present.
    pub fn add_response_option(&mut self, opt: DhcpOption) {
        if !self.response_opts.contains(&opt) {
            self.response_opts.push(opt);
        }
    }

    /// Replace any existing option of the same concrete type.
    pub fn force_response_option(&mut self, opt: DhcpOption) {
        let code = OptionCode::from(&opt);
        self.response_opts.retain(|o| OptionCode::from(o) != code);
        self.response_opts.push(opt);
    }

    /// Mutable access to the in-progress response body, for handlers that
    /// rewrite options an earlier handler already placed (e.g. clamping
    /// IA timers to policy limits) rather than appending or replacing by
    /// type.
    pub fn response_options_mut(&mut self) -> &mut [DhcpOption] {
        &mut self.response_opts
    }

    pub fn get_response_option(&self, code: OptionCode) -> Option<&DhcpOption> {
        self.response_opts
            .iter()
            .find(|o| OptionCode::from(*o) == code)
    }

    pub fn has_response_option(&self, code: OptionCode) -> bool {
        self.get_response_option(code).is_some()
    }

    /// Walk the relay chain looking for `code`. `from_innermost` searches
    /// starting at the relay nearest the client (the common case: fetching
    /// an interface-id to echo back). Returns an owned value since each
    /// relay's options are stored in a per-message container type, not
    /// `DhcpOption` directly.
    pub fn get_relay_option(&self, code: OptionCode, from_innermost: bool) -> Option<DhcpOption> {
        let indices: Box<dyn Iterator<Item = usize>> = if from_innermost {
            Box::new((0..self.relays.len()).rev())
        } else {
            Box::new(0..self.relays.len())
        };
        for i in indices {
            if let Some(opt) = self.relays[i]
                .opts()
                .iter()
                .map(DhcpOption::from)
                .find(|o| OptionCode::from(o) == code)
            {
                return Some(opt);
            }
        }
        None
    }

    /// Queue `opt` to be placed in the relay-reply shell matching the
    /// relay at `depth` (0 = outermost, matching `relays`'s indexing).
    pub fn add_response_relay_option(&mut self, depth: usize, opt: DhcpOption) {
        if let Some(slot) = self.relay_response_opts.get_mut(depth) {
            slot.push(opt);
        }
    }

    /// Queue an additional complete outgoing message (bulk leasequery).
    pub fn add_response(&mut self, message: Message) {
        self.responses.push_back(message);
    }

    /// Build the final outgoing message: the innermost reply wrapped in
    /// `RelayRepl` shells mirroring the incoming chain, innermost-first.
    pub fn finalize(
        &self,
        client_id: Option<DhcpOption>,
        server_id: DhcpOption,
    ) -> Result<Message, BundleError> {
        let kind = self
            .response_kind
            .ok_or_else(|| BundleError::NoResponseShape(self.request.msg_type()))?;

        let mut opts = self.response_opts.clone();
        opts.push(server_id);
        if let Some(cid) = client_id {
            opts.push(cid);
        }

        let xid = request_xid(&self.request);
        let mut inner = match kind {
            ResponseKind::Advertise => Message::Advertise(dhcproto::v6::Advertise {
                xid,
                opts: opts.into_iter().collect(),
            }),
            ResponseKind::Reply => Message::Reply(dhcproto::v6::Reply {
                xid,
                opts: opts.into_iter().collect(),
            }),
        };

        for (depth, relay) in self.relays.iter().enumerate().rev() {
            let mut buf = Vec::new();
            {
                use dhcproto::{Encodable, Encoder};
                inner
                    .encode(&mut Encoder::new(&mut buf))
                    .expect("in-memory encode of a well-formed message cannot fail");
            }
            let mut opts: dhcproto::v6::RelayMessageOptions = self
                .relay_response_opts
                .get(depth)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .filter_map(|o| dhcproto::v6::RelayMessageOption::try_from(&o).ok())
                .collect();
            opts.insert(dhcproto::v6::RelayMsg { msg: buf });
            inner = Message::RelayRepl(RelayRepl {
                hop_count: relay.hop_count,
                link_address: relay.link_address,
                peer_address: relay.peer_address,
                opts,
            });
        }
        Ok(inner)
    }
}

/// Flatten a request message's options into the codec-agnostic
/// `DhcpOption` list, regardless of which per-message container holds
/// them.
pub fn request_options(msg: &Message) -> Vec<DhcpOption> {
    use Message::*;
    match msg {
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
        Reconfigure(m) => m.opts().iter().map(DhcpOption::from).collect(),
        _ => Vec::new(),
    }
}

fn request_xid(msg: &Message) -> dhcproto::v6::TransactionId {
    use Message::*;
    match msg {
        Solicit(m) => m.xid,
        Advertise(m) => m.xid,
        Request(m) => m.xid,
        Confirm(m) => m.xid,
        Renew(m) => m.xid,
        Rebind(m) => m.xid,
        Reply(m) => m.xid,
        Release(m) => m.xid,
        Decline(m) => m.xid,
        InformationRequest(m) => m.xid,
        Reconfigure(m) => m.xid,
        _ => Default::default(),
    }
}

/// Helper a static-assignment handler uses to build a status option for
/// a negative IA answer, only if no earlier handler already set one for
/// this IA.
pub fn ia_has_status(opts: &[DhcpOption]) -> bool {
    opts.iter().any(|o| matches!(o, DhcpOption::StatusCode(_)))
}

pub fn status_option(code: dhcproto::v6::options::Status, msg: impl Into<String>) -> StatusCode {
    StatusCode {
        status: code,
        msg: msg.into(),
    }
}

pub fn iaaddr_opts_with_status(status: StatusCode) -> dhcproto::v6::IAAddrOptions {
    std::iter::once(DhcpOption::StatusCode(status))
        .filter_map(|o| dhcproto::v6::IAAddrOption::try_from(&o).ok())
        .collect()
}

pub fn iana_opts_with_status(status: StatusCode) -> dhcproto::v6::IANAOptions {
    std::iter::once(DhcpOption::StatusCode(status))
        .filter_map(|o| dhcproto::v6::IANAOption::try_from(&o).ok())
        .collect()
}

pub fn iapd_opts_with_status(status: StatusCode) -> dhcproto::v6::IAPDOptions {
    std::iter::once(DhcpOption::StatusCode(status))
        .filter_map(|o| dhcproto::v6::IAPDOption::try_from(&o).ok())
        .collect()
}

/// Build an `IAAddr`/`IANA`/`IAPD` option carrying only a negative
/// status, for IAs no handler could satisfy.
pub fn iana_with_status(id: u32, t1: u32, t2: u32, status: StatusCode) -> IANA {
    IANA {
        id,
        t1,
        t2,
        opts: iana_opts_with_status(status),
    }
}

pub fn iata_with_status(id: u32, status: StatusCode) -> IATA {
    IATA {
        id,
        opts: std::iter::once(DhcpOption::StatusCode(status))
            .filter_map(|o| dhcproto::v6::IATAOption::try_from(&o).ok())
            .collect(),
    }
}

pub fn iapd_with_status(id: u32, t1: u32, t2: u32, status: StatusCode) -> IAPD {
    IAPD {
        id,
        t1,
        t2,
        opts: iapd_opts_with_status(status),
    }
}

#[allow(unused)]
fn _type_assertions(_: IAAddr, _: IAPrefix) {}
