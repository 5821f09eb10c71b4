//! Terminal fallback: answers every IA no earlier handler claimed.
//!
//! [`crate::plan::Plan`] always appends this as the last handler before
//! [`crate::handlers::rapid_commit::RapidCommitHandler`], so by the time it
//! runs every other handler has had a chance to call `mark_handled`.
//!
//! Status choice: the `authoritative` flag governs replies that would
//! otherwise assert something about an existing binding the server has
//! no record of -- `Confirm` (validating a binding against the link) and
//! `Rebind` regardless of the flag (a rebinding client already believes
//! it holds a binding, and a server that has simply never heard of it
//! cannot distinguish "no such binding" from "ask a different server", so
//! `NoBinding` is the safe default even when authoritative).
//! `Solicit`/`Request`/`Renew` are requests for a *new* or self-renewed
//! assignment -- no outstanding binding is in question, so an unclaimed
//! IA always gets a definite `NoAddrsAvail`/`NoPrefixAvail` independent
//! of the flag.

use dhcproto::v6::options::Status;
use dhcproto::v6::{DhcpOption, MessageType};

use crate::bundle::{self, IaKind, TransactionBundle, UnhandledIa};
use crate::error::PipelineResult;
use crate::pipeline::Handler;

pub struct UnansweredIaHandler {
    authoritative: bool,
}

impl UnansweredIaHandler {
    pub fn new(authoritative: bool) -> Self {
        Self { authoritative }
    }

    fn status_for(&self, msg_type: MessageType, kind: IaKind) -> Status {
        if msg_type == MessageType::Rebind {
            return Status::NoBinding;
        }
        if msg_type == MessageType::Confirm {
            return if self.authoritative {
                Status::NotOnLink
            } else {
                Status::NoBinding
            };
        }
        match kind {
            IaKind::PrefixDelegation => Status::NoPrefixAvail,
            IaKind::NonTemporary | IaKind::Temporary => Status::NoAddrsAvail,
        }
    }
}

impl Handler for UnansweredIaHandler {
    fn name(&self) -> &str {
        "unanswered-ia-fallback"
    }

    fn handle(&self, bundle: &mut TransactionBundle) -> PipelineResult<()> {
        let msg_type = bundle.request.msg_type();
        for kind in [IaKind::NonTemporary, IaKind::Temporary, IaKind::PrefixDelegation] {
            for ia in bundle.get_unhandled_options(kind) {
                let key = ia.key();
                let status = bundle::status_option(
                    self.status_for(msg_type, kind),
                    "no handler claimed this IA",
                );
                let opt = match ia {
                    UnhandledIa::NonTemporary(ia) => DhcpOption::IANA(bundle::iana_with_status(
                        ia.id,
                        u32::MAX,
                        u32::MAX,
                        status,
                    )),
                    UnhandledIa::Temporary(ia) => {
                        DhcpOption::IATA(bundle::iata_with_status(ia.id, status))
                    }
                    UnhandledIa::PrefixDelegation(ia) => DhcpOption::IAPD(bundle::iapd_with_status(
                        ia.id,
                        u32::MAX,
                        u32::MAX,
                        status,
                    )),
                };
                bundle.add_response_option(opt);
                bundle.mark_handled(key);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dhcproto::v6::{Message, RelayForw, Solicit, IANA};
    use std::net::Ipv6Addr;

    fn solicit_bundle_with_ia(iaid: u32) -> TransactionBundle {
        let mut request = Solicit::new();
        request.opts_mut().insert(IANA {
            id: iaid,
            t1: 0,
            t2: 0,
            opts: Default::default(),
        });
        let relay = RelayForw {
            hop_count: 0,
            link_address: Ipv6Addr::UNSPECIFIED,
            peer_address: Ipv6Addr::UNSPECIFIED,
            opts: Default::default(),
        };
        TransactionBundle::new(
            Message::RelayForw(relay.clone()),
            vec![relay],
            Message::Solicit(request),
        )
    }

    #[test]
    fn answers_unhandled_ia_with_no_addrs_avail_when_authoritative() {
        let handler = UnansweredIaHandler::new(true);
        let mut bundle = solicit_bundle_with_ia(1);
        handler.handle(&mut bundle).unwrap();
        assert!(bundle.is_handled(bundle::IaKey {
            kind: IaKind::NonTemporary,
            iaid: 1,
        }));
        assert!(bundle.get_unhandled_options(IaKind::NonTemporary).is_empty());
        assert!(bundle.has_response_option(dhcproto::v6::OptionCode::IANA));
    }

    #[test]
    fn rebind_falls_back_to_no_binding_even_when_authoritative() {
        let handler = UnansweredIaHandler::new(true);
        assert_eq!(
            handler.status_for(MessageType::Rebind, IaKind::NonTemporary),
            Status::NoBinding
        );
    }

    #[test]
    fn solicit_with_no_assignment_is_no_addrs_avail_even_when_non_authoritative() {
        // a Solicit claims no existing binding, so an unclaimed IA gets
        // a definite negative regardless of the authoritative flag.
        let handler = UnansweredIaHandler::new(false);
        assert_eq!(
            handler.status_for(MessageType::Solicit, IaKind::NonTemporary),
            Status::NoAddrsAvail
        );
        assert_eq!(
            handler.status_for(MessageType::Solicit, IaKind::PrefixDelegation),
            Status::NoPrefixAvail
        );
    }
}
