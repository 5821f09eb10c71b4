//! Converts `Advertise` to `Reply` when rapid commit applies.
//!
//! This is always the last node the [`crate::plan::Plan`] appends, so it is
//! the *first* node whose `post` runs (phases' `post` is the reverse of the
//! visit order) -- every other handler's `post`, including the one that
//! records a successful lease, then observes the final response kind
//! instead of the provisional `Advertise`.

use dhcproto::v6::{options::RapidCommit as RapidCommitOption, DhcpOption};

use crate::bundle::{ResponseKind, TransactionBundle};
use crate::pipeline::Handler;

pub struct RapidCommitHandler {
    allow: bool,
}

impl RapidCommitHandler {
    pub fn new(allow: bool) -> Self {
        Self { allow }
    }
}

impl Handler for RapidCommitHandler {
    fn name(&self) -> &str {
        "rapid-commit"
    }

    fn post(&self, bundle: &mut TransactionBundle) -> anyhow::Result<()> {
        if self.allow
            && bundle.allow_rapid_commit
            && bundle.response_kind() == Some(ResponseKind::Advertise)
        {
            bundle.set_response_kind(ResponseKind::Reply);
            bundle.add_response_option(DhcpOption::RapidCommit(RapidCommitOption));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dhcproto::v6::{Message, RelayForw, Solicit};
    use std::net::Ipv6Addr;

    fn solicit_bundle_with_rapid_commit() -> TransactionBundle {
        let mut request = Solicit::new();
        request
            .opts_mut()
            .insert(RapidCommitOption);
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
    fn converts_advertise_to_reply_when_allowed() {
        let handler = RapidCommitHandler::new(true);
        let mut bundle = solicit_bundle_with_rapid_commit();
        assert_eq!(bundle.response_kind(), Some(ResponseKind::Advertise));
        handler.post(&mut bundle).unwrap();
        assert_eq!(bundle.response_kind(), Some(ResponseKind::Reply));
        assert!(bundle.has_response_option(dhcproto::v6::OptionCode::RapidCommit));
    }

    #[test]
    fn leaves_advertise_when_not_allowed() {
        let handler = RapidCommitHandler::new(false);
        let mut bundle = solicit_bundle_with_rapid_commit();
        handler.post(&mut bundle).unwrap();
        assert_eq!(bundle.response_kind(), Some(ResponseKind::Advertise));
    }

    #[test]
    fn leaves_advertise_when_a_handler_cleared_the_flag() {
        let handler = RapidCommitHandler::new(true);
        let mut bundle = solicit_bundle_with_rapid_commit();
        bundle.allow_rapid_commit = false;
        handler.post(&mut bundle).unwrap();
        assert_eq!(bundle.response_kind(), Some(ResponseKind::Advertise));
    }
}
