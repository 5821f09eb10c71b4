//! A filter keyed on the requesting relay's link-address: only descends
//! into its subtree if the nearest relay's `link_address` falls inside
//! one of the configured subnets.
//!
//! "Nearest relay" is the innermost entry in the bundle's relay chain --
//! the one closest to the client, carrying the link the client is
//! actually on -- per the same convention `get_relay_option`'s
//! `from_innermost` flag uses.

use ipnet::Ipv6Net;

use crate::bundle::TransactionBundle;
use crate::pipeline::Filter;

pub struct SubnetFilter {
    subnets: Vec<Ipv6Net>,
}

impl SubnetFilter {
    pub fn new(subnets: Vec<Ipv6Net>) -> Self {
        Self { subnets }
    }
}

impl Filter for SubnetFilter {
    fn name(&self) -> &str {
        "subnet-filter"
    }

    fn matches(&self, bundle: &TransactionBundle) -> bool {
        let Some(relay) = bundle.relays.last() else {
            return false;
        };
        self.subnets.iter().any(|s| s.contains(&relay.link_address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dhcproto::v6::{Message, RelayForw, Solicit};
    use std::net::Ipv6Addr;

    fn bundle_on_link(link_address: Ipv6Addr) -> TransactionBundle {
        let relay = RelayForw {
            hop_count: 0,
            link_address,
            peer_address: Ipv6Addr::UNSPECIFIED,
            opts: Default::default(),
        };
        TransactionBundle::new(
            Message::RelayForw(relay.clone()),
            vec![relay],
            Message::Solicit(Solicit::new()),
        )
    }

    #[test]
    fn matches_link_address_in_subnet() {
        let filter = SubnetFilter::new(vec!["2001:db8::/32".parse().unwrap()]);
        assert!(filter.matches(&bundle_on_link("2001:db8::1".parse().unwrap())));
        assert!(!filter.matches(&bundle_on_link("2001:dead::1".parse().unwrap())));
    }
}
