//! A filter keyed on packet marks: only descends
//! into its subtree if the bundle carries at least one of the configured
//! marks. Marks are attached by listeners (e.g. a listener's own `marks`
//! list) and by earlier filters/handlers, so later nodes in the pipeline
//! can route on them without knowing which listener a packet arrived on.

use crate::bundle::TransactionBundle;
use crate::pipeline::Filter;

pub struct MarkFilter {
    marks: Vec<String>,
}

impl MarkFilter {
    pub fn new(marks: Vec<String>) -> Self {
        Self { marks }
    }
}

impl Filter for MarkFilter {
    fn name(&self) -> &str {
        "mark-filter"
    }

    fn matches(&self, bundle: &TransactionBundle) -> bool {
        self.marks.iter().any(|m| bundle.marks.contains(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dhcproto::v6::{Message, RelayForw, Solicit};
    use std::net::Ipv6Addr;

    fn bundle_with_marks(marks: &[&str]) -> TransactionBundle {
        let relay = RelayForw {
            hop_count: 0,
            link_address: Ipv6Addr::UNSPECIFIED,
            peer_address: Ipv6Addr::UNSPECIFIED,
            opts: Default::default(),
        };
        let mut b = TransactionBundle::new(
            Message::RelayForw(relay.clone()),
            vec![relay],
            Message::Solicit(Solicit::new()),
        );
        b.marks.extend(marks.iter().map(|m| m.to_string()));
        b
    }

    #[test]
    fn matches_when_any_mark_present() {
        let filter = MarkFilter::new(vec!["wifi".into(), "guest".into()]);
        assert!(filter.matches(&bundle_with_marks(&["guest"])));
        assert!(!filter.matches(&bundle_with_marks(&["wired"])));
    }
}
