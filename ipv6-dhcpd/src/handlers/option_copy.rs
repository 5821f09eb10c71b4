//! Echoes an option from the nearest relay back into the matching
//! relay-reply shell -- e.g. the interface-id a relay attached comes
//! back in the matching `RelayRepl`.

use dhcproto::v6::{DhcpOption, OptionCode};

use crate::bundle::TransactionBundle;
use crate::config::RelayOptionKind;
use crate::error::PipelineResult;
use crate::pipeline::Handler;

pub struct OptionCopyHandler {
    code: OptionCode,
}

impl OptionCopyHandler {
    pub fn new(kind: RelayOptionKind) -> Self {
        let code = match kind {
            RelayOptionKind::InterfaceId => OptionCode::InterfaceId,
            RelayOptionKind::RemoteId => OptionCode::RemoteId,
        };
        Self { code }
    }
}

impl Handler for OptionCopyHandler {
    fn name(&self) -> &str {
        "option-copy"
    }

    fn handle(&self, bundle: &mut TransactionBundle) -> PipelineResult<()> {
        for depth in (0..bundle.relays.len()).rev() {
            let found = bundle.relays[depth]
                .opts()
                .iter()
                .map(DhcpOption::from)
                .find(|o| OptionCode::from(o) == self.code);
            if let Some(opt) = found {
                bundle.add_response_relay_option(depth, opt);
                break;
            }
        }
        Ok(())
    }
}
