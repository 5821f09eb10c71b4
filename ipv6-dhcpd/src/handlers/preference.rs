//! Sets the Preference option (RFC 8415 §21.8) on Advertise replies, so a
//! client configured with multiple servers picks this one immediately.

use dhcproto::v6::{options::Preference as PreferenceOption, DhcpOption};

use crate::bundle::{ResponseKind, TransactionBundle};
use crate::error::PipelineResult;
use crate::pipeline::Handler;

pub struct PreferenceHandler {
    value: u8,
}

impl PreferenceHandler {
    pub fn new(value: u8) -> Self {
        Self { value }
    }
}

impl Handler for PreferenceHandler {
    fn name(&self) -> &str {
        "preference"
    }

    fn handle(&self, bundle: &mut TransactionBundle) -> PipelineResult<()> {
        if bundle.response_kind() == Some(ResponseKind::Advertise) {
            bundle.force_response_option(DhcpOption::Preference(PreferenceOption {
                pref: self.value,
            }));
        }
        Ok(())
    }
}
