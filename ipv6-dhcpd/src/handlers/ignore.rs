//! Unconditional drop. Normally nested
//! under a [`crate::handlers::mark_filter::MarkFilter`] or
//! [`crate::handlers::subnet_filter::SubnetFilter`] so it only fires for a
//! routed subset of traffic -- on its own at the top level it would black
//! -hole the whole listener.

use crate::bundle::TransactionBundle;
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::Handler;

pub struct IgnoreHandler;

impl Handler for IgnoreHandler {
    fn name(&self) -> &str {
        "ignore"
    }

    fn pre(&self, _bundle: &mut TransactionBundle) -> PipelineResult<()> {
        Err(PipelineError::IgnoreMessage("ignore handler"))
    }
}
