//! Rejects requests whose Elapsed Time option (RFC 8415 §21.9, in
//! hundredths of a second) exceeds a configured ceiling -- a client that's
//! been retrying a long time is presumably already being served by another
//! server on the link.

use dhcproto::v6::DhcpOption;

use crate::bundle::{self, TransactionBundle};
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::Handler;

pub struct ElapsedTimeFilter {
    max_elapsed_ms: u32,
}

impl ElapsedTimeFilter {
    pub fn new(max_elapsed_ms: u32) -> Self {
        Self { max_elapsed_ms }
    }
}

impl Handler for ElapsedTimeFilter {
    fn name(&self) -> &str {
        "elapsed-time-filter"
    }

    fn pre(&self, bundle: &mut TransactionBundle) -> PipelineResult<()> {
        let elapsed_ms = bundle::request_options(&bundle.request)
            .into_iter()
            .find_map(|o| match o {
                DhcpOption::ElapsedTime(e) => Some(u32::from(e.time) * 10),
                _ => None,
            });
        if let Some(ms) = elapsed_ms {
            if ms > self.max_elapsed_ms {
                return Err(PipelineError::IgnoreMessage(
                    "elapsed time exceeds configured ceiling",
                ));
            }
        }
        Ok(())
    }
}
