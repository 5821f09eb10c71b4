//! Static address/prefix assignment keyed by client DUID, from a CSV file.

use std::path::PathBuf;

use dhcproto::v6::{DhcpOption, IAAddr, IAPD};

use crate::bundle::{self, IaKind};
use crate::error::PipelineError;
use crate::pipeline::Handler;
use crate::store::{StaticAssignments, StaticEntry};

const PREFERRED_LIFETIME: u32 = 3600;
const VALID_LIFETIME: u32 = 7200;
const T1: u32 = 1800;
const T2: u32 = 2880;

pub struct StaticAssignHandler {
    csv_path: PathBuf,
    assignments: Option<StaticAssignments>,
}

impl StaticAssignHandler {
    pub fn new(csv_path: PathBuf) -> Self {
        Self {
            csv_path,
            assignments: None,
        }
    }
}

impl Handler for StaticAssignHandler {
    fn name(&self) -> &str {
        "static-assign"
    }

    fn worker_init(&mut self) -> anyhow::Result<()> {
        self.assignments = Some(StaticAssignments::load(&self.csv_path)?);
        Ok(())
    }

    fn handle(&self, bundle: &mut bundle::TransactionBundle) -> crate::error::PipelineResult<()> {
        let assignments = self.assignments.as_ref().ok_or_else(|| {
            PipelineError::Handler(anyhow::anyhow!("static-assign handler not initialized"))
        })?;

        let client_id = bundle::request_options(&bundle.request)
            .into_iter()
            .find_map(|o| match o {
                DhcpOption::ClientId(c) => Some(c.id),
                _ => None,
            });
        let Some(duid) = client_id else {
            return Ok(());
        };
        let Some(entry) = assignments.lookup(&duid) else {
            return Ok(());
        };

        match entry {
            StaticEntry::Address(addr) => {
                for ia in bundle.get_unhandled_options(IaKind::NonTemporary) {
                    let bundle::UnhandledIa::NonTemporary(ia) = ia else {
                        continue;
                    };
                    let key = bundle::UnhandledIa::NonTemporary(ia.clone()).key();
                    let mut opts = dhcproto::v6::IANAOptions::new();
                    opts.insert(IAAddr {
                        addr: *addr,
                        preferred_life: PREFERRED_LIFETIME,
                        valid_life: VALID_LIFETIME,
                        opts: Default::default(),
                    });
                    bundle.add_response_option(DhcpOption::IANA(dhcproto::v6::IANA {
                        id: ia.id,
                        t1: T1,
                        t2: T2,
                        opts,
                    }));
                    bundle.mark_handled(key);
                }
            }
            StaticEntry::Prefix(addr, len) => {
                for ia in bundle.get_unhandled_options(IaKind::PrefixDelegation) {
                    let bundle::UnhandledIa::PrefixDelegation(ia) = ia else {
                        continue;
                    };
                    let key = bundle::UnhandledIa::PrefixDelegation(ia.clone()).key();
                    let mut opts = dhcproto::v6::IAPDOptions::new();
                    opts.insert(dhcproto::v6::IAPrefix {
                        preferred_lifetime: PREFERRED_LIFETIME,
                        valid_lifetime: VALID_LIFETIME,
                        prefix_len: *len,
                        prefix_ip: *addr,
                        opts: Default::default(),
                    });
                    bundle.add_response_option(DhcpOption::IAPD(IAPD {
                        id: ia.id,
                        t1: T1,
                        t2: T2,
                        opts,
                    }));
                    bundle.mark_handled(key);
                }
            }
        }
        Ok(())
    }
}
