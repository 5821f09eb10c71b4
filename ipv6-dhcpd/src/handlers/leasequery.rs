//! Answers leasequery requests from the configured [`crate::store::LeaseStore`]
//! and, in `post`, records every address/prefix this bundle's response
//! actually granted so later
//! queries can find it.
//!
//! Single (UDP or TCP) leasequery and RFC 5460 bulk leasequery share one
//! handler: a plain `QueryByAddress`/`QueryByClientID` request gets one
//! `LeaseQueryReply`; a request arriving on a listener marked `tcp` (bulk
//! transport) additionally streams a `LeaseQueryData` per matching lease
//! followed by a `LeaseQueryDone`, per RFC 5460 §5.2.

use std::cell::RefCell;

use dhcproto::v6::options::Status;
use dhcproto::v6::{
    ClientData, ClientDataOptions, CltTime, DhcpOption, LeaseQueryDataOptions,
    LeaseQueryDone, LeaseQueryDoneOptions, LeaseQueryReply, LeaseQueryReplyOptions, Message,
    OptionCode, QueryType,
};

use crate::bundle::{self, TransactionBundle};
use crate::config::StoreConfig;
use crate::error::PipelineResult;
use crate::pipeline::Handler;
use crate::store::{AssignedResource, LeaseFilter, LeaseRecord, LeaseStore, SqliteStore};

pub struct LeaseQueryHandler {
    store_config: Option<StoreConfig>,
    /// a single worker drives one bundle at a time, so a `RefCell` is
    /// enough to give `handle`/`post` (both `&self`) mutable access to
    /// `record` without reaching for a `Mutex` nothing else contends on.
    store: RefCell<Option<Box<dyn LeaseStore>>>,
}

impl LeaseQueryHandler {
    pub fn new(store_config: Option<StoreConfig>) -> Self {
        Self {
            store_config,
            store: RefCell::new(None),
        }
    }

    fn records_for(&self, filter: &LeaseFilter) -> Vec<LeaseRecord> {
        self.store
            .borrow()
            .as_ref()
            .map(|s| s.query(filter).unwrap_or_default())
            .unwrap_or_default()
    }
}

impl Handler for LeaseQueryHandler {
    fn name(&self) -> &str {
        "leasequery"
    }

    fn worker_init(&mut self) -> anyhow::Result<()> {
        *self.store.get_mut() = match &self.store_config {
            Some(StoreConfig::Sqlite { path }) => Some(Box::new(SqliteStore::open(path)?) as _),
            None => None,
        };
        Ok(())
    }

    fn handle(&self, bundle: &mut TransactionBundle) -> PipelineResult<()> {
        let Message::LeaseQuery(req) = &bundle.request else {
            return Ok(());
        };
        let Some(query) = req.opts().get::<dhcproto::v6::LqQuery>() else {
            return Ok(());
        };

        let filter = match query.qtype {
            QueryType::QueryByClientID => LeaseFilter {
                client_duid: query
                    .opts
                    .get::<dhcproto::v6::ClientId>()
                    .map(|c| c.id.as_ref().to_vec()),
                link_address: None,
            },
            QueryType::QueryByAddress => LeaseFilter {
                client_duid: None,
                link_address: Some(query.link_address),
            },
            QueryType::Unknown(_) => {
                let mut opts = LeaseQueryReplyOptions::new();
                opts.insert(bundle::status_option(
                    Status::UnknownQueryType,
                    "unsupported query type",
                ));
                bundle.add_response(Message::LeaseQueryReply(LeaseQueryReply {
                    xid: req.xid,
                    opts,
                }));
                return Ok(());
            }
        };

        let records = self.records_for(&filter);
        let bulk = bundle.marks.contains("tcp");

        let mut reply_opts = LeaseQueryReplyOptions::new();
        match records.first() {
            Some(record) => {
                reply_opts.insert(client_data(record));
            }
            None => {
                reply_opts.insert(bundle::status_option(
                    Status::NotConfigured,
                    "no matching lease",
                ));
            }
        }
        bundle.add_response(Message::LeaseQueryReply(LeaseQueryReply {
            xid: req.xid,
            opts: reply_opts,
        }));

        if bulk {
            for record in records.iter().skip(1) {
                let mut opts = LeaseQueryDataOptions::new();
                opts.insert(client_data(record));
                bundle.add_response(Message::LeaseQueryData(dhcproto::v6::LeaseQueryData {
                    xid: req.xid,
                    opts,
                }));
            }
            let mut done_opts = LeaseQueryDoneOptions::new();
            done_opts.insert(bundle::status_option(
                Status::Success,
                "",
            ));
            bundle.add_response(Message::LeaseQueryDone(LeaseQueryDone {
                xid: req.xid,
                opts: done_opts,
            }));
        }
        Ok(())
    }

    fn post(&self, bundle: &mut TransactionBundle) -> anyhow::Result<()> {
        use crate::bundle::ResponseKind;
        if bundle.response_kind() != Some(ResponseKind::Reply) {
            return Ok(());
        }
        let Some(client_id) = bundle::request_options(&bundle.request)
            .into_iter()
            .find_map(|o| match o {
                DhcpOption::ClientId(c) => Some(c.id.as_ref().to_vec()),
                _ => None,
            })
        else {
            return Ok(());
        };
        let link_address = bundle
            .relays
            .last()
            .map(|r| r.link_address)
            .unwrap_or(std::net::Ipv6Addr::UNSPECIFIED);
        let remote_id = match bundle.get_relay_option(OptionCode::RemoteId, true) {
            Some(DhcpOption::Unknown(u)) => Some(u.data().to_vec()),
            _ => None,
        };

        if let Some(store) = self.store.borrow_mut().as_mut() {
            for opt in bundle_response_opts(bundle) {
                record_one(store.as_mut(), &client_id, link_address, remote_id.clone(), opt)?;
            }
        }
        Ok(())
    }
}

/// pull the leasable (IA-NA/IA-TA/IA-PD) options back out of the bundle's
/// finalized response so `post` can record each assignment.
fn bundle_response_opts(bundle: &TransactionBundle) -> Vec<DhcpOption> {
    [OptionCode::IANA, OptionCode::IATA, OptionCode::IAPD]
        .into_iter()
        .filter_map(|code| bundle.get_response_option(code).cloned())
        .collect()
}

fn record_one(
    store: &mut dyn LeaseStore,
    client_duid: &[u8],
    link_address: std::net::Ipv6Addr,
    remote_id: Option<Vec<u8>>,
    opt: DhcpOption,
) -> anyhow::Result<()> {
    match opt {
        DhcpOption::IANA(ia) => {
            for sub in ia.opts.iter() {
                if let dhcproto::v6::IANAOption::IAAddr(addr) = sub {
                    store.record(LeaseRecord {
                        client_duid: client_duid.to_vec(),
                        link_address,
                        iaid: ia.id,
                        assigned: AssignedResource::Address(addr.addr),
                        preferred_lifetime: addr.preferred_life,
                        valid_lifetime: addr.valid_life,
                        last_client_txn_time: 0,
                        remote_id: remote_id.clone(),
                    })?;
                }
            }
        }
        DhcpOption::IAPD(ia) => {
            for sub in ia.opts.iter() {
                if let dhcproto::v6::IAPDOption::IAPrefix(prefix) = sub {
                    store.record(LeaseRecord {
                        client_duid: client_duid.to_vec(),
                        link_address,
                        iaid: ia.id,
                        assigned: AssignedResource::Prefix(prefix.prefix_ip, prefix.prefix_len),
                        preferred_lifetime: prefix.preferred_lifetime,
                        valid_lifetime: prefix.valid_lifetime,
                        last_client_txn_time: 0,
                        remote_id: remote_id.clone(),
                    })?;
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn client_data(record: &LeaseRecord) -> ClientData {
    let mut opts = ClientDataOptions::new();
    opts.insert(dhcproto::v6::ClientId {
        id: dhcproto::v6::Duid::unknown(&record.client_duid),
    });
    match record.assigned {
        AssignedResource::Address(addr) => {
            opts.insert(dhcproto::v6::IAAddr {
                addr,
                preferred_life: record.preferred_lifetime,
                valid_life: record.valid_lifetime,
                opts: Default::default(),
            });
        }
        AssignedResource::Prefix(addr, len) => {
            opts.insert(dhcproto::v6::IAPrefix {
                preferred_lifetime: record.preferred_lifetime,
                valid_lifetime: record.valid_lifetime,
                prefix_len: len,
                prefix_ip: addr,
                opts: Default::default(),
            });
        }
    }
    opts.insert(CltTime {
        time: record.last_client_txn_time,
    });
    ClientData { opts }
}
