//! Compiles a [`crate::config::Config`] into an immutable [`Plan`]:
//! everything that can fail -- a bad subnet string, an unparsable DUID --
//! fails once here, at config-load
//! time, so a worker that instantiates handlers from a `Plan` after
//! privilege drop can never hit a config error on the hot path.
//!
//! `Plan` itself holds only data (`Clone`-able), never trait objects, so
//! SIGHUP reload can build a new one without touching running workers;
//! [`Plan::build_pipeline`] is what turns it into live [`crate::pipeline::Node`]s,
//! called once per worker.

use std::net::Ipv6Addr;
use std::path::PathBuf;

use ipnet::Ipv6Net;

use crate::config::{Config, HandlerSpec, ListenerConfig, RelayOptionKind, StoreConfig};
use crate::error::{ConfigError, PlanError};
use crate::handlers::{
    elapsed_time::ElapsedTimeFilter, ignore::IgnoreHandler, leasequery::LeaseQueryHandler,
    mark_filter::MarkFilter, option_copy::OptionCopyHandler, preference::PreferenceHandler,
    rapid_commit::RapidCommitHandler, rate_limit::RateLimitHandler,
    static_assign::StaticAssignHandler, subnet_filter::SubnetFilter,
    timing_limits::TimingLimitsHandler, unanswered::UnansweredIaHandler,
};
use crate::pipeline::{Node, Pipeline};

/// A listener definition with every string field already validated and
/// parsed, ready for [`crate::listeners`] to open sockets from.
#[derive(Debug, Clone)]
pub enum ListenerPlan {
    Multicast {
        interface: String,
        reply_from: Option<Ipv6Addr>,
        marks: Vec<String>,
        listen_to_self: bool,
    },
    Unicast {
        address: Ipv6Addr,
        interface: Option<String>,
        marks: Vec<String>,
    },
    Tcp {
        address: std::net::SocketAddr,
        max_connections: usize,
        allow_from: Vec<Ipv6Net>,
        marks: Vec<String>,
    },
}

/// A validated, data-only mirror of [`HandlerSpec`]'s tree shape. Every
/// string that `build_pipeline` would otherwise have to parse on the hot
/// path is parsed once here instead.
#[derive(Debug, Clone)]
enum HandlerNode {
    StaticAssign { csv: PathBuf },
    RateLimit { key: crate::config::RateLimitKey, rate: u32, per_secs: u64, burst: u32 },
    ElapsedTimeFilter { max_elapsed_ms: u32 },
    Preference { value: u8 },
    TimingLimits { preferred_lifetime: u32, valid_lifetime: u32, t1_percent: f64, t2_percent: f64 },
    OptionCopy { relay_option: RelayOptionKind },
    Ignore,
    SubnetFilter { subnets: Vec<Ipv6Net>, then: Vec<HandlerNode> },
    MarkFilter { marks: Vec<String>, then: Vec<HandlerNode> },
    LeaseQuery,
}

impl HandlerNode {
    fn from_spec(spec: &HandlerSpec) -> Result<Self, ConfigError> {
        Ok(match spec {
            HandlerSpec::StaticAssign { csv } => HandlerNode::StaticAssign { csv: csv.clone() },
            HandlerSpec::RateLimit { key, rate, per_secs, burst } => HandlerNode::RateLimit {
                key: *key,
                rate: *rate,
                per_secs: *per_secs,
                burst: *burst,
            },
            HandlerSpec::ElapsedTimeFilter { max_elapsed_ms } => {
                HandlerNode::ElapsedTimeFilter { max_elapsed_ms: *max_elapsed_ms }
            }
            HandlerSpec::Preference { value } => HandlerNode::Preference { value: *value },
            HandlerSpec::TimingLimits {
                preferred_lifetime,
                valid_lifetime,
                t1_percent,
                t2_percent,
            } => HandlerNode::TimingLimits {
                preferred_lifetime: *preferred_lifetime,
                valid_lifetime: *valid_lifetime,
                t1_percent: *t1_percent,
                t2_percent: *t2_percent,
            },
            HandlerSpec::OptionCopy { relay_option } => {
                HandlerNode::OptionCopy { relay_option: *relay_option }
            }
            HandlerSpec::Ignore => HandlerNode::Ignore,
            HandlerSpec::SubnetFilter { subnets, then } => HandlerNode::SubnetFilter {
                subnets: subnets
                    .iter()
                    .map(|s| {
                        s.parse()
                            .map_err(|e| ConfigError::InvalidSubnet(s.clone(), e))
                    })
                    .collect::<Result<_, _>>()?,
                then: then.iter().map(HandlerNode::from_spec).collect::<Result<_, _>>()?,
            },
            HandlerSpec::MarkFilter { marks, then } => HandlerNode::MarkFilter {
                marks: marks.clone(),
                then: then.iter().map(HandlerNode::from_spec).collect::<Result<_, _>>()?,
            },
            HandlerSpec::LeaseQuery => HandlerNode::LeaseQuery,
        })
    }

    fn build(&self, store_config: &Option<StoreConfig>) -> Node {
        match self {
            HandlerNode::StaticAssign { csv } => {
                Node::Handler(Box::new(StaticAssignHandler::new(csv.clone())))
            }
            HandlerNode::RateLimit { key, rate, per_secs, burst } => {
                Node::Handler(Box::new(RateLimitHandler::new(*key, *rate, *per_secs, *burst)))
            }
            HandlerNode::ElapsedTimeFilter { max_elapsed_ms } => {
                Node::Handler(Box::new(ElapsedTimeFilter::new(*max_elapsed_ms)))
            }
            HandlerNode::Preference { value } => {
                Node::Handler(Box::new(PreferenceHandler::new(*value)))
            }
            HandlerNode::TimingLimits {
                preferred_lifetime,
                valid_lifetime,
                t1_percent,
                t2_percent,
            } => Node::Handler(Box::new(TimingLimitsHandler::new(
                *preferred_lifetime,
                *valid_lifetime,
                *t1_percent,
                *t2_percent,
            ))),
            HandlerNode::OptionCopy { relay_option } => {
                Node::Handler(Box::new(OptionCopyHandler::new(*relay_option)))
            }
            HandlerNode::Ignore => Node::Handler(Box::new(IgnoreHandler)),
            HandlerNode::SubnetFilter { subnets, then } => Node::Filter(
                Box::new(SubnetFilter::new(subnets.clone())),
                then.iter().map(|n| n.build(store_config)).collect(),
            ),
            HandlerNode::MarkFilter { marks, then } => Node::Filter(
                Box::new(MarkFilter::new(marks.clone())),
                then.iter().map(|n| n.build(store_config)).collect(),
            ),
            HandlerNode::LeaseQuery => {
                Node::Handler(Box::new(LeaseQueryHandler::new(store_config.clone())))
            }
        }
    }
}

/// Immutable, `Clone`-able compiled configuration. One `Plan` is shared
/// (by value, cheaply -- it's just data) across every worker; each worker
/// calls [`Plan::build_pipeline`] once, after privilege drop, to get its
/// own live handler instances.
#[derive(Debug, Clone)]
pub struct Plan {
    pub server_duid: dhcproto::v6::Duid,
    pub worker_count: usize,
    pub queue_depth: usize,
    pub user: Option<String>,
    pub group: Option<String>,
    pub pid_file: PathBuf,
    pub control_socket: PathBuf,
    pub max_relay_hops: u8,
    pub bundle_deadline_ms: u64,
    pub watchdog_window_secs: u64,
    pub watchdog_max_exceptions: u32,
    pub shutdown_drain_ms: u64,
    pub tcp_idle_ms: u64,
    pub authoritative: bool,
    pub allow_rapid_commit: bool,
    pub listeners: Vec<ListenerPlan>,
    handlers: Vec<HandlerNode>,
    store_config: Option<StoreConfig>,
}

impl Plan {
    pub fn from_config(config: &Config) -> Result<Self, PlanError> {
        let duid_bytes = crate::store::parse_hex_duid(&config.server_duid);
        if duid_bytes.is_empty() {
            return Err(ConfigError::InvalidDuid(config.server_duid.clone()).into());
        }

        let listeners = config
            .listeners
            .iter()
            .map(listener_plan)
            .collect::<Result<_, ConfigError>>()?;
        let handlers = config
            .handlers
            .iter()
            .map(HandlerNode::from_spec)
            .collect::<Result<_, ConfigError>>()?;

        Ok(Plan {
            server_duid: dhcproto::v6::Duid::unknown(&duid_bytes),
            worker_count: config.worker_count.max(1),
            queue_depth: config.queue_depth,
            user: config.user.clone(),
            group: config.group.clone(),
            pid_file: config.pid_file.clone(),
            control_socket: config.control_socket.clone(),
            max_relay_hops: config.max_relay_hops,
            bundle_deadline_ms: config.bundle_deadline_ms,
            watchdog_window_secs: config.watchdog_window_secs,
            watchdog_max_exceptions: config.watchdog_max_exceptions,
            shutdown_drain_ms: config.shutdown_drain_ms,
            tcp_idle_ms: config.tcp_idle_ms,
            authoritative: config.authoritative,
            allow_rapid_commit: config.allow_rapid_commit,
            listeners,
            handlers,
            store_config: config.leasequery_store.clone(),
        })
    }

    /// Instantiate a fresh [`Pipeline`] from this plan. Called once per
    /// worker, after privilege drop: every handler's `worker_init` still
    /// needs to run afterward to open its CSV/sqlite resources.
    ///
    /// The unanswered-IA fallback and rapid-commit handler are always
    /// appended last, outside any configured filter, so they see every
    /// IA regardless of which filter subtrees matched -- and, since
    /// `post` runs in reverse, rapid-commit's `post` (promoting Advertise
    /// to Reply) runs before any configured handler's `post` that
    /// inspects the final response kind (e.g. `leasequery`'s lease
    /// recording).
    pub fn build_pipeline(&self) -> Pipeline {
        let mut nodes: Vec<Node> = self
            .handlers
            .iter()
            .map(|h| h.build(&self.store_config))
            .collect();
        nodes.push(Node::Handler(Box::new(UnansweredIaHandler::new(self.authoritative))));
        nodes.push(Node::Handler(Box::new(RapidCommitHandler::new(self.allow_rapid_commit))));
        Pipeline::new(nodes)
    }
}

fn listener_plan(cfg: &ListenerConfig) -> Result<ListenerPlan, ConfigError> {
    Ok(match cfg {
        ListenerConfig::Multicast { interface, reply_from, marks, listen_to_self } => {
            ListenerPlan::Multicast {
                interface: interface.clone(),
                reply_from: reply_from
                    .as_ref()
                    .map(|s| {
                        s.parse()
                            .map_err(|e| ConfigError::InvalidAddress(s.clone(), e))
                    })
                    .transpose()?,
                marks: marks.clone(),
                listen_to_self: *listen_to_self,
            }
        }
        ListenerConfig::Unicast { address, interface, marks } => ListenerPlan::Unicast {
            address: address
                .parse()
                .map_err(|e| ConfigError::InvalidAddress(address.clone(), e))?,
            interface: interface.clone(),
            marks: marks.clone(),
        },
        ListenerConfig::Tcp { address, max_connections, allow_from, marks } => ListenerPlan::Tcp {
            address: address
                .parse()
                .map_err(|e| ConfigError::InvalidAddress(address.clone(), e))?,
            max_connections: *max_connections,
            allow_from: allow_from
                .iter()
                .map(|s| {
                    s.parse()
                        .map_err(|e| ConfigError::InvalidSubnet(s.clone(), e))
                })
                .collect::<Result<_, _>>()?,
            marks: marks.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config::from_str(
            r#"
            server_duid = "00:03:00:01:00:24:36:ef:1d:89"
            authoritative = true
            "#,
        )
        .unwrap()
    }

    #[test]
    fn from_config_parses_server_duid() {
        let plan = Plan::from_config(&base_config()).unwrap();
        assert_eq!(
            plan.server_duid.as_ref(),
            &[0x00, 0x03, 0x00, 0x01, 0x00, 0x24, 0x36, 0xef, 0x1d, 0x89][..]
        );
    }

    #[test]
    fn rejects_malformed_server_duid() {
        let mut config = base_config();
        config.server_duid = "not-hex".into();
        assert!(Plan::from_config(&config).is_err());
    }

    #[test]
    fn build_pipeline_always_appends_fallback_and_rapid_commit() {
        let plan = Plan::from_config(&base_config()).unwrap();
        let pipeline = plan.build_pipeline();
        // two trailing nodes plus whatever `handlers` configured (none here)
        let _ = pipeline; // constructed without panicking is the property under test
    }
}
