//! Declarative configuration.
//!
//! This module owns only the file format: a `Config` deserialized from TOML
//! via `serde`. It knows nothing about sockets, privileges, or handler
//! construction -- that happens in [`crate::plan`], which turns a `Config`
//! into an immutable [`crate::plan::Plan`] workers instantiate from after
//! privilege drop.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_queue_depth() -> usize {
    1024
}

fn default_max_relay_hops() -> u8 {
    dhcproto::v6::DEFAULT_MAX_HOPS
}

fn default_bundle_deadline_ms() -> u64 {
    5_000
}

fn default_watchdog_window_secs() -> u64 {
    10
}

fn default_watchdog_max_exceptions() -> u32 {
    5
}

fn default_shutdown_drain_ms() -> u64 {
    5_000
}

fn default_tcp_idle_ms() -> u64 {
    30_000
}

fn default_pid_file() -> PathBuf {
    PathBuf::from("/var/run/ipv6-dhcpd.pid")
}

fn default_control_socket() -> PathBuf {
    PathBuf::from("/var/run/ipv6-dhcpd.sock")
}

fn default_true() -> bool {
    true
}

/// Top-level configuration, one TOML file per server instance.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// the server's own DUID, hex-colon separated octets (e.g.
    /// `00:01:00:01:2b:5a...`). Required -- the core never invents one.
    pub server_duid: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,

    /// uid/gid to drop to before forking workers. Absent means "don't drop"
    /// (only sensible for testing against virtual interfaces).
    pub user: Option<String>,
    pub group: Option<String>,

    #[serde(default = "default_pid_file")]
    pub pid_file: PathBuf,
    #[serde(default = "default_control_socket")]
    pub control_socket: PathBuf,

    #[serde(default = "default_max_relay_hops")]
    pub max_relay_hops: u8,
    #[serde(default = "default_bundle_deadline_ms")]
    pub bundle_deadline_ms: u64,

    #[serde(default = "default_watchdog_window_secs")]
    pub watchdog_window_secs: u64,
    #[serde(default = "default_watchdog_max_exceptions")]
    pub watchdog_max_exceptions: u32,
    #[serde(default = "default_shutdown_drain_ms")]
    pub shutdown_drain_ms: u64,

    /// read/write idle timeout for bulk-leasequery TCP connections; a
    /// connection that stalls past this is closed.
    #[serde(default = "default_tcp_idle_ms")]
    pub tcp_idle_ms: u64,

    /// whether this server is authoritative for the subnets it serves;
    /// governs the unanswered-IA fallback's NoBinding vs NotOnLink/NoAddrsAvail
    /// choice.
    #[serde(default = "default_true")]
    pub authoritative: bool,
    /// whether the rapid-commit handler is allowed to honor a client's
    /// request at all.
    #[serde(default)]
    pub allow_rapid_commit: bool,

    #[serde(default)]
    pub listeners: Vec<ListenerConfig>,
    #[serde(default)]
    pub handlers: Vec<HandlerSpec>,

    pub leasequery_store: Option<StoreConfig>,
}

impl Config {
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_path(path: &std::path::Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_str(&data)
    }
}

/// One listener definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ListenerConfig {
    /// joins the DHCPv6 multicast groups on `interface`, binds port 547.
    Multicast {
        interface: String,
        /// source address used for replies; default picks the interface's
        /// first link-local address.
        reply_from: Option<String>,
        #[serde(default)]
        marks: Vec<String>,
        #[serde(default)]
        listen_to_self: bool,
    },
    /// binds a specific unicast address, typically fed by a relay.
    Unicast {
        address: String,
        interface: Option<String>,
        #[serde(default)]
        marks: Vec<String>,
    },
    /// bulk leasequery over TCP.
    Tcp {
        address: String,
        #[serde(default = "default_tcp_max_connections")]
        max_connections: usize,
        #[serde(default)]
        allow_from: Vec<String>,
        #[serde(default)]
        marks: Vec<String>,
    },
}

fn default_tcp_max_connections() -> usize {
    64
}

fn default_t1_percent() -> f64 {
    0.5
}

fn default_t2_percent() -> f64 {
    0.8
}

/// One node in the pipeline tree: a leaf handler, or a filter owning a
/// nested subtree.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum HandlerSpec {
    /// static address/prefix assignment keyed by client DUID, read from a
    /// CSV file.
    StaticAssign { csv: PathBuf },
    /// keyed sliding-window rate limiter.
    RateLimit {
        #[serde(default)]
        key: RateLimitKey,
        rate: u32,
        per_secs: u64,
        #[serde(default)]
        burst: u32,
    },
    /// rejects messages whose elapsed-time option exceeds a ceiling.
    ElapsedTimeFilter { max_elapsed_ms: u32 },
    /// sets the Preference option on Advertise replies.
    Preference { value: u8 },
    /// clamps every IA's lease lifetimes and T1/T2 to policy bounds,
    /// regardless of which earlier handler built the IA.
    TimingLimits {
        preferred_lifetime: u32,
        valid_lifetime: u32,
        #[serde(default = "default_t1_percent")]
        t1_percent: f64,
        #[serde(default = "default_t2_percent")]
        t2_percent: f64,
    },
    /// echoes an option from the nearest relay back into the matching
    /// relay-reply shell.
    OptionCopy { relay_option: RelayOptionKind },
    /// drops messages unconditionally, normally nested under a filter.
    Ignore,
    /// a filter: only descends into `then` if `matches` holds.
    SubnetFilter {
        subnets: Vec<String>,
        then: Vec<HandlerSpec>,
    },
    /// a filter keyed on listener/packet marks.
    MarkFilter {
        marks: Vec<String>,
        then: Vec<HandlerSpec>,
    },
    /// answers bulk/single leasequery requests from the configured store.
    LeaseQuery,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RateLimitKey {
    #[default]
    Duid,
    InterfaceId,
    RemoteId,
    SubscriberId,
    LinkLayerId,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RelayOptionKind {
    InterfaceId,
    RemoteId,
}

/// Leasequery store backend configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StoreConfig {
    Sqlite { path: PathBuf },
}
