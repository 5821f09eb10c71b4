//! Error taxonomy, grouped by the boundary each error crosses rather than
//! by module — this matches how they're handled (drop packet, abort
//! pipeline, refuse reload, ...) more closely than module boundaries do.

use thiserror::Error;

/// Raised by a handler's `pre`/`handle` phase to short-circuit the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// "not mine" — abort silently, no reply, no reason recorded.
    #[error("ignored: {0}")]
    IgnoreMessage(&'static str),

    /// a framing/parse problem short of a hard decode failure — a subclass
    /// of ignore, kept as its own variant so it gets a distinct counter
    /// bucket despite identical observable behavior.
    #[error("incomplete: {0}")]
    IncompleteMessage(&'static str),

    /// abort with a structured, loggable reason, but still no reply.
    #[error("cannot respond: {0}")]
    CannotRespond(String),

    /// client contacted unicast when it must use multicast. Unlike the
    /// other pre/handle aborts this is client-visible: the pipeline forces
    /// a Reply carrying a `UseMulticast` status instead of staying silent.
    #[error("use multicast")]
    UseMulticast,

    /// a keyed rate limiter tripped. A subclass of ignore-request with its
    /// own stats bucket, `rate_limited`.
    #[error("rate limited")]
    RateLimited,

    /// any other handler failure during the handle phase; aborts only
    /// this bundle, counted toward the exception watchdog window.
    #[error("handler error: {0}")]
    Handler(#[from] anyhow::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("no response shape for message type {0:?}")]
    NoResponseShape(dhcproto::v6::MessageType),
    #[error("relay chain: {0}")]
    Relay(#[from] dhcproto::error::DecodeError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing toml: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown handler kind {0:?}")]
    UnknownHandler(String),
    #[error("unknown listener kind {0:?}")]
    UnknownListener(String),
    #[error("invalid address {0:?}: {1}")]
    InvalidAddress(String, std::net::AddrParseError),
    #[error("invalid subnet {0:?}: {1}")]
    InvalidSubnet(String, ipnet::AddrParseError),
    #[error("invalid server-duid {0:?}: expected colon-separated hex octets")]
    InvalidDuid(String),
    #[error("static assignment csv {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Raised compiling a [`crate::config::Config`] into a [`crate::plan::Plan`]
/// or instantiating handlers from one -- a superset of `ConfigError` that
/// also covers failures only visible once a worker tries to open a
/// resource (e.g. a missing CSV file).
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("binding {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("joining multicast group on {interface}: {source}")]
    Multicast {
        interface: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no usable source address found on interface {0:?}")]
    NoSourceAddress(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Dropping to a configured uid/gid before forking workers. A failure here
/// because the process wasn't started
/// with the necessary rights is a warning, not an error (see
/// `crate::privilege::drop_privileges`); this type covers the cases that
/// really are fatal -- a configured user/group that doesn't exist.
#[derive(Debug, Error)]
pub enum PrivilegeError {
    #[error("unknown user {0:?}")]
    UnknownUser(String),
    #[error("unknown group {0:?}")]
    UnknownGroup(String),
    #[error("{0}")]
    Nix(#[from] nix::errno::Errno),
}

/// Failures in the master's own setup/run loop, a superset of the other
/// error types that can surface on the way there.
#[derive(Debug, Error)]
pub enum MasterError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error(transparent)]
    Privilege(#[from] PrivilegeError),
    #[error("pid file {path}: {source}")]
    PidFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("control socket {path}: {source}")]
    ControlSocket {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("forking worker: {0}")]
    Fork(#[source] nix::errno::Errno),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
