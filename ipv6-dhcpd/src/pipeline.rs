//! The filter/handler pipeline: an ordered tree of nodes run across three
//! phases against a single [`TransactionBundle`].
//!
//! A `Node` is either a `Handler` leaf or a `Filter` owning a nested
//! subtree. Traversal order is the heart of the design:
//!
//! - `pre`: depth-first, declared order. A filter whose `matches` returns
//!   false is skipped along with its entire subtree -- no `pre`, `handle`,
//!   or `post` call reaches any node under it.
//! - `handle`: same traversal, same order.
//! - `post`: the reverse of whatever nodes were actually visited (matching
//!   filters only), so side effects that depend on the final response run
//!   outermost-first undone, innermost-first applied.

use tracing::{debug, warn};

use crate::bundle::{self, ResponseKind, TransactionBundle};
use crate::error::{PipelineError, PipelineResult};

/// A pipeline leaf. Any method may be a no-op; the default implementations
/// are all no-ops so concrete handlers only override what they need.
pub trait Handler: Send {
    /// short human-readable name used in logs and `-C` dumps.
    fn name(&self) -> &str;

    /// runs before `handle`, in declared order. The classic place to
    /// enforce rate limits and other "not mine" checks that should skip
    /// the rest of the pipeline.
    fn pre(&self, _bundle: &mut TransactionBundle) -> PipelineResult<()> {
        Ok(())
    }

    /// runs in declared order; the place a handler builds its part of the
    /// response.
    fn handle(&self, _bundle: &mut TransactionBundle) -> PipelineResult<()> {
        Ok(())
    }

    /// runs in reverse order across the full flattened visit list. Cannot
    /// abort the pipeline: errors here are logged and swallowed per node,
    /// the response is still sent.
    fn post(&self, _bundle: &mut TransactionBundle) -> anyhow::Result<()> {
        Ok(())
    }

    /// called once when a worker instantiates this handler from the plan,
    /// after privilege drop. The place to open a CSV reader or a sqlite
    /// connection.
    fn worker_init(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// called once as a worker shuts down.
    fn worker_shutdown(&mut self) {}
}

/// A pipeline interior node: conditionally gates a nested subtree.
pub trait Filter: Send {
    fn name(&self) -> &str;

    /// whether this filter's subtree should run at all for `bundle`'s
    /// current state. Evaluated fresh at the start of every phase, so a
    /// handler mutating marks during `pre` can change `handle`-phase
    /// routing.
    fn matches(&self, bundle: &TransactionBundle) -> bool;

    fn pre(&self, _bundle: &mut TransactionBundle) -> PipelineResult<()> {
        Ok(())
    }
    fn handle(&self, _bundle: &mut TransactionBundle) -> PipelineResult<()> {
        Ok(())
    }
    fn post(&self, _bundle: &mut TransactionBundle) -> anyhow::Result<()> {
        Ok(())
    }
    fn worker_init(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
    fn worker_shutdown(&mut self) {}
}

/// One entry in the pipeline tree.
pub enum Node {
    Handler(Box<dyn Handler>),
    Filter(Box<dyn Filter>, Vec<Node>),
}

impl Node {
    fn name(&self) -> &str {
        match self {
            Node::Handler(h) => h.name(),
            Node::Filter(f, _) => f.name(),
        }
    }

    fn worker_init(&mut self) -> anyhow::Result<()> {
        match self {
            Node::Handler(h) => h.worker_init(),
            Node::Filter(f, children) => {
                f.worker_init()?;
                for child in children {
                    child.worker_init()?;
                }
                Ok(())
            }
        }
    }

    fn worker_shutdown(&mut self) {
        match self {
            Node::Handler(h) => h.worker_shutdown(),
            Node::Filter(f, children) => {
                f.worker_shutdown();
                for child in children {
                    child.worker_shutdown();
                }
            }
        }
    }
}

/// An ordered tree of [`Node`]s, run across `pre`/`handle`/`post` for one
/// [`TransactionBundle`] at a time.
pub struct Pipeline {
    nodes: Vec<Node>,
}

/// How a pipeline run ended, for the worker to decide what (if anything)
/// to put on the wire.
#[derive(Debug)]
pub enum Outcome {
    /// `handle` completed (or was never reached because the message type
    /// has no response shape); `post` has already run. Send the finalized
    /// response plus any queued extra `responses`.
    Respond,
    /// a handler raised `IgnoreMessage`/`IncompleteMessage`/`CannotRespond`/
    /// `RateLimited` during `pre` or `handle`: no reply. `post` does not
    /// run for an aborted pipeline -- it relies on a finished response,
    /// which an aborted pipeline never produces.
    Silent { counter_bucket: &'static str },
}

impl Pipeline {
    pub fn new(nodes: Vec<Node>) -> Self {
        Pipeline { nodes }
    }

    pub fn worker_init(&mut self) -> anyhow::Result<()> {
        for node in &mut self.nodes {
            node.worker_init()?;
        }
        Ok(())
    }

    pub fn worker_shutdown(&mut self) {
        for node in &mut self.nodes {
            node.worker_shutdown();
        }
    }

    /// Run the full pre -> handle -> post cycle for `bundle`.
    pub fn run(&self, bundle: &mut TransactionBundle) -> Outcome {
        let mut visited: Vec<&Node> = Vec::new();
        match run_phase_pre(&self.nodes, bundle, &mut visited) {
            Ok(()) => {}
            Err(PipelineError::UseMulticast) => return force_use_multicast(bundle),
            Err(e) => return silent_outcome(e),
        }
        visited.clear();
        match run_phase_handle(&self.nodes, bundle, &mut visited) {
            Ok(()) => {}
            Err(PipelineError::UseMulticast) => return force_use_multicast(bundle),
            Err(e) => return silent_outcome(e),
        }
        // post runs in reverse order over exactly the nodes that were
        // actually visited in the handle phase.
        for node in visited.into_iter().rev() {
            run_post_one(node, bundle);
        }
        Outcome::Respond
    }
}

/// `UseMulticastError` is the one pre/handle abort that is client-visible:
/// force the response to a Reply carrying a `UseMulticast` status rather
/// than dropping silently.
fn force_use_multicast(bundle: &mut TransactionBundle) -> Outcome {
    use dhcproto::v6::options::Status;
    bundle.set_response_kind(ResponseKind::Reply);
    bundle.force_response_option(dhcproto::v6::DhcpOption::StatusCode(bundle::status_option(
        Status::UseMulticast,
        "server requires multicast",
    )));
    Outcome::Respond
}

fn silent_outcome(e: PipelineError) -> Outcome {
    let counter_bucket = match &e {
        PipelineError::IgnoreMessage(_) => "ignored",
        PipelineError::IncompleteMessage(_) => "incomplete",
        PipelineError::CannotRespond(_) => "cannot_respond",
        PipelineError::RateLimited => "rate_limited",
        PipelineError::UseMulticast => unreachable!("handled by force_use_multicast"),
        PipelineError::Handler(_) => "handler_error",
    };
    debug!(error = %e, bucket = counter_bucket, "pipeline aborted");
    Outcome::Silent { counter_bucket }
}

fn run_phase_pre<'a>(
    nodes: &'a [Node],
    bundle: &mut TransactionBundle,
    visited: &mut Vec<&'a Node>,
) -> PipelineResult<()> {
    for node in nodes {
        match node {
            Node::Handler(h) => {
                visited.push(node);
                h.pre(bundle)?;
            }
            Node::Filter(f, children) => {
                if !f.matches(bundle) {
                    continue;
                }
                visited.push(node);
                f.pre(bundle)?;
                run_phase_pre(children, bundle, visited)?;
            }
        }
    }
    Ok(())
}

fn run_phase_handle<'a>(
    nodes: &'a [Node],
    bundle: &mut TransactionBundle,
    visited: &mut Vec<&'a Node>,
) -> PipelineResult<()> {
    for node in nodes {
        match node {
            Node::Handler(h) => {
                visited.push(node);
                h.handle(bundle)?;
            }
            Node::Filter(f, children) => {
                if !f.matches(bundle) {
                    continue;
                }
                visited.push(node);
                f.handle(bundle)?;
                run_phase_handle(children, bundle, visited)?;
            }
        }
    }
    Ok(())
}

fn run_post_one(node: &Node, bundle: &mut TransactionBundle) {
    let result = match node {
        Node::Handler(h) => h.post(bundle),
        Node::Filter(f, _) => f.post(bundle),
    };
    if let Err(e) = result {
        warn!(node = node.name(), error = %e, "post handler failed, response still sent");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder(Arc<Mutex<Vec<String>>>, &'static str);
    impl Handler for Recorder {
        fn name(&self) -> &str {
            self.1
        }
        fn pre(&self, _b: &mut TransactionBundle) -> PipelineResult<()> {
            self.0.lock().unwrap().push(format!("{}:pre", self.1));
            Ok(())
        }
        fn handle(&self, _b: &mut TransactionBundle) -> PipelineResult<()> {
            self.0.lock().unwrap().push(format!("{}:handle", self.1));
            Ok(())
        }
        fn post(&self, _b: &mut TransactionBundle) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(format!("{}:post", self.1));
            Ok(())
        }
    }

    fn solicit_bundle() -> TransactionBundle {
        use dhcproto::v6::{Message, RelayForw, Solicit};
        use std::net::Ipv6Addr;
        let request = Message::Solicit(Solicit::new());
        let relay = RelayForw {
            hop_count: 0,
            link_address: Ipv6Addr::UNSPECIFIED,
            peer_address: Ipv6Addr::UNSPECIFIED,
            opts: Default::default(),
        };
        TransactionBundle::new(Message::RelayForw(relay.clone()), vec![relay], request)
    }

    #[test]
    fn post_runs_in_reverse_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let nodes = vec![
            Node::Handler(Box::new(Recorder(log.clone(), "A"))),
            Node::Handler(Box::new(Recorder(log.clone(), "B"))),
            Node::Handler(Box::new(Recorder(log.clone(), "C"))),
        ];
        let pipeline = Pipeline::new(nodes);
        let mut bundle = solicit_bundle();
        let outcome = pipeline.run(&mut bundle);
        assert!(matches!(outcome, Outcome::Respond));
        let log = log.lock().unwrap();
        assert_eq!(
            *log,
            vec![
                "A:pre", "B:pre", "C:pre", "A:handle", "B:handle", "C:handle", "C:post", "B:post",
                "A:post",
            ]
        );
    }

    struct NeverMatch;
    impl Filter for NeverMatch {
        fn name(&self) -> &str {
            "never"
        }
        fn matches(&self, _b: &TransactionBundle) -> bool {
            false
        }
    }

    #[test]
    fn filter_skip_visits_nothing_in_subtree() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let nodes = vec![Node::Filter(
            Box::new(NeverMatch),
            vec![Node::Handler(Box::new(Recorder(log.clone(), "inner")))],
        )];
        let pipeline = Pipeline::new(nodes);
        let mut bundle = solicit_bundle();
        pipeline.run(&mut bundle);
        assert!(log.lock().unwrap().is_empty());
    }

    struct Aborter;
    impl Handler for Aborter {
        fn name(&self) -> &str {
            "aborter"
        }
        fn pre(&self, _b: &mut TransactionBundle) -> PipelineResult<()> {
            Err(PipelineError::IgnoreMessage("test abort"))
        }
    }

    #[test]
    fn ignore_in_pre_skips_handle_and_post() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let nodes = vec![
            Node::Handler(Box::new(Aborter)),
            Node::Handler(Box::new(Recorder(log.clone(), "never-reached"))),
        ];
        let pipeline = Pipeline::new(nodes);
        let mut bundle = solicit_bundle();
        let outcome = pipeline.run(&mut bundle);
        assert!(matches!(
            outcome,
            Outcome::Silent {
                counter_bucket: "ignored"
            }
        ));
        assert!(log.lock().unwrap().is_empty());
    }
}
