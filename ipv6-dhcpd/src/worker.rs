//! One worker process's packet-processing loop.
//!
//! A worker owns a live [`Pipeline`] built from the master's [`Plan`], its
//! own duped [`ListenerSet`] (see `ListenerSet::try_clone`), and one
//! [`UnixDatagram`] half of the pair the master uses to push work and pull
//! stats. Everything here runs single-threaded: one packet is fully
//! processed -- decode, pipeline, reply -- before the next is read off the
//! channel.

use std::net::Ipv6Addr;
use std::os::fd::OwnedFd;
use std::os::unix::net::UnixDatagram;
use std::time::{Duration, Instant};

use dhcproto::error::DecodeError;
use dhcproto::v6::{DhcpOption, Message, MessageType, RelayForw, ServerId};
use dhcproto::{Decodable, Decoder, Encodable, Encoder};
use tracing::{debug, warn};

use crate::bundle::{self, TransactionBundle};
use crate::ipc::{self, WorkerMessage};
use crate::listeners::{write_one_frame, IncomingPacket, ListenerSet};
use crate::pipeline::{Outcome, Pipeline};
use crate::plan::Plan;
use crate::stats::Stats;

/// A single worker process's state. Constructed once, after privilege drop,
/// then driven by [`Worker::run`] until the master sends
/// [`WorkerMessage::Drain`].
pub struct Worker {
    id: u32,
    plan: Plan,
    pipeline: Pipeline,
    listeners: ListenerSet,
    channel: UnixDatagram,
    stats: Stats,
}

impl Worker {
    /// Builds this worker's own handler instances from `plan` and runs
    /// their `worker_init` -- the place a handler opens its CSV file or
    /// sqlite connection, safely after privilege drop.
    pub fn new(
        id: u32,
        plan: Plan,
        listeners: ListenerSet,
        channel: UnixDatagram,
    ) -> anyhow::Result<Self> {
        let mut pipeline = plan.build_pipeline();
        pipeline.worker_init()?;
        Ok(Worker {
            id,
            plan,
            pipeline,
            listeners,
            channel,
            stats: Stats::default(),
        })
    }

    /// Drains the IPC channel until told to stop. Never returns an error on
    /// a single bad packet -- only a channel-level IO failure aborts the
    /// loop, since the master treats a dead channel as "worker crashed" and
    /// replaces it.
    pub fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let (message, fd) = ipc::recv_message(&self.channel)?;
            match message {
                WorkerMessage::Packet(packet) => self.process(packet, fd),
                WorkerMessage::Drain => {
                    debug!(worker = self.id, "draining");
                    self.pipeline.worker_shutdown();
                    return Ok(());
                }
                WorkerMessage::StatsRequest => {
                    ipc::send_message(&self.channel, &WorkerMessage::StatsReport(self.stats.clone()), None)?;
                }
                WorkerMessage::StatsReport(_) | WorkerMessage::TcpClosed { .. } => {
                    // a worker never legitimately receives one of its own message kinds.
                }
            }
        }
    }

    fn process(&mut self, packet: IncomingPacket, fd: Option<OwnedFd>) {
        let msg = match Message::decode(&mut Decoder::new(&packet.payload)) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(error = %e, "framing error, dropping packet");
                self.stats.malformed += 1;
                return;
            }
        };

        let (relays, request) = match dhcproto::v6::unwrap_relay_chain(msg, self.plan.max_relay_hops) {
            Ok(pair) => pair,
            Err(DecodeError::RelayTooDeep(max)) => {
                debug!(max, "relay chain too deep, dropping packet");
                self.stats.relay_too_deep += 1;
                return;
            }
            Err(e) => {
                debug!(error = %e, "relay-encapsulated message failed to decode");
                self.stats.malformed += 1;
                return;
            }
        };
        self.stats.received += 1;

        if request.msg_type() == MessageType::Reconfigure {
            // no Advertise/Reply shape and no bundle at all -- a server
            // only ever sends Reconfigure, never receives one.
            return;
        }

        // RFC 8415 §7.1's "directly contacted" case: synthesize a single
        // virtual relay-forward so the pipeline always sees a uniform
        // relay-chain shape, instead of special-casing the no-relay path
        // in every handler.
        let relays = if relays.is_empty() {
            vec![synthetic_relay(&packet)]
        } else {
            relays
        };
        let incoming = Message::RelayForw(relays[0].clone());

        let mut bundle = TransactionBundle::new(incoming, relays, request);
        bundle.marks.extend(packet.marks.iter().cloned());

        let deadline = Duration::from_millis(self.plan.bundle_deadline_ms);
        let started = Instant::now();
        let outcome = self.pipeline.run(&mut bundle);
        let overran = started.elapsed() > deadline;

        match outcome {
            Outcome::Silent { counter_bucket } => self.stats.record_outcome(counter_bucket),
            Outcome::Respond => {
                if overran {
                    warn!(worker = self.id, "bundle exceeded deadline, dropping response");
                    self.stats.deadline_exceeded += 1;
                    return;
                }
                self.send_responses(&bundle, packet.listener_id, packet.source, fd);
            }
        }
    }

    /// Emits the finalized response plus any additional queued messages
    /// (RFC 5460 bulk leasequery streaming). UDP goes out on the matching
    /// inherited listener socket; a TCP connection's fd (passed from the
    /// master) is reconstructed and written to directly, then dropped,
    /// closing the connection once every queued message has gone out.
    fn send_responses(
        &mut self,
        bundle: &TransactionBundle,
        listener_id: usize,
        source: std::net::SocketAddr,
        fd: Option<OwnedFd>,
    ) {
        // the LeaseQuery family has no Advertise/Reply shape -- its entire
        // response is the queued `bundle.responses` messages, built by
        // `handlers::leasequery` via `add_response` rather than `finalize`.
        let mut messages = if bundle.response_kind().is_some() {
            let client_id = bundle::request_options(&bundle.request)
                .into_iter()
                .find(|o| matches!(o, DhcpOption::ClientId(_)));
            let server_id = DhcpOption::ServerId(ServerId { id: self.plan.server_duid.clone() });

            let finalized = match bundle.finalize(client_id, server_id) {
                Ok(msg) => msg,
                Err(e) => {
                    warn!(error = %e, "finalize failed, dropping response");
                    return;
                }
            };
            vec![finalized]
        } else {
            Vec::new()
        };
        messages.extend(bundle.responses.iter().cloned());

        match fd {
            Some(fd) => {
                let mut stream = std::net::TcpStream::from(fd);
                for msg in &messages {
                    let Some(bytes) = encode(msg) else { continue };
                    if let Err(e) = write_one_frame(&mut stream, &bytes) {
                        warn!(error = %e, "writing leasequery reply frame");
                        break;
                    }
                }
                // stream drops here, closing the connection; tell the
                // master so it can free this listener's connection slot.
                if let Err(e) =
                    ipc::send_message(&self.channel, &WorkerMessage::TcpClosed { listener_id }, None)
                {
                    warn!(error = %e, "reporting closed TCP connection");
                }
            }
            None => {
                let Some(listener) = self.listeners.get(listener_id) else {
                    warn!(listener_id, "reply listener vanished");
                    return;
                };
                for msg in &messages {
                    let Some(bytes) = encode(msg) else { continue };
                    if let Err(e) = listener.send_to(&bytes, source) {
                        warn!(error = %e, "sending reply");
                    }
                }
            }
        }

        self.stats.responded += 1;
    }
}

fn encode(msg: &Message) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    match msg.encode(&mut Encoder::new(&mut buf)) {
        Ok(()) => Some(buf),
        Err(e) => {
            warn!(error = %e, "encoding finalized response");
            None
        }
    }
}

/// Wraps a directly-contacted client's message in a single hop-0 relay
/// shell whose `peer_address` is the packet's source (link_address is left
/// unspecified -- there's no relay-supplied link to report).
fn synthetic_relay(packet: &IncomingPacket) -> RelayForw {
    let peer_address = match packet.source {
        std::net::SocketAddr::V6(addr) => *addr.ip(),
        std::net::SocketAddr::V4(_) => Ipv6Addr::UNSPECIFIED,
    };
    RelayForw {
        hop_count: 0,
        link_address: Ipv6Addr::UNSPECIFIED,
        peer_address,
        opts: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_relay_carries_source_as_peer_address() {
        let packet = IncomingPacket {
            listener_id: 0,
            interface: None,
            source: "[2001:db8::42]:546".parse().unwrap(),
            payload: Vec::new(),
            marks: Vec::new(),
        };
        let relay = synthetic_relay(&packet);
        assert_eq!(relay.hop_count, 0);
        assert_eq!(relay.peer_address, "2001:db8::42".parse::<Ipv6Addr>().unwrap());
    }
}
