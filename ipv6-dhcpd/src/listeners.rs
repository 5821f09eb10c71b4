//! Listener sockets: per-interface multicast, unicast, and TCP (bulk
//! leasequery) -- plus [`IncomingPacket`], the (bytes, metadata) record
//! that's all that crosses the worker IPC boundary; it never carries the
//! socket itself.
//!
//! A `ListenerSet` is built once in the master, before it forks workers:
//! the master keeps one copy to read incoming datagrams from; each forked
//! worker gets its own [`ListenerSet::try_clone`] -- a `dup()` of every
//! underlying fd -- to send replies through.

use std::io;
use std::net::{Ipv6Addr, SocketAddr, SocketAddrV6};
use std::os::fd::{AsRawFd, FromRawFd};

use ipnet::Ipv6Net;
use mio::net::{TcpListener as MioTcpListener, UdpSocket as MioUdpSocket};
use serde::{Deserialize, Serialize};
use socket2::{Domain, Protocol, Socket, Type};

use crate::error::ListenerError;
use crate::plan::ListenerPlan;

/// RFC 8415 §7.1 `All_DHCP_Relay_Agents_and_Servers`.
pub const ALL_DHCP_RELAY_AGENTS_AND_SERVERS: Ipv6Addr =
    Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 1, 2);

/// One packet lifted off a listener socket, on its way to a worker. Framed
/// with `bincode` across the `UnixDatagram` that stands in for the bounded
/// work queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingPacket {
    /// index into the receiving process's `ListenerSet`; identifies which
    /// inherited socket a worker must reply on.
    pub listener_id: usize,
    pub interface: Option<String>,
    pub source: SocketAddr,
    pub payload: Vec<u8>,
    pub marks: Vec<String>,
}

/// A live listener socket plus the marks/metadata from its [`ListenerPlan`].
pub enum Listener {
    Udp {
        socket: MioUdpSocket,
        /// a second socket bound to the configured `reply-from` address,
        /// used for sends instead of `socket` when present -- `socket`
        /// itself stays bound to the wildcard address so it keeps
        /// receiving the joined multicast group. `None` means replies go
        /// out on `socket` directly and the kernel picks the source
        /// address via its normal outbound route selection, which for a
        /// link-scoped destination already lands on a link-local address
        /// of the matching interface in practice.
        reply_socket: Option<MioUdpSocket>,
        interface: Option<String>,
        marks: Vec<String>,
        listen_to_self: bool,
    },
    Tcp {
        socket: MioTcpListener,
        max_connections: usize,
        /// connections currently handed off to a worker and not yet
        /// reported closed (see [`Listener::tcp_connection_closed`]).
        active: usize,
        allow_from: Vec<Ipv6Net>,
        marks: Vec<String>,
    },
}

impl Listener {
    pub fn marks(&self) -> &[String] {
        match self {
            Listener::Udp { marks, .. } => marks,
            Listener::Tcp { marks, .. } => marks,
        }
    }

    pub fn interface(&self) -> Option<&str> {
        match self {
            Listener::Udp { interface, .. } => interface.as_deref(),
            Listener::Tcp { .. } => None,
        }
    }

    /// Registers this listener's readable interest with `poll`, keyed by
    /// `token` (conventionally the listener's index in the owning
    /// `ListenerSet`).
    pub fn register(&mut self, poll: &mio::Poll, token: mio::Token) -> io::Result<()> {
        use mio::Interest;
        match self {
            Listener::Udp { socket, .. } => poll.registry().register(socket, token, Interest::READABLE),
            Listener::Tcp { socket, .. } => poll.registry().register(socket, token, Interest::READABLE),
        }
    }

    /// Called by the master when a worker reports a TCP connection it held
    /// has closed, freeing its slot against `max-connections`.
    pub fn tcp_connection_closed(&mut self) {
        if let Listener::Tcp { active, .. } = self {
            *active = active.saturating_sub(1);
        }
    }

    /// Reads every datagram currently available (non-blocking), handing
    /// each to `on_packet`. For a TCP listener, accepts every pending
    /// connection and reads one length-prefixed frame from each; the
    /// accepted connection is handed back alongside its packet so the
    /// master can pass its fd on to whichever worker ends up owning the
    /// transaction -- that worker holds the connection for the duration
    /// of the leasequery. A connection beyond `max-connections` is closed
    /// immediately without being read; `idle` bounds how long the header+
    /// body read may block before the connection is abandoned.
    pub fn drain(
        &mut self,
        listener_id: usize,
        idle: std::time::Duration,
        on_packet: &mut dyn FnMut(IncomingPacket, Option<std::net::TcpStream>),
    ) -> io::Result<()> {
        match self {
            Listener::Udp { socket, interface, marks, listen_to_self, .. } => loop {
                let mut buf = [0u8; 1500];
                match socket.recv_from(&mut buf) {
                    Ok((n, src)) => {
                        if !*listen_to_self && is_loopback_source(&src) {
                            continue;
                        }
                        on_packet(
                            IncomingPacket {
                                listener_id,
                                interface: interface.clone(),
                                source: src,
                                payload: buf[..n].to_vec(),
                                marks: marks.clone(),
                            },
                            None,
                        );
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                    Err(e) => return Err(e),
                }
            },
            Listener::Tcp { socket, max_connections, active, allow_from, marks } => loop {
                match socket.accept() {
                    Ok((stream, peer)) => {
                        if !allow_from.is_empty() && !peer_allowed(&peer, allow_from) {
                            continue;
                        }
                        if *active >= *max_connections {
                            debug_assert!(*active == *max_connections);
                            continue;
                        }
                        // hand the accepted connection's I/O to a blocking
                        // std socket just long enough to read the framing
                        // header + body synchronously; the fd itself is
                        // unaffected, and the same std socket is what gets
                        // passed on to the chosen worker afterward.
                        use std::os::fd::{FromRawFd, IntoRawFd};
                        let mut stream = unsafe { std::net::TcpStream::from_raw_fd(stream.into_raw_fd()) };
                        stream.set_nonblocking(false)?;
                        stream.set_read_timeout(Some(idle))?;
                        stream.set_write_timeout(Some(idle))?;
                        match read_one_frame(&mut stream) {
                            Ok(Some(payload)) => {
                                *active += 1;
                                on_packet(
                                    IncomingPacket {
                                        listener_id,
                                        interface: None,
                                        source: peer,
                                        payload,
                                        marks: marks.clone(),
                                    },
                                    Some(stream),
                                )
                            }
                            Ok(None) | Err(_) => continue,
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                    Err(e) => return Err(e),
                }
            },
        }
    }

    /// Sends a reply on this listener's socket, used by a worker holding
    /// its own inherited copy.
    pub fn send_to(&self, buf: &[u8], dest: SocketAddr) -> io::Result<usize> {
        match self {
            Listener::Udp { socket, reply_socket, .. } => {
                reply_socket.as_ref().unwrap_or(socket).send_to(buf, dest)
            }
            Listener::Tcp { .. } => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "TCP replies go out on the held connection, not the listening socket",
            )),
        }
    }

    /// Duplicates the underlying socket fd, giving the caller an
    /// independent, worker-local handle to the same bound/joined socket.
    /// The master reads packets on its own copy; each worker gets one of
    /// these for sending replies.
    pub fn try_clone(&self) -> io::Result<Listener> {
        match self {
            Listener::Udp { socket, reply_socket, interface, marks, listen_to_self } => {
                let dup = nix::unistd::dup(socket.as_raw_fd())?;
                let std_socket = unsafe { std::net::UdpSocket::from_raw_fd(dup) };
                let reply_socket = reply_socket
                    .as_ref()
                    .map(|s| -> io::Result<MioUdpSocket> {
                        let dup = nix::unistd::dup(s.as_raw_fd())?;
                        Ok(MioUdpSocket::from_std(unsafe {
                            std::net::UdpSocket::from_raw_fd(dup)
                        }))
                    })
                    .transpose()?;
                Ok(Listener::Udp {
                    socket: MioUdpSocket::from_std(std_socket),
                    reply_socket,
                    interface: interface.clone(),
                    marks: marks.clone(),
                    listen_to_self: *listen_to_self,
                })
            }
            Listener::Tcp { socket, max_connections, allow_from, marks, .. } => {
                let dup = nix::unistd::dup(socket.as_raw_fd())?;
                let std_listener = unsafe { std::net::TcpListener::from_raw_fd(dup) };
                std_listener.set_nonblocking(true)?;
                Ok(Listener::Tcp {
                    socket: MioTcpListener::from_std(std_listener),
                    max_connections: *max_connections,
                    active: 0,
                    allow_from: allow_from.clone(),
                    marks: marks.clone(),
                })
            }
        }
    }
}

fn is_loopback_source(addr: &SocketAddr) -> bool {
    match addr {
        SocketAddr::V6(a) => a.ip().is_loopback(),
        SocketAddr::V4(a) => a.ip().is_loopback(),
    }
}

fn peer_allowed(peer: &SocketAddr, allow_from: &[Ipv6Net]) -> bool {
    let SocketAddr::V6(v6) = peer else {
        return false;
    };
    allow_from.iter().any(|net| net.contains(v6.ip()))
}

/// 2-byte network-order length prefix + payload, the TCP listener's framing.
/// Generic over the stream type since a connection is read as a plain
/// `mio::net::TcpStream` in the master (accept) but reconstructed as a
/// `std::net::TcpStream` in the worker that inherits its fd.
fn read_one_frame<S: io::Read>(stream: &mut S) -> io::Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 2];
    if let Err(e) = stream.read_exact(&mut len_buf) {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            return Ok(None);
        }
        return Err(e);
    }
    let len = u16::from_be_bytes(len_buf) as usize;
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload)?;
    Ok(Some(payload))
}

/// Writes one length-prefixed frame, the TCP counterpart to
/// [`read_one_frame`] used when a worker streams bulk-leasequery replies.
pub fn write_one_frame<S: io::Write>(stream: &mut S, payload: &[u8]) -> io::Result<()> {
    let len = u16::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "frame too large"))?;
    stream.write_all(&len.to_be_bytes())?;
    stream.write_all(payload)?;
    Ok(())
}

pub struct ListenerSet {
    listeners: Vec<Listener>,
}

impl ListenerSet {
    /// Opens every configured listener, in order -- a listener's index in
    /// this vector is its IPC-stable id, the handle workers use to refer
    /// back to the socket they should reply on.
    pub fn open(plans: &[ListenerPlan]) -> Result<Self, ListenerError> {
        let listeners = plans.iter().map(open_one).collect::<Result<_, _>>()?;
        Ok(Self { listeners })
    }

    pub fn get(&self, id: usize) -> Option<&Listener> {
        self.listeners.get(id)
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut Listener> {
        self.listeners.get_mut(id)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut Listener)> {
        self.listeners.iter_mut().enumerate()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Duplicates every listener socket, for handing an independent set to
    /// a newly forked worker.
    pub fn try_clone(&self) -> io::Result<ListenerSet> {
        let listeners = self.listeners.iter().map(Listener::try_clone).collect::<io::Result<_>>()?;
        Ok(ListenerSet { listeners })
    }
}

fn open_one(plan: &ListenerPlan) -> Result<Listener, ListenerError> {
    match plan {
        ListenerPlan::Multicast { interface, reply_from, marks, listen_to_self } => {
            let socket = bind_udp(SocketAddrV6::new(
                Ipv6Addr::UNSPECIFIED,
                dhcproto::v6::SERVER_PORT,
                0,
                0,
            ))?;
            let if_index = nix::net::if_::if_nametoindex(interface.as_str()).map_err(|source| {
                ListenerError::Multicast {
                    interface: interface.clone(),
                    source: io::Error::from(source),
                }
            })?;
            socket
                .join_multicast_v6(&ALL_DHCP_RELAY_AGENTS_AND_SERVERS, if_index)
                .map_err(|source| ListenerError::Multicast {
                    interface: interface.clone(),
                    source,
                })?;
            let socket = to_mio_udp(socket)?;
            // `reply_from` pins replies to a specific link-local source on
            // this interface rather than whatever the kernel's outbound
            // route selection would otherwise pick.
            let reply_socket = match reply_from {
                Some(addr) => {
                    let bound = bind_udp(SocketAddrV6::new(*addr, 0, 0, if_index))?;
                    Some(to_mio_udp(bound)?)
                }
                None => None,
            };
            Ok(Listener::Udp {
                socket,
                reply_socket,
                interface: Some(interface.clone()),
                marks: marks.clone(),
                listen_to_self: *listen_to_self,
            })
        }
        ListenerPlan::Unicast { address, interface, marks } => {
            let socket = bind_udp(SocketAddrV6::new(*address, dhcproto::v6::SERVER_PORT, 0, 0))?;
            let socket = to_mio_udp(socket)?;
            Ok(Listener::Udp {
                socket,
                reply_socket: None,
                interface: interface.clone(),
                marks: marks.clone(),
                listen_to_self: true,
            })
        }
        ListenerPlan::Tcp { address, max_connections, allow_from, marks } => {
            let domain = if address.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
            let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))
                .map_err(|source| bind_error(*address, source))?;
            socket.set_reuse_address(true).map_err(|source| bind_error(*address, source))?;
            socket.bind(&(*address).into()).map_err(|source| bind_error(*address, source))?;
            socket.listen(128).map_err(|source| bind_error(*address, source))?;
            socket.set_nonblocking(true).map_err(|source| bind_error(*address, source))?;
            let socket: std::net::TcpListener = socket.into();
            let socket = MioTcpListener::from_std(socket);
            Ok(Listener::Tcp {
                socket,
                max_connections: *max_connections,
                active: 0,
                allow_from: allow_from.clone(),
                marks: marks.clone(),
            })
        }
    }
}

fn bind_udp(addr: SocketAddrV6) -> Result<Socket, ListenerError> {
    let socket = Socket::new(Domain::IPV6, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|source| bind_error(addr.into(), source))?;
    socket.set_reuse_address(true).map_err(|source| bind_error(addr.into(), source))?;
    socket.set_only_v6(true).map_err(|source| bind_error(addr.into(), source))?;
    socket.bind(&addr.into()).map_err(|source| bind_error(addr.into(), source))?;
    Ok(socket)
}

fn to_mio_udp(socket: Socket) -> Result<MioUdpSocket, ListenerError> {
    socket
        .set_nonblocking(true)
        .map_err(ListenerError::Io)?;
    let socket: std::net::UdpSocket = socket.into();
    Ok(MioUdpSocket::from_std(socket))
}

fn bind_error(addr: SocketAddr, source: io::Error) -> ListenerError {
    ListenerError::Bind { addr: addr.to_string(), source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_allowed_checks_prefix_membership() {
        let allow = vec!["2001:db8::/32".parse().unwrap()];
        let inside: SocketAddr = "[2001:db8::1]:1234".parse().unwrap();
        let outside: SocketAddr = "[2001:dead::1]:1234".parse().unwrap();
        assert!(peer_allowed(&inside, &allow));
        assert!(!peer_allowed(&outside, &allow));
    }
}
