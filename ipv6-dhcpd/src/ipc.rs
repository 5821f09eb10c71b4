//! The worker IPC boundary: one `UnixDatagram` pair per worker,
//! bincode-framed. The kernel's socket buffer *is* the bounded work queue
//! -- a non-blocking send that returns `EWOULDBLOCK` is the overflow
//! signal, no separate queue data structure needed.
//!
//! The same channel carries both directions: the master pushes
//! [`WorkerMessage::Packet`] and [`WorkerMessage::Drain`]; a worker pushes
//! back [`WorkerMessage::StatsReport`] in response to
//! [`WorkerMessage::StatsRequest`], and unprompted, [`WorkerMessage::TcpClosed`]
//! once it's done with a bulk-leasequery connection. A `Packet` wrapping a
//! TCP connection additionally carries its fd as `SCM_RIGHTS` ancillary
//! data -- the one payload element that can't travel as plain bytes, since
//! a fd number is only meaningful within the process that owns it.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::net::UnixDatagram;

use nix::sys::socket::{recvmsg, sendmsg, ControlMessage, ControlMessageOwned, MsgFlags, UnixAddr};
use serde::{Deserialize, Serialize};

use crate::listeners::IncomingPacket;
use crate::stats::Stats;

const MAX_MESSAGE_BYTES: usize = 2048;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkerMessage {
    /// master -> worker: one unit of work.
    Packet(IncomingPacket),
    /// master -> worker: finish in-flight bundles, then exit.
    Drain,
    /// master -> worker: "send me your counters".
    StatsRequest,
    /// worker -> master, in response to `StatsRequest`.
    StatsReport(Stats),
    /// worker -> master: a TCP connection handed off by this listener has
    /// been closed, so its slot against `max-connections` is free again.
    TcpClosed { listener_id: usize },
}

/// Sends one message, with a TCP connection's fd (if any) riding along as
/// ancillary data. A non-blocking socket's `EWOULDBLOCK` surfaces straight
/// through to the caller as the work-queue overflow signal.
pub fn send_message(
    sock: &UnixDatagram,
    message: &WorkerMessage,
    fd: Option<RawFd>,
) -> io::Result<usize> {
    let payload =
        bincode::serialize(message).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let iov = [io::IoSlice::new(&payload)];
    let fds = fd.map(|fd| [fd]);
    let cmsgs: &[ControlMessage] = match &fds {
        Some(fds) => &[ControlMessage::ScmRights(fds)],
        None => &[],
    };
    sendmsg::<UnixAddr>(sock.as_raw_fd(), &iov, cmsgs, MsgFlags::empty(), None).map_err(io::Error::from)
}

/// Receives one message, reconstructing an attached fd (if any) as an
/// owned, close-on-drop handle.
pub fn recv_message(sock: &UnixDatagram) -> io::Result<(WorkerMessage, Option<OwnedFd>)> {
    let mut buf = vec![0u8; MAX_MESSAGE_BYTES];
    let mut iov = [io::IoSliceMut::new(&mut buf)];
    let mut cmsg_buffer = nix::cmsg_space!([RawFd; 1]);
    let msg = recvmsg::<UnixAddr>(sock.as_raw_fd(), &mut iov, Some(&mut cmsg_buffer), MsgFlags::empty())
        .map_err(io::Error::from)?;

    let fd = msg
        .cmsgs()
        .ok()
        .and_then(|mut cmsgs| {
            cmsgs.find_map(|cmsg| match cmsg {
                ControlMessageOwned::ScmRights(fds) => fds.first().copied(),
                _ => None,
            })
        })
        .map(|raw| unsafe { OwnedFd::from_raw_fd(raw) });

    let n = msg.bytes;
    let message = bincode::deserialize(&buf[..n])
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok((message, fd))
}
