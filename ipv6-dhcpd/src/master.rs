//! The master process: opens every listener, drops privileges,
//! forks a pool of workers, then loops reading packets off listener
//! sockets, dispatching them round-robin to workers over a
//! [`crate::ipc`] channel, and servicing the control socket and
//! reload/shutdown signals.
//!
//! The master never runs the pipeline itself -- it only reads, dispatches,
//! and (for the control surface) aggregates stats a worker reports back.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader};
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd};
use std::os::unix::net::{UnixDatagram, UnixListener as StdUnixListener, UnixStream as StdUnixStream};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use mio::net::UnixListener as MioUnixListener;
use mio::{Events, Interest, Poll, Token};
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};
use signal_hook::consts::signal::{SIGCHLD, SIGHUP, SIGINT, SIGTERM};
use signal_hook_mio::v1_0::Signals;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::control::{self, Command, Response};
use crate::error::MasterError;
use crate::ipc::{self, WorkerMessage};
use crate::listeners::ListenerSet;
use crate::plan::Plan;
use crate::privilege;
use crate::stats::{Stats, StatsTable};
use crate::worker::Worker;

const CONTROL_TOKEN: Token = Token(usize::MAX - 1);
const SIGNALS_TOKEN: Token = Token(usize::MAX - 2);
/// Worker channel tokens start here, well above any realistic listener
/// count, so `Token(id)` below `WORKER_TOKEN_BASE` always means a listener.
const WORKER_TOKEN_BASE: usize = 1 << 20;
const POLL_TICK: Duration = Duration::from_millis(500);
const STATS_RECV_TIMEOUT_MS: i32 = 300;

/// Synthetic worker id the master reports its own counters under: queue
/// overflow and worker-restart counts are observed by the master itself,
/// not by any one worker.
const MASTER_STATS_SLOT: u32 = u32::MAX;

struct WorkerSlot {
    id: u32,
    pid: Pid,
    channel: UnixDatagram,
}

/// Sliding-window crash counter.
struct Watchdog {
    window: Duration,
    max_exceptions: u32,
    crashes: VecDeque<Instant>,
}

impl Watchdog {
    fn new(window_secs: u64, max_exceptions: u32) -> Self {
        Watchdog { window: Duration::from_secs(window_secs.max(1)), max_exceptions, crashes: VecDeque::new() }
    }

    /// Records a crash at `now`; returns `true` once the window holds more
    /// than `max_exceptions` of them.
    fn record_crash(&mut self, now: Instant) -> bool {
        self.crashes.push_back(now);
        while let Some(&front) = self.crashes.front() {
            if now.duration_since(front) > self.window {
                self.crashes.pop_front();
            } else {
                break;
            }
        }
        self.crashes.len() as u32 > self.max_exceptions
    }
}

pub struct Master {
    config_path: PathBuf,
    plan: Plan,
    listeners: ListenerSet,
    workers: Vec<WorkerSlot>,
    next_worker: usize,
    watchdog: Watchdog,
    queue_overflow: u64,
    worker_restarts: u64,
    control_listener: MioUnixListener,
    signals: Signals,
    poll: Poll,
    shutdown_requested: bool,
    reload_requested: bool,
    watchdog_tripped: bool,
}

impl Master {
    /// Opens listeners, writes the pid file, binds the control socket,
    /// drops privileges, and forks the initial worker pool. Everything
    /// that can fail does so here, before any worker runs.
    pub fn bootstrap(config_path: PathBuf, config: Config) -> Result<Self, MasterError> {
        let plan = Plan::from_config(&config)?;
        Self::bootstrap_from_plan(config_path, plan)
    }

    fn bootstrap_from_plan(config_path: PathBuf, plan: Plan) -> Result<Self, MasterError> {
        let mut listeners = ListenerSet::open(&plan.listeners)?;

        write_pid_file(&plan.pid_file)?;
        let mut control_listener = bind_control_socket(&plan.control_socket)?;

        privilege::drop_privileges(plan.user.as_deref(), plan.group.as_deref())?;

        let poll = Poll::new().map_err(MasterError::Io)?;

        let mut workers = Vec::with_capacity(plan.worker_count);
        for id in 0..plan.worker_count as u32 {
            let slot = spawn_worker(id, &plan, &listeners)?;
            register_worker_channel(&poll, &slot).map_err(MasterError::Io)?;
            workers.push(slot);
        }

        // the master reads on its own listener set; register each socket.
        for (id, listener) in listeners.iter_mut() {
            listener.register(&poll, Token(id)).map_err(MasterError::Io)?;
        }
        poll.registry()
            .register(&mut control_listener, CONTROL_TOKEN, Interest::READABLE)
            .map_err(MasterError::Io)?;

        let mut signals = Signals::new([SIGTERM, SIGINT, SIGHUP, SIGCHLD]).map_err(MasterError::Io)?;
        poll.registry()
            .register(&mut signals, SIGNALS_TOKEN, Interest::READABLE)
            .map_err(MasterError::Io)?;

        let watchdog = Watchdog::new(plan.watchdog_window_secs, plan.watchdog_max_exceptions);

        info!(workers = workers.len(), listeners = listeners.len(), "ipv6-dhcpd started");

        Ok(Master {
            config_path,
            plan,
            listeners,
            workers,
            next_worker: 0,
            watchdog,
            queue_overflow: 0,
            worker_restarts: 0,
            control_listener,
            signals,
            poll,
            shutdown_requested: false,
            reload_requested: false,
            watchdog_tripped: false,
        })
    }

    /// The master's event loop: reads listener sockets, services the
    /// control socket, and reacts to signals, until told to shut down.
    pub fn run(&mut self) -> Result<(), MasterError> {
        let mut events = Events::with_capacity(128);
        loop {
            match self.poll.poll(&mut events, Some(POLL_TICK)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(MasterError::Io(e)),
            }

            for event in events.iter() {
                match event.token() {
                    CONTROL_TOKEN => self.accept_control(),
                    SIGNALS_TOKEN => self.handle_signals(),
                    Token(id) if id >= WORKER_TOKEN_BASE => {
                        self.drain_worker_channel(id - WORKER_TOKEN_BASE)
                    }
                    Token(id) => self.drain_listener(id),
                }
            }

            // a missed SIGCHLD (races with registration, or coalesced
            // delivery) must not leave a dead worker unreplaced forever.
            self.reap_children();

            if self.watchdog_tripped {
                error!("exception watchdog tripped, terminating");
                self.shutdown(false);
                return Err(MasterError::Io(io::Error::other("watchdog tripped")));
            }

            if self.reload_requested {
                self.reload_requested = false;
                if let Err(e) = self.perform_reload() {
                    error!(error = %e, "reload failed, keeping running configuration");
                }
            }

            if self.shutdown_requested {
                self.shutdown(true);
                return Ok(());
            }
        }
    }

    fn drain_listener(&mut self, id: usize) {
        let Some(listener) = self.listeners.get_mut(id) else {
            return;
        };
        let workers = self.workers.len();
        if workers == 0 {
            return;
        }
        let idle = Duration::from_millis(self.plan.tcp_idle_ms);
        let mut dispatched = Vec::new();
        let result = listener.drain(id, idle, &mut |packet, fd| dispatched.push((packet, fd)));
        if let Err(e) = result {
            warn!(listener = id, error = %e, "reading from listener");
        }
        for (packet, fd) in dispatched {
            self.dispatch(packet, fd);
        }
    }

    /// Services an unsolicited message pushed by a worker outside the
    /// request/response stats exchange -- currently only
    /// [`WorkerMessage::TcpClosed`], reported when a worker finishes with a
    /// bulk-leasequery connection so its listener's `max-connections` slot
    /// frees up.
    fn drain_worker_channel(&mut self, worker_id: usize) {
        let Some(slot) = self.workers.iter().find(|w| w.id as usize == worker_id) else {
            return;
        };
        loop {
            match ipc::recv_message(&slot.channel) {
                Ok((WorkerMessage::TcpClosed { listener_id }, _)) => {
                    if let Some(listener) = self.listeners.get_mut(listener_id) {
                        listener.tcp_connection_closed();
                    }
                }
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) => {
                    warn!(worker = worker_id, error = %e, "reading worker channel");
                    return;
                }
            }
        }
    }

    fn dispatch(&mut self, packet: crate::listeners::IncomingPacket, fd: Option<std::net::TcpStream>) {
        if self.workers.is_empty() {
            return;
        }
        let raw_fd = fd.map(|s| s.into_raw_fd());
        let idx = self.next_worker;
        self.next_worker = (self.next_worker + 1) % self.workers.len();
        let slot = &self.workers[idx];
        match ipc::send_message(&slot.channel, &WorkerMessage::Packet(packet), raw_fd) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                self.queue_overflow += 1;
                debug!(worker = slot.id, "work queue full, dropping packet");
            }
            Err(e) => {
                warn!(worker = slot.id, error = %e, "dispatching packet");
            }
        }
        if let Some(raw) = raw_fd {
            // the worker has its own dup via SCM_RIGHTS (or, on failure,
            // there is no reader left at all) -- either way the master's
            // copy must be closed so the connection doesn't linger.
            unsafe { drop(OwnedFd::from_raw_fd(raw)) };
        }
    }

    fn handle_signals(&mut self) {
        for signal in self.signals.pending() {
            match signal {
                SIGTERM | SIGINT => {
                    info!(?signal, "shutdown signal received");
                    self.shutdown_requested = true;
                }
                SIGHUP => {
                    info!("reload signal received");
                    self.reload_requested = true;
                }
                SIGCHLD => self.reap_children(),
                _ => {}
            }
        }
    }

    /// Non-blocking reap of any exited/crashed worker; replaces it unless
    /// the watchdog has tripped.
    fn reap_children(&mut self) {
        loop {
            match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) | Err(nix::errno::Errno::ECHILD) => return,
                Ok(WaitStatus::Exited(pid, code)) => self.on_worker_gone(pid, format!("exited({code})")),
                Ok(WaitStatus::Signaled(pid, sig, _)) => {
                    self.on_worker_gone(pid, format!("killed by {sig:?}"))
                }
                Ok(_) => continue,
                Err(e) => {
                    warn!(error = %e, "waitpid");
                    return;
                }
            }
        }
    }

    fn on_worker_gone(&mut self, pid: Pid, reason: String) {
        let Some(idx) = self.workers.iter().position(|w| w.pid == pid) else {
            return;
        };
        let slot = self.workers.remove(idx);
        warn!(worker = slot.id, pid = %pid, reason, "worker gone");
        self.worker_restarts += 1;

        if self.watchdog.record_crash(Instant::now()) {
            self.watchdog_tripped = true;
            return;
        }

        match spawn_worker(slot.id, &self.plan, &self.listeners) {
            Ok(new_slot) => {
                if let Err(e) = register_worker_channel(&self.poll, &new_slot) {
                    error!(worker = new_slot.id, error = %e, "registering respawned worker channel");
                }
                self.workers.insert(idx, new_slot)
            }
            Err(e) => error!(worker = slot.id, error = %e, "failed to respawn worker"),
        }
    }

    fn accept_control(&mut self) {
        loop {
            match self.control_listener.accept() {
                Ok((stream, _addr)) => {
                    let raw = stream.into_raw_fd();
                    let mut std_stream = unsafe { StdUnixStream::from_raw_fd(raw) };
                    if let Err(e) = std_stream.set_nonblocking(false) {
                        warn!(error = %e, "control connection set_nonblocking");
                        continue;
                    }
                    self.service_control_connection(std_stream);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) => {
                    warn!(error = %e, "accepting control connection");
                    return;
                }
            }
        }
    }

    fn service_control_connection(&mut self, stream: StdUnixStream) {
        let mut reader = BufReader::new(&stream);
        let mut line = String::new();
        if let Err(e) = reader.read_line(&mut line) {
            warn!(error = %e, "reading control command");
            return;
        }
        if line.is_empty() {
            return;
        }
        let response = match Command::parse(&line) {
            Ok(cmd) => self.handle_command(cmd),
            Err(e) => Response::Err(e.to_string()),
        };
        let mut writer = &stream;
        if let Err(e) = response.write_to(&mut writer) {
            warn!(error = %e, "writing control response");
        }
    }

    fn handle_command(&mut self, cmd: Command) -> Response {
        match cmd {
            Command::Help => Response::Ok(control::HELP_TEXT.to_string()),
            Command::Shutdown => {
                self.shutdown_requested = true;
                Response::Ok("shutting down".to_string())
            }
            Command::Reload => match self.perform_reload() {
                Ok(()) => Response::Ok("reloaded".to_string()),
                Err(e) => Response::Err(e.to_string()),
            },
            Command::Stats => {
                let table = self.collect_stats();
                Response::Block(table.total().to_lines())
            }
            Command::StatsJson => {
                let table = self.collect_stats();
                match serde_json::to_string(&table.total()) {
                    Ok(s) => Response::Ok(s),
                    Err(e) => Response::Err(e.to_string()),
                }
            }
        }
    }

    /// Queries every live worker for a stats snapshot, folding in the
    /// master's own queue-overflow/worker-restart counters under a
    /// synthetic slot since those are observed here, not in any worker.
    fn collect_stats(&mut self) -> StatsTable {
        let mut table = StatsTable::default();
        for slot in &self.workers {
            if let Err(e) = ipc::send_message(&slot.channel, &WorkerMessage::StatsRequest, None) {
                warn!(worker = slot.id, error = %e, "requesting stats");
                continue;
            }
            match recv_with_timeout(&slot.channel, STATS_RECV_TIMEOUT_MS) {
                Ok(Some((WorkerMessage::StatsReport(stats), _))) => table.update(slot.id, stats),
                Ok(Some(_)) => {}
                Ok(None) => warn!(worker = slot.id, "stats request timed out"),
                Err(e) => warn!(worker = slot.id, error = %e, "receiving stats"),
            }
        }
        table.update(
            MASTER_STATS_SLOT,
            Stats {
                queue_overflow: self.queue_overflow,
                worker_restarts: self.worker_restarts,
                ..Default::default()
            },
        );
        table
    }

    /// Re-parses the configuration, compiles a new [`Plan`], drains the
    /// current workers, and forks a fresh pool from the new plan. Listener
    /// sockets are left untouched -- in-flight
    /// bundles on the old pipeline finish on their own; only new packets
    /// see the new one. A failure here leaves everything as it was.
    fn perform_reload(&mut self) -> Result<(), MasterError> {
        let config = Config::from_path(&self.config_path)?;
        let new_plan = Plan::from_config(&config)?;

        let old_workers = std::mem::take(&mut self.workers);
        drain_workers(old_workers, Duration::from_millis(self.plan.shutdown_drain_ms));

        let mut new_workers = Vec::with_capacity(new_plan.worker_count);
        for id in 0..new_plan.worker_count as u32 {
            new_workers.push(spawn_worker(id, &new_plan, &self.listeners)?);
        }
        self.workers = new_workers;
        self.next_worker = 0;
        self.watchdog = Watchdog::new(new_plan.watchdog_window_secs, new_plan.watchdog_max_exceptions);
        self.plan = new_plan;
        info!("configuration reloaded");
        Ok(())
    }

    /// Closes listeners (no new work accepted), drains workers up to the
    /// configured deadline, force-kills stragglers, and unlinks the pid
    /// file and control socket.
    fn shutdown(&mut self, graceful: bool) {
        info!(graceful, "shutting down");
        let workers = std::mem::take(&mut self.workers);
        drain_workers(workers, Duration::from_millis(self.plan.shutdown_drain_ms));
        let _ = std::fs::remove_file(&self.plan.pid_file);
        let _ = std::fs::remove_file(&self.plan.control_socket);
    }
}

fn drain_workers(workers: Vec<WorkerSlot>, deadline: Duration) {
    for slot in &workers {
        let _ = ipc::send_message(&slot.channel, &WorkerMessage::Drain, None);
    }
    let started = Instant::now();
    let mut remaining: Vec<Pid> = workers.iter().map(|w| w.pid).collect();
    while !remaining.is_empty() && started.elapsed() < deadline {
        remaining.retain(|&pid| match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => true,
            Ok(_) => false,
            Err(_) => false,
        });
        if !remaining.is_empty() {
            std::thread::sleep(Duration::from_millis(20));
        }
    }
    for pid in remaining {
        warn!(pid = %pid, "worker did not drain in time, killing");
        let _ = kill(pid, Signal::SIGKILL);
        let _ = waitpid(pid, None);
    }
}

/// Registers a worker's half of the IPC channel for readable events, keyed
/// by `WORKER_TOKEN_BASE + slot.id` so the master's event loop can react to
/// a message the worker pushed outside the stats request/response exchange
/// (which instead polls the raw fd directly, see [`recv_with_timeout`]).
fn register_worker_channel(poll: &Poll, slot: &WorkerSlot) -> io::Result<()> {
    let mut source = mio::unix::SourceFd(&slot.channel.as_raw_fd());
    poll.registry().register(
        &mut source,
        Token(WORKER_TOKEN_BASE + slot.id as usize),
        Interest::READABLE,
    )
}

/// Forks one worker process. The child builds its own [`Worker`] from a
/// duped [`ListenerSet`] and its half of a fresh `UnixDatagram` pair, runs
/// it to completion, and exits; the parent just records the pid and its
/// half of the channel.
fn spawn_worker(id: u32, plan: &Plan, listeners: &ListenerSet) -> Result<WorkerSlot, MasterError> {
    let (master_half, worker_half) = UnixDatagram::pair().map_err(MasterError::Io)?;
    size_channel_buffer(&master_half, plan.queue_depth);
    size_channel_buffer(&worker_half, plan.queue_depth);

    match unsafe { fork() }.map_err(MasterError::Fork)? {
        ForkResult::Parent { child } => {
            master_half.set_nonblocking(true).map_err(MasterError::Io)?;
            Ok(WorkerSlot { id, pid: child, channel: master_half })
        }
        ForkResult::Child => {
            drop(master_half);
            let listeners = match listeners.try_clone() {
                Ok(l) => l,
                Err(e) => {
                    error!(worker = id, error = %e, "cloning listeners in worker");
                    std::process::exit(2);
                }
            };
            let exit_code = match Worker::new(id, plan.clone(), listeners, worker_half) {
                Ok(mut worker) => match worker.run() {
                    Ok(()) => 0,
                    Err(e) => {
                        error!(worker = id, error = %e, "worker crashed");
                        1
                    }
                },
                Err(e) => {
                    error!(worker = id, error = %e, "worker failed to start");
                    2
                }
            };
            std::process::exit(exit_code);
        }
    }
}

/// Sizes the IPC socket's buffers so the kernel's own buffering enforces
/// the configured queue depth: ~1500 bytes (one max-size UDP datagram)
/// per queued packet. Best-effort --
/// a failure here just means the OS default stands in instead.
fn size_channel_buffer(sock: &UnixDatagram, queue_depth: usize) {
    use nix::sys::socket::{setsockopt, sockopt};
    use std::os::fd::BorrowedFd;
    let bytes = queue_depth.max(1) * 1500;
    let borrowed = unsafe { BorrowedFd::borrow_raw(sock.as_raw_fd()) };
    if let Err(e) = setsockopt(&borrowed, sockopt::SndBuf, &bytes) {
        debug!(error = %e, "setting IPC socket send buffer size");
    }
    if let Err(e) = setsockopt(&borrowed, sockopt::RcvBuf, &bytes) {
        debug!(error = %e, "setting IPC socket recv buffer size");
    }
}

fn write_pid_file(path: &std::path::Path) -> Result<(), MasterError> {
    std::fs::write(path, format!("{}\n", std::process::id())).map_err(|source| MasterError::PidFile {
        path: path.display().to_string(),
        source,
    })
}

fn bind_control_socket(path: &std::path::Path) -> Result<MioUnixListener, MasterError> {
    if path.exists() {
        let _ = std::fs::remove_file(path);
    }
    let listener = StdUnixListener::bind(path).map_err(|source| MasterError::ControlSocket {
        path: path.display().to_string(),
        source,
    })?;
    listener.set_nonblocking(true).map_err(|source| MasterError::ControlSocket {
        path: path.display().to_string(),
        source,
    })?;
    Ok(MioUnixListener::from_std(listener))
}

/// Receives one message with a bounded wait, used for stats collection
/// where the master can't afford to block indefinitely on a worker that
/// never replies.
fn recv_with_timeout(
    sock: &UnixDatagram,
    timeout_ms: i32,
) -> io::Result<Option<(WorkerMessage, Option<OwnedFd>)>> {
    use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
    let fd = sock.as_raw_fd();
    let borrowed = unsafe { std::os::fd::BorrowedFd::borrow_raw(fd) };
    let mut fds = [PollFd::new(&borrowed, PollFlags::POLLIN)];
    let timeout: PollTimeout = timeout_ms.into();
    match poll(&mut fds, timeout) {
        Ok(0) => Ok(None),
        Ok(_) => ipc::recv_message(sock).map(Some),
        Err(e) => Err(io::Error::from(e)),
    }
}
