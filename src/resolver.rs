//! The receive loop: a UDP socket, an optional multicast membership and one
//! dedicated worker thread that validates, decodes and hands records to the
//! consumer sink.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

use crate::errors::StartError;
use crate::models::Record;
use crate::parser::{decode_datagram, DecodeOptions, DecodeOutcome, MAX_DATAGRAM_SIZE};
use crate::stats::{ParserStats, StatsSnapshot};

/// How often the worker re-checks the stop flag while the socket is idle.
const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// How long `stop` waits before treating the worker as detached.
const JOIN_TIMEOUT: Duration = Duration::from_secs(2);
/// Pause after a transient socket read error.
const TRANSIENT_BACKOFF: Duration = Duration::from_millis(100);

/// Consumer of decoded records, invoked synchronously on the worker thread.
///
/// Any `FnMut(Record) + Send` closure is a sink. The worker calls it once
/// per decoded record, in receive order, and isolates panics so a broken
/// consumer cannot take the loop down.
pub trait RecordSink: Send {
    fn on_record(&mut self, record: Record);
}

impl<F> RecordSink for F
where
    F: FnMut(Record) + Send,
{
    fn on_record(&mut self, record: Record) {
        self(record)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
///
/// IPv4 multicast membership parameters
///
pub struct MulticastConfig {
    pub group: Ipv4Addr,
    pub interface: Ipv4Addr,
}

#[derive(Debug)]
struct Worker {
    stop: Arc<AtomicBool>,
    handle: thread::JoinHandle<()>,
    done_rx: mpsc::Receiver<()>,
}

#[derive(Debug)]
///
/// The feed parser: owns the socket, the receive worker and the counters
///
/// Configuration is written before `start` and read by the worker
/// thereafter; setters called while running only apply to the next start.
/// Several parsers may coexist, each with its own socket and thread.
///
pub struct Parser {
    multicast: Option<MulticastConfig>,
    options: DecodeOptions,
    stats: Arc<ParserStats>,
    worker: Option<Worker>,
    local_port: Option<u16>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            multicast: None,
            options: DecodeOptions::default(),
            stats: Arc::new(ParserStats::default()),
            worker: None,
            local_port: None,
        }
    }

    /// Join `group` on `interface` when the socket opens.
    pub fn set_multicast(&mut self, group: Ipv4Addr, interface: Ipv4Addr) {
        self.multicast = Some(MulticastConfig { group, interface });
    }

    /// Only decode bodies whose format code is in `codes`.
    pub fn set_allowed_format_codes<I>(&mut self, codes: I)
    where
        I: IntoIterator<Item = u8>,
    {
        self.options.allowed_formats = Some(codes.into_iter().collect());
    }

    /// Remove the allow-set; every format reaches the body dispatch again.
    pub fn clear_allowed_format_codes(&mut self) {
        self.options.allowed_formats = None;
    }

    /// Deliver valid frames without a typed decoder as [`Record::Unknown`].
    pub fn set_deliver_unknown(&mut self, deliver: bool) {
        self.options.deliver_unknown = deliver;
    }

    /// Also accept checksums that XOR the ESC byte in.
    pub fn set_lenient_checksum(&mut self, lenient: bool) {
        self.options.lenient_checksum = lenient;
    }

    /// Open the socket, reset the counters and spawn the receive worker.
    ///
    /// The sink runs synchronously on the worker; if it blocks, the kernel
    /// buffer fills and the OS drops the oldest datagrams, which this feed
    /// tolerates.
    pub fn start<S>(&mut self, port: u16, sink: S) -> Result<(), StartError>
    where
        S: RecordSink + 'static,
    {
        if self.worker.is_some() {
            return Err(StartError::AlreadyRunning);
        }

        let socket = bind_socket(port).map_err(StartError::BindFailed)?;
        if let Some(mc) = self.multicast {
            join_multicast(&socket, mc)
                .map_err(StartError::MulticastJoinFailed)?;
            log::info!(
                "joined multicast group {} on interface {}",
                mc.group,
                mc.interface
            );
        }
        // short read timeout so the worker observes the stop flag promptly
        socket
            .set_read_timeout(Some(POLL_INTERVAL))
            .map_err(StartError::BindFailed)?;
        let local_addr = socket.local_addr().map_err(StartError::BindFailed)?;

        self.stats.reset();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let stats = Arc::clone(&self.stats);
        let options = self.options.clone();
        let (done_tx, done_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("twse-recv".to_string())
            .spawn(move || {
                receive_loop(socket, options, stats, stop_flag, sink);
                let _ = done_tx.send(());
            })
            .expect("failed to spawn the receive worker");

        self.local_port = Some(local_addr.port());
        self.worker = Some(Worker {
            stop,
            handle,
            done_rx,
        });
        log::info!("parser started on {}", local_addr);
        Ok(())
    }

    /// Signal the worker and wait for it to exit. Idempotent; a no-op when
    /// the parser never started.
    ///
    /// The worker is joined with a bounded timeout; past it the thread is
    /// considered detached and its resources are released when it finally
    /// observes the flag.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        worker.stop.store(true, Ordering::Release);
        match worker.done_rx.recv_timeout(JOIN_TIMEOUT) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let _ = worker.handle.join();
                log::info!("parser stopped");
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "receive worker did not exit within {:?}, detaching",
                    JOIN_TIMEOUT
                );
            }
        }
        self.local_port = None;
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// The bound port while running; handy with port 0.
    pub fn local_port(&self) -> Option<u16> {
        self.local_port
    }

    /// Read-only snapshot of the monotonic counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl Drop for Parser {
    fn drop(&mut self) {
        self.stop();
    }
}

fn bind_socket(port: u16) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    socket.bind(&addr.into())?;
    Ok(socket.into())
}

fn join_multicast(socket: &UdpSocket, mc: MulticastConfig) -> io::Result<()> {
    socket.join_multicast_v4(&mc.group, &mc.interface)?;
    // loopback on, so a feed replayed locally is observable
    socket.set_multicast_loop_v4(true)?;
    Ok(())
}

fn receive_loop<S: RecordSink>(
    socket: UdpSocket,
    options: DecodeOptions,
    stats: Arc<ParserStats>,
    stop: Arc<AtomicBool>,
    mut sink: S,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    while !stop.load(Ordering::Acquire) {
        let len = match socket.recv_from(&mut buf) {
            Ok((len, _peer)) => len,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                continue;
            }
            Err(e) => {
                if stop.load(Ordering::Acquire) {
                    break;
                }
                stats.bump_transient_errors();
                log::warn!("socket read error: {}", e);
                thread::sleep(TRANSIENT_BACKOFF);
                continue;
            }
        };
        stats.bump_received();

        match decode_datagram(&buf[..len], &options) {
            Ok(DecodeOutcome::Record(record)) => {
                match catch_unwind(AssertUnwindSafe(|| sink.on_record(record)))
                {
                    Ok(()) => stats.bump_delivered(),
                    Err(_) => {
                        stats.bump_sink_panics();
                        log::error!("sink panicked on a record, resuming");
                    }
                }
            }
            Ok(DecodeOutcome::Filtered(code)) => {
                stats.bump_filtered();
                log::debug!("format 0x{:02x} outside the allow-set", code);
            }
            Ok(DecodeOutcome::UnknownDropped(code)) => {
                stats.bump_unknown_format();
                log::debug!("no decoder for format 0x{:02x}", code);
            }
            Err(e) => {
                stats.record_error(&e);
                log::debug!("dropped datagram: {}", e);
            }
        }
    }
    log::debug!("receive worker exited");
}
