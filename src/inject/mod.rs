//! Data operations on a descriptor borrowed from another process.
//!
//! Every operation attaches to the target (process handle plus duplicated
//! descriptor), performs exactly one send, file transfer, or receive, and
//! releases both before returning. Nothing about the target's descriptor is
//! modified: no socket options, no file status flags.

pub mod pidfd;

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd};
use std::path::Path;
use std::time::{Duration, Instant};

use log::debug;
use nix::errno::Errno;
use nix::poll::{self, PollFd, PollFlags, PollTimeout};
use nix::sys::socket::{self, MsgFlags};

pub use pidfd::{Attached, PidFd};

use crate::Error;

/// Size of the buffer used for file transfers and receives.
pub const CHUNK_SIZE: usize = 4096;

/// Idle timeout used by the command-line front ends unless overridden.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a receive finished.
#[derive(Debug)]
pub enum StopReason {
    /// Nothing arrived for the whole idle timeout.
    Timeout,
    /// The peer performed an orderly shutdown.
    PeerClosed,
    /// Waiting, reading, or writing the destination failed.
    IoError(io::Error),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Timeout => write!(f, "timeout"),
            StopReason::PeerClosed => write!(f, "connection closed by peer"),
            StopReason::IoError(e) => write!(f, "{}", e),
        }
    }
}

/// Outcome of a completed receive.
#[derive(Debug)]
pub struct Received {
    pub bytes: u64,
    pub reason: StopReason,
}

/// Send `data` through descriptor `fd` of process `pid` with a single
/// `send(2)` call and return how many bytes the transport accepted, which
/// may be fewer than `data.len()`.
pub fn send(pid: u64, fd: u64, data: &[u8]) -> Result<usize, Error> {
    let target = Attached::new(pid, fd)?;
    debug!("attached to pid {} fd {}", pid, fd);

    let sent = loop {
        match send_once(&target, data) {
            Err(Errno::EINTR) => continue,
            result => break result,
        }
    };
    sent.map_err(|e| Error::io_after(e.into(), 0))
}

/// Stream the contents of `path` through descriptor `fd` of process `pid`.
///
/// On a write failure the returned [`Error::Io`] carries the number of
/// bytes already transferred.
pub fn send_file(pid: u64, fd: u64, path: &Path) -> Result<u64, Error> {
    let mut file = File::open(path)?;
    let target = Attached::new(pid, fd)?;
    debug!(
        "attached to pid {} fd {}, sending {}",
        pid,
        fd,
        path.display()
    );

    let mut buf = [0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::io_after(e, total)),
        };
        send_chunk(&target, &buf[..n], &mut total)?;
    }
    Ok(total)
}

/// Write all of `chunk`, continuing after short writes.
fn send_chunk(target: &Attached, mut chunk: &[u8], total: &mut u64) -> Result<(), Error> {
    while !chunk.is_empty() {
        match send_once(target, chunk) {
            Ok(0) => {
                return Err(Error::io_after(
                    io::Error::from(io::ErrorKind::WriteZero),
                    *total,
                ))
            }
            Ok(n) => {
                *total += n as u64;
                chunk = &chunk[n..];
            }
            Err(Errno::EINTR) => {}
            Err(e) => return Err(Error::io_after(e.into(), *total)),
        }
    }
    Ok(())
}

fn send_once(target: &Attached, data: &[u8]) -> nix::Result<usize> {
    // MSG_NOSIGNAL: a reset peer must not raise SIGPIPE in this process.
    socket::send(target.as_raw_fd(), data, MsgFlags::MSG_NOSIGNAL)
}

/// Receive from descriptor `fd` of process `pid` until the peer closes the
/// connection, nothing arrives for `idle_timeout`, or an I/O error occurs.
///
/// Data is written to `destination` (created or truncated) or, without one,
/// to standard output, chunk by chunk as it arrives.
pub fn receive(
    pid: u64,
    fd: u64,
    destination: Option<&Path>,
    idle_timeout: Duration,
) -> Result<Received, Error> {
    let target = Attached::new(pid, fd)?;
    debug!("attached to pid {} fd {}", pid, fd);

    // Opened only once attached, so a bad pid/fd leaves the file alone.
    match destination {
        Some(path) => {
            let mut file = File::create(path)?;
            Ok(pump(&target, &mut file, idle_timeout))
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            Ok(pump(&target, &mut out, idle_timeout))
        }
    }
}

/// Like [`receive`], writing into any sink.
pub fn receive_into<W: Write>(
    pid: u64,
    fd: u64,
    out: &mut W,
    idle_timeout: Duration,
) -> Result<Received, Error> {
    let target = Attached::new(pid, fd)?;
    debug!("attached to pid {} fd {}", pid, fd);
    Ok(pump(&target, out, idle_timeout))
}

/// Copy from the duplicate to `out` until a stop condition is reached.
fn pump<W: Write>(source: &Attached, out: &mut W, idle_timeout: Duration) -> Received {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut bytes = 0u64;
    let mut deadline = deadline_after(idle_timeout);

    let reason = loop {
        match wait_readable(source, deadline) {
            Ok(true) => {}
            Ok(false) => break StopReason::Timeout,
            Err(e) => break StopReason::IoError(e),
        }

        // MSG_DONTWAIT: the target may have consumed the data since poll
        // returned, and we must not block in recv when it did.
        match socket::recv(source.as_raw_fd(), &mut buf, MsgFlags::MSG_DONTWAIT) {
            Ok(0) => break StopReason::PeerClosed,
            Ok(n) => {
                bytes += n as u64;
                if let Err(e) = out.write_all(&buf[..n]).and_then(|()| out.flush()) {
                    break StopReason::IoError(e);
                }
                deadline = deadline_after(idle_timeout);
            }
            Err(Errno::EAGAIN) | Err(Errno::EINTR) => {}
            Err(e) => break StopReason::IoError(e.into()),
        }
    };

    debug!("receive from pid {} finished: {} ({} bytes)", source.pid(), reason, bytes);
    Received { bytes, reason }
}

/// `None` when the timeout is too large to represent: wait forever.
fn deadline_after(idle_timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(idle_timeout)
}

/// Wait until `source` is readable. Returns `Ok(false)` if `deadline`
/// passes first.
fn wait_readable(source: &Attached, deadline: Option<Instant>) -> io::Result<bool> {
    loop {
        let timeout = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                PollTimeout::try_from(remaining).unwrap_or(PollTimeout::MAX)
            }
            None => PollTimeout::NONE,
        };
        let mut fds = [PollFd::new(source.as_fd(), PollFlags::POLLIN)];
        match poll::poll(&mut fds, timeout) {
            // A deadline beyond PollTimeout::MAX takes several polls.
            Ok(0) if deadline.is_some_and(|d| Instant::now() < d) => continue,
            Ok(0) => return Ok(false),
            Ok(_) => return Ok(true),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
