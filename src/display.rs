use std::io::{self, Write};
use std::time::Duration;

use crate::inject::{Received, StopReason};
use crate::registry::SocketRegistry;

pub fn print_registry<W: Write>(out: &mut W, registry: &SocketRegistry) -> io::Result<()> {
    writeln!(out, "Found {} socket(s):", registry.len())?;
    for (i, entry) in registry.iter().enumerate() {
        writeln!(out, "[{}] {}", i, entry)?;
    }
    if registry.is_truncated() {
        writeln!(out, "Too many entries, truncated")?;
    }
    Ok(())
}

pub fn print_sent<W: Write>(out: &mut W, bytes: usize) -> io::Result<()> {
    writeln!(out, "Data sent: {} bytes", bytes)
}

pub fn print_file_sent<W: Write>(out: &mut W, bytes: u64) -> io::Result<()> {
    writeln!(out, "File sent: {} bytes", bytes)
}

/// Report how a receive ended. Returns false if it ended in an I/O error.
pub fn print_received<W: Write>(
    out: &mut W,
    received: &Received,
    idle_timeout: Duration,
) -> io::Result<bool> {
    let ok = match &received.reason {
        StopReason::Timeout => {
            writeln!(out, "Timeout expired ({} seconds)", idle_timeout.as_secs())?;
            true
        }
        StopReason::PeerClosed => {
            writeln!(out, "Connection closed by peer")?;
            true
        }
        StopReason::IoError(e) => {
            writeln!(out, "Receive error: {}", e)?;
            false
        }
    };
    writeln!(out, "Received {} bytes", received.bytes)?;
    Ok(ok)
}
