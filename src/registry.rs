use std::fmt;
use std::net::SocketAddr;

use crate::proc::ProcName;

/// Number of entries a registry holds unless told otherwise.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Text shown in place of an address that could not be resolved.
pub const UNRESOLVED: &str = "?";

/// One socket descriptor found during a scan.
///
/// `pid` and `fd` are coordinates into live kernel state at scan time. The
/// kernel recycles both, so an entry should only be acted on shortly after
/// the scan that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketEntry {
    pub pid: u64,
    pub fd: u64,
    pub name: ProcName,
    pub inode: u64,
    pub local: Option<SocketAddr>,
    pub remote: Option<SocketAddr>,
}

impl SocketEntry {
    /// Remote address as text, or [`UNRESOLVED`].
    pub fn remote_addr(&self) -> String {
        self.remote
            .map_or_else(|| UNRESOLVED.to_string(), |r| r.ip().to_string())
    }

    /// Remote port, or 0 when unresolved.
    pub fn remote_port(&self) -> u16 {
        self.remote.map_or(0, |r| r.port())
    }
}

impl fmt::Display for SocketEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PID={} ({}) FD={} -> {}:{}",
            self.pid,
            self.name,
            self.fd,
            self.remote_addr(),
            self.remote_port()
        )
    }
}

/// Returned by [`SocketRegistry::push`] when the registry is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Full;

/// Fixed-capacity, scan-ordered collection of [`SocketEntry`].
///
/// A registry is produced whole by one scan and never grows past its
/// capacity; an attempt to add past it marks the registry truncated.
#[derive(Debug, Clone)]
pub struct SocketRegistry {
    entries: Vec<SocketEntry>,
    capacity: usize,
    truncated: bool,
}

impl Default for SocketRegistry {
    fn default() -> Self {
        SocketRegistry::with_capacity(DEFAULT_CAPACITY)
    }
}

impl SocketRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        SocketRegistry {
            entries: Vec::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
            truncated: false,
        }
    }

    /// Append an entry, or mark the registry truncated if it is full.
    pub fn push(&mut self, entry: SocketEntry) -> Result<(), Full> {
        if self.entries.len() >= self.capacity {
            self.truncated = true;
            return Err(Full);
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&SocketEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[SocketEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SocketEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Whether the scan that filled this registry stopped early because
    /// capacity was reached.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl<'a> IntoIterator for &'a SocketRegistry {
    type Item = &'a SocketEntry;
    type IntoIter = std::slice::Iter<'a, SocketEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
