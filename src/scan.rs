use std::ops::ControlFlow;

use log::{debug, warn};

use crate::proc::fd::socket_inode;
use crate::proc::net::ConnectionTable;
use crate::proc::{ProcFs, ProcName, ProcSource};
use crate::registry::{SocketEntry, SocketRegistry, DEFAULT_CAPACITY};

// Processes on a live system come and go while we walk /proc, and we may not
// be allowed to look at all of them. Any failure below the level of the
// procfs root is logged and the offending process or descriptor is skipped.

/// Find the socket descriptors of every process under `/proc`.
///
/// With a `pattern`, only processes whose name or decimal pid contains it as
/// a literal substring are examined.
pub fn scan(pattern: Option<&str>) -> SocketRegistry {
    scan_procfs(&ProcFs::default(), pattern, DEFAULT_CAPACITY)
}

/// Like [`scan`], against an arbitrary procfs root and registry capacity.
pub fn scan_procfs(procfs: &ProcFs, pattern: Option<&str>, capacity: usize) -> SocketRegistry {
    let mut registry = SocketRegistry::with_capacity(capacity);
    let pattern = pattern.filter(|p| !p.is_empty());

    let pids = match procfs.pids() {
        Ok(pids) => pids,
        Err(e) => {
            warn!("cannot list {}: {}", procfs.root().display(), e);
            return registry;
        }
    };

    for pid in pids {
        let process = procfs.process(pid);
        let name = load_name(&process);

        if let Some(pattern) = pattern {
            if !matches_pattern(pid, &name, pattern) {
                continue;
            }
        }

        if scan_process(&process, &name, &mut registry).is_break() {
            warn!(
                "socket registry full ({} entries), results truncated",
                registry.capacity()
            );
            break;
        }
    }

    registry
}

fn load_name(process: &dyn ProcSource) -> ProcName {
    let raw = match process.read_comm() {
        Ok(raw) => raw,
        Err(e) => {
            debug!("cannot read /proc/{}/comm: {}", process.pid(), e);
            return ProcName::default();
        }
    };
    ProcName::from_comm(&raw).unwrap_or_else(|e| {
        debug!("pid {}: {}", process.pid(), e);
        ProcName::default()
    })
}

fn matches_pattern(pid: u64, name: &ProcName, pattern: &str) -> bool {
    name.as_str().contains(pattern) || pid.to_string().contains(pattern)
}

/// Add every socket descriptor of one process. Breaks when the registry is
/// full.
fn scan_process(
    process: &dyn ProcSource,
    name: &ProcName,
    registry: &mut SocketRegistry,
) -> ControlFlow<()> {
    let pid = process.pid();
    let fds = match process.list_fds() {
        Ok(fds) => fds,
        Err(e) => {
            debug!("cannot list /proc/{}/fd: {}", pid, e);
            return ControlFlow::Continue(());
        }
    };

    // Loaded on the first socket so that processes without sockets cost
    // nothing beyond the fd listing.
    let mut table: Option<ConnectionTable> = None;

    for fd in fds {
        let inode = match socket_inode(process, fd) {
            Ok(Some(inode)) => inode,
            Ok(None) => continue,
            Err(e) => {
                debug!("cannot read /proc/{}/fd/{}: {}", pid, fd, e);
                continue;
            }
        };

        let table = table.get_or_insert_with(|| ConnectionTable::load(process));
        let remote = match table.remote(inode) {
            Ok(remote) => Some(remote),
            Err(e) => {
                debug!("pid {} fd {}: {}", pid, fd, e);
                None
            }
        };
        let local = table.local(inode).ok();

        let entry = SocketEntry {
            pid,
            fd,
            name: name.clone(),
            inode,
            local,
            remote,
        };
        if registry.push(entry).is_err() {
            return ControlFlow::Break(());
        }
    }

    ControlFlow::Continue(())
}
