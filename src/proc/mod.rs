pub mod addr;
pub mod fd;
pub(crate) mod live;
pub mod net;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

pub use live::LiveProcess;

use crate::Error;

/// Abstraction over per-process procfs data.
///
/// The live backend reads `<root>/[pid]/...`; tests supply a synthetic tree
/// through the same backend with a different root.
pub trait ProcSource {
    fn pid(&self) -> u64;

    fn read_comm(&self) -> io::Result<String>;

    // Per-fd
    fn list_fds(&self) -> io::Result<Vec<u64>>;
    fn read_fd_link(&self, fd: u64) -> io::Result<PathBuf>;

    // Network namespace
    fn read_net_file(&self, name: &str) -> io::Result<String>;
}

/// A procfs mount point.
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl Default for ProcFs {
    fn default() -> Self {
        ProcFs::new("/proc")
    }
}

impl ProcFs {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        ProcFs { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List every numeric entry directly under the root, in ascending order.
    pub fn pids(&self) -> io::Result<Vec<u64>> {
        let mut pids: Vec<u64> = std::fs::read_dir(&self.root)?
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str()?.parse::<u64>().ok())
            .collect();
        pids.sort();
        Ok(pids)
    }

    pub fn process(&self, pid: u64) -> LiveProcess {
        LiveProcess::with_root(&self.root, pid)
    }
}

/// Longest process display name we accept.
pub const PROC_NAME_MAX: usize = 255;

/// A process display name as read from `/proc/[pid]/comm`.
///
/// Bounded to [`PROC_NAME_MAX`] bytes and free of NUL and newline
/// characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcName(String);

impl ProcName {
    pub fn new(name: &str) -> Result<Self, Error> {
        if name.len() > PROC_NAME_MAX {
            return Err(Error::in_file(
                "comm",
                &format!("name is {} bytes, limit is {}", name.len(), PROC_NAME_MAX),
            ));
        }
        if name.contains(['\0', '\n']) {
            return Err(Error::in_file("comm", "name contains NUL or newline"));
        }
        Ok(ProcName(name.to_string()))
    }

    /// Parse the raw contents of a `comm` file, which carry one trailing
    /// newline.
    pub fn from_comm(raw: &str) -> Result<Self, Error> {
        ProcName::new(raw.strip_suffix('\n').unwrap_or(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ProcName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
