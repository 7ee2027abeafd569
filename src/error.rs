use std::io;

use nix::errno::Errno;

/// Unified error type for discovery and injection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The process or descriptor does not exist (or no longer exists), or a
    /// procfs entry could not be found.
    #[error("{0}")]
    NotFound(String),

    /// The kernel refused to hand out a process handle or a descriptor.
    #[error("{0}")]
    PermissionDenied(String),

    /// Text read from procfs did not have the expected kernel format.
    #[error("{0}")]
    Parse(String),

    /// The running kernel does not implement a required primitive.
    #[error("{0} is not supported by this kernel")]
    CapabilityUnavailable(&'static str),

    /// Read or write failure on a duplicated descriptor or a local file.
    /// `transferred` is the number of bytes moved before the failure.
    #[error("{source} (after {transferred} bytes)")]
    Io {
        #[source]
        source: io::Error,
        transferred: u64,
    },
}

impl Error {
    pub fn parse(item: &str, reason: &str) -> Self {
        Error::Parse(format!("Error parsing {}: {}", item, reason))
    }

    pub fn in_file(file: &str, reason: &str) -> Self {
        Error::Parse(format!("Error parsing /proc/[pid]/{}: {}", file, reason))
    }

    pub(crate) fn io_after(source: io::Error, transferred: u64) -> Self {
        Error::Io {
            source,
            transferred,
        }
    }

    /// Classify the failure of a privileged process primitive such as
    /// `pidfd_open(2)`.
    pub(crate) fn from_errno(call: &'static str, what: String, errno: Errno) -> Self {
        match errno {
            Errno::ENOSYS => Error::CapabilityUnavailable(call),
            Errno::ESRCH | Errno::ENOENT | Errno::EBADF => {
                Error::NotFound(format!("{}: {}: {}", call, what, errno.desc()))
            }
            Errno::EPERM | Errno::EACCES => {
                Error::PermissionDenied(format!("{}: {}: {}", call, what, errno.desc()))
            }
            e => Error::io_after(io::Error::from(e), 0),
        }
    }

    /// Bytes transferred before the operation failed. Zero for errors that
    /// occur before any data moved.
    pub fn transferred(&self) -> u64 {
        match self {
            Error::Io { transferred, .. } => *transferred,
            _ => 0,
        }
    }

    /// Whether the underlying error is a "not found" condition.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Error::NotFound(e.to_string()),
            io::ErrorKind::PermissionDenied => Error::PermissionDenied(e.to_string()),
            _ => Error::io_after(e, 0),
        }
    }
}
