//! Process handles and cross-process descriptor duplication.
//!
//! Both primitives need ptrace-level access to the target (same credentials
//! or `CAP_SYS_PTRACE`) and Linux 5.6 or newer for `pidfd_getfd(2)`.

use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd};

use log::trace;
use nix::errno::Errno;
use nix::libc;

use crate::Error;

/// A handle to one specific process instance, obtained with
/// `pidfd_open(2)`. Closed on drop.
#[derive(Debug)]
pub struct PidFd {
    fd: OwnedFd,
    pid: libc::pid_t,
}

impl PidFd {
    #[cfg(target_os = "linux")]
    pub fn open(pid: u64) -> Result<Self, Error> {
        let pid = to_pid(pid)?;
        let ret = unsafe { libc::syscall(libc::SYS_pidfd_open, pid, 0_u32) };
        if ret < 0 {
            return Err(Error::from_errno(
                "pidfd_open",
                format!("pid {}", pid),
                Errno::last(),
            ));
        }
        trace!("pidfd_open({}) = {}", pid, ret);
        Ok(PidFd {
            // SAFETY: the kernel just handed us this descriptor and nothing
            // else owns it.
            fd: unsafe { OwnedFd::from_raw_fd(ret as i32) },
            pid,
        })
    }

    #[cfg(not(target_os = "linux"))]
    pub fn open(_pid: u64) -> Result<Self, Error> {
        Err(Error::CapabilityUnavailable("pidfd_open"))
    }

    pub fn pid(&self) -> u64 {
        self.pid as u64
    }

    /// Duplicate descriptor `target_fd` of this process into ours.
    ///
    /// The duplicate refers to the same open file description as the
    /// target's descriptor, so file status flags and socket state are
    /// shared with the target.
    #[cfg(target_os = "linux")]
    pub fn get_fd(&self, target_fd: u64) -> Result<OwnedFd, Error> {
        let target_fd = to_fd(target_fd)?;
        let ret = unsafe {
            libc::syscall(
                libc::SYS_pidfd_getfd,
                self.fd.as_raw_fd(),
                target_fd,
                0_u32,
            )
        };
        if ret < 0 {
            return Err(Error::from_errno(
                "pidfd_getfd",
                format!("pid {} fd {}", self.pid, target_fd),
                Errno::last(),
            ));
        }
        trace!(
            "pidfd_getfd(pid {}, fd {}) = {}",
            self.pid,
            target_fd,
            ret
        );
        // SAFETY: as above, the new descriptor is ours alone.
        Ok(unsafe { OwnedFd::from_raw_fd(ret as i32) })
    }

    #[cfg(not(target_os = "linux"))]
    pub fn get_fd(&self, _target_fd: u64) -> Result<OwnedFd, Error> {
        Err(Error::CapabilityUnavailable("pidfd_getfd"))
    }
}

impl AsFd for PidFd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl Drop for PidFd {
    fn drop(&mut self) {
        trace!("closing pidfd for pid {}", self.pid);
    }
}

fn to_pid(pid: u64) -> Result<libc::pid_t, Error> {
    match libc::pid_t::try_from(pid) {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(Error::NotFound(format!("invalid PID {}", pid))),
    }
}

fn to_fd(fd: u64) -> Result<i32, Error> {
    i32::try_from(fd).map_err(|_| Error::NotFound(format!("invalid file descriptor {}", fd)))
}

/// A process handle plus one descriptor duplicated from that process.
///
/// Fields drop in declaration order: the duplicate is closed before the
/// process handle.
#[derive(Debug)]
pub struct Attached {
    duplicate: OwnedFd,
    process: PidFd,
}

impl Attached {
    pub fn new(pid: u64, fd: u64) -> Result<Self, Error> {
        let process = PidFd::open(pid)?;
        let duplicate = process.get_fd(fd)?;
        Ok(Attached { duplicate, process })
    }

    pub fn pid(&self) -> u64 {
        self.process.pid()
    }
}

impl Drop for Attached {
    fn drop(&mut self) {
        trace!(
            "closing duplicate fd {} of pid {}",
            self.duplicate.as_raw_fd(),
            self.process.pid
        );
    }
}

impl AsFd for Attached {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.duplicate.as_fd()
    }
}

impl AsRawFd for Attached {
    fn as_raw_fd(&self) -> std::os::fd::RawFd {
        self.duplicate.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(matches!(PidFd::open(0), Err(Error::NotFound(_))));
        assert!(matches!(
            PidFd::open(u64::from(u32::MAX) + 1),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            Attached::new(0, 3),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn rejects_fd_beyond_i32() {
        // Only meaningful where pidfds work at all.
        let Ok(me) = PidFd::open(std::process::id() as u64) else {
            return;
        };
        assert!(matches!(
            me.get_fd(u64::from(u32::MAX)),
            Err(Error::NotFound(_))
        ));
    }
}
