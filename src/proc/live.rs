use std::io;
use std::path::{Path, PathBuf};

use super::ProcSource;

/// Live-process backend: reads everything from `<root>/[pid]/...`.
pub struct LiveProcess {
    dir: PathBuf,
    pid: u64,
}

impl LiveProcess {
    pub fn new(pid: u64) -> Self {
        LiveProcess::with_root(Path::new("/proc"), pid)
    }

    pub fn with_root(root: &Path, pid: u64) -> Self {
        LiveProcess {
            dir: root.join(pid.to_string()),
            pid,
        }
    }
}

impl ProcSource for LiveProcess {
    fn pid(&self) -> u64 {
        self.pid
    }

    fn read_comm(&self) -> io::Result<String> {
        std::fs::read_to_string(self.dir.join("comm"))
    }

    fn list_fds(&self) -> io::Result<Vec<u64>> {
        let mut fds: Vec<u64> = std::fs::read_dir(self.dir.join("fd"))?
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str()?.parse::<u64>().ok())
            .collect();
        fds.sort();
        Ok(fds)
    }

    fn read_fd_link(&self, fd: u64) -> io::Result<PathBuf> {
        std::fs::read_link(self.dir.join("fd").join(fd.to_string()))
    }

    fn read_net_file(&self, name: &str) -> io::Result<String> {
        std::fs::read_to_string(self.dir.join("net").join(name))
    }
}
