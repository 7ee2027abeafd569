use std::collections::HashMap;
use std::net::SocketAddr;

use log::{debug, trace};

use super::addr::decode_endpoint;
use super::{LiveProcess, ProcSource};
use crate::Error;

/// TCP tables consulted, in order.
const TCP_TABLES: &[&str] = &["tcp", "tcp6"];

// Column positions in /proc/[pid]/net/tcp*:
//   sl local_address rem_address st tx_queue:rx_queue tr:tm->when retrnsmt uid timeout inode
const LOCAL_ADDR_COL: usize = 1;
const REM_ADDR_COL: usize = 2;
const INODE_COL: usize = 9;

/// Raw address fields of one connection table row.
#[derive(Debug, Clone)]
struct Row {
    local: String,
    remote: String,
}

/// The TCP connection tables of one network namespace, keyed by inode.
///
/// Loading both tables once per process lets every socket descriptor of
/// that process be resolved without re-reading procfs.
#[derive(Debug, Default)]
pub struct ConnectionTable {
    rows: HashMap<u64, Row>,
}

impl ConnectionTable {
    /// Read `net/tcp` and `net/tcp6` from the process's view of procfs.
    /// Missing or unreadable tables contribute no rows.
    pub fn load(source: &dyn ProcSource) -> Self {
        let mut table = ConnectionTable::default();
        for name in TCP_TABLES {
            match source.read_net_file(name) {
                Ok(content) => table.add_rows(&content),
                Err(e) => debug!(
                    "cannot read /proc/{}/net/{}: {}",
                    source.pid(),
                    name,
                    e
                ),
            }
        }
        table
    }

    fn add_rows(&mut self, content: &str) {
        for line in content.lines().skip(1) {
            let fields = line.split_whitespace().collect::<Vec<&str>>();
            if fields.len() <= INODE_COL {
                trace!("skipping short tcp table row: {:?}", line);
                continue;
            }
            let Ok(inode) = fields[INODE_COL].parse::<u64>() else {
                continue;
            };
            // The first row for an inode wins.
            self.rows.entry(inode).or_insert_with(|| Row {
                local: fields[LOCAL_ADDR_COL].to_string(),
                remote: fields[REM_ADDR_COL].to_string(),
            });
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Remote endpoint of the socket with the given inode.
    pub fn remote(&self, inode: u64) -> Result<SocketAddr, Error> {
        let row = self.row(inode)?;
        decode_endpoint(&row.remote)
    }

    /// Local endpoint of the socket with the given inode.
    pub fn local(&self, inode: u64) -> Result<SocketAddr, Error> {
        let row = self.row(inode)?;
        decode_endpoint(&row.local)
    }

    fn row(&self, inode: u64) -> Result<&Row, Error> {
        self.rows
            .get(&inode)
            .ok_or_else(|| Error::NotFound(format!("no TCP connection with inode {}", inode)))
    }
}

/// Find the remote endpoint of socket `inode` in the TCP tables visible to
/// process `pid`.
pub fn resolve(pid: u64, inode: u64) -> Result<SocketAddr, Error> {
    resolve_in(&LiveProcess::new(pid), inode)
}

/// Like [`resolve`], against any process source.
pub fn resolve_in(source: &dyn ProcSource, inode: u64) -> Result<SocketAddr, Error> {
    ConnectionTable::load(source).remote(inode)
}
