//
//   Copyright 2018, 2019 Delphix
//
//   Licensed under the Apache License, Version 2.0 (the "License");
//   you may not use this file except in compliance with the License.
//   You may obtain a copy of the License at
//
//       http://www.apache.org/licenses/LICENSE-2.0
//
//   Unless required by applicable law or agreed to in writing, software
//   distributed under the License is distributed on an "AS IS" BASIS,
//   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//   See the License for the specific language governing permissions and
//   limitations under the License.
//

#![allow(dead_code)]

use std::net::{TcpListener, TcpStream};
use std::os::fd::AsRawFd;
use std::path::PathBuf;

use sockinject::Error;

// Find an executable produced by the Cargo build
pub fn find_exec(name: &str) -> PathBuf {
    // Find the path where Cargo has placed the executables by looking at this test process's
    // executable, which was also built by Cargo.
    let this_exec = std::env::current_exe().unwrap();
    let exec_dir = this_exec.parent().unwrap().parent().unwrap();

    exec_dir.join(name)
}

pub fn assert_contains(output: &str, needle: &str) {
    assert!(
        output.contains(needle),
        "Expected to find {:?} in output:\n{}",
        needle,
        output
    );
}

/// A connected loopback TCP pair, both ends owned by this process.
pub struct LoopbackPair {
    pub client: TcpStream,
    pub server: TcpStream,
}

impl LoopbackPair {
    pub fn new() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();
        LoopbackPair { client, server }
    }

    pub fn client_fd(&self) -> u64 {
        self.client.as_raw_fd() as u64
    }

    pub fn server_fd(&self) -> u64 {
        self.server.as_raw_fd() as u64
    }
}

pub fn own_pid() -> u64 {
    u64::from(std::process::id())
}

/// Whether this kernel and sandbox let us borrow our own descriptors. Tests
/// that inject call this first and return early when it is false.
pub fn attach_supported() -> bool {
    let pair = LoopbackPair::new();
    match sockinject::send(own_pid(), pair.client_fd(), b"") {
        Ok(_) => true,
        Err(e @ Error::CapabilityUnavailable(_)) | Err(e @ Error::PermissionDenied(_)) => {
            eprintln!("skipping: cannot duplicate descriptors here: {}", e);
            false
        }
        Err(e) => panic!("unexpected error probing pidfd_getfd: {}", e),
    }
}
