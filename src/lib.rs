//
//   Copyright 2026 Basil Crow
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

//! Find TCP sockets held by running processes and talk through them.
//!
//! [`scan`] walks `/proc` and returns a [`SocketRegistry`] of socket
//! descriptors with their remote endpoints. [`send`], [`send_file`] and
//! [`receive`] borrow one of those descriptors from its owner with
//! `pidfd_getfd(2)` and perform a single operation on the copy. The target
//! process is neither stopped nor traced.

// Error handling philosophy: discovery runs against a live /proc that
// changes underneath us, so anything that goes wrong for a single process or
// descriptor is logged and skipped, and a scan always produces a result.
// Injection is the opposite: each call is one operation on one descriptor,
// and any failure ends that operation and is returned to the caller.

pub mod cli;
pub mod display;
mod error;
pub mod inject;
pub mod proc;
pub mod registry;
pub mod scan;
pub mod shell;

pub use error::Error;
pub use inject::{
    receive, receive_into, send, send_file, Received, StopReason, CHUNK_SIZE,
    DEFAULT_RECEIVE_TIMEOUT,
};
pub use proc::addr::{decode_endpoint, decode_v4, decode_v6};
pub use proc::net::resolve;
pub use proc::{ProcFs, ProcName};
pub use registry::{SocketEntry, SocketRegistry, DEFAULT_CAPACITY};
pub use scan::{scan, scan_procfs};

/// Restore the default SIGPIPE disposition so that writing to a closed pipe
/// (`sockinject search | head`) ends the process quietly instead of
/// panicking in `println!`.
pub fn reset_sigpipe() {
    use nix::sys::signal::{signal, SigHandler, Signal};
    // SAFETY: SIG_DFL installs no handler code.
    let _ = unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) };
}
