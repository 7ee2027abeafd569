use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "sockinject",
    version,
    about = "Inject data into TCP sockets of running processes",
    long_about = "List the TCP sockets held by running processes, or borrow one of them with \
pidfd_getfd(2) and send a string, send a file, or receive data through it. The target process \
is not stopped or traced. Requires ptrace access to the target (same user, or CAP_SYS_PTRACE) \
and Linux 5.6 or newer. Without arguments, start an interactive shell.",
    args_conflicts_with_subcommands = true,
    group(ArgGroup::new("action").args(["send", "sendf", "rec"]).requires("pid"))
)]
pub struct SockinjectCli {
    #[command(subcommand)]
    pub command: Option<SockinjectCommand>,

    /// Process ID (PID) that owns the socket
    #[arg(
        short = 'p',
        long = "pid",
        value_name = "PID",
        requires = "socket",
        requires = "action",
        value_parser = clap::value_parser!(u64).range(1..=i32::MAX as u64)
    )]
    pub pid: Option<u64>,

    /// Socket file descriptor number in the target process
    #[arg(
        short = 's',
        long = "socket",
        value_name = "FD",
        requires = "pid",
        value_parser = clap::value_parser!(u64).range(0..=i32::MAX as u64)
    )]
    pub socket: Option<u64>,

    /// Send a string to the socket
    #[arg(short = 'S', long = "send", value_name = "DATA")]
    pub send: Option<String>,

    /// Send the contents of a file to the socket
    #[arg(short = 'F', long = "sendf", value_name = "FILE")]
    pub sendf: Option<PathBuf>,

    /// Receive from the socket, to standard output or FILE
    ///
    /// Receive until the peer closes the connection or nothing arrives for
    /// the idle timeout. Data is written to FILE if given, otherwise to
    /// standard output.
    #[arg(short = 'r', long = "rec", value_name = "FILE", num_args = 0..=1)]
    pub rec: Option<Option<PathBuf>>,

    /// Receive idle timeout in seconds
    #[arg(
        short = 't',
        long = "timeout",
        value_name = "SECONDS",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,
}

#[derive(Subcommand, Debug)]
pub enum SockinjectCommand {
    /// List sockets, optionally filtered by PID or process name
    Search {
        /// Substring to look for in the process name or PID
        pattern: Option<String>,
    },
}

/// The single operation requested in flag mode.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Send(String),
    SendFile(PathBuf),
    Receive(Option<PathBuf>),
}

impl SockinjectCli {
    pub fn action(&self) -> Option<Action> {
        if let Some(data) = &self.send {
            Some(Action::Send(data.clone()))
        } else if let Some(path) = &self.sendf {
            Some(Action::SendFile(path.clone()))
        } else {
            self.rec.clone().map(Action::Receive)
        }
    }
}
