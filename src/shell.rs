//! Line-oriented interactive front end.
//!
//! The shell keeps the registry from the last `search` and an index into it
//! chosen with `select`; the injection commands act on that entry.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

use log::debug;

use crate::display::{print_file_sent, print_received, print_registry, print_sent};
use crate::inject::{self, DEFAULT_RECEIVE_TIMEOUT};
use crate::proc::ProcFs;
use crate::registry::{SocketEntry, SocketRegistry, DEFAULT_CAPACITY};
use crate::scan::scan_procfs;

const HELP: &str = "\
Commands:
  help                 - Show this help
  search [pattern]     - List sockets, optionally filter by pid or process name
  select <index>       - Select a socket from the search results
  send <string>        - Send string to selected socket
  sendf <file>         - Send file content to selected socket
  rec [file]           - Receive from socket with timeout, output to stdout or file
  timeout <seconds>    - Set receive timeout (default 5 sec)
  quit                 - Exit
";

pub struct Shell<R, W> {
    input: R,
    out: W,
    procfs: ProcFs,
    registry: SocketRegistry,
    selected: Option<usize>,
    timeout: Duration,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Shell {
            input,
            out,
            procfs: ProcFs::default(),
            registry: SocketRegistry::default(),
            selected: None,
            timeout: DEFAULT_RECEIVE_TIMEOUT,
        }
    }

    pub fn with_procfs(mut self, procfs: ProcFs) -> Self {
        self.procfs = procfs;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn selected(&self) -> Option<&SocketEntry> {
        self.selected.and_then(|i| self.registry.get(i))
    }

    /// Read and execute commands until `quit` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.out, "Socket Injector Shell. Type 'help' for commands.")?;
        let mut line = String::new();
        loop {
            write!(self.out, "> ")?;
            self.out.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            let command = line.trim_end_matches(['\n', '\r']);
            if !self.execute(command)? {
                break;
            }
        }
        writeln!(self.out, "Bye.")?;
        self.out.flush()
    }

    /// Execute one command line. Returns false when the shell should exit.
    fn execute(&mut self, line: &str) -> io::Result<bool> {
        let line = line.trim_start();
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim_start()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "help" => write!(self.out, "{}", HELP)?,
            "search" => self.search(arg)?,
            "select" => self.select(arg)?,
            "send" => self.send(arg)?,
            "sendf" => self.send_file(arg)?,
            "rec" => self.receive(arg)?,
            "timeout" => self.set_timeout(arg)?,
            "quit" => return Ok(false),
            _ => writeln!(self.out, "Unknown command: {}", line)?,
        }
        Ok(true)
    }

    fn search(&mut self, pattern: &str) -> io::Result<()> {
        self.registry = scan_procfs(&self.procfs, Some(pattern), DEFAULT_CAPACITY);
        // Indices refer to the previous listing.
        self.selected = None;
        print_registry(&mut self.out, &self.registry)
    }

    fn select(&mut self, arg: &str) -> io::Result<()> {
        match arg.trim().parse::<usize>() {
            Ok(index) if index < self.registry.len() => {
                self.selected = Some(index);
                writeln!(self.out, "Selected entry [{}]", index)
            }
            _ => writeln!(self.out, "Invalid index"),
        }
    }

    /// The selected entry's coordinates, or a message saying there is none.
    fn target(&mut self) -> io::Result<Option<(u64, u64)>> {
        match self.selected() {
            Some(entry) => Ok(Some((entry.pid, entry.fd))),
            None => {
                writeln!(self.out, "No socket selected")?;
                Ok(None)
            }
        }
    }

    fn send(&mut self, data: &str) -> io::Result<()> {
        let Some((pid, fd)) = self.target()? else {
            return Ok(());
        };
        if data.is_empty() {
            return writeln!(self.out, "Missing data to send");
        }
        match inject::send(pid, fd, data.as_bytes()) {
            Ok(sent) => print_sent(&mut self.out, sent),
            Err(e) => {
                eprintln!("Error sending to pid {} fd {}: {}", pid, fd, e);
                Ok(())
            }
        }
    }

    fn send_file(&mut self, file: &str) -> io::Result<()> {
        let Some((pid, fd)) = self.target()? else {
            return Ok(());
        };
        if file.is_empty() {
            return writeln!(self.out, "Missing filename");
        }
        match inject::send_file(pid, fd, Path::new(file)) {
            Ok(sent) => print_file_sent(&mut self.out, sent),
            Err(e) => {
                eprintln!("Error sending {} to pid {} fd {}: {}", file, pid, fd, e);
                Ok(())
            }
        }
    }

    fn receive(&mut self, file: &str) -> io::Result<()> {
        let Some((pid, fd)) = self.target()? else {
            return Ok(());
        };
        let destination = (!file.is_empty()).then(|| Path::new(file));
        // Data may be going to stdout as well.
        self.out.flush()?;
        match inject::receive(pid, fd, destination, self.timeout) {
            Ok(received) => {
                print_received(&mut self.out, &received, self.timeout)?;
                Ok(())
            }
            Err(e) => {
                eprintln!("Error receiving from pid {} fd {}: {}", pid, fd, e);
                Ok(())
            }
        }
    }

    fn set_timeout(&mut self, arg: &str) -> io::Result<()> {
        match arg.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => {
                self.timeout = Duration::from_secs(secs);
                debug!("receive timeout now {:?}", self.timeout);
                writeln!(self.out, "Timeout set to {} seconds", secs)
            }
            _ => writeln!(self.out, "Invalid timeout value"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::net::TcpListener;

    fn run_script(script: &str) -> String {
        let mut out = Vec::new();
        Shell::new(Cursor::new(script.as_bytes()), &mut out)
            .run()
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn greets_and_says_bye_on_eof() {
        assert_eq!(
            run_script(""),
            "Socket Injector Shell. Type 'help' for commands.\n> Bye.\n"
        );
    }

    #[test]
    fn quit_stops_reading() {
        let out = run_script("quit\nhelp\n");
        assert!(!out.contains("Commands:"));
        assert!(out.ends_with("> Bye.\n"));
    }

    #[test]
    fn help_lists_every_command() {
        let out = run_script("help\n");
        for command in ["help", "search", "select", "send", "sendf", "rec", "timeout", "quit"] {
            assert!(out.contains(&format!("  {} ", command)), "{}", command);
        }
    }

    #[test]
    fn unknown_and_empty_commands() {
        let out = run_script("\nfrobnicate now\nsendfile x\n");
        assert!(out.contains("Unknown command: frobnicate now\n"));
        assert!(out.contains("Unknown command: sendfile x\n"));
        assert_eq!(out.matches("Unknown command").count(), 2);
    }

    #[test]
    fn tab_separates_command_from_argument() {
        let out = run_script("send\thello\ntimeout\t3\n");
        assert!(!out.contains("Unknown command"), "{}", out);
        assert!(out.contains("No socket selected\n"), "{}", out);
        assert!(out.contains("Timeout set to 3 seconds\n"), "{}", out);
    }

    #[test]
    fn injection_needs_a_selection() {
        let out = run_script("send hello\nsendf /etc/hostname\nrec\n");
        assert_eq!(out.matches("No socket selected\n").count(), 3);
    }

    #[test]
    fn select_validates_index() {
        let out = run_script("select 0\nselect -1\nselect\nselect x\n");
        assert_eq!(out.matches("Invalid index\n").count(), 4);
    }

    #[test]
    fn timeout_validates_and_updates() {
        let mut out = Vec::new();
        let mut shell = Shell::new(Cursor::new("timeout 0\ntimeout abc\ntimeout 2\n"), &mut out);
        assert_eq!(shell.timeout(), DEFAULT_RECEIVE_TIMEOUT);
        shell.run().unwrap();
        assert_eq!(shell.timeout(), Duration::from_secs(2));
        drop(shell);

        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.matches("Invalid timeout value\n").count(), 2);
        assert!(out.contains("Timeout set to 2 seconds\n"));
    }

    #[test]
    fn search_and_select_own_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let pid = std::process::id();

        let mut out = Vec::new();
        let script = format!("search {}\nselect 0\n", pid);
        let mut shell = Shell::new(Cursor::new(script), &mut out);
        shell.run().unwrap();
        let selected = shell.selected().cloned();
        drop(shell);
        drop(listener);

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("socket(s):\n"), "{}", out);
        assert!(out.contains(&format!("[0] PID={} (", pid)), "{}", out);
        assert!(out.contains("Selected entry [0]\n"), "{}", out);
        assert_eq!(selected.map(|e| e.pid), Some(u64::from(pid)));
    }

    #[test]
    fn missing_arguments_after_selection() {
        let _listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let script = format!("search {}\nselect 0\nsend\nsendf\n", std::process::id());
        let out = run_script(&script);
        assert!(out.contains("Missing data to send\n"), "{}", out);
        assert!(out.contains("Missing filename\n"), "{}", out);
    }
}
