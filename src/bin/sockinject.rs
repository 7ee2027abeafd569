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

use std::io::{self, Write};
use std::process::exit;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use sockinject::cli::{Action, SockinjectCli, SockinjectCommand};
use sockinject::display::{print_file_sent, print_received, print_registry, print_sent};
use sockinject::shell::Shell;

fn search(pattern: Option<&str>) -> bool {
    let registry = sockinject::scan(pattern);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_registry(&mut out, &registry).is_ok()
}

fn run_action(pid: u64, fd: u64, action: Action, timeout: Duration) -> bool {
    let stdout = io::stdout();
    match action {
        Action::Send(data) => match sockinject::send(pid, fd, data.as_bytes()) {
            Ok(sent) => print_sent(&mut stdout.lock(), sent).is_ok(),
            Err(e) => {
                eprintln!("sockinject: pid {} fd {}: {}", pid, fd, e);
                false
            }
        },
        Action::SendFile(path) => match sockinject::send_file(pid, fd, &path) {
            Ok(sent) => print_file_sent(&mut stdout.lock(), sent).is_ok(),
            Err(e) => {
                eprintln!(
                    "sockinject: sending {} to pid {} fd {}: {}",
                    path.display(),
                    pid,
                    fd,
                    e
                );
                false
            }
        },
        Action::Receive(path) => match sockinject::receive(pid, fd, path.as_deref(), timeout) {
            // Keep stdout for the data when that is where it went.
            Ok(received) => match path {
                Some(_) => print_received(&mut stdout.lock(), &received, timeout).unwrap_or(false),
                None => print_received(&mut io::stderr(), &received, timeout).unwrap_or(false),
            },
            Err(e) => {
                eprintln!("sockinject: pid {} fd {}: {}", pid, fd, e);
                false
            }
        },
    }
}

fn main() {
    sockinject::reset_sigpipe();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = SockinjectCli::parse();
    let timeout = Duration::from_secs(cli.timeout);

    let ok = if let Some(SockinjectCommand::Search { pattern }) = &cli.command {
        search(pattern.as_deref())
    } else if let Some(pid) = cli.pid {
        let (Some(fd), Some(action)) = (cli.socket, cli.action()) else {
            SockinjectCli::command()
                .error(
                    ErrorKind::MissingRequiredArgument,
                    "one of --send, --sendf or --rec is required together with --pid and --socket",
                )
                .exit();
        };
        run_action(pid, fd, action, timeout)
    } else {
        let stdin = io::stdin();
        let mut shell = Shell::new(stdin.lock(), io::stdout());
        match shell.run() {
            Ok(()) => true,
            Err(e) => {
                eprintln!("sockinject: {}", e);
                false
            }
        }
    };

    let _ = io::stdout().flush();
    exit(if ok { 0 } else { 1 });
}
