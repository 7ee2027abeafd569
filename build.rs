use roff::{bold, roman, Roff};
use std::fs;
use std::path::Path;

struct Example<'a> {
    title: &'a str,
    description: &'a str,
    code: &'a str,
}

struct ManPage<'a> {
    name: &'a str,
    about: &'a str,
    description: &'a str,
    synopsis: &'a [&'a str],
    options: &'a [(&'a str, &'a str)],
    commands: &'a [(&'a str, &'a str)],
    examples: &'a [Example<'a>],
    exit_status: &'a str,
    environment: &'a str,
    files: &'a str,
    see_also: &'a str,
    warnings: &'a str,
}

fn definition_list(roff: &mut Roff, heading: &str, items: &[(&str, &str)]) {
    if items.is_empty() {
        return;
    }
    roff.control("SH", [heading]);
    for (term, help) in items {
        roff.control("TP", []);
        roff.text([bold(*term)]);
        roff.text([roman(*help)]);
    }
}

fn render_man_page(page: &ManPage, out_dir: &Path) {
    let version = env!("CARGO_PKG_VERSION");
    let upper_name = page.name.to_uppercase();
    let date_version = format!("{} {}", page.name, version);
    let mut roff = Roff::default();
    roff.control("TH", [upper_name.as_str(), "1", date_version.as_str()]);
    roff.control("SH", ["NAME"]);
    roff.text([roman(format!("{} - {}", page.name, page.about))]);
    roff.control("SH", ["SYNOPSIS"]);
    for (i, synopsis) in page.synopsis.iter().enumerate() {
        if i > 0 {
            roff.control("br", [] as [&str; 0]);
        }
        roff.text([bold(page.name), roman(format!(" {}", synopsis))]);
    }
    roff.control("SH", ["DESCRIPTION"]);
    for paragraph in page.description.split("\n\n") {
        roff.control("PP", [] as [&str; 0]);
        roff.text([roman(paragraph)]);
    }
    definition_list(&mut roff, "OPTIONS", page.options);
    definition_list(&mut roff, "SHELL COMMANDS", page.commands);
    if !page.examples.is_empty() {
        roff.control("SH", ["EXAMPLES"]);
        for example in page.examples {
            roff.text([bold(example.title)]);
            roff.text([roman(example.description)]);
            roff.control("sp", [] as [&str; 0]);
            roff.control("nf", [] as [&str; 0]);
            roff.control("RS", ["4"]);
            for line in example.code.lines() {
                roff.text([roman(line)]);
            }
            roff.control("RE", [] as [&str; 0]);
            roff.control("fi", [] as [&str; 0]);
        }
    }
    if !page.exit_status.is_empty() {
        roff.control("SH", ["EXIT STATUS"]);
        roff.text([roman(page.exit_status)]);
    }
    if !page.environment.is_empty() {
        roff.control("SH", ["ENVIRONMENT"]);
        roff.text([roman(page.environment)]);
    }
    if !page.files.is_empty() {
        roff.control("SH", ["FILES"]);
        for line in page.files.lines() {
            if let Some((path, desc)) = line.split_once('\t') {
                roff.control("TP", []);
                roff.text([roman(path)]);
                roff.text([roman(desc)]);
            } else {
                roff.text([roman(line)]);
            }
        }
    }
    if !page.warnings.is_empty() {
        roff.control("SH", ["WARNINGS"]);
        roff.text([roman(page.warnings)]);
    }
    if !page.see_also.is_empty() {
        roff.control("SH", ["SEE ALSO"]);
        roff.text([roman(page.see_also)]);
    }
    fs::write(out_dir.join(format!("{}.1", page.name)), roff.to_roff()).unwrap();
}

fn main() {
    let out_dir = Path::new("target/man");
    fs::create_dir_all(out_dir).unwrap();

    render_man_page(
        &ManPage {
            name: "sockinject",
            about: "find and inject data into TCP sockets of running processes",
            description: "List the TCP socket descriptors held by running processes, together \
                          with the remote address each one is connected to, or operate on one \
                          of them. An operation borrows the descriptor from its owner with \
                          pidfd_getfd(2), sends a string, sends a file, or receives data, and \
                          then closes the borrowed copy. The target process is not stopped or \
                          traced, and keeps using the socket concurrently.\n\n\
                          Without arguments, sockinject starts an interactive shell that reads \
                          commands from standard input.",
            synopsis: &[
                "",
                "search [PATTERN]",
                "-p PID -s FD (-S DATA | -F FILE | -r [FILE]) [-t SECONDS]",
            ],
            options: &[
                (
                    "search [PATTERN]",
                    "List socket descriptors of all processes. With PATTERN, only processes \
                     whose name or PID contains PATTERN as a literal, case-sensitive substring \
                     are listed.",
                ),
                ("-p, --pid PID", "Process that owns the socket."),
                ("-s, --socket FD", "Descriptor number of the socket in that process."),
                ("-S, --send DATA", "Send DATA with a single send(2) call."),
                ("-F, --sendf FILE", "Send the whole contents of FILE."),
                (
                    "-r, --rec [FILE]",
                    "Receive until the peer closes the connection or nothing arrives for \
                     the idle timeout. Data is written to FILE, or to standard output.",
                ),
                (
                    "-t, --timeout SECONDS",
                    "Idle timeout for -r, in seconds. The default is 5.",
                ),
            ],
            commands: &[
                ("help", "Show the list of commands."),
                ("search [pattern]", "List sockets, as the search subcommand does."),
                ("select <index>", "Select an entry of the last listing."),
                ("send <string>", "Send the rest of the line to the selected socket."),
                ("sendf <file>", "Send the contents of a file to the selected socket."),
                ("rec [file]", "Receive from the selected socket."),
                ("timeout <seconds>", "Set the receive idle timeout."),
                ("quit", "Exit the shell. End of input also exits."),
            ],
            examples: &[Example {
                title: "Example 1 Sending a line to a connection",
                description: "Find the sockets of a netcat process and send a line \
                              through one of them:",
                code: "\
$ sockinject search nc
Found 1 socket(s):
[0] PID=4242 (nc) FD=3 -> 127.0.0.1:8080
$ sockinject -p 4242 -s 3 -S hello
Data sent: 5 bytes",
            }],
            exit_status: "0 on success, 1 if the operation failed (such as no such process or \
                          descriptor, permission denied, or an unsupported kernel), and 2 for \
                          invalid usage.",
            environment: "RUST_LOG controls diagnostic logging on standard error. The default \
                          level is warn.",
            files: "/proc/pid/comm\tProcess name.\n\
                    /proc/pid/fd\tOpen descriptors of the process.\n\
                    /proc/pid/net/tcp, /proc/pid/net/tcp6\tTCP connection tables.",
            see_also: "pidfd_open(2), pidfd_getfd(2), ptrace(2), proc(5)",
            warnings: "Data injected into a connection is interleaved with whatever the \
                       owning process writes, and data received is taken away from it. Both \
                       can break the application protocol. Operating on a descriptor \
                       requires ptrace access to its owner and Linux 5.6 or newer.",
        },
        out_dir,
    );

    println!("cargo:rerun-if-changed=build.rs");
}
