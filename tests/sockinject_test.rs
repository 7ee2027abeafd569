mod common;

use std::io::Write;
use std::net::TcpListener;
use std::process::{Command, Stdio};

use common::{assert_contains, find_exec};

fn sockinject(args: &[&str]) -> std::process::Output {
    Command::new(find_exec("sockinject"))
        .args(args)
        .env("RUST_LOG", "off")
        .stdin(Stdio::null())
        .output()
        .expect("failed to run sockinject")
}

#[test]
fn help_describes_options() {
    let output = sockinject(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for option in ["--pid", "--socket", "--send", "--sendf", "--rec", "--timeout", "search"] {
        assert_contains(&stdout, option);
    }
}

#[test]
fn incomplete_request_is_usage_error() {
    for args in [
        &["-p", "1", "-s", "3"][..],
        &["-p", "1", "-S", "hello"][..],
        &["-s", "3", "-r"][..],
        &["-p", "1", "-s", "3", "-S", "a", "-r"][..],
        &["-p", "abc", "-s", "3", "-S", "a"][..],
    ] {
        let output = sockinject(args);
        assert_eq!(output.status.code(), Some(2), "args {:?}", args);
    }
}

#[test]
fn search_lists_own_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let pid = std::process::id().to_string();

    let output = sockinject(&["search", &pid]);
    drop(listener);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "socket(s):");
    assert_contains(&stdout, &format!("PID={} (", pid));
    assert_contains(&stdout, "FD=");
}

#[test]
fn search_without_match_is_empty() {
    let output = sockinject(&["search", "no-process-is-called-this"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Found 0 socket(s):\n"
    );
}

#[test]
fn injection_into_missing_process_fails() {
    let output = sockinject(&["-p", &i32::MAX.to_string(), "-s", "3", "-S", "hello"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(!output.stderr.is_empty());
}

#[test]
fn shell_runs_commands_from_stdin() {
    let mut child = Command::new(find_exec("sockinject"))
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn sockinject");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"help\nselect 3\ntimeout 9\nbogus\nquit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "Socket Injector Shell. Type 'help' for commands.");
    assert_contains(&stdout, "Commands:");
    assert_contains(&stdout, "Invalid index");
    assert_contains(&stdout, "Timeout set to 9 seconds");
    assert_contains(&stdout, "Unknown command: bogus");
    assert!(stdout.ends_with("Bye.\n"), "{}", stdout);
}
