use std::io;

use super::ProcSource;

/// Extract the inode number from a `"socket:[12345]"` link text.
pub fn parse_socket_inode(link_text: &str) -> Option<u64> {
    let inner = link_text.strip_prefix("socket:[")?;
    let inner = inner.strip_suffix(']')?;
    if !inner.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    inner.parse::<u64>().ok()
}

/// Resolve `/proc/[pid]/fd/<fd>` and return the socket inode it refers to,
/// or `None` if the descriptor is not a socket.
pub fn socket_inode(source: &dyn ProcSource, fd: u64) -> io::Result<Option<u64>> {
    let link = source.read_fd_link(fd)?;
    Ok(link.to_str().and_then(parse_socket_inode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_socket_inode_valid() {
        assert_eq!(parse_socket_inode("socket:[12345]"), Some(12345));
    }

    #[test]
    fn test_parse_socket_inode_not_socket() {
        assert_eq!(parse_socket_inode("/dev/null"), None);
        assert_eq!(parse_socket_inode("pipe:[4242]"), None);
    }

    #[test]
    fn test_parse_socket_inode_anon() {
        assert_eq!(parse_socket_inode("anon_inode:[eventpoll]"), None);
    }

    #[test]
    fn test_parse_socket_inode_malformed() {
        assert_eq!(parse_socket_inode("socket:[]"), None);
        assert_eq!(parse_socket_inode("socket:[+12]"), None);
        assert_eq!(parse_socket_inode("socket:[12"), None);
        assert_eq!(parse_socket_inode("socket:[12]x"), None);
    }
}
