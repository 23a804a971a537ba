//! Shared I/O helpers for the fake IMAP server.
//!
//! `write_line` flushes after every write, which keeps the test server
//! simple and deterministic. `arguments` splits a raw command line for
//! the handlers that need the literal arguments rather than what
//! `imap-codec` decoded.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Write a string to the stream and flush.
pub async fn write_line<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut BufReader<S>,
    line: &str,
) -> std::io::Result<()> {
    stream.get_mut().write_all(line.as_bytes()).await?;
    stream.get_mut().flush().await
}

/// The arguments of a command line, after the tag and the command
/// name. Quoted strings are unescaped; atoms are returned as-is.
pub fn arguments(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut chars = line.trim_end().chars().peekable();

    while chars.peek().is_some() {
        while chars.next_if(|c| *c == ' ').is_some() {}
        let Some(first) = chars.next() else {
            break;
        };

        let mut arg = String::new();
        if first == '"' {
            while let Some(c) = chars.next() {
                match c {
                    '"' => break,
                    '\\' => arg.extend(chars.next()),
                    other => arg.push(other),
                }
            }
        } else {
            arg.push(first);
            while let Some(c) = chars.next_if(|c| *c != ' ') {
                arg.push(c);
            }
        }
        args.push(arg);
    }

    args.into_iter().skip(2).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_quoted_and_atom_arguments() {
        assert_eq!(arguments("A0003 LIST \"\" *\r\n"), vec!["", "*"]);
        assert_eq!(
            arguments("A0001 LOGIN \"testuser\" \"pa\\\"ss\""),
            vec!["testuser", "pa\"ss"]
        );
        assert!(arguments("A0009 NOOP").is_empty());
    }
}
