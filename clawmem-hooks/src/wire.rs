//! Stdin/stdout framing for hook handlers (§6).
//!
//! Unlike the long-running JSON-RPC transport a persistent server reads
//! (Content-Length-framed messages over a kept-open pipe), a hook handler is
//! spawned once per event and exits: the host writes one JSON object to
//! stdin, closes it, and expects exactly one JSON object back on stdout.
//! There is no framing header to parse, only an EOF to read to.

use std::io::{self, Read, Write};

use crate::input::HookInput;
use crate::output::HookOutput;

/// Read and parse the single JSON object on stdin.
///
/// # Errors
/// Returns an [`io::Error`] if stdin cannot be read, or if its contents are
/// not a valid [`HookInput`].
pub fn read_request<R: Read>(mut reader: R) -> io::Result<HookInput> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    serde_json::from_str(buf.trim()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Write `output` as a single JSON line and flush. stdout is exclusive to
/// this one object; any diagnostic logging belongs on stderr.
///
/// # Errors
/// Returns an [`io::Error`] if the writer fails.
pub fn write_response<W: Write>(mut writer: W, output: &HookOutput) -> io::Result<()> {
    let body = serde_json::to_string(output).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writer.write_all(body.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_request() {
        let input = read_request(r#"{"session_id":"s1","hook_event_name":"session-start"}"#.as_bytes()).unwrap();
        assert_eq!(input.session_id, "s1");
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(read_request("not json".as_bytes()).is_err());
    }

    #[test]
    fn writes_a_trailing_newline() {
        let mut buf = Vec::new();
        write_response(&mut buf, &HookOutput::empty("session-start")).unwrap();
        assert_eq!(buf.last(), Some(&b'\n'));
    }
}
