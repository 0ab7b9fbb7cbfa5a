//! Line-based codec for tokio.
//!
//! Reads CRLF (or bare LF) terminated lines off the wire and writes outbound
//! lines with a CRLF terminator appended.
//!
//! A line that is too long, not UTF-8 or carries an illegal control character
//! is logged and skipped. The decoder only fails on I/O, since a framed
//! stream ends after its first decode error.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::error::{ProtocolError, Result};

/// Default maximum line length. Twitch tag blocks alone can run to several
/// hundred bytes, so the classic 512-byte limit is far too tight.
pub const MAX_LINE_LEN: usize = 8191;

/// Formatting codes that may legitimately appear in chat text.
fn is_format_code(ch: char) -> bool {
    matches!(
        ch,
        '\x01' | '\x02' | '\x03' | '\x04' | '\x0f' | '\x11' | '\x16' | '\x1d' | '\x1e' | '\x1f'
    )
}

/// Control characters that must never cross the wire.
pub fn is_illegal_control_char(ch: char) -> bool {
    if ch == '\0' || ch == '\x07' {
        return true;
    }
    ch.is_control() && ch != '\r' && ch != '\n' && ch != '\t' && !is_format_code(ch)
}

/// Prepare an outbound line: cut it at the first line ending (dropping the
/// ending itself) and reject illegal control characters.
///
/// Cutting rather than rejecting keeps a multi-line chat reply from smuggling
/// a second protocol command onto the wire.
pub fn sanitize(data: &str) -> Result<String> {
    let end = data.find(['\r', '\n']).unwrap_or(data.len());
    let line = &data[..end];

    if let Some(ch) = line.chars().find(|&ch| is_illegal_control_char(ch)) {
        return Err(ProtocolError::IllegalControlChar(ch));
    }

    Ok(line.to_owned())
}

/// Line-based codec that handles newline-terminated messages.
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length
    max_len: usize,
    /// Dropping the tail of an overlong line up to its newline.
    discarding: bool,
}

impl LineCodec {
    pub fn new() -> Self {
        Self::with_max_len(MAX_LINE_LEN)
    }

    /// Create a new codec with custom max line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            discarding: false,
        }
    }

    /// Check one complete line, terminator included.
    fn check_line(&self, line: BytesMut) -> Result<String> {
        if line.len() > self.max_len {
            return Err(ProtocolError::MessageTooLong {
                actual: line.len(),
                limit: self.max_len,
            });
        }

        let data = String::from_utf8(line.to_vec())?;
        let trimmed = data.trim_end_matches(['\r', '\n']);
        if let Some(ch) = trimmed.chars().find(|&ch| is_illegal_control_char(ch)) {
            return Err(ProtocolError::IllegalControlChar(ch));
        }
        Ok(data)
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                if self.discarding {
                    src.clear();
                    self.next_index = 0;
                } else if src.len() > self.max_len {
                    warn!(
                        length = src.len(),
                        limit = self.max_len,
                        "discarding overlong line"
                    );
                    src.clear();
                    self.next_index = 0;
                    self.discarding = true;
                } else {
                    // No complete line yet. Remember where we stopped.
                    self.next_index = src.len();
                }
                return Ok(None);
            };

            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if std::mem::take(&mut self.discarding) {
                continue;
            }

            match self.check_line(line) {
                Ok(data) => return Ok(Some(data)),
                Err(error) => warn!(%error, "dropping unreadable line"),
            }
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: String, dst: &mut BytesMut) -> Result<()> {
        dst.reserve(msg.len() + 2);
        dst.extend_from_slice(msg.as_bytes());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}
