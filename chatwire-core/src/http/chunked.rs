//! Incremental decoder for `Transfer-Encoding: chunked` bodies

use crate::error::{ChatError, ChatResult};
use tracing::trace;

/// Longest chunk-size or trailer line accepted
const MAX_LINE_LEN: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkState {
    /// Reading a hex size line
    Size,
    /// Copying chunk payload
    Data { remaining: usize },
    /// Expecting the CRLF that closes a chunk
    DataEnd,
    /// After the zero-size chunk, skipping trailer lines
    Trailer,
    /// Terminating chunk and trailer fully consumed
    Finished,
}

/// Strips chunk framing from a body delivered in arbitrary pieces
///
/// Input may split anywhere, including inside a size line or its CRLF.
/// Chunk extensions (`1a;name=value`) are ignored.
#[derive(Debug, Clone)]
pub struct ChunkDecoder {
    state: ChunkState,
    line: Vec<u8>,
    rearm: bool,
}

impl Default for ChunkDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self {
            state: ChunkState::Size,
            line: Vec::new(),
            rearm: false,
        }
    }

    /// A decoder that never finishes
    ///
    /// A terminator chunk and its trailer are consumed and decoding carries
    /// on with the next size line, in the same input or a later one.
    pub fn rearming() -> Self {
        Self {
            rearm: true,
            ..Self::new()
        }
    }

    /// Decode `input`, appending payload bytes to `out`
    ///
    /// Returns `true` once the terminating zero-size chunk and its trailer
    /// have been seen. Bytes fed after that are ignored.
    pub fn feed(&mut self, mut input: &[u8], out: &mut Vec<u8>) -> ChatResult<bool> {
        while !input.is_empty() {
            match self.state {
                ChunkState::Finished => break,
                ChunkState::Size => {
                    let Some(line) = take_line(&mut self.line, &mut input)? else {
                        break;
                    };
                    // Stray blank lines between chunks are tolerated
                    if line.is_empty() {
                        continue;
                    }
                    let size = parse_size(&line)?;
                    self.state = if size == 0 {
                        ChunkState::Trailer
                    } else {
                        ChunkState::Data { remaining: size }
                    };
                }
                ChunkState::Data { remaining } => {
                    let n = remaining.min(input.len());
                    out.extend_from_slice(&input[..n]);
                    input = &input[n..];
                    self.state = if n == remaining {
                        ChunkState::DataEnd
                    } else {
                        ChunkState::Data {
                            remaining: remaining - n,
                        }
                    };
                }
                ChunkState::DataEnd => {
                    let Some(line) = take_line(&mut self.line, &mut input)? else {
                        break;
                    };
                    if !line.is_empty() {
                        return Err(ChatError::http("missing CRLF after chunk data"));
                    }
                    self.state = ChunkState::Size;
                }
                ChunkState::Trailer => {
                    let Some(line) = take_line(&mut self.line, &mut input)? else {
                        break;
                    };
                    if line.is_empty() {
                        self.state = if self.rearm {
                            trace!("Terminating chunk consumed, rearming");
                            ChunkState::Size
                        } else {
                            ChunkState::Finished
                        };
                    }
                }
            }
        }

        Ok(self.is_finished())
    }

    /// Whether the terminating chunk has been fully consumed
    pub fn is_finished(&self) -> bool {
        self.state == ChunkState::Finished
    }
}

/// Pull one LF-terminated line out of `input`, buffering partial lines
///
/// The returned line has its trailing CR stripped.
fn take_line(pending: &mut Vec<u8>, input: &mut &[u8]) -> ChatResult<Option<Vec<u8>>> {
    let newline = input.iter().position(|&b| b == b'\n');
    let take = newline.unwrap_or(input.len());

    if pending.len() + take > MAX_LINE_LEN {
        return Err(ChatError::http("chunk framing line too long"));
    }
    pending.extend_from_slice(&input[..take]);

    match newline {
        Some(pos) => {
            *input = &input[pos + 1..];
            let mut line = std::mem::take(pending);
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            Ok(Some(line))
        }
        None => {
            *input = &[];
            Ok(None)
        }
    }
}

fn parse_size(line: &[u8]) -> ChatResult<usize> {
    let text = std::str::from_utf8(line)
        .map_err(|_| ChatError::http("chunk size line is not ASCII"))?;
    let digits = text.split(';').next().unwrap_or("").trim();

    usize::from_str_radix(digits, 16)
        .map_err(|_| ChatError::http(format!("invalid chunk size '{}'", digits)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn decode_all(pieces: &[&[u8]]) -> (Vec<u8>, bool) {
        let mut decoder = ChunkDecoder::new();
        let mut out = Vec::new();
        let mut done = false;
        for piece in pieces {
            done = decoder.feed(piece, &mut out).unwrap();
        }
        (out, done)
    }

    #[test_case(&[b"5\r\nhello\r\n0\r\n\r\n"] ; "single piece")]
    #[test_case(&[b"5\r", b"\nhel", b"lo\r", b"\n0\r\n", b"\r\n"] ; "split inside crlf")]
    #[test_case(&[b"2\r\nhe\r\n3\r\nllo\r\n0\r\n\r\n"] ; "two chunks")]
    #[test_case(&[b"5;ext=1\r\nhello\r\n0\r\n\r\n"] ; "chunk extension")]
    #[test_case(&[b"\r\n5\r\nhello\r\n0\r\nX-Trailer: 1\r\n\r\n"] ; "stray line and trailer")]
    fn test_decodes_hello(pieces: &[&[u8]]) {
        let (out, done) = decode_all(pieces);
        assert_eq!(out, b"hello");
        assert!(done);
    }

    #[test]
    fn test_byte_at_a_time() {
        let wire = b"a\r\n0123456789\r\n1\r\n!\r\n0\r\n\r\n";
        let pieces: Vec<&[u8]> = wire.chunks(1).collect();
        let (out, done) = decode_all(&pieces);
        assert_eq!(out, b"0123456789!");
        assert!(done);
    }

    #[test]
    fn test_unfinished_body() {
        let (out, done) = decode_all(&[b"5\r\nhel"]);
        assert_eq!(out, b"hel");
        assert!(!done);
    }

    #[test]
    fn test_bytes_after_finish_are_ignored() {
        let (out, done) = decode_all(&[b"1\r\na\r\n0\r\n\r\n", b"HTTP/1.1 200 OK\r\n"]);
        assert_eq!(out, b"a");
        assert!(done);
    }

    #[test_case(b"zz\r\n" ; "non hex size")]
    #[test_case(b"2\r\nabXX\r\n" ; "missing crlf after data")]
    fn test_rejects_bad_framing(wire: &[u8]) {
        let mut decoder = ChunkDecoder::new();
        let result = decoder.feed(wire, &mut Vec::new());
        assert!(matches!(result, Err(ChatError::Http { .. })));
    }

    #[test]
    fn test_rejects_overlong_size_line() {
        let mut decoder = ChunkDecoder::new();
        let wire = vec![b'1'; MAX_LINE_LEN + 1];
        assert!(decoder.feed(&wire, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_rearming_continues_past_terminator() {
        let mut decoder = ChunkDecoder::rearming();
        let mut out = Vec::new();
        let finished = decoder
            .feed(b"1\r\na\r\n0\r\n\r\n1\r\nb\r\n", &mut out)
            .unwrap();

        assert!(!finished);
        assert_eq!(out, b"ab");
        assert!(!decoder.feed(b"0\r\n\r\n1\r\nc", &mut out).unwrap());
        assert_eq!(out, b"abc");
    }
}
