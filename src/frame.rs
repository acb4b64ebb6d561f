// https://redis.io/docs/reference/protocol-spec

use std::io::Cursor;

use bytes::{Buf, Bytes};
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

#[derive(Debug, ThisError)]
pub enum FrameError {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// A single RESP value. Client requests arrive as `Array`s of `Bulk` strings;
/// replies use the full set of variants.
///
/// `Null` serializes as a null bulk string (`$-1`) and `NullArray` as a null
/// array (`*-1`); RESP2 keeps these as two distinct wire encodings.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    NullArray,
    Array(Vec<Frame>),
}

impl Frame {
    /// Parses one frame out of `src`, leaving the cursor just past it.
    ///
    /// Returns `FrameError::Incomplete` when the buffer ends mid-frame, so the
    /// caller can wait for more bytes and retry with the same data prefix.
    /// Any structural violation (unknown sigil, non-numeric length, bulk data
    /// not terminated by CRLF) is a `FrameError::Protocol`.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, FrameError> {
        // The first byte in a RESP-serialized payload identifies its type.
        let sigil = get_byte(src)?;

        match sigil {
            b'+' => {
                let line = get_line(src)?.to_vec();
                let string = String::from_utf8(line)
                    .map_err(|_| FrameError::Protocol("invalid UTF-8 in simple string".into()))?;
                Ok(Frame::Simple(string))
            }
            b'-' => {
                let line = get_line(src)?.to_vec();
                let string = String::from_utf8(line)
                    .map_err(|_| FrameError::Protocol("invalid UTF-8 in error".into()))?;
                Ok(Frame::Error(string))
            }
            b':' => {
                let line = get_line(src)?;
                let integer = parse_decimal(line)?;
                Ok(Frame::Integer(integer))
            }
            // $<length>\r\n<data>\r\n
            b'$' => {
                let line = get_line(src)?;
                let length = parse_decimal(line)?;

                if length == -1 {
                    return Ok(Frame::Null);
                }

                let length = usize::try_from(length)
                    .map_err(|_| FrameError::Protocol("negative bulk string length".into()))?;

                // The declared length is authoritative: read exactly that many
                // bytes and require the terminating CRLF, rather than scanning
                // for the next CRLF (bulk data may contain CRLF itself).
                if src.remaining() < length + CRLF.len() {
                    return Err(FrameError::Incomplete);
                }

                let start = src.position() as usize;
                let data = Bytes::copy_from_slice(&src.get_ref()[start..start + length]);

                if &src.get_ref()[start + length..start + length + CRLF.len()] != CRLF {
                    return Err(FrameError::Protocol(
                        "bulk string length mismatch".to_string(),
                    ));
                }

                src.advance(length + CRLF.len());

                Ok(Frame::Bulk(data))
            }
            // *<number-of-elements>\r\n<element-1>...<element-n>
            b'*' => {
                let line = get_line(src)?;
                let length = parse_decimal(line)?;

                if length == -1 {
                    return Ok(Frame::NullArray);
                }

                let length = usize::try_from(length)
                    .map_err(|_| FrameError::Protocol("negative array length".into()))?;

                // The declared count is untrusted; cap the preallocation so a
                // huge header cannot overflow capacity before any element has
                // actually been parsed.
                let mut frames = Vec::with_capacity(length.min(1024));
                for _ in 0..length {
                    frames.push(Self::parse(src)?);
                }

                Ok(Frame::Array(frames))
            }
            sigil => Err(FrameError::Protocol(format!(
                "invalid frame type byte {:#04x}",
                sigil
            ))),
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Frame::Simple(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(b'+');
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Error(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(b'-');
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Integer(i) => {
                let digits = i.to_string();
                let mut bytes = Vec::with_capacity(1 + digits.len() + CRLF.len());
                bytes.push(b':');
                bytes.extend_from_slice(digits.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Bulk(data) => {
                let digits = data.len().to_string();
                let mut bytes = Vec::with_capacity(1 + digits.len() + 2 * CRLF.len() + data.len());
                bytes.push(b'$');
                bytes.extend_from_slice(digits.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes.extend_from_slice(data);
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Null => b"$-1\r\n".to_vec(),
            Frame::NullArray => b"*-1\r\n".to_vec(),
            Frame::Array(frames) => {
                let digits = frames.len().to_string();
                let mut bytes = Vec::with_capacity(1 + digits.len() + CRLF.len());
                bytes.push(b'*');
                bytes.extend_from_slice(digits.as_bytes());
                bytes.extend_from_slice(CRLF);
                for frame in frames {
                    bytes.extend(frame.serialize());
                }
                bytes
            }
        }
    }
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        frame.serialize()
    }
}

fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], FrameError> {
    let start = src.position() as usize;
    // Copy the inner slice out so the returned line borrows the underlying
    // buffer, not the cursor.
    let buffer: &'a [u8] = *src.get_ref();

    let line_end = buffer[start..]
        .windows(CRLF.len())
        .position(|window| window == CRLF)
        .map(|index| start + index)
        .ok_or(FrameError::Incomplete)?;

    src.set_position((line_end + CRLF.len()) as u64);

    Ok(&buffer[start..line_end])
}

fn get_byte(src: &mut Cursor<&[u8]>) -> Result<u8, FrameError> {
    if !src.has_remaining() {
        return Err(FrameError::Incomplete);
    }
    Ok(src.get_u8())
}

fn parse_decimal(line: &[u8]) -> Result<i64, FrameError> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            FrameError::Protocol(format!(
                "invalid decimal '{}'",
                String::from_utf8_lossy(line)
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &[u8]) -> Result<Frame, FrameError> {
        let mut cursor = Cursor::new(data);
        Frame::parse(&mut cursor)
    }

    #[test]
    fn parse_simple_string_frame() {
        assert!(matches!(parse(b"+OK\r\n"), Ok(Frame::Simple(ref s)) if s == "OK"));
    }

    #[test]
    fn parse_simple_error_frame() {
        assert!(matches!(
            parse(b"-Error message\r\n"),
            Ok(Frame::Error(ref s)) if s == "Error message"
        ));
    }

    #[test]
    fn parse_integer_frames() {
        assert!(matches!(parse(b":1000\r\n"), Ok(Frame::Integer(1000))));
        assert!(matches!(parse(b":-1000\r\n"), Ok(Frame::Integer(-1000))));
        assert!(matches!(parse(b":0\r\n"), Ok(Frame::Integer(0))));
    }

    #[test]
    fn parse_bulk_string_frame() {
        assert!(matches!(
            parse(b"$6\r\nfoobar\r\n"),
            Ok(Frame::Bulk(ref b)) if b == &Bytes::from("foobar")
        ));
    }

    #[test]
    fn parse_bulk_string_frame_empty() {
        assert!(matches!(
            parse(b"$0\r\n\r\n"),
            Ok(Frame::Bulk(ref b)) if b.is_empty()
        ));
    }

    #[test]
    fn parse_bulk_string_frame_null() {
        assert!(matches!(parse(b"$-1\r\n"), Ok(Frame::Null)));
    }

    #[test]
    fn parse_bulk_string_with_embedded_crlf() {
        // The declared length wins over any CRLF inside the payload.
        assert!(matches!(
            parse(b"$8\r\nfoo\r\nbar\r\n"),
            Ok(Frame::Bulk(ref b)) if b == &Bytes::from("foo\r\nbar")
        ));
    }

    #[test]
    fn parse_bulk_string_length_mismatch() {
        assert!(matches!(
            parse(b"$3\r\nfoobar\r\n"),
            Err(FrameError::Protocol(_))
        ));
    }

    #[test]
    fn parse_array_frame_empty() {
        assert!(matches!(parse(b"*0\r\n"), Ok(Frame::Array(ref a)) if a.is_empty()));
    }

    #[test]
    fn parse_array_frame_null() {
        assert!(matches!(parse(b"*-1\r\n"), Ok(Frame::NullArray)));
    }

    #[test]
    fn parse_command_array() {
        let frame = parse(b"*3\r\n$3\r\nSET\r\n$5\r\nmykey\r\n$7\r\nmyvalue\r\n").unwrap();

        assert_eq!(
            frame,
            Frame::Array(vec![
                Frame::Bulk(Bytes::from("SET")),
                Frame::Bulk(Bytes::from("mykey")),
                Frame::Bulk(Bytes::from("myvalue")),
            ])
        );
    }

    #[test]
    fn parse_nested_array_frame() {
        let frame = parse(b"*2\r\n*3\r\n:1\r\n:2\r\n:3\r\n*2\r\n+Hello\r\n-World\r\n").unwrap();

        assert_eq!(
            frame,
            Frame::Array(vec![
                Frame::Array(vec![
                    Frame::Integer(1),
                    Frame::Integer(2),
                    Frame::Integer(3)
                ]),
                Frame::Array(vec![
                    Frame::Simple("Hello".to_string()),
                    Frame::Error("World".to_string())
                ]),
            ])
        );
    }

    #[test]
    fn parse_incomplete_frames() {
        assert!(matches!(parse(b""), Err(FrameError::Incomplete)));
        assert!(matches!(
            parse(b"*2\r\n$3\r\nGET\r\n"),
            Err(FrameError::Incomplete)
        ));
        assert!(matches!(parse(b"$10\r\nhello"), Err(FrameError::Incomplete)));
        assert!(matches!(parse(b":123"), Err(FrameError::Incomplete)));
    }

    #[test]
    fn parse_array_with_huge_declared_count() {
        // The header alone must not allocate; the missing elements simply
        // leave the frame incomplete.
        assert!(matches!(
            parse(b"*9223372036854775807\r\n"),
            Err(FrameError::Incomplete)
        ));
        assert!(matches!(
            parse(b"*1000000\r\n+OK\r\n"),
            Err(FrameError::Incomplete)
        ));
    }

    #[test]
    fn parse_invalid_sigil() {
        assert!(matches!(parse(b"@foo\r\n"), Err(FrameError::Protocol(_))));
    }

    #[test]
    fn parse_invalid_length() {
        assert!(matches!(parse(b"$abc\r\n"), Err(FrameError::Protocol(_))));
        assert!(matches!(parse(b"*-4\r\n"), Err(FrameError::Protocol(_))));
    }

    #[test]
    fn serialize_round_trip() {
        let frames = vec![
            Frame::Simple("OK".to_string()),
            Frame::Error("ERR unknown command".to_string()),
            Frame::Integer(42),
            Frame::Bulk(Bytes::from("hello")),
            Frame::Null,
            Frame::NullArray,
            Frame::Array(vec![
                Frame::Bulk(Bytes::from("a")),
                Frame::Integer(-7),
                Frame::Null,
            ]),
        ];

        for frame in frames {
            let bytes = frame.serialize();
            let parsed = parse(&bytes).unwrap();
            assert_eq!(parsed, frame);
        }
    }

    #[test]
    fn serialize_null_encodings() {
        assert_eq!(Frame::Null.serialize(), b"$-1\r\n");
        assert_eq!(Frame::NullArray.serialize(), b"*-1\r\n");
        assert_eq!(Frame::Array(vec![]).serialize(), b"*0\r\n");
    }
}
