use std::io::Cursor;

use bytes::{Buf, BytesMut};
use thiserror::Error as ThisError;
use tokio_util::codec::{Decoder, Encoder};

use crate::frame::{Frame, FrameError};

// Upper bound on a single frame, to keep a misbehaving client from growing
// the read buffer without limit.
const MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

#[derive(Debug, ThisError)]
pub enum CodecError {
    #[error("{0}")]
    Protocol(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Stateless codec between the raw byte stream and [`Frame`]s.
///
/// Decoding buffers incrementally: a command split across several transport
/// reads yields `Ok(None)` until the whole frame has arrived. A malformed
/// frame discards the read buffer (the stream offset into a corrupt command
/// is unknowable) and surfaces `CodecError::Protocol` so the caller can
/// report it and keep the connection open.
pub struct FrameCodec;

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() > MAX_FRAME_SIZE {
            src.clear();
            return Err(CodecError::Protocol("frame size exceeds limit".to_string()));
        }

        let mut cursor = Cursor::new(&src[..]);

        match Frame::parse(&mut cursor) {
            Ok(frame) => {
                // Remove the parsed frame from the buffer; anything after it
                // belongs to the next (possibly pipelined) command.
                let position = cursor.position() as usize;
                src.advance(position);
                Ok(Some(frame))
            }
            Err(FrameError::Incomplete) => Ok(None),
            Err(FrameError::Protocol(msg)) => {
                src.clear();
                Err(CodecError::Protocol(msg))
            }
        }
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = CodecError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&frame.serialize());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn decode_incomplete_returns_none() {
        let mut codec = FrameCodec;
        let mut buffer = BytesMut::from(&b"*2\r\n$4\r\nECHO\r\n$2\r\nhi"[..]);

        let decoded = codec.decode(&mut buffer).unwrap();

        assert!(decoded.is_none());
        // The partial frame stays buffered for the next read.
        assert!(!buffer.is_empty());
    }

    #[test]
    fn decode_consumes_exactly_one_frame() {
        let mut codec = FrameCodec;
        let mut buffer =
            BytesMut::from(&b"*1\r\n$4\r\nPING\r\n*2\r\n$4\r\nECHO\r\n$2\r\nhi\r\n"[..]);

        let first = codec.decode(&mut buffer).unwrap();
        assert_eq!(
            first,
            Some(Frame::Array(vec![Frame::Bulk(Bytes::from("PING"))]))
        );

        let second = codec.decode(&mut buffer).unwrap();
        assert_eq!(
            second,
            Some(Frame::Array(vec![
                Frame::Bulk(Bytes::from("ECHO")),
                Frame::Bulk(Bytes::from("hi")),
            ]))
        );

        assert!(buffer.is_empty());
        assert!(codec.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn decode_malformed_clears_buffer() {
        let mut codec = FrameCodec;
        let mut buffer = BytesMut::from(&b"*1\r\n$3\r\nPING\r\n"[..]);

        let result = codec.decode(&mut buffer);

        assert!(matches!(result, Err(CodecError::Protocol(_))));
        assert!(buffer.is_empty());
    }

    #[test]
    fn encode_serializes_frame() {
        let mut codec = FrameCodec;
        let mut buffer = BytesMut::new();

        codec
            .encode(Frame::Simple("OK".to_string()), &mut buffer)
            .unwrap();

        assert_eq!(&buffer[..], b"+OK\r\n");
    }
}
