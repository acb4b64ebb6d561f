use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use uuid::Uuid;

use crate::codec::{CodecError, FrameCodec};
use crate::frame::Frame;

/// One client connection: a TCP stream framed by [`FrameCodec`].
///
/// Data is read from the socket into the codec's buffer; a frame is returned
/// only once it has fully arrived, so commands may span any number of
/// transport reads.
pub struct Connection {
    pub id: Uuid,
    framed: Framed<TcpStream, FrameCodec>,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Connection {
        Connection {
            id: Uuid::new_v4(),
            framed: Framed::new(stream, FrameCodec),
        }
    }

    /// Reads the next frame. `Ok(None)` means the peer closed the connection.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, CodecError> {
        self.framed.next().await.transpose()
    }

    /// Writes and flushes one frame.
    pub async fn write_frame(&mut self, frame: Frame) -> Result<(), CodecError> {
        self.framed.send(frame).await
    }
}
