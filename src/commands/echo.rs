use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::Store;

/// Returns the given message as a bulk string.
///
/// Ref: <https://redis.io/docs/latest/commands/echo>
#[derive(Debug, PartialEq)]
pub struct Echo {
    pub message: Bytes,
}

impl Executable for Echo {
    async fn exec(self, _store: Store) -> Result<Frame, CommandError> {
        Ok(Frame::Bulk(self.message))
    }
}

impl TryFrom<&mut CommandParser> for Echo {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() != 1 {
            return Err(CommandError::WrongArgumentCount { command: "echo" });
        }

        let message = parser.next_bytes()?;
        Ok(Self { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    #[tokio::test]
    async fn echoes_message() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("ECHO")),
            Frame::Bulk(Bytes::from("hey")),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Echo(Echo {
                message: Bytes::from("hey")
            })
        );

        let result = cmd.exec(Store::new()).await.unwrap();

        assert_eq!(result, Frame::Bulk(Bytes::from("hey")));
    }

    #[tokio::test]
    async fn missing_message() {
        let frame = Frame::Array(vec![Frame::Bulk(Bytes::from("ECHO"))]);

        assert_eq!(
            Command::try_from(frame),
            Err(CommandError::WrongArgumentCount { command: "echo" })
        );
    }
}
