use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::Store;

/// Gets the value of `key`. A missing or expired key yields the null bulk
/// string; a key holding a non-string value is an error.
///
/// Ref: <https://redis.io/docs/latest/commands/get/>
#[derive(Debug, PartialEq)]
pub struct Get {
    pub key: String,
}

impl Executable for Get {
    async fn exec(self, store: Store) -> Result<Frame, CommandError> {
        let mut state = store.lock();

        match state.get(&self.key) {
            Some(entry) => {
                let value = entry.value.as_string().ok_or(CommandError::WrongType)?;
                Ok(Frame::Bulk(value.clone()))
            }
            None => Ok(Frame::Null),
        }
    }
}

impl TryFrom<&mut CommandParser> for Get {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() != 1 {
            return Err(CommandError::WrongArgumentCount { command: "get" });
        }

        let key = parser.next_string()?;
        Ok(Self { key })
    }
}
