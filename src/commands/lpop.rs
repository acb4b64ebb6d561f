use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::Store;

/// Removes and returns the head of the list at `key`. With `count`, removes
/// up to `count` head elements and returns them as an array; `count` must be
/// a positive integer.
///
/// Ref: <https://redis.io/docs/latest/commands/lpop/>
#[derive(Debug, PartialEq)]
pub struct Lpop {
    pub key: String,
    pub count: Option<usize>,
}

impl Executable for Lpop {
    async fn exec(self, store: Store) -> Result<Frame, CommandError> {
        let mut state = store.lock();

        let Some(entry) = state.get_mut(&self.key) else {
            return Ok(match self.count {
                None => Frame::Null,
                Some(_) => Frame::NullArray,
            });
        };
        let list = entry.value.as_list_mut().ok_or(CommandError::WrongType)?;

        match self.count {
            None => Ok(list.pop_front().map_or(Frame::Null, Frame::Bulk)),
            Some(count) => {
                let count = count.min(list.len());
                let frames = list.drain(..count).map(Frame::Bulk).collect();
                Ok(Frame::Array(frames))
            }
        }
    }
}

impl TryFrom<&mut CommandParser> for Lpop {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() != 1 && parser.remaining() != 2 {
            return Err(CommandError::WrongArgumentCount { command: "lpop" });
        }

        let key = parser.next_string()?;

        let count = if parser.remaining() == 1 {
            let count = parser
                .next_string()?
                .parse::<i64>()
                .map_err(|_| CommandError::InvalidInteger)?;
            if count <= 0 {
                return Err(CommandError::OutOfRange);
            }
            Some(count as usize)
        } else {
            None
        };

        Ok(Self { key, count })
    }
}
