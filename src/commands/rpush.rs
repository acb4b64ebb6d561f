use std::collections::VecDeque;

use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::{Entry, Store, Value};

/// Appends one or more values to the tail of the list at `key`, creating the
/// list if the key is absent. Replies with the list length after the push.
///
/// Ref: <https://redis.io/docs/latest/commands/rpush/>
#[derive(Debug, PartialEq)]
pub struct Rpush {
    pub key: String,
    pub values: Vec<Bytes>,
}

impl Executable for Rpush {
    async fn exec(self, store: Store) -> Result<Frame, CommandError> {
        let mut state = store.lock();

        match state.get_mut(&self.key) {
            Some(entry) => {
                let list = entry.value.as_list_mut().ok_or(CommandError::WrongType)?;
                list.extend(self.values);
                Ok(Frame::Integer(list.len() as i64))
            }
            None => {
                let list: VecDeque<Bytes> = self.values.into();
                let len = list.len() as i64;
                state.set(self.key, Entry::new(Value::List(list)));
                Ok(Frame::Integer(len))
            }
        }
    }
}

impl TryFrom<&mut CommandParser> for Rpush {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() < 2 {
            return Err(CommandError::WrongArgumentCount { command: "rpush" });
        }

        let key = parser.next_string()?;

        let mut values = Vec::with_capacity(parser.remaining());
        while parser.remaining() > 0 {
            values.push(parser.next_bytes()?);
        }

        Ok(Self { key, values })
    }
}
