use std::collections::VecDeque;

use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::{Entry, Store, Value};

/// Inserts one or more values at the head of the list at `key`, creating the
/// list if the key is absent. Each value is inserted at the head in turn, so
/// the final order is the reverse of the argument order. Replies with the
/// list length after the push.
///
/// Ref: <https://redis.io/docs/latest/commands/lpush/>
#[derive(Debug, PartialEq)]
pub struct Lpush {
    pub key: String,
    pub values: Vec<Bytes>,
}

impl Executable for Lpush {
    async fn exec(self, store: Store) -> Result<Frame, CommandError> {
        let mut state = store.lock();

        match state.get_mut(&self.key) {
            Some(entry) => {
                let list = entry.value.as_list_mut().ok_or(CommandError::WrongType)?;
                for value in self.values {
                    list.push_front(value);
                }
                Ok(Frame::Integer(list.len() as i64))
            }
            None => {
                let mut list = VecDeque::with_capacity(self.values.len());
                for value in self.values {
                    list.push_front(value);
                }
                let len = list.len() as i64;
                state.set(self.key, Entry::new(Value::List(list)));
                Ok(Frame::Integer(len))
            }
        }
    }
}

impl TryFrom<&mut CommandParser> for Lpush {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() < 2 {
            return Err(CommandError::WrongArgumentCount { command: "lpush" });
        }

        let key = parser.next_string()?;

        let mut values = Vec::with_capacity(parser.remaining());
        while parser.remaining() > 0 {
            values.push(parser.next_bytes()?);
        }

        Ok(Self { key, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    fn lpush_frame(parts: &[&str]) -> Frame {
        let mut frames = vec![Frame::Bulk(Bytes::from("LPUSH"))];
        frames.extend(
            parts
                .iter()
                .map(|part| Frame::Bulk(Bytes::copy_from_slice(part.as_bytes()))),
        );
        Frame::Array(frames)
    }

    #[tokio::test]
    async fn inserts_at_the_head_in_reverse_order() {
        let store = Store::new();

        let cmd = Command::try_from(lpush_frame(&["key1", "a", "b", "c"])).unwrap();
        let result = cmd.exec(store.clone()).await.unwrap();
        assert_eq!(result, Frame::Integer(3));

        let mut state = store.lock();
        let list = state.get("key1").unwrap().value.as_list().unwrap();
        assert_eq!(
            list.iter().cloned().collect::<Vec<_>>(),
            vec![Bytes::from("c"), Bytes::from("b"), Bytes::from("a")]
        );
    }

    #[tokio::test]
    async fn prepends_to_an_existing_list() {
        let store = Store::new();
        store.lock().set(
            String::from("key1"),
            Entry::new(Value::List(VecDeque::from([Bytes::from("x")]))),
        );

        let cmd = Command::try_from(lpush_frame(&["key1", "y"])).unwrap();
        let result = cmd.exec(store.clone()).await.unwrap();
        assert_eq!(result, Frame::Integer(2));

        let mut state = store.lock();
        let list = state.get("key1").unwrap().value.as_list().unwrap();
        assert_eq!(
            list.iter().cloned().collect::<Vec<_>>(),
            vec![Bytes::from("y"), Bytes::from("x")]
        );
    }

    #[tokio::test]
    async fn wrong_type() {
        let store = Store::new();
        store.lock().set(
            String::from("key1"),
            Entry::new(Value::String(Bytes::from("v"))),
        );

        let cmd = Command::try_from(lpush_frame(&["key1", "a"])).unwrap();

        assert_eq!(cmd.exec(store.clone()).await, Err(CommandError::WrongType));
    }
}
