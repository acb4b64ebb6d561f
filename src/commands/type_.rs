use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::Store;

/// Returns the string representation of the type of the value stored at
/// `key`: `string`, `list` or `stream`. A missing or expired key reports
/// `none`.
///
/// Ref: <https://redis.io/docs/latest/commands/type/>
#[derive(Debug, PartialEq)]
pub struct Type {
    pub key: String,
}

impl Executable for Type {
    async fn exec(self, store: Store) -> Result<Frame, CommandError> {
        let mut state = store.lock();
        let type_name = state
            .get(&self.key)
            .map(|entry| entry.value.type_name())
            .unwrap_or("none");

        Ok(Frame::Simple(type_name.to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Type {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() != 1 {
            return Err(CommandError::WrongArgumentCount { command: "type" });
        }

        let key = parser.next_string()?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use crate::store::{Entry, Value};
    use crate::stream::Stream;
    use bytes::Bytes;
    use std::collections::VecDeque;

    async fn type_of(store: &Store, key: &str) -> Frame {
        let cmd = Command::try_from(Frame::Array(vec![
            Frame::Bulk(Bytes::from("TYPE")),
            Frame::Bulk(Bytes::copy_from_slice(key.as_bytes())),
        ]))
        .unwrap();

        cmd.exec(store.clone()).await.unwrap()
    }

    #[tokio::test]
    async fn reports_each_type() {
        let store = Store::new();

        store.lock().set(
            String::from("string-key"),
            Entry::new(Value::String(Bytes::from("v"))),
        );
        store.lock().set(
            String::from("list-key"),
            Entry::new(Value::List(VecDeque::from([Bytes::from("a")]))),
        );
        store.lock().set(
            String::from("stream-key"),
            Entry::new(Value::Stream(Stream::new())),
        );

        assert_eq!(
            type_of(&store, "string-key").await,
            Frame::Simple("string".to_string())
        );
        assert_eq!(
            type_of(&store, "list-key").await,
            Frame::Simple("list".to_string())
        );
        assert_eq!(
            type_of(&store, "stream-key").await,
            Frame::Simple("stream".to_string())
        );
        assert_eq!(
            type_of(&store, "missing-key").await,
            Frame::Simple("none".to_string())
        );
    }
}
