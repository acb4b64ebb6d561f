use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::Store;

/// Returns the inclusive slice of the list at `key` between `start` and
/// `end`. Negative indices count from the tail (-1 is the last element);
/// out-of-range indices are clamped, and an inverted range after resolution
/// yields an empty array, as does a missing key.
///
/// Ref: <https://redis.io/docs/latest/commands/lrange/>
#[derive(Debug, PartialEq)]
pub struct Lrange {
    pub key: String,
    pub start: i64,
    pub end: i64,
}

impl Executable for Lrange {
    async fn exec(self, store: Store) -> Result<Frame, CommandError> {
        let mut state = store.lock();

        let Some(entry) = state.get(&self.key) else {
            return Ok(Frame::Array(vec![]));
        };
        let list = entry.value.as_list().ok_or(CommandError::WrongType)?;

        let len = list.len() as i64;
        let start = resolve_index(self.start, len).max(0);
        let end = resolve_index(self.end, len).min(len - 1);

        if start > end {
            return Ok(Frame::Array(vec![]));
        }

        let frames = list
            .iter()
            .skip(start as usize)
            .take((end - start + 1) as usize)
            .map(|value| Frame::Bulk(value.clone()))
            .collect();

        Ok(Frame::Array(frames))
    }
}

fn resolve_index(index: i64, len: i64) -> i64 {
    if index < 0 {
        index + len
    } else {
        index
    }
}

impl TryFrom<&mut CommandParser> for Lrange {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() != 3 {
            return Err(CommandError::WrongArgumentCount { command: "lrange" });
        }

        let key = parser.next_string()?;
        let start = parser
            .next_string()?
            .parse::<i64>()
            .map_err(|_| CommandError::InvalidInteger)?;
        let end = parser
            .next_string()?
            .parse::<i64>()
            .map_err(|_| CommandError::InvalidInteger)?;

        Ok(Self { key, start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use crate::store::{Entry, Value};
    use bytes::Bytes;
    use std::collections::VecDeque;

    fn store_with_list(key: &str, values: &[&str]) -> Store {
        let store = Store::new();
        let list: VecDeque<Bytes> = values
            .iter()
            .map(|v| Bytes::copy_from_slice(v.as_bytes()))
            .collect();
        store
            .lock()
            .set(key.to_string(), Entry::new(Value::List(list)));
        store
    }

    async fn lrange(store: &Store, key: &str, start: &str, end: &str) -> Frame {
        let cmd = Command::try_from(Frame::Array(vec![
            Frame::Bulk(Bytes::from("LRANGE")),
            Frame::Bulk(Bytes::copy_from_slice(key.as_bytes())),
            Frame::Bulk(Bytes::copy_from_slice(start.as_bytes())),
            Frame::Bulk(Bytes::copy_from_slice(end.as_bytes())),
        ]))
        .unwrap();

        cmd.exec(store.clone()).await.unwrap()
    }

    fn bulk_array(values: &[&str]) -> Frame {
        Frame::Array(
            values
                .iter()
                .map(|v| Frame::Bulk(Bytes::copy_from_slice(v.as_bytes())))
                .collect(),
        )
    }

    #[tokio::test]
    async fn positive_range() {
        let store = store_with_list("key1", &["a", "b", "c", "d", "e"]);

        assert_eq!(
            lrange(&store, "key1", "1", "3").await,
            bulk_array(&["b", "c", "d"])
        );
    }

    #[tokio::test]
    async fn negative_indices_count_from_the_tail() {
        let store = store_with_list("key1", &["a", "b", "c", "d", "e"]);

        assert_eq!(
            lrange(&store, "key1", "-3", "-1").await,
            bulk_array(&["c", "d", "e"])
        );
        assert_eq!(
            lrange(&store, "key1", "0", "-1").await,
            bulk_array(&["a", "b", "c", "d", "e"])
        );
    }

    #[tokio::test]
    async fn out_of_range_indices_are_clamped() {
        let store = store_with_list("key1", &["a", "b", "c"]);

        assert_eq!(
            lrange(&store, "key1", "-100", "100").await,
            bulk_array(&["a", "b", "c"])
        );
    }

    #[tokio::test]
    async fn inverted_range_is_empty() {
        let store = store_with_list("key1", &["a", "b", "c"]);

        assert_eq!(lrange(&store, "key1", "2", "1").await, bulk_array(&[]));
        assert_eq!(lrange(&store, "key1", "5", "10").await, bulk_array(&[]));
    }

    #[tokio::test]
    async fn missing_key_is_empty() {
        let store = Store::new();

        assert_eq!(lrange(&store, "nope", "0", "-1").await, bulk_array(&[]));
    }

    #[tokio::test]
    async fn rejects_non_integer_indices() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("LRANGE")),
            Frame::Bulk(Bytes::from("key1")),
            Frame::Bulk(Bytes::from("zero")),
            Frame::Bulk(Bytes::from("-1")),
        ]);

        assert_eq!(Command::try_from(frame), Err(CommandError::InvalidInteger));
    }
}
