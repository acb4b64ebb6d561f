use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::{Entry, Store, Value};
use crate::stream::Stream;

/// Appends a record to the stream at `key`, creating the stream if the key is
/// absent. The `id` argument is `*` (fully auto), `<ms>-*` (auto sequence) or
/// an explicit `<ms>-<seq>`; explicit ids must exceed the stream's last id.
/// Replies with the id actually assigned, as a bulk string.
///
/// Ref: <https://redis.io/docs/latest/commands/xadd/>
#[derive(Debug, PartialEq)]
pub struct Xadd {
    pub key: String,
    pub id: String,
    pub fields: Vec<(Bytes, Bytes)>,
}

impl Executable for Xadd {
    async fn exec(self, store: Store) -> Result<Frame, CommandError> {
        let now_ms = unix_time_ms();
        let mut state = store.lock();

        match state.get_mut(&self.key) {
            Some(entry) => {
                let stream = entry.value.as_stream_mut().ok_or(CommandError::WrongType)?;
                let id = stream.resolve_id(&self.id, now_ms)?;
                stream.append(id, self.fields);
                Ok(Frame::Bulk(Bytes::from(id.to_string())))
            }
            None => {
                // Validate the id before creating anything, so a rejected
                // XADD leaves no empty stream behind.
                let mut stream = Stream::new();
                let id = stream.resolve_id(&self.id, now_ms)?;
                stream.append(id, self.fields);
                state.set(self.key, Entry::new(Value::Stream(stream)));
                Ok(Frame::Bulk(Bytes::from(id.to_string())))
            }
        }
    }
}

fn unix_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

impl TryFrom<&mut CommandParser> for Xadd {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        // Key, id and at least one field/value pair; pairs must be balanced.
        if parser.remaining() < 4 || parser.remaining() % 2 != 0 {
            return Err(CommandError::WrongArgumentCount { command: "xadd" });
        }

        let key = parser.next_string()?;
        let id = parser.next_string()?;

        let mut fields = Vec::with_capacity(parser.remaining() / 2);
        while parser.remaining() > 0 {
            let field = parser.next_bytes()?;
            let value = parser.next_bytes()?;
            fields.push((field, value));
        }

        Ok(Self { key, id, fields })
    }
}
