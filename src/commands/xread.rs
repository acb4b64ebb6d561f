use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{encode_records, CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::Store;
use crate::stream::StreamId;

/// Reads from several streams at once: for each `(key, id)` pair, returns the
/// records with ids strictly greater than `id`. Streams that are missing or
/// have nothing newer are omitted from the reply; if none qualify the reply
/// is an empty array.
///
/// Ref: <https://redis.io/docs/latest/commands/xread/>
#[derive(Debug, PartialEq)]
pub struct Xread {
    pub streams: Vec<(String, StreamId)>,
}

impl Executable for Xread {
    async fn exec(self, store: Store) -> Result<Frame, CommandError> {
        let mut state = store.lock();
        let mut replies = Vec::new();

        for (key, after) in &self.streams {
            let Some(entry) = state.get(key) else {
                continue;
            };
            let stream = entry.value.as_stream().ok_or(CommandError::WrongType)?;

            let records = stream.read_after(*after);
            if records.is_empty() {
                continue;
            }

            replies.push(Frame::Array(vec![
                Frame::Bulk(Bytes::from(key.clone())),
                Frame::Array(encode_records(records)),
            ]));
        }

        Ok(Frame::Array(replies))
    }
}

impl TryFrom<&mut CommandParser> for Xread {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() < 3 {
            return Err(CommandError::WrongArgumentCount { command: "xread" });
        }

        if !parser.next_string()?.eq_ignore_ascii_case("streams") {
            return Err(CommandError::Syntax);
        }

        // The remaining arguments are keys followed by as many ids.
        if parser.remaining() % 2 != 0 {
            return Err(CommandError::UnbalancedStreams);
        }

        let count = parser.remaining() / 2;
        let mut keys = Vec::with_capacity(count);
        for _ in 0..count {
            keys.push(parser.next_string()?);
        }

        let mut streams = Vec::with_capacity(count);
        for key in keys {
            let id = StreamId::parse_bound(&parser.next_string()?, 0)?;
            streams.push((key, id));
        }

        Ok(Self { streams })
    }
}
