use crate::commands::executable::Executable;
use crate::commands::{encode_records, CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::Store;
use crate::stream::StreamId;

/// Returns the records of the stream at `key` whose ids fall inside the
/// inclusive `[start, end]` range. `-` and `+` denote the unbounded ends; a
/// bare `<ms>` bound defaults the sequence part (0 at the start, the maximum
/// at the end). A missing key yields an empty array.
///
/// Ref: <https://redis.io/docs/latest/commands/xrange/>
#[derive(Debug, PartialEq)]
pub struct Xrange {
    pub key: String,
    pub start: StreamId,
    pub end: StreamId,
}

impl Executable for Xrange {
    async fn exec(self, store: Store) -> Result<Frame, CommandError> {
        let mut state = store.lock();

        let Some(entry) = state.get(&self.key) else {
            return Ok(Frame::Array(vec![]));
        };
        let stream = entry.value.as_stream().ok_or(CommandError::WrongType)?;

        Ok(Frame::Array(encode_records(
            stream.range(self.start, self.end),
        )))
    }
}

impl TryFrom<&mut CommandParser> for Xrange {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() != 3 {
            return Err(CommandError::WrongArgumentCount { command: "xrange" });
        }

        let key = parser.next_string()?;

        let start = match parser.next_string()?.as_str() {
            "-" => StreamId::MIN,
            bound => StreamId::parse_bound(bound, 0)?,
        };
        let end = match parser.next_string()?.as_str() {
            "+" => StreamId::MAX,
            bound => StreamId::parse_bound(bound, u64::MAX)?,
        };

        Ok(Self { key, start, end })
    }
}
