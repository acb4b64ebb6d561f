use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::Store;

/// Returns the length of the list at `key`; a missing key counts as an empty
/// list of length 0.
///
/// Ref: <https://redis.io/docs/latest/commands/llen/>
#[derive(Debug, PartialEq)]
pub struct Llen {
    pub key: String,
}

impl Executable for Llen {
    async fn exec(self, store: Store) -> Result<Frame, CommandError> {
        let mut state = store.lock();

        let len = match state.get(&self.key) {
            Some(entry) => entry.value.as_list().ok_or(CommandError::WrongType)?.len(),
            None => 0,
        };

        Ok(Frame::Integer(len as i64))
    }
}

impl TryFrom<&mut CommandParser> for Llen {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() != 1 {
            return Err(CommandError::WrongArgumentCount { command: "llen" });
        }

        let key = parser.next_string()?;
        Ok(Self { key })
    }
}
