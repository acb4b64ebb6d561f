use bytes::Bytes;
use tokio::time::{Duration, Instant};

use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::{Entry, Store, Value};

/// Stores `value` under `key`, unconditionally replacing any prior entry of
/// any type. The optional `PX <milliseconds>` argument attaches a relative
/// expiry deadline.
///
/// Ref: <https://redis.io/docs/latest/commands/set/>
#[derive(Debug, PartialEq)]
pub struct Set {
    pub key: String,
    pub value: Bytes,
    pub expire_ms: Option<u64>,
}

impl Executable for Set {
    async fn exec(self, store: Store) -> Result<Frame, CommandError> {
        let expires_at = self
            .expire_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));

        store.lock().set(
            self.key,
            Entry {
                value: Value::String(self.value),
                expires_at,
            },
        );

        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Set {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() != 2 && parser.remaining() != 4 {
            return Err(CommandError::WrongArgumentCount { command: "set" });
        }

        let key = parser.next_string()?;
        let value = parser.next_bytes()?;

        let expire_ms = if parser.remaining() == 2 {
            let option = parser.next_string()?;
            if !option.eq_ignore_ascii_case("px") {
                return Err(CommandError::Syntax);
            }

            let ms = parser
                .next_string()?
                .parse::<u64>()
                .map_err(|_| CommandError::InvalidInteger)?;

            Some(ms)
        } else {
            None
        };

        Ok(Self {
            key,
            value,
            expire_ms,
        })
    }
}
