use bytes::Bytes;
use tokio::time::{self, Duration, Instant};

use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::Store;

// How long to wait between store polls while blocked.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Pops the head of the first non-empty list among `keys`, blocking until one
/// becomes available or `timeout` (float seconds, 0 = wait forever) expires.
/// The reply is a `[key, value]` array, or a null array on timeout.
///
/// Blocking is implemented by polling: each attempt scans the keys in
/// argument order under a single lock acquisition (check and pop are atomic),
/// then releases the lock and sleeps before retrying. The lock is never held
/// across the sleep. When several clients block on the same key, which one is
/// served first is unspecified.
///
/// Ref: <https://redis.io/docs/latest/commands/blpop/>
#[derive(Debug, PartialEq)]
pub struct Blpop {
    pub keys: Vec<String>,
    pub timeout: f64,
}

impl Executable for Blpop {
    async fn exec(self, store: Store) -> Result<Frame, CommandError> {
        let deadline =
            (self.timeout > 0.0).then(|| Instant::now() + Duration::from_secs_f64(self.timeout));

        loop {
            if let Some(reply) = self.try_pop(&store)? {
                return Ok(reply);
            }

            match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(Frame::NullArray);
                    }
                    time::sleep(POLL_INTERVAL.min(deadline - now)).await;
                }
                None => time::sleep(POLL_INTERVAL).await,
            }
        }
    }
}

impl Blpop {
    fn try_pop(&self, store: &Store) -> Result<Option<Frame>, CommandError> {
        let mut state = store.lock();

        for key in &self.keys {
            let Some(entry) = state.get_mut(key) else {
                continue;
            };
            let list = entry.value.as_list_mut().ok_or(CommandError::WrongType)?;

            if let Some(value) = list.pop_front() {
                return Ok(Some(Frame::Array(vec![
                    Frame::Bulk(Bytes::from(key.clone())),
                    Frame::Bulk(value),
                ])));
            }
        }

        Ok(None)
    }
}

impl TryFrom<&mut CommandParser> for Blpop {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() < 2 {
            return Err(CommandError::WrongArgumentCount { command: "blpop" });
        }

        let mut keys = Vec::with_capacity(parser.remaining() - 1);
        while parser.remaining() > 1 {
            keys.push(parser.next_string()?);
        }

        let timeout = parser
            .next_string()?
            .parse::<f64>()
            .map_err(|_| CommandError::InvalidTimeout)?;
        if !timeout.is_finite() || timeout < 0.0 {
            return Err(CommandError::InvalidTimeout);
        }

        Ok(Self { keys, timeout })
    }
}
