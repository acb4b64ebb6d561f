pub mod blpop;
pub mod echo;
pub mod executable;
pub mod get;
pub mod llen;
pub mod lpop;
pub mod lpush;
pub mod lrange;
pub mod ping;
pub mod rpush;
pub mod set;
pub mod type_;
pub mod xadd;
pub mod xrange;
pub mod xread;

use std::{str, vec};

use bytes::Bytes;
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::store::Store;
use crate::stream::{StreamIdError, StreamRecord};

use blpop::Blpop;
use echo::Echo;
use get::Get;
use llen::Llen;
use lpop::Lpop;
use lpush::Lpush;
use lrange::Lrange;
use ping::Ping;
use rpush::Rpush;
use set::Set;
use type_::Type;
use xadd::Xadd;
use xrange::Xrange;
use xread::Xread;

#[derive(Debug, PartialEq)]
pub enum Command {
    Blpop(Blpop),
    Echo(Echo),
    Get(Get),
    Llen(Llen),
    Lpop(Lpop),
    Lpush(Lpush),
    Lrange(Lrange),
    Ping(Ping),
    Rpush(Rpush),
    Set(Set),
    Type(Type),
    Xadd(Xadd),
    Xrange(Xrange),
    Xread(Xread),
}

impl Executable for Command {
    async fn exec(self, store: Store) -> Result<Frame, CommandError> {
        match self {
            Command::Blpop(cmd) => cmd.exec(store).await,
            Command::Echo(cmd) => cmd.exec(store).await,
            Command::Get(cmd) => cmd.exec(store).await,
            Command::Llen(cmd) => cmd.exec(store).await,
            Command::Lpop(cmd) => cmd.exec(store).await,
            Command::Lpush(cmd) => cmd.exec(store).await,
            Command::Lrange(cmd) => cmd.exec(store).await,
            Command::Ping(cmd) => cmd.exec(store).await,
            Command::Rpush(cmd) => cmd.exec(store).await,
            Command::Set(cmd) => cmd.exec(store).await,
            Command::Type(cmd) => cmd.exec(store).await,
            Command::Xadd(cmd) => cmd.exec(store).await,
            Command::Xrange(cmd) => cmd.exec(store).await,
            Command::Xread(cmd) => cmd.exec(store).await,
        }
    }
}

impl TryFrom<Frame> for Command {
    type Error = CommandError;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands to the server as RESP arrays of bulk strings.
        let frames = match frame {
            Frame::Array(array) => array,
            frame => {
                return Err(CommandError::InvalidFrame {
                    expected: "array".to_string(),
                    actual: frame,
                })
            }
        };

        let parser = &mut CommandParser {
            parts: frames.into_iter(),
        };

        // Command matching is case-insensitive; argument bytes are untouched.
        let command_name = parser.parse_command_name()?;

        match &command_name[..] {
            "blpop" => Blpop::try_from(parser).map(Command::Blpop),
            "echo" => Echo::try_from(parser).map(Command::Echo),
            "get" => Get::try_from(parser).map(Command::Get),
            "llen" => Llen::try_from(parser).map(Command::Llen),
            "lpop" => Lpop::try_from(parser).map(Command::Lpop),
            "lpush" => Lpush::try_from(parser).map(Command::Lpush),
            "lrange" => Lrange::try_from(parser).map(Command::Lrange),
            "ping" => Ping::try_from(parser).map(Command::Ping),
            "rpush" => Rpush::try_from(parser).map(Command::Rpush),
            "set" => Set::try_from(parser).map(Command::Set),
            "type" => Type::try_from(parser).map(Command::Type),
            "xadd" => Xadd::try_from(parser).map(Command::Xadd),
            "xrange" => Xrange::try_from(parser).map(Command::Xrange),
            "xread" => Xread::try_from(parser).map(Command::Xread),
            _ => Err(CommandError::UnknownCommand {
                command: command_name,
            }),
        }
    }
}

/// Iterator over the argument frames of one command array.
struct CommandParser {
    parts: vec::IntoIter<Frame>,
}

impl CommandParser {
    fn parse_command_name(&mut self) -> Result<String, CommandError> {
        let command_name = self.parts.next().ok_or(CommandError::EndOfStream)?;

        match command_name {
            Frame::Simple(s) => Ok(s.to_lowercase()),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_lowercase())
                .map_err(|_| CommandError::InvalidUtf8),
            frame => Err(CommandError::InvalidFrame {
                expected: "simple string".to_string(),
                actual: frame,
            }),
        }
    }

    /// Number of argument frames not yet consumed. Commands check this up
    /// front to produce their arity errors.
    fn remaining(&self) -> usize {
        self.parts.len()
    }

    fn next_string(&mut self) -> Result<String, CommandError> {
        let frame = self.parts.next().ok_or(CommandError::EndOfStream)?;

        match frame {
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_string())
                .map_err(|_| CommandError::InvalidUtf8),
            frame => Err(CommandError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    fn next_bytes(&mut self) -> Result<Bytes, CommandError> {
        let frame = self.parts.next().ok_or(CommandError::EndOfStream)?;

        match frame {
            Frame::Simple(s) => Ok(Bytes::from(s)),
            Frame::Bulk(bytes) => Ok(bytes),
            frame => Err(CommandError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }
}

/// Everything that can go wrong between receiving a well-formed frame and
/// producing a reply. Each variant renders as a single `-ERR <message>` line.
#[derive(Debug, ThisError, PartialEq)]
pub enum CommandError {
    #[error("unknown command '{command}'")]
    UnknownCommand { command: String },
    #[error("wrong number of arguments for '{command}' command")]
    WrongArgumentCount { command: &'static str },
    #[error("wrong type")]
    WrongType,
    #[error("value is not an integer or out of range")]
    InvalidInteger,
    #[error("value is out of range, must be positive")]
    OutOfRange,
    #[error("timeout is not a float or out of range")]
    InvalidTimeout,
    #[error("syntax error")]
    Syntax,
    #[error("Unbalanced XREAD list of streams: for each stream key an ID must be specified")]
    UnbalancedStreams,
    #[error(transparent)]
    StreamId(#[from] StreamIdError),
    #[error("invalid frame, expected {expected}, got {actual:?}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("invalid UTF-8 string")]
    InvalidUtf8,
    #[error("attempting to extract a value failed due to the frame being fully consumed")]
    EndOfStream,
}

impl CommandError {
    /// The error reply sent to the client instead of a normal result.
    pub fn to_frame(&self) -> Frame {
        Frame::Error(format!("ERR {self}"))
    }
}

/// Encodes stream records the way XRANGE and XREAD replies carry them:
/// one `[id, [field1, value1, ...]]` array per record.
pub(crate) fn encode_records(records: &[StreamRecord]) -> Vec<Frame> {
    records
        .iter()
        .map(|record| {
            let mut fields = Vec::with_capacity(record.fields.len() * 2);
            for (field, value) in &record.fields {
                fields.push(Frame::Bulk(field.clone()));
                fields.push(Frame::Bulk(value.clone()));
            }

            Frame::Array(vec![
                Frame::Bulk(Bytes::from(record.id.to_string())),
                Frame::Array(fields),
            ])
        })
        .collect()
}
