//! Command Handler
//!
//! Turns a decoded [`RespValue`] into a [`Command`], runs it against the
//! [`StorageEngine`], and produces the [`Reply`] to send back.
//!
//! ## Supported Commands
//!
//! | Request                       | Reply                         |
//! |-------------------------------|-------------------------------|
//! | `ping` or `[ping]`            | `+PONG`                       |
//! | `[echo, message]`             | `+<message>`                  |
//! | `[get, key]`                  | `+<value>` or `$-1`           |
//! | `[set, key, value]`           | `+OK`                         |
//! | `[set, key, value, px, ms]`   | `+OK`                         |
//!
//! Names and the `px` option are matched case-insensitively. Anything else,
//! including a known name with the wrong number of arguments, gets
//! `-ERR Unknown Command` and the connection carries on.

use crate::protocol::{Reply, RespValue};
use crate::storage::StorageEngine;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::trace;

/// A request the server knows how to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    Echo(Bytes),
    Get(Bytes),
    Set {
        key: Bytes,
        value: Bytes,
        ttl: Option<Duration>,
    },
}

/// Why a request could not be turned into a [`Command`].
///
/// The display text is the exact error line sent to the client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unrecognized name, wrong arity, or a request shape no command uses
    #[error("ERR Unknown Command")]
    Unknown,

    /// `px` was given something other than a positive integer
    #[error("ERR invalid expire time in 'set' command")]
    InvalidExpireTime,
}

impl Command {
    /// Classifies a decoded request.
    ///
    /// # Example
    ///
    /// ```
    /// use respkv::commands::{Command, CommandError};
    /// use respkv::protocol::RespValue;
    ///
    /// let cmd = Command::parse(RespValue::command(["GET", "name"])).unwrap();
    /// assert_eq!(cmd, Command::Get("name".into()));
    ///
    /// let err = Command::parse(RespValue::command(["get"])).unwrap_err();
    /// assert_eq!(err, CommandError::Unknown);
    /// ```
    pub fn parse(request: RespValue) -> Result<Command, CommandError> {
        match request {
            RespValue::SimpleString(name) | RespValue::BulkString(name) => {
                if is_keyword(&name, "ping") {
                    Ok(Command::Ping)
                } else {
                    Err(CommandError::Unknown)
                }
            }
            RespValue::Array(items) => {
                // Every argument must be a string; nested arrays match nothing.
                let args = items
                    .into_iter()
                    .map(RespValue::into_bytes)
                    .collect::<Option<Vec<Bytes>>>()
                    .ok_or(CommandError::Unknown)?;

                Self::from_args(&args)
            }
        }
    }

    fn from_args(args: &[Bytes]) -> Result<Command, CommandError> {
        match args {
            [name] if is_keyword(name, "ping") => Ok(Command::Ping),
            [name, message] if is_keyword(name, "echo") => Ok(Command::Echo(message.clone())),
            [name, key] if is_keyword(name, "get") => Ok(Command::Get(key.clone())),
            [name, key, value] if is_keyword(name, "set") => Ok(Command::Set {
                key: key.clone(),
                value: value.clone(),
                ttl: None,
            }),
            [name, key, value, option, millis]
                if is_keyword(name, "set") && is_keyword(option, "px") =>
            {
                Ok(Command::Set {
                    key: key.clone(),
                    value: value.clone(),
                    ttl: Some(parse_millis(millis)?),
                })
            }
            _ => Err(CommandError::Unknown),
        }
    }

    /// Lowercase command name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "ping",
            Command::Echo(_) => "echo",
            Command::Get(_) => "get",
            Command::Set { .. } => "set",
        }
    }
}

#[inline]
fn is_keyword(arg: &[u8], keyword: &str) -> bool {
    arg.eq_ignore_ascii_case(keyword.as_bytes())
}

fn parse_millis(arg: &[u8]) -> Result<Duration, CommandError> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|&ms| ms > 0)
        .map(Duration::from_millis)
        .ok_or(CommandError::InvalidExpireTime)
}

/// Executes commands against the shared storage engine.
///
/// Cheap to clone; every connection gets its own handle to the same store.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    storage: Arc<StorageEngine>,
}

impl CommandHandler {
    /// Creates a new command handler with the given storage engine.
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self { storage }
    }

    /// Executes a decoded request and returns the reply.
    ///
    /// Malformed or unknown requests become error replies; this never fails.
    pub fn execute(&self, request: RespValue) -> Reply {
        match Command::parse(request) {
            Ok(command) => {
                trace!(command = command.name(), "Executing command");
                self.apply(command)
            }
            Err(e) => Reply::error(e.to_string()),
        }
    }

    /// Runs an already-classified command.
    pub fn apply(&self, command: Command) -> Reply {
        match command {
            Command::Ping => Reply::pong(),
            Command::Echo(message) => Reply::text(message),
            Command::Get(key) => match self.storage.get(&key) {
                Some(value) => Reply::text(value),
                None => Reply::Null,
            },
            Command::Set { key, value, ttl } => {
                self.storage.set(key, value, ttl);
                Reply::ok()
            }
        }
    }
}
