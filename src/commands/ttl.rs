//! TTL commands (TTL, EXPIRE, EXPIREAT, PERSIST)

use super::{expect_args, parse_integer, CommandContext, CommandError, CommandHandler};
use crate::protocol::RespValue;
use crate::store::unix_now;

/// TTL command - Get the time to live for a key
///
/// Syntax: TTL key
///
/// Returns:
/// - The TTL in seconds
/// - -1 if the key exists but has no expiration
/// - -2 if the key does not exist
pub struct TtlCommand;

impl CommandHandler for TtlCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<RespValue, CommandError> {
        let [key] = expect_args::<1>(self.name(), args)?;

        Ok(RespValue::integer(ctx.store.get_ttl(key)))
    }

    fn name(&self) -> &'static str {
        "TTL"
    }

    fn syntax(&self) -> &'static str {
        "TTL key"
    }

    fn summary(&self) -> &'static str {
        "Seconds left before the key expires (-1 no TTL, -2 absent)"
    }
}

/// EXPIRE command - Set a timeout on a key
///
/// Syntax: EXPIRE key seconds
///
/// The log keeps the command as received, with relative seconds. Replay
/// recomputes the deadline from the time of the restart, so a TTL set this
/// way is extended by however long the engine was down. Use EXPIREAT for a
/// deadline that survives restarts unchanged.
pub struct ExpireCommand;

impl CommandHandler for ExpireCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<RespValue, CommandError> {
        let [key, seconds] = expect_args::<2>(self.name(), args)?;
        let seconds = parse_integer(seconds)?;

        let deadline = unix_now()
            .checked_add(seconds)
            .ok_or_else(|| CommandError::InvalidExpireTime(self.name().to_lowercase()))?;

        Ok(expiry_reply(ctx.store.set_ttl(key, deadline)))
    }

    fn name(&self) -> &'static str {
        "EXPIRE"
    }

    fn syntax(&self) -> &'static str {
        "EXPIRE key seconds"
    }

    fn summary(&self) -> &'static str {
        "Expire the key after the given number of seconds"
    }
}

/// EXPIREAT command - Set an absolute expiration time on a key
///
/// Syntax: EXPIREAT key unix-timestamp
pub struct ExpireAtCommand;

impl CommandHandler for ExpireAtCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<RespValue, CommandError> {
        let [key, timestamp] = expect_args::<2>(self.name(), args)?;
        let deadline = parse_integer(timestamp)?;

        Ok(expiry_reply(ctx.store.set_ttl(key, deadline)))
    }

    fn name(&self) -> &'static str {
        "EXPIREAT"
    }

    fn syntax(&self) -> &'static str {
        "EXPIREAT key unix-timestamp"
    }

    fn summary(&self) -> &'static str {
        "Expire the key at the given UNIX time in seconds"
    }
}

/// PERSIST command - Remove the expiration of a key
///
/// Syntax: PERSIST key
pub struct PersistCommand;

impl CommandHandler for PersistCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<RespValue, CommandError> {
        let [key] = expect_args::<1>(self.name(), args)?;

        Ok(RespValue::integer(i64::from(ctx.store.remove_expiry(key))))
    }

    fn name(&self) -> &'static str {
        "PERSIST"
    }

    fn syntax(&self) -> &'static str {
        "PERSIST key"
    }

    fn summary(&self) -> &'static str {
        "Remove the TTL of a key"
    }
}

/// +OK when the deadline was recorded, :0 when the key is absent
fn expiry_reply(applied: bool) -> RespValue {
    if applied {
        RespValue::ok()
    } else {
        RespValue::integer(0)
    }
}
