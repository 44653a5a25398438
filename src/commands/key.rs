//! Key commands (DEL, EXISTS)

use super::{expect_args, CommandContext, CommandError, CommandHandler};
use crate::protocol::RespValue;

/// DEL command - Delete a key
///
/// Syntax: DEL key
///
/// Replies +OK when the key existed, nil otherwise.
pub struct DelCommand;

impl CommandHandler for DelCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<RespValue, CommandError> {
        let [key] = expect_args::<1>(self.name(), args)?;

        Ok(if ctx.store.delete(key) {
            RespValue::ok()
        } else {
            RespValue::null()
        })
    }

    fn name(&self) -> &'static str {
        "DEL"
    }

    fn syntax(&self) -> &'static str {
        "DEL key"
    }

    fn summary(&self) -> &'static str {
        "Delete a key and its TTL"
    }
}

/// EXISTS command - Check if a key exists
///
/// Syntax: EXISTS key
pub struct ExistsCommand;

impl CommandHandler for ExistsCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<RespValue, CommandError> {
        let [key] = expect_args::<1>(self.name(), args)?;

        Ok(RespValue::integer(i64::from(ctx.store.exists(key))))
    }

    fn name(&self) -> &'static str {
        "EXISTS"
    }

    fn syntax(&self) -> &'static str {
        "EXISTS key"
    }

    fn summary(&self) -> &'static str {
        "Reply 1 if the key exists, 0 otherwise"
    }
}
