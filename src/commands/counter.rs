//! Counter commands (INCRBY, DECRBY)

use super::{expect_args, parse_integer, CommandContext, CommandError, CommandHandler};
use crate::protocol::RespValue;

/// INCRBY command - Increment the integer value of a key by the given amount
///
/// Syntax: INCRBY key increment
pub struct IncrByCommand;

impl CommandHandler for IncrByCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<RespValue, CommandError> {
        let [key, increment] = expect_args::<2>(self.name(), args)?;
        let increment = parse_integer(increment)?;

        let updated = ctx.store.increment_by(key, increment)?;
        Ok(RespValue::integer(updated))
    }

    fn name(&self) -> &'static str {
        "INCRBY"
    }

    fn syntax(&self) -> &'static str {
        "INCRBY key increment"
    }

    fn summary(&self) -> &'static str {
        "Add to the integer value of a key, missing keys start at 0"
    }
}

/// DECRBY command - Decrement the integer value of a key by the given amount
///
/// Syntax: DECRBY key decrement
pub struct DecrByCommand;

impl CommandHandler for DecrByCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<RespValue, CommandError> {
        let [key, decrement] = expect_args::<2>(self.name(), args)?;
        let decrement = parse_integer(decrement)?;

        let updated = ctx.store.decrement_by(key, decrement)?;
        Ok(RespValue::integer(updated))
    }

    fn name(&self) -> &'static str {
        "DECRBY"
    }

    fn syntax(&self) -> &'static str {
        "DECRBY key decrement"
    }

    fn summary(&self) -> &'static str {
        "Subtract from the integer value of a key, missing keys start at 0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::to_args;
    use crate::store::{StoreError, Value};

    #[test]
    fn test_incrby() {
        let mut ctx = CommandContext::new();
        let args = to_args(&["counter", "10"]);

        // INCRBY on non-existent key
        assert_eq!(IncrByCommand.execute(&mut ctx, &args), Ok(RespValue::integer(10)));

        // INCRBY again
        assert_eq!(IncrByCommand.execute(&mut ctx, &args), Ok(RespValue::integer(20)));
    }

    #[test]
    fn test_decrby() {
        let mut ctx = CommandContext::new();
        let args = to_args(&["counter", "5"]);

        assert_eq!(DecrByCommand.execute(&mut ctx, &args), Ok(RespValue::integer(-5)));
        assert_eq!(DecrByCommand.execute(&mut ctx, &args), Ok(RespValue::integer(-10)));
    }

    #[test]
    fn test_incrby_on_text() {
        let mut ctx = CommandContext::new();
        ctx.store.set("name", Value::text("alice"));

        let result = IncrByCommand.execute(&mut ctx, &to_args(&["name", "1"]));
        assert_eq!(result, Err(CommandError::Store(StoreError::NotAnInteger)));
    }

    #[test]
    fn test_incrby_bad_delta() {
        let mut ctx = CommandContext::new();
        let result = IncrByCommand.execute(&mut ctx, &to_args(&["c", "1.5"]));
        assert_eq!(result, Err(CommandError::InvalidInteger));
        assert!(!ctx.store.exists("c"));
    }

    #[test]
    fn test_incrby_overflow() {
        let mut ctx = CommandContext::new();
        ctx.store.set("c", Value::integer(i64::MAX - 1));

        let result = IncrByCommand.execute(&mut ctx, &to_args(&["c", "2"]));
        assert_eq!(result, Err(CommandError::Store(StoreError::Overflow)));
    }
}
