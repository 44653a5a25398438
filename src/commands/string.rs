//! String commands (SET, GET)

use super::{expect_args, CommandContext, CommandError, CommandHandler};
use crate::protocol::RespValue;
use crate::store::Value;

/// SET command - Set a key to a value
///
/// Syntax: SET key value
///
/// Canonical decimal values are stored with the integer encoding so
/// INCRBY/DECRBY can operate on them. An existing TTL is kept.
pub struct SetCommand;

impl CommandHandler for SetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<RespValue, CommandError> {
        let [key, value] = expect_args::<2>(self.name(), args)?;

        ctx.store.set(key.as_str(), Value::from_client_text(value));

        Ok(RespValue::ok())
    }

    fn name(&self) -> &'static str {
        "SET"
    }

    fn syntax(&self) -> &'static str {
        "SET key value"
    }

    fn summary(&self) -> &'static str {
        "Set the value of a key"
    }
}

/// GET command - Get the value of a key
///
/// Syntax: GET key
pub struct GetCommand;

impl CommandHandler for GetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<RespValue, CommandError> {
        let [key] = expect_args::<1>(self.name(), args)?;

        Ok(match ctx.store.get(key) {
            Some(value) => RespValue::bulk_string(value.to_string()),
            None => RespValue::null(),
        })
    }

    fn name(&self) -> &'static str {
        "GET"
    }

    fn syntax(&self) -> &'static str {
        "GET key"
    }

    fn summary(&self) -> &'static str {
        "Get the value of a key, nil if absent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::to_args;
    use crate::store::Encoding;

    #[test]
    fn test_set_get() {
        let mut ctx = CommandContext::new();

        let result = SetCommand.execute(&mut ctx, &to_args(&["mykey", "myvalue"]));
        assert_eq!(result, Ok(RespValue::ok()));

        let result = GetCommand.execute(&mut ctx, &to_args(&["mykey"]));
        assert_eq!(result, Ok(RespValue::bulk_string("myvalue")));
    }

    #[test]
    fn test_get_nonexistent() {
        let mut ctx = CommandContext::new();
        let result = GetCommand.execute(&mut ctx, &to_args(&["nonexistent"]));
        assert_eq!(result, Ok(RespValue::null()));
    }

    #[test]
    fn test_numeric_set_uses_int_encoding() {
        let mut ctx = CommandContext::new();
        SetCommand.execute(&mut ctx, &to_args(&["n", "123"])).unwrap();

        assert_eq!(ctx.store.get("n").unwrap().encoding(), Encoding::Int);
        let result = GetCommand.execute(&mut ctx, &to_args(&["n"]));
        assert_eq!(result, Ok(RespValue::bulk_string("123")));
    }

    #[test]
    fn test_wrong_arity() {
        let mut ctx = CommandContext::new();
        assert_eq!(
            SetCommand.execute(&mut ctx, &to_args(&["only-key"])),
            Err(CommandError::WrongArity("set".to_string()))
        );
        assert_eq!(
            GetCommand.execute(&mut ctx, &to_args(&["a", "b"])),
            Err(CommandError::WrongArity("get".to_string()))
        );
    }
}
