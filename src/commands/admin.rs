//! Admin commands (BGSAVE)

use super::{expect_args, CommandContext, CommandError, CommandHandler};
use crate::protocol::RespValue;
use tracing::info;

/// BGSAVE command - Request a background snapshot
///
/// Syntax: BGSAVE
///
/// Snapshots are not implemented; durability comes from the append-only
/// log. The command is accepted so clients that issue it keep working.
pub struct BgSaveCommand;

impl CommandHandler for BgSaveCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<RespValue, CommandError> {
        expect_args::<0>(self.name(), args)?;

        info!("BGSAVE requested ({} keys); snapshots are not supported, nothing written", ctx.store.len());
        Ok(RespValue::ok())
    }

    fn name(&self) -> &'static str {
        "BGSAVE"
    }

    fn syntax(&self) -> &'static str {
        "BGSAVE"
    }

    fn summary(&self) -> &'static str {
        "Accepted for compatibility, always replies OK"
    }
}
