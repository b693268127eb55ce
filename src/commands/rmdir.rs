use super::check_flags;
use crate::command::{Command, CommandResult, EXIT_FAILURE, EXIT_SUCCESS};
use crate::context::ExecutionContext;
use crate::error::CommandError;
use async_trait::async_trait;

pub struct RmdirCommand;

#[async_trait(?Send)]
impl Command for RmdirCommand {
    fn description(&self) -> &str {
        "Remove empty directories"
    }

    fn usage(&self) -> &str {
        "Usage: rmdir DIRECTORY...\nRemove the DIRECTORY(ies), if they are empty."
    }

    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> CommandResult {
        check_flags(ctx, "", &[])?;
        if ctx.args.is_empty() {
            return Err(CommandError::usage("missing operand"));
        }
        let mut status = EXIT_SUCCESS;
        for dir in ctx.args.clone() {
            let reason = match ctx.vfs.get_node(&dir).map(|n| n.is_dir()) {
                None => Some("No such file or directory"),
                Some(false) => Some("Not a directory"),
                Some(true) => ctx.vfs.remove(&dir, false).err().map(|e| e.reason()),
            };
            if let Some(reason) = reason {
                ctx.error(format!("failed to remove '{}': {}", dir, reason));
                status = EXIT_FAILURE;
            }
        }
        Ok(status)
    }
}
