use super::check_flags;
use crate::command::{Command, CommandResult, EXIT_FAILURE, EXIT_SUCCESS};
use crate::context::ExecutionContext;
use crate::error::CommandError;
use async_trait::async_trait;

/// touch FILE...
/// Create the FILE(s) if they do not exist, or update the modification time if they do.
pub struct TouchCommand;

#[async_trait(?Send)]
impl Command for TouchCommand {
    fn description(&self) -> &str {
        "Create files or update their timestamps"
    }

    fn usage(&self) -> &str {
        "Usage: touch FILE...\nUpdate the modification time of each FILE, creating empty files as needed."
    }

    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> CommandResult {
        check_flags(ctx, "", &[])?;
        if ctx.args.is_empty() {
            return Err(CommandError::usage("missing file operand"));
        }
        let mut status = EXIT_SUCCESS;
        for file in ctx.args.clone() {
            if let Err(err) = ctx.vfs.touch(&file) {
                ctx.error(format!("cannot touch '{}': {}", file, err.reason()));
                status = EXIT_FAILURE;
            }
        }
        Ok(status)
    }
}
