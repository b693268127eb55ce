use super::check_flags;
use crate::command::{Command, CommandResult, EXIT_SUCCESS};
use crate::context::ExecutionContext;
use async_trait::async_trait;

/// pwd
/// Print the full filename of the current working directory.
pub struct PwdCommand;

#[async_trait(?Send)]
impl Command for PwdCommand {
    fn description(&self) -> &str {
        "Print the working directory"
    }

    fn usage(&self) -> &str {
        "Usage: pwd\nPrint the full filename of the current working directory."
    }

    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> CommandResult {
        check_flags(ctx, "", &[])?;
        let cwd = ctx.vfs.cwd().to_string();
        ctx.println(&cwd);
        Ok(EXIT_SUCCESS)
    }
}
