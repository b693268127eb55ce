use super::check_flags;
use crate::command::{Command, CommandResult, EXIT_FAILURE, EXIT_SUCCESS};
use crate::context::ExecutionContext;
use crate::error::CommandError;
use async_trait::async_trait;

pub struct RmCommand;

const RM_USAGE: &str = "Usage: rm [OPTION]... FILE...\nRemove (unlink) the FILE(s).\n\n  -f, --force           ignore nonexistent files, never complain about them\n  -r, -R, --recursive   remove directories and their contents recursively";

#[async_trait(?Send)]
impl Command for RmCommand {
    fn description(&self) -> &str {
        "Remove files or directories"
    }

    fn usage(&self) -> &str {
        RM_USAGE
    }

    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> CommandResult {
        check_flags(ctx, "rRf", &["recursive", "force"])?;
        let recursive = ctx.flags.has('R') || ctx.flags.any('r', "recursive");
        let force = ctx.flags.any('f', "force");
        if ctx.args.is_empty() {
            if force {
                return Ok(EXIT_SUCCESS);
            }
            return Err(CommandError::usage("missing operand"));
        }

        let mut status = EXIT_SUCCESS;
        for target in ctx.args.clone() {
            let reason = match ctx.vfs.get_node(&target).map(|n| n.is_dir()) {
                None if force => continue,
                None => Some("No such file or directory"),
                Some(true) if !recursive => Some("Is a directory"),
                Some(_) => ctx.vfs.remove(&target, recursive).err().map(|e| e.reason()),
            };
            if let Some(reason) = reason {
                ctx.error(format!("cannot remove '{}': {}", target, reason));
                status = EXIT_FAILURE;
            }
        }
        Ok(status)
    }
}
