use super::check_flags;
use crate::command::{Command, CommandResult, EXIT_FAILURE, EXIT_SUCCESS};
use crate::context::ExecutionContext;
use crate::error::CommandError;
use async_trait::async_trait;

pub struct MkdirCommand;

const MKDIR_USAGE: &str = "Usage: mkdir [OPTION]... DIRECTORY...\nCreate the DIRECTORY(ies), if they do not already exist.\n\n  -p, --parents  no error if existing, make parent directories as needed";

#[async_trait(?Send)]
impl Command for MkdirCommand {
    fn description(&self) -> &str {
        "Create directories"
    }

    fn usage(&self) -> &str {
        MKDIR_USAGE
    }

    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> CommandResult {
        check_flags(ctx, "p", &["parents"])?;
        if ctx.args.is_empty() {
            return Err(CommandError::usage("missing operand"));
        }
        let parents = ctx.flags.any('p', "parents");
        let mut status = EXIT_SUCCESS;
        for dir in ctx.args.clone() {
            let result = if parents {
                ctx.vfs.mkdir_all(&dir)
            } else {
                ctx.vfs.mkdir(&dir)
            };
            if let Err(err) = result {
                ctx.error(format!("cannot create directory '{}': {}", dir, err.reason()));
                status = EXIT_FAILURE;
            }
        }
        Ok(status)
    }
}
