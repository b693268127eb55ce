use super::{check_flags, describe};
use crate::command::{Command, CommandResult, EXIT_FAILURE, EXIT_SUCCESS};
use crate::context::ExecutionContext;
use crate::error::CommandError;
use async_trait::async_trait;

pub struct CpCommand;

const CP_USAGE: &str = "Usage: cp [OPTION]... SOURCE DEST\n  or:  cp [OPTION]... SOURCE... DIRECTORY\nCopy SOURCE to DEST, or multiple SOURCE(s) into DIRECTORY.\n\n  -r, -R, --recursive  copy directories recursively";

#[async_trait(?Send)]
impl Command for CpCommand {
    fn description(&self) -> &str {
        "Copy files and directories"
    }

    fn usage(&self) -> &str {
        CP_USAGE
    }

    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> CommandResult {
        check_flags(ctx, "rR", &["recursive"])?;
        let recursive = ctx.flags.has('R') || ctx.flags.any('r', "recursive");
        let args = ctx.args.clone();
        let (dest, sources) = match args.split_last() {
            None => return Err(CommandError::usage("missing file operand")),
            Some((only, [])) => {
                return Err(CommandError::usage(format!(
                    "missing destination file operand after '{}'",
                    only
                )))
            }
            Some((dest, sources)) => (dest.as_str(), sources),
        };
        if sources.len() > 1 && !ctx.vfs.get_node(dest).is_some_and(|n| n.is_dir()) {
            return Err(CommandError::failed(format!("target '{}' is not a directory", dest)));
        }

        let mut status = EXIT_SUCCESS;
        for src in sources {
            if !recursive && ctx.vfs.get_node(src).is_some_and(|n| n.is_dir()) {
                ctx.error(format!("-r not specified; omitting directory '{}'", src));
                status = EXIT_FAILURE;
                continue;
            }
            if let Err(err) = ctx.vfs.copy(src, dest, recursive) {
                let msg = describe(ctx.vfs, &[src.as_str(), dest], &err);
                ctx.error(msg);
                status = EXIT_FAILURE;
            }
        }
        Ok(status)
    }
}
