use super::check_flags;
use crate::command::{Command, CommandResult, EXIT_FAILURE, EXIT_SUCCESS};
use crate::context::ExecutionContext;
use crate::error::CommandError;
use async_trait::async_trait;

pub struct CatCommand;

const CAT_USAGE: &str = "Usage: cat [OPTION]... FILE...\nConcatenate FILE(s) to standard output.\n\n  -n, --number   number all output lines\n      --help     display this help and exit";

#[async_trait(?Send)]
impl Command for CatCommand {
    fn description(&self) -> &str {
        "Print file contents"
    }

    fn usage(&self) -> &str {
        CAT_USAGE
    }

    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> CommandResult {
        check_flags(ctx, "n", &["number"])?;
        if ctx.args.is_empty() {
            return Err(CommandError::usage("missing file operand"));
        }
        let number = ctx.flags.any('n', "number");
        let mut status = EXIT_SUCCESS;
        let mut line_no = 1;

        for name in ctx.args.clone() {
            let content = match ctx.vfs.get_node(&name) {
                Some(node) if node.is_dir() => Err("Is a directory"),
                Some(node) => Ok(node.content().unwrap_or_default().to_string()),
                None => Err("No such file or directory"),
            };
            let content = match content {
                Ok(c) => c,
                Err(reason) => {
                    // report and keep going, like the real thing
                    ctx.error(format!("{}: {}", name, reason));
                    status = EXIT_FAILURE;
                    continue;
                }
            };
            if number {
                for line in content.lines() {
                    ctx.println(&format!("{:6}\t{}", line_no, line));
                    line_no += 1;
                }
            } else {
                ctx.out.print(&content);
            }
        }
        Ok(status)
    }
}
