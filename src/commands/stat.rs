use super::check_flags;
use crate::command::{Command, CommandResult, EXIT_FAILURE, EXIT_SUCCESS};
use crate::context::ExecutionContext;
use crate::error::CommandError;
use crate::vfs::{Metadata, NodeKind};
use async_trait::async_trait;

pub struct StatCommand;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

fn render(meta: &Metadata) -> Vec<String> {
    let kind = match meta.kind {
        NodeKind::File => "regular file",
        NodeKind::Directory => "directory",
    };
    vec![
        format!("  File: {}", meta.path),
        format!("  Size: {:<10} Type: {}", meta.size, kind),
        format!("Access: {}  Owner: {}  Group: {}", meta.permissions, meta.owner, meta.group),
        format!("Modify: {}", meta.modified_at.format(TIME_FORMAT)),
        format!(" Birth: {}", meta.created_at.format(TIME_FORMAT)),
    ]
}

#[async_trait(?Send)]
impl Command for StatCommand {
    fn description(&self) -> &str {
        "Show file metadata"
    }

    fn usage(&self) -> &str {
        "Usage: stat FILE...\nDisplay size, type, permissions, owner and timestamps of each FILE."
    }

    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> CommandResult {
        check_flags(ctx, "", &[])?;
        if ctx.args.is_empty() {
            return Err(CommandError::usage("missing operand"));
        }
        let mut status = EXIT_SUCCESS;
        for target in ctx.args.clone() {
            match ctx.vfs.stat(&target) {
                Some(meta) => {
                    for line in render(&meta) {
                        ctx.println(&line);
                    }
                }
                None => {
                    ctx.error(format!("cannot stat '{}': No such file or directory", target));
                    status = EXIT_FAILURE;
                }
            }
        }
        Ok(status)
    }
}
