use super::check_flags;
use crate::command::{Command, CommandResult, EXIT_FAILURE, EXIT_SUCCESS};
use crate::context::ExecutionContext;
use async_trait::async_trait;

pub struct ExportCommand;

const EXPORT_USAGE: &str = "Usage: export [-p] [NAME[=VALUE]]...\nSet environment variables.\n\n  -p             list all variables in a reusable form";

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[async_trait(?Send)]
impl Command for ExportCommand {
    fn description(&self) -> &str {
        "Set environment variables"
    }

    fn usage(&self) -> &str {
        EXPORT_USAGE
    }

    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> CommandResult {
        check_flags(ctx, "p", &[])?;
        if ctx.args.is_empty() || ctx.flags.has('p') {
            let mut vars: Vec<String> = ctx
                .env
                .iter()
                .map(|(k, v)| format!("declare -x {}=\"{}\"", k, v))
                .collect();
            vars.sort();
            for line in vars {
                ctx.println(&line);
            }
            if ctx.args.is_empty() {
                return Ok(EXIT_SUCCESS);
            }
        }

        let mut status = EXIT_SUCCESS;
        for arg in ctx.args.clone() {
            let (name, value) = match arg.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (arg.as_str(), None),
            };
            if !valid_name(name) {
                ctx.error(format!("`{}': not a valid identifier", arg));
                status = EXIT_FAILURE;
                continue;
            }
            // a bare NAME is already visible to every command
            if let Some(value) = value {
                ctx.set_var(name, value);
            }
        }
        Ok(status)
    }
}
