use super::check_flags;
use crate::command::{Command, CommandResult, EXIT_SUCCESS};
use crate::context::{CompletionContext, ExecutionContext};
use crate::error::CommandError;
use async_trait::async_trait;

/// help [COMMAND]
pub struct HelpCommand;

const HELP_USAGE: &str = "Usage: help [COMMAND]\nList available commands, or show usage for COMMAND.";

#[async_trait(?Send)]
impl Command for HelpCommand {
    fn description(&self) -> &str {
        "Show available commands"
    }

    fn usage(&self) -> &str {
        HELP_USAGE
    }

    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> CommandResult {
        check_flags(ctx, "", &[])?;
        let registry = ctx.registry;

        if let Some(name) = ctx.args.first().cloned() {
            let Some(cmd) = registry.get(&name) else {
                return Err(CommandError::failed(format!("no help topics match '{}'", name)));
            };
            let text = if cmd.usage().is_empty() {
                format!("{}: {}", name, cmd.description())
            } else {
                cmd.usage().to_string()
            };
            ctx.println(&text);
            return Ok(EXIT_SUCCESS);
        }

        let names = registry.get_command_names();
        let width = names.iter().map(|n| n.len()).max().unwrap_or(0);
        ctx.println("Available commands:");
        for name in names {
            let description = registry.get(name).map(|c| c.description()).unwrap_or_default();
            ctx.println(&format!("  {:<width$}  {}", name, description, width = width));
        }
        ctx.println("\nType 'help NAME' for details on a command.");
        Ok(EXIT_SUCCESS)
    }

    fn complete(&self, partial: &str, ctx: &CompletionContext<'_>) -> Option<Vec<String>> {
        Some(
            ctx.registry
                .get_command_names()
                .into_iter()
                .filter(|n| n.starts_with(partial))
                .map(str::to_string)
                .collect(),
        )
    }
}
