use super::check_flags;
use crate::command::{Command, CommandResult, EXIT_SUCCESS};
use crate::context::ExecutionContext;
use async_trait::async_trait;

pub struct ClearCommand;

#[async_trait(?Send)]
impl Command for ClearCommand {
    fn description(&self) -> &str {
        "Clear the terminal screen"
    }

    fn usage(&self) -> &str {
        "Usage: clear\nClear the terminal screen."
    }

    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> CommandResult {
        check_flags(ctx, "", &[])?;
        ctx.out.clear();
        Ok(EXIT_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::testing::{run, session};

    #[test]
    fn test_clear() {
        let mut d = session();
        let (status, out) = run(&mut d, "clear");
        assert_eq!(status, 0);
        assert_eq!(out.clears, 1);
        assert!(out.stdout.is_empty());
    }
}
