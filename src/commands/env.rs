use super::check_flags;
use crate::command::{Command, CommandResult, EXIT_SUCCESS};
use crate::context::ExecutionContext;
use async_trait::async_trait;

pub struct EnvCommand;

#[async_trait(?Send)]
impl Command for EnvCommand {
    fn description(&self) -> &str {
        "Print the environment"
    }

    fn usage(&self) -> &str {
        "Usage: env\nPrint every environment variable as NAME=value, sorted by name."
    }

    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> CommandResult {
        check_flags(ctx, "", &[])?;
        let mut vars: Vec<String> = ctx.env.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        vars.sort();
        for line in vars {
            ctx.println(&line);
        }
        Ok(EXIT_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::testing::{run, session};

    #[test]
    fn test_env_is_sorted() {
        let mut d = session();
        let (status, out) = run(&mut d, "env");
        assert_eq!(status, 0);
        assert_eq!(out.lines(), vec!["HOME=/home/guest", "PWD=/home/guest", "USER=guest"]);
    }
}
