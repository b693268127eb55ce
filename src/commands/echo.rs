use super::check_flags;
use crate::command::{Command, CommandResult, EXIT_SUCCESS};
use crate::context::ExecutionContext;
use async_trait::async_trait;

/// echo [-n] [STRING]...
pub struct EchoCommand;

const ECHO_USAGE: &str = "Usage: echo [-n] [STRING]...\nWrite arguments to the standard output, separated by spaces and followed by a newline.\n\n  -n             do not output the trailing newline";

#[async_trait(?Send)]
impl Command for EchoCommand {
    fn description(&self) -> &str {
        "Print arguments"
    }

    fn usage(&self) -> &str {
        ECHO_USAGE
    }

    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> CommandResult {
        check_flags(ctx, "n", &[])?;
        let mut out = ctx.args.join(" ");
        if !ctx.flags.has('n') {
            out.push('\n');
        }
        ctx.out.print(&out);
        Ok(EXIT_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::testing::{run, session};

    #[test]
    fn test_echo_quoting_and_expansion() {
        let mut d = session();
        let (_, out) = run(&mut d, "echo \"a  b\" 'c $USER' $USER");
        assert_eq!(out.stdout, "a  b c $USER guest\n");
    }

    #[test]
    fn test_echo_empty() {
        let mut d = session();
        let (status, out) = run(&mut d, "echo");
        assert_eq!(status, 0);
        assert_eq!(out.stdout, "\n");
    }
}
