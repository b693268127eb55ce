use super::check_flags;
use crate::command::{Command, CommandResult, EXIT_SUCCESS};
use crate::context::ExecutionContext;
use crate::error::CommandError;
use async_trait::async_trait;

pub struct HistoryCommand;

#[async_trait(?Send)]
impl Command for HistoryCommand {
    fn description(&self) -> &str {
        "Show command history"
    }

    fn usage(&self) -> &str {
        "Usage: history [N]\nShow the command history, or only its last N entries."
    }

    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> CommandResult {
        // history belongs to the line editor and only ever grows, so no -c
        check_flags(ctx, "", &[])?;
        let history = ctx.history;
        let skip = match ctx.args.as_slice() {
            [] => 0,
            [n] => match n.parse::<usize>() {
                Ok(n) => history.len().saturating_sub(n),
                Err(_) => return Err(CommandError::usage(format!("{}: numeric argument required", n))),
            },
            _ => return Err(CommandError::usage("too many arguments")),
        };
        for (i, line) in history.iter().enumerate().skip(skip) {
            ctx.println(&format!("{:5}  {}", i + 1, line));
        }
        Ok(EXIT_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::testing::{run, run_with_history, session};

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_history_numbered() {
        let mut d = session();
        let history = lines(&["ls", "cd /tmp", "history"]);
        let (status, out) = run_with_history(&mut d, "history", &history);
        assert_eq!(status, 0);
        assert_eq!(out.stdout, "    1  ls\n    2  cd /tmp\n    3  history\n");
    }

    #[test]
    fn test_history_tail() {
        let mut d = session();
        let history = lines(&["a", "b", "c"]);
        let (_, out) = run_with_history(&mut d, "history 2", &history);
        assert_eq!(out.lines(), vec!["    2  b", "    3  c"]);
        let (_, out) = run_with_history(&mut d, "history 10", &history);
        assert_eq!(out.lines().len(), 3);
    }

    #[test]
    fn test_history_clear_is_not_supported() {
        let mut d = session();
        let (status, out) = run(&mut d, "history -c");
        assert_eq!(status, 1);
        assert_eq!(out.stderr, vec!["history: invalid option '-c'"]);
        let (_, out) = run(&mut d, "history x");
        assert_eq!(out.stderr, vec!["history: x: numeric argument required"]);
    }
}
