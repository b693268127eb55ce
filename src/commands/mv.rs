use super::{check_flags, describe};
use crate::command::{Command, CommandResult, EXIT_FAILURE, EXIT_SUCCESS};
use crate::context::ExecutionContext;
use crate::error::CommandError;
use async_trait::async_trait;

pub struct MvCommand;

const MV_USAGE: &str = "Usage: mv SOURCE DEST\n  or:  mv SOURCE... DIRECTORY\nRename SOURCE to DEST, or move SOURCE(s) into DIRECTORY.";

#[async_trait(?Send)]
impl Command for MvCommand {
    fn description(&self) -> &str {
        "Move or rename files"
    }

    fn usage(&self) -> &str {
        MV_USAGE
    }

    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> CommandResult {
        check_flags(ctx, "", &[])?;
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
            if let Err(err) = ctx.vfs.move_node(src, dest) {
                let msg = describe(ctx.vfs, &[src.as_str(), dest], &err);
                ctx.error(msg);
                status = EXIT_FAILURE;
            }
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::testing::{run, session};

    #[test]
    fn test_mv_rename() {
        let mut d = session();
        d.vfs_mut().write_file("old.txt", "x").unwrap();
        let (status, _) = run(&mut d, "mv old.txt new.txt");
        assert_eq!(status, 0);
        assert!(!d.vfs().exists("old.txt"));
        assert_eq!(d.vfs().read_file("new.txt"), Some("x"));
    }

    #[test]
    fn test_mv_directory_into_directory() {
        let mut d = session();
        d.vfs_mut().mkdir_all("proj/src").unwrap();
        d.vfs_mut().write_file("proj/src/main.rs", "fn main() {}").unwrap();
        let (status, _) = run(&mut d, "mv proj /tmp");
        assert_eq!(status, 0);
        assert!(!d.vfs().exists("proj"));
        assert_eq!(d.vfs().read_file("/tmp/proj/src/main.rs"), Some("fn main() {}"));
    }

    #[test]
    fn test_mv_errors() {
        let mut d = session();
        d.vfs_mut().mkdir("box").unwrap();
        let (status, out) = run(&mut d, "mv ghost x");
        assert_eq!(status, 1);
        assert_eq!(out.stderr, vec!["mv: ghost: No such file or directory"]);
        let (status, out) = run(&mut d, "mv box box/inner");
        assert_eq!(status, 1);
        assert_eq!(out.stderr.len(), 1);
        assert!(d.vfs().exists("box"));
    }
}
