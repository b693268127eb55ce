use super::check_flags;
use crate::command::{Command, CommandResult, EXIT_NOT_FOUND, EXIT_SUCCESS};
use crate::context::ExecutionContext;
use crate::editor::char_width;
use crate::vfs::Node;
use async_trait::async_trait;

pub struct LsCommand;

const LS_USAGE: &str = "Usage: ls [OPTION]... [FILE]...\nList information about the FILEs (the current directory by default).\nDirectories come first and are marked with a trailing '/'.\n\n  -a, --all      do not ignore entries starting with .\n  -l             use a long listing format\n  -1             list one file per line";

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Style {
    Grid,
    OnePerLine,
    Long,
}

/// One listed entry, rendered up front so nothing borrows the VFS.
struct Row {
    label: String,
    long: String,
    is_dir: bool,
}

impl Row {
    fn new(name: &str, node: &Node) -> Self {
        let label = if node.is_dir() {
            format!("{}/", name.trim_end_matches('/'))
        } else {
            name.to_string()
        };
        let long = format!(
            "{} 1 {:<8} {:<8} {:>6} {} {}",
            node.permissions(),
            node.owner(),
            node.group(),
            node.size(),
            node.modified_at().format("%b %e %H:%M"),
            label
        );
        Self { label, long, is_dir: node.is_dir() }
    }
}

fn sort_rows(rows: &mut [Row]) {
    // directories first, then plain lexical order
    rows.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.label.cmp(&b.label)));
}

fn width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

/// Row-major grid sized to the terminal width.
fn grid(rows: &[Row], columns: usize) -> Vec<String> {
    let cell = rows.iter().map(|r| width(&r.label)).max().unwrap_or(0) + 2;
    let per_line = (columns / cell).max(1);
    rows.chunks(per_line)
        .map(|chunk| {
            let mut line = String::new();
            for (i, row) in chunk.iter().enumerate() {
                line.push_str(&row.label);
                if i + 1 < chunk.len() {
                    line.push_str(&" ".repeat(cell - width(&row.label)));
                }
            }
            line
        })
        .collect()
}

fn render(rows: &[Row], style: Style, columns: usize) -> Vec<String> {
    match style {
        Style::Grid => grid(rows, columns),
        Style::OnePerLine => rows.iter().map(|r| r.label.clone()).collect(),
        Style::Long => rows.iter().map(|r| r.long.clone()).collect(),
    }
}

#[async_trait(?Send)]
impl Command for LsCommand {
    fn description(&self) -> &str {
        "List directory contents"
    }

    fn usage(&self) -> &str {
        LS_USAGE
    }

    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> CommandResult {
        check_flags(ctx, "al1", &["all"])?;
        let show_all = ctx.flags.any('a', "all");
        let style = if ctx.flags.has('l') {
            Style::Long
        } else if ctx.flags.has('1') {
            Style::OnePerLine
        } else {
            Style::Grid
        };
        let targets = if ctx.args.is_empty() {
            vec![".".to_string()]
        } else {
            ctx.args.clone()
        };

        // sort the targets into missing ones, plain files and directories
        let mut missing = Vec::new();
        let mut files = Vec::new();
        let mut dirs: Vec<(String, Vec<Row>)> = Vec::new();
        for target in &targets {
            match ctx.vfs.get_node(target) {
                None => missing.push(target.clone()),
                Some(node) if node.is_dir() => {
                    let mut rows: Vec<Row> = ctx
                        .vfs
                        .list(Some(target.as_str()))
                        .unwrap_or_default()
                        .into_iter()
                        .filter(|n| show_all || !is_hidden(n.name()))
                        .map(|n| Row::new(n.name(), n))
                        .collect();
                    sort_rows(&mut rows);
                    dirs.push((target.clone(), rows));
                }
                Some(node) => files.push(Row::new(target, node)),
            }
        }

        let mut status = EXIT_SUCCESS;
        for target in &missing {
            ctx.error(format!("cannot access '{}': No such file or directory", target));
            status = EXIT_NOT_FOUND;
        }

        let columns = usize::from(ctx.columns);
        let with_headers = targets.len() > 1;
        let mut first = true;
        if !files.is_empty() {
            sort_rows(&mut files);
            for line in render(&files, style, columns) {
                ctx.println(&line);
            }
            first = false;
        }
        for (target, rows) in &dirs {
            if with_headers {
                if !first {
                    ctx.println("");
                }
                ctx.println(&format!("{}:", target));
            }
            for line in render(rows, style, columns) {
                ctx.println(&line);
            }
            first = false;
        }
        Ok(status)
    }
}
