// native front end: feeds stdin to a session line by line and draws on stdout.
// the terminal stays in cooked mode, so this is mostly for piping scripts in.
use futures::executor::block_on;
use sandshell::{Screen, Shell, ShellConfig};
use std::io::{self, BufRead, Write};

struct StdoutScreen {
    out: io::Stdout,
}

impl Screen for StdoutScreen {
    fn write(&mut self, data: &str) {
        let mut lock = self.out.lock();
        if let Err(e) = lock.write_all(data.as_bytes()).and_then(|_| lock.flush()) {
            tracing::warn!("stdout write failed: {}", e);
        }
    }

    fn clear(&mut self) {
        self.write("\x1b[2J\x1b[H");
    }
}

fn load_config() -> Result<ShellConfig, String> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path).map_err(|e| format!("{}: {}", path, e))?;
            ShellConfig::from_json(&json).map_err(|e| format!("{}: {}", path, e))
        }
        None => Ok(ShellConfig::default()),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("bad config: {}", e);
            std::process::exit(2);
        }
    };

    let screen = StdoutScreen { out: io::stdout() };
    let mut shell = match Shell::new(config, Box::new(screen)) {
        Ok(shell) => shell,
        Err(e) => {
            tracing::error!("cannot start session: {}", e);
            std::process::exit(1);
        }
    };
    shell.start();

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("stdin: {}", e);
                break;
            }
        };
        block_on(shell.feed(&format!("{}\r", line)));
        if shell.is_ended() {
            break;
        }
    }
    println!();
}
