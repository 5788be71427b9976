//! pipesh: interactive or batch pipeline shell.
//!
//! With no script argument, reads lines from a line editor on the terminal.
//! With a script path, runs its lines in order without prompting.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use argh::FromArgs;

use pipesh::config::Config;
use pipesh::input::{Interactive, Script};
use pipesh::{Shell, logging, signals};

#[derive(FromArgs)]
/// A small shell with pipes, redirection, and history replay.
struct Args {
    /// configuration file to merge over the defaults
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// log at debug level regardless of configuration
    #[argh(switch, short = 'd')]
    debug: bool,

    /// print the effective configuration as TOML and exit
    #[argh(switch)]
    dump_config: bool,

    /// script to run instead of reading from the terminal
    #[argh(positional)]
    script: Option<PathBuf>,
}

fn main() {
    let args: Args = argh::from_env();
    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("pipesh: {e:#}");
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<i32> {
    let config = Config::load(args.config.as_deref());
    if args.dump_config {
        print!("{}", config.to_toml().context("rendering configuration")?);
        return Ok(0);
    }

    logging::init(&config.logging, args.debug);
    signals::install().context("installing signal handlers")?;

    let mut shell = Shell::new(config);
    let status = match args.script {
        Some(path) => {
            let mut source = Script::open(&path)
                .with_context(|| format!("cannot open script {}", path.display()))?;
            shell.repl(&mut source)?
        }
        None => {
            let mut source =
                Interactive::new().map_err(|e| anyhow!("cannot start line editor: {e}"))?;
            shell.repl(&mut source)?
        }
    };
    Ok(status)
}
