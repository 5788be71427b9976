//! Interpreter state shared by the main loop, the engine, and the builtins.

use crate::config::{Config, Quoting};
use crate::error::{ExecError, ParseError, ShellError};
use crate::exec::{self, reaper};
use crate::history::History;
use crate::input::LineSource;
use crate::parse::{self, Chain, ParseOptions};

/// Status of a line the parser rejected.
pub const PARSE_FAILURE: i32 = 2;

#[derive(Debug)]
pub struct Shell {
    config: Config,
    history: History,
    prompt: String,
    exit_request: Option<i32>,
    replay_depth: usize,
    last_status: i32,
}

impl Shell {
    pub fn new(config: Config) -> Self {
        let prompt = config.shell.prompt.clone();
        Self {
            config,
            history: History::new(),
            prompt,
            exit_request: None,
            replay_depth: 0,
            last_status: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: String) {
        self.prompt = prompt;
    }

    /// Ask the loop to stop once the current line is done.
    pub fn request_exit(&mut self, code: i32) {
        self.exit_request = Some(code);
    }

    pub fn exit_requested(&self) -> Option<i32> {
        self.exit_request
    }

    /// Number of `history` replays currently on the stack.
    pub fn replay_depth(&self) -> usize {
        self.replay_depth
    }

    /// Status of the last line run.
    pub fn last_status(&self) -> i32 {
        self.last_status
    }

    /// Tokenize and build a chain with the configured quoting mode.
    pub fn parse_line(&self, line: &str) -> Result<Chain, ParseError> {
        let quoting = self.config.parser.quoting;
        let tokens = parse::tokenize(line, quoting);
        log::trace!("tokens {tokens:?}");
        let options = ParseOptions {
            strip_quotes: quoting == Quoting::Literal,
        };
        parse::parse(&tokens, options)
    }

    /// Parse and run one line. A rejected line prints its diagnostic and
    /// yields [`PARSE_FAILURE`] without running anything.
    pub fn run_line(&mut self, line: &str) -> Result<i32, ExecError> {
        let status = match self.parse_line(line) {
            Ok(chain) => exec::execute(self, chain)?,
            Err(e) => {
                eprintln!("pipesh: {e}");
                PARSE_FAILURE
            }
        };
        self.last_status = status;
        Ok(status)
    }

    /// Run a line recalled from history, one level deeper.
    pub(crate) fn replay(&mut self, line: &str) -> Result<i32, ExecError> {
        self.replay_depth += 1;
        let status = self.run_line(line);
        self.replay_depth -= 1;
        status
    }

    /// Read, record and run lines until end of input or `exit`.
    ///
    /// Returns the requested exit status, or the last line's status at end of input.
    pub fn repl(&mut self, source: &mut dyn LineSource) -> Result<i32, ShellError> {
        loop {
            reaper::sweep();
            let prompt = format!("{} ", self.prompt);
            let Some(line) = source.next_line(&prompt)? else {
                log::debug!("end of input");
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            self.history.append(line.as_str());
            self.run_line(&line)?;
            if let Some(code) = self.exit_request {
                log::debug!("exit requested with {code}");
                return Ok(code);
            }
        }
        let pending = reaper::pending();
        if pending > 0 {
            log::debug!("{pending} background child(ren) still running");
        }
        Ok(self.last_status)
    }
}
