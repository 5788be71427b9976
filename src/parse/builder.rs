//! Pipeline/chain builder: one left-to-right pass over the token sequence.
//!
//! The builder owns every stage, pipeline, and descriptor it creates until it
//! hands back a finished [`Chain`]. Any error returns early and drops the
//! builder, which closes every pipe and file opened for the line so far.

use std::fs::{File, OpenOptions};
use std::mem;
use std::os::fd::OwnedFd;
use std::os::unix::fs::OpenOptionsExt;

use glob::MatchOptions;
use nix::fcntl::OFlag;
use nix::unistd;

use super::lexer::{self, TokenKind};
use super::tokenize::strip_quotes;
use super::types::{Chain, Operator, Pipeline, Stage, Stream};
use crate::builtins::Builtin;
use crate::error::ParseError;

/// Mode for files created by output redirection.
const CREATE_MODE: u32 = 0o644;

/// Word handling that depends on how the line was tokenized.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Remove quote characters from words before expansion.
    pub strip_quotes: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { strip_quotes: true }
    }
}

/// Build a chain from a token sequence. The end of the slice is the
/// end-of-input terminator.
pub fn parse<S: AsRef<str>>(tokens: &[S], options: ParseOptions) -> Result<Chain, ParseError> {
    ChainBuilder::new(options).build(tokens)
}

struct ChainBuilder {
    options: ParseOptions,
    chain: Chain,
    /// Committed stages of the pipeline under construction.
    stages: Vec<Stage>,
    /// Stage under construction.
    stage: Stage,
}

impl ChainBuilder {
    fn new(options: ParseOptions) -> Self {
        Self {
            options,
            chain: Chain::default(),
            stages: Vec::new(),
            stage: Stage::new(),
        }
    }

    fn build<S: AsRef<str>>(mut self, tokens: &[S]) -> Result<Chain, ParseError> {
        let mut i = 0;
        while let Some(token) = tokens.get(i).map(AsRef::as_ref) {
            match lexer::classify(token) {
                TokenKind::Chain(op) => self.close_pipeline(Some(op))?,
                TokenKind::Pipe => self.pipe()?,
                kind @ (TokenKind::OutputRedirect { .. }
                | TokenKind::InputRedirect
                | TokenKind::StderrRedirect) => {
                    i = self.redirect(kind, token, tokens, i)?;
                }
                TokenKind::Ignorable => {}
                TokenKind::Word => self.word(token)?,
            }
            i += 1;
        }
        self.close_pipeline(None)?;
        Ok(self.chain)
    }

    /// Commit the current stage (if it has a program) and close the pipeline.
    fn close_pipeline(&mut self, op: Option<Operator>) -> Result<(), ParseError> {
        let mut stage = mem::take(&mut self.stage);
        if stage.name().is_some() {
            stage.bind_runner();
            self.stages.push(stage);
        } else if stage.is_overridden(Stream::Input) {
            // Only a pipe gives a nameless stage an input.
            return Err(ParseError::DanglingPipe);
        }

        let mut stages = mem::take(&mut self.stages);
        if stages.is_empty() {
            log::debug!("dropping empty pipeline before {:?}", op.map(|o| o.as_str()));
            return Ok(());
        }

        let background = op == Some(Operator::Background);
        if background {
            for stage in &mut stages {
                stage.deferred_wait = true;
            }
        }
        log::debug!(
            "pipeline of {} stage(s), chained by {:?}, background={background}",
            stages.len(),
            op.map(|o| o.as_str())
        );
        self.chain.pipelines.push(Pipeline {
            stages,
            background,
            chained_by: op,
        });
        Ok(())
    }

    fn pipe(&mut self) -> Result<(), ParseError> {
        if self.stage.name().is_none() {
            return Err(ParseError::PipeWithoutCommand);
        }
        if self.stage.is_overridden(Stream::Output) {
            return Err(ParseError::MultiplePipeTargets);
        }

        // Close-on-exec: only the dup2'd copies survive into a child.
        let (read, write) = unistd::pipe2(OFlag::O_CLOEXEC).map_err(ParseError::Pipe)?;

        let mut stage = mem::take(&mut self.stage);
        stage.set_fd(Stream::Output, write);
        stage.bind_runner();
        log::debug!("committed stage {:?} into pipe", stage.args());
        self.stages.push(stage);

        self.stage.set_fd(Stream::Input, read);
        Ok(())
    }

    /// Open the target of a redirection operator at `tokens[at]`.
    /// Returns the index of the file name token.
    fn redirect<S: AsRef<str>>(
        &mut self,
        kind: TokenKind,
        op: &str,
        tokens: &[S],
        at: usize,
    ) -> Result<usize, ParseError> {
        let Some(stream) = kind.redirected_stream() else {
            unreachable!("redirect called for {kind:?}");
        };
        if self.stage.name().is_none() {
            return Err(ParseError::RedirectWithoutCommand { op: op.into() });
        }
        if self.stage.is_overridden(stream) {
            return Err(ParseError::DuplicateRedirect { stream });
        }

        let mut i = at + 1;
        while tokens
            .get(i)
            .is_some_and(|t| lexer::is_ignorable(t.as_ref()))
        {
            i += 1;
        }
        let Some(target) = tokens
            .get(i)
            .map(AsRef::as_ref)
            .filter(|t| lexer::classify(t) == TokenKind::Word)
        else {
            return Err(ParseError::MissingRedirectTarget { op: op.into() });
        };

        let path = shellexpand::tilde(&self.clean(target)).into_owned();
        let file = open_target(&path, kind).map_err(|source| ParseError::Open {
            path: path.clone(),
            source,
        })?;
        log::debug!("{} of {:?} -> {path}", stream.as_str(), self.stage.name());
        self.stage.set_fd(stream, OwnedFd::from(file));
        Ok(i)
    }

    fn word(&mut self, token: &str) -> Result<(), ParseError> {
        if self.stage.name().is_none() && lexer::is_history_reference(token) {
            // `!ref` is shorthand for `history ref`, taken verbatim.
            self.stage.push(Builtin::History.name());
            self.stage.push(&token[lexer::HISTORY_MARKER.len_utf8()..]);
            return Ok(());
        }

        for arg in expand_word(&self.clean(token))? {
            self.stage.push(arg);
        }
        Ok(())
    }

    fn clean(&self, token: &str) -> String {
        if self.options.strip_quotes {
            strip_quotes(token)
        } else {
            token.to_string()
        }
    }
}

fn open_target(path: &str, kind: TokenKind) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    match kind {
        TokenKind::InputRedirect => options.read(true),
        TokenKind::OutputRedirect { append: true } => {
            options.write(true).create(true).append(true).mode(CREATE_MODE)
        }
        _ => options.write(true).create(true).truncate(true).mode(CREATE_MODE),
    };
    options.open(path)
}

fn has_glob_meta(word: &str) -> bool {
    word.contains(['*', '?', '['])
}

/// Tilde- and wildcard-expand a word. No match, or a pattern the glob engine
/// rejects, yields the word itself.
pub fn expand_word(word: &str) -> Result<Vec<String>, ParseError> {
    let expanded = shellexpand::tilde(word);
    if !has_glob_meta(&expanded) {
        return Ok(vec![expanded.into_owned()]);
    }

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };
    let Ok(paths) = glob::glob_with(&expanded, options) else {
        return Ok(vec![expanded.into_owned()]);
    };

    let mut matches = Vec::new();
    for path in paths.filter_map(Result::ok) {
        let path = path
            .into_os_string()
            .into_string()
            .map_err(|_| ParseError::InvalidGlobMatch {
                pattern: expanded.to_string(),
            })?;
        matches.push(path);
    }
    if matches.is_empty() {
        matches.push(expanded.into_owned());
    }
    Ok(matches)
}
