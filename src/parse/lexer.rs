//! Token classification. Pure predicates; anything unrecognized is a word.

use super::types::{Operator, Stream};

/// Marker that turns the first word of a stage into a history lookup.
pub const HISTORY_MARKER: char = '!';

/// Coarse class of a single token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Pipe,
    /// `>` (append = false) or `>>` (append = true)
    OutputRedirect { append: bool },
    InputRedirect,
    StderrRedirect,
    Chain(Operator),
    Ignorable,
    Word,
}

pub fn is_pipe(token: &str) -> bool {
    token == "|"
}

pub fn is_output_redirect(token: &str) -> bool {
    token == ">" || token == ">>"
}

pub fn is_append(token: &str) -> bool {
    token == ">>"
}

pub fn is_input_redirect(token: &str) -> bool {
    token == "<"
}

pub fn is_stderr_redirect(token: &str) -> bool {
    token == "2>"
}

pub fn is_chaining_operator(token: &str) -> bool {
    Operator::from_token(token).is_some()
}

pub fn is_background(token: &str) -> bool {
    token == "&"
}

/// Blank tokens come from runs of delimiters in the raw line.
pub fn is_ignorable(token: &str) -> bool {
    token.trim().is_empty()
}

/// A history reference: the marker followed by at least one character.
pub fn is_history_reference(token: &str) -> bool {
    token.len() >= 2 && token.starts_with(HISTORY_MARKER)
}

/// Classify a token, operators first.
pub fn classify(token: &str) -> TokenKind {
    if is_pipe(token) {
        TokenKind::Pipe
    } else if is_output_redirect(token) {
        TokenKind::OutputRedirect {
            append: is_append(token),
        }
    } else if is_input_redirect(token) {
        TokenKind::InputRedirect
    } else if is_stderr_redirect(token) {
        TokenKind::StderrRedirect
    } else if let Some(op) = Operator::from_token(token) {
        TokenKind::Chain(op)
    } else if is_ignorable(token) {
        TokenKind::Ignorable
    } else {
        TokenKind::Word
    }
}

impl TokenKind {
    /// Stream a redirection operator targets.
    pub fn redirected_stream(self) -> Option<Stream> {
        match self {
            TokenKind::OutputRedirect { .. } => Some(Stream::Output),
            TokenKind::InputRedirect => Some(Stream::Input),
            TokenKind::StderrRedirect => Some(Stream::Error),
            _ => None,
        }
    }
}
