use crate::config::Quoting;

/// Delimiter used by the literal tokenizer.
pub const DELIMITER: char = ' ';

/// Split a raw line into tokens according to the quoting mode.
///
/// Literal mode splits on every [`DELIMITER`] and keeps the blank tokens that
/// runs of delimiters produce; the parser skips them as ignorable.
pub fn tokenize(line: &str, quoting: Quoting) -> Vec<String> {
    match quoting {
        Quoting::Literal => split_literal(line),
        Quoting::Posix => split_posix(line),
    }
}

fn split_literal(line: &str) -> Vec<String> {
    line.split(DELIMITER).map(String::from).collect()
}

/// Tokenize a line into words using shlex (POSIX word splitting).
fn split_posix(line: &str) -> Vec<String> {
    shlex::split(line).unwrap_or_else(|| {
        // Fallback: simple whitespace splitting if shlex can't parse
        line.split_whitespace().map(String::from).collect()
    })
}

/// Strip every quote character from a word. Not nesting-aware: `"it's"` becomes `its`.
pub fn strip_quotes(word: &str) -> String {
    word.chars().filter(|c| !matches!(c, '"' | '\'')).collect()
}
