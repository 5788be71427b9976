//! Where command lines come from: a line editor on a terminal, or a script.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// A source of raw command lines. `Ok(None)` is end of input.
pub trait LineSource {
    fn next_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// Line-edited terminal input. Ctrl-C abandons the current line.
pub struct Interactive {
    editor: DefaultEditor,
}

impl Interactive {
    pub fn new() -> rustyline::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineSource for Interactive {
    fn next_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        loop {
            match self.editor.readline(prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = self.editor.add_history_entry(line.as_str());
                    }
                    return Ok(Some(line));
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Ok(None),
                Err(ReadlineError::Io(e)) => return Err(e),
                Err(e) => return Err(io::Error::other(e.to_string())),
            }
        }
    }
}

/// Lines read from any buffered reader, without a prompt. Bytes that are not
/// valid UTF-8 are replaced with U+FFFD rather than failing the read.
pub struct Script<R> {
    reader: R,
}

impl<R: BufRead> Script<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl Script<BufReader<File>> {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> LineSource for Script<R> {
    fn next_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        if self.reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        let mut line = String::from_utf8_lossy(&buf).into_owned();
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}
