//! In-memory history of raw command lines, oldest first.

#[derive(Debug, Default, Clone)]
pub struct History {
    entries: Vec<String>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, line: impl Into<String>) {
        self.entries.push(line.into());
    }

    /// Entry at a 1-based position.
    pub fn get(&self, index: usize) -> Option<&str> {
        let i = index.checked_sub(1)?;
        self.entries.get(i).map(String::as_str)
    }

    /// Most recent entry that starts with `prefix`.
    pub fn find_latest_with_prefix(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|line| line.starts_with(prefix))
            .map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}
