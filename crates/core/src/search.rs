//! In-text search for the text viewer.

/// Case-insensitive substring search over a line list. Match positions are
/// kept in ascending line order and recomputed whenever the query or the
/// content changes; the cursor wraps around at both ends.
#[derive(Debug, Clone, Default)]
pub struct TextSearch {
    query: String,
    matches: Vec<usize>,
    cursor: usize,
}

impl TextSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[usize] {
        &self.matches
    }

    pub fn set_query(&mut self, query: impl Into<String>, lines: &[String]) {
        self.query = query.into();
        self.recompute(lines);
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.matches.clear();
        self.cursor = 0;
    }

    /// Rebuilds the match list. Call when the content changes.
    pub fn recompute(&mut self, lines: &[String]) {
        self.matches.clear();
        self.cursor = 0;
        let needle = self.query.to_lowercase();
        if needle.is_empty() {
            return;
        }
        for (index, line) in lines.iter().enumerate() {
            if line.to_lowercase().contains(&needle) {
                self.matches.push(index);
            }
        }
    }

    /// Line index of the current match, if any.
    pub fn current(&self) -> Option<usize> {
        self.matches.get(self.cursor).copied()
    }

    /// Position of the current match within the match list (for "3/7" display).
    pub fn cursor_position(&self) -> Option<(usize, usize)> {
        if self.matches.is_empty() {
            None
        } else {
            Some((self.cursor + 1, self.matches.len()))
        }
    }

    pub fn next(&mut self) {
        if !self.matches.is_empty() {
            self.cursor = (self.cursor + 1) % self.matches.len();
        }
    }

    pub fn prev(&mut self) {
        if !self.matches.is_empty() {
            self.cursor = self.cursor.checked_sub(1).unwrap_or(self.matches.len() - 1);
        }
    }

    pub fn is_match_line(&self, line_index: usize) -> bool {
        self.matches.binary_search(&line_index).is_ok()
    }
}
