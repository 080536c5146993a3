//! Directory-tree reconstruction for the archive viewer.

use std::collections::{BTreeMap, HashSet};

/// One entry from an inflated archive, with its full path inside the
/// archive. Directory paths carry a trailing `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub is_directory: bool,
    pub size: u64,
}

impl ArchiveEntry {
    pub fn directory(path: impl Into<String>) -> Self {
        let mut path = path.into();
        if !path.ends_with('/') {
            path.push('/');
        }
        Self {
            path,
            is_directory: true,
            size: 0,
        }
    }

    pub fn file(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            is_directory: false,
            size,
        }
    }

    /// Last path component.
    pub fn name(&self) -> &str {
        let trimmed = self.path.trim_end_matches('/');
        trimmed.rsplit_once('/').map_or(trimmed, |(_, name)| name)
    }

    fn parent(&self) -> String {
        let trimmed = self.path.trim_end_matches('/');
        match trimmed.rsplit_once('/') {
            Some((parent, _)) => format!("{parent}/"),
            None => String::new(),
        }
    }
}

/// A rebuilt archive tree: flat entries grouped by parent-path prefix,
/// with an expand/collapse set keyed by directory path.
#[derive(Debug, Clone, Default)]
pub struct ArchiveTree {
    entries: Vec<ArchiveEntry>,
    children_of: BTreeMap<String, Vec<usize>>,
    expanded: HashSet<String>,
}

impl ArchiveTree {
    pub fn build(mut entries: Vec<ArchiveEntry>) -> Self {
        synthesize_missing_directories(&mut entries);
        sort_for_listing(&mut entries);

        let mut children_of: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, entry) in entries.iter().enumerate() {
            children_of.entry(entry.parent()).or_default().push(index);
        }

        Self {
            entries,
            children_of,
            expanded: HashSet::new(),
        }
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn roots(&self) -> &[usize] {
        self.children_of.get("").map_or(&[], Vec::as_slice)
    }

    pub fn children(&self, dir_path: &str) -> &[usize] {
        self.children_of.get(dir_path).map_or(&[], Vec::as_slice)
    }

    pub fn is_expanded(&self, dir_path: &str) -> bool {
        self.expanded.contains(dir_path)
    }

    pub fn toggle(&mut self, dir_path: &str) {
        if !self.expanded.remove(dir_path) {
            self.expanded.insert(dir_path.to_string());
        }
    }

    pub fn file_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_directory).count()
    }

    pub fn directory_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_directory).count()
    }

    pub fn total_size(&self) -> u64 {
        self.entries
            .iter()
            .filter(|e| !e.is_directory)
            .map(|e| e.size)
            .sum()
    }

    /// Aggregate size of all files under a directory path.
    pub fn directory_size(&self, dir_path: &str) -> u64 {
        self.entries
            .iter()
            .filter(|e| !e.is_directory && e.path.starts_with(dir_path))
            .map(|e| e.size)
            .sum()
    }

    /// Depth-first flattening of the tree, descending only into expanded
    /// directories. Yields `(depth, entry index)` in display order.
    pub fn visible(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        self.push_visible("", 0, &mut out);
        out
    }

    fn push_visible(&self, dir_path: &str, depth: usize, out: &mut Vec<(usize, usize)>) {
        for &index in self.children(dir_path) {
            out.push((depth, index));
            let entry = &self.entries[index];
            if entry.is_directory && self.is_expanded(&entry.path) {
                self.push_visible(&entry.path, depth + 1, out);
            }
        }
    }
}

/// Zip archives routinely omit explicit directory entries; rebuild them so
/// every file has a parent chain up to the root.
fn synthesize_missing_directories(entries: &mut Vec<ArchiveEntry>) {
    let mut known: HashSet<String> = entries
        .iter()
        .filter(|e| e.is_directory)
        .map(|e| e.path.clone())
        .collect();

    let mut missing = Vec::new();
    for entry in entries.iter() {
        let trimmed = entry.path.trim_end_matches('/');
        let mut offset = 0;
        while let Some(pos) = trimmed[offset..].find('/') {
            let dir = format!("{}/", &trimmed[..offset + pos]);
            if known.insert(dir.clone()) {
                missing.push(ArchiveEntry {
                    path: dir,
                    is_directory: true,
                    size: 0,
                });
            }
            offset += pos + 1;
        }
    }
    entries.extend(missing);
}

fn sort_for_listing(entries: &mut [ArchiveEntry]) {
    entries.sort_by(|a, b| {
        b.is_directory
            .cmp(&a.is_directory)
            .then_with(|| a.path.to_lowercase().cmp(&b.path.to_lowercase()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ArchiveEntry> {
        vec![
            ArchiveEntry::directory("a/"),
            ArchiveEntry::file("a/b.txt", 10),
            ArchiveEntry::file("c.txt", 5),
        ]
    }

    #[test]
    fn roots_hold_top_level_entries() {
        let tree = ArchiveTree::build(sample());
        let roots: Vec<&str> = tree
            .roots()
            .iter()
            .map(|&i| tree.entries()[i].path.as_str())
            .collect();
        assert_eq!(roots, vec!["a/", "c.txt"]);
    }

    #[test]
    fn directory_has_exactly_its_children() {
        let tree = ArchiveTree::build(sample());
        let children: Vec<&str> = tree
            .children("a/")
            .iter()
            .map(|&i| tree.entries()[i].path.as_str())
            .collect();
        assert_eq!(children, vec!["a/b.txt"]);
    }

    #[test]
    fn missing_parent_directories_are_synthesized() {
        let tree = ArchiveTree::build(vec![ArchiveEntry::file("x/y/z.txt", 1)]);
        let roots: Vec<&str> = tree
            .roots()
            .iter()
            .map(|&i| tree.entries()[i].path.as_str())
            .collect();
        assert_eq!(roots, vec!["x/"]);
        assert_eq!(tree.directory_count(), 2);
        assert_eq!(tree.file_count(), 1);
    }

    #[test]
    fn visible_descends_only_into_expanded_directories() {
        let mut tree = ArchiveTree::build(sample());
        let collapsed: Vec<&str> = tree
            .visible()
            .iter()
            .map(|&(_, i)| tree.entries()[i].path.as_str())
            .collect();
        assert_eq!(collapsed, vec!["a/", "c.txt"]);

        tree.toggle("a/");
        let expanded: Vec<(usize, &str)> = tree
            .visible()
            .iter()
            .map(|&(depth, i)| (depth, tree.entries()[i].path.as_str()))
            .collect();
        assert_eq!(expanded, vec![(0, "a/"), (1, "a/b.txt"), (0, "c.txt")]);

        tree.toggle("a/");
        assert!(!tree.is_expanded("a/"));
    }

    #[test]
    fn aggregates_count_files_and_sizes() {
        let tree = ArchiveTree::build(sample());
        assert_eq!(tree.file_count(), 2);
        assert_eq!(tree.directory_count(), 1);
        assert_eq!(tree.total_size(), 15);
        assert_eq!(tree.directory_size("a/"), 10);
    }

    #[test]
    fn entry_names_are_last_components() {
        assert_eq!(ArchiveEntry::file("a/b.txt", 0).name(), "b.txt");
        assert_eq!(ArchiveEntry::directory("a/b/").name(), "b");
        assert_eq!(ArchiveEntry::file("c.txt", 0).name(), "c.txt");
    }
}
