//! Test helpers and fixtures.

use filepeek_application::ViewerContext;
use filepeek_core::archive::ArchiveEntry;
use filepeek_core::{Settings, ViewRequest};

pub fn make_settings(default_zoom_percent: u16) -> Settings {
    Settings {
        default_zoom_percent,
        line_numbers: true,
        safe_pdf_mode: false,
        text_font_size: 14,
    }
}

pub fn make_request(file_name: &str) -> ViewRequest {
    ViewRequest::new(format!("/tmp/{file_name}"), file_name)
}

/// An open viewer context for the named file, with default settings.
pub fn open_context(file_name: &str) -> ViewerContext {
    let mut ctx = ViewerContext::new(Settings::default());
    ctx.open(make_request(file_name));
    ctx
}

/// A small archive layout with nesting, for tree-view tests.
pub fn sample_archive_entries() -> Vec<ArchiveEntry> {
    vec![
        ArchiveEntry::directory("docs/"),
        ArchiveEntry::file("docs/guide.md", 2_048),
        ArchiveEntry::file("docs/notes/todo.txt", 128),
        ArchiveEntry::file("readme.txt", 512),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use filepeek_core::FileCategory;
    use filepeek_core::archive::ArchiveTree;

    #[test]
    fn builds_settings() {
        let settings = make_settings(150);
        assert_eq!(settings.default_zoom_percent, 150);
    }

    #[test]
    fn open_context_classifies_the_file() {
        let ctx = open_context("slides.pdf");
        assert_eq!(ctx.category(), Some(FileCategory::Pdf));
    }

    #[test]
    fn sample_archive_builds_a_tree() {
        let tree = ArchiveTree::build(sample_archive_entries());
        assert_eq!(tree.file_count(), 3);
        // `docs/notes/` has no explicit entry; the tree synthesizes it.
        assert_eq!(tree.directory_count(), 2);
    }
}
