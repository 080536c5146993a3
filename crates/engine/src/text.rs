//! Text/code content loading for the text viewer.

use std::path::Path;

use anyhow::Context as _;

/// Loads above this size are refused; the viewer is a previewer, not an
/// editor.
const MAX_TEXT_BYTES: u64 = 8 * 1024 * 1024;

/// How much of the head of a file is sniffed for binary content.
const BINARY_SNIFF_BYTES: usize = 4096;

#[derive(Debug, Clone, Default)]
pub struct TextContent {
    pub lines: Vec<String>,
}

impl TextContent {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Reads a file into a line list. Refuses binary content and oversized
/// files with a readable error instead of flooding the terminal.
pub fn load_text(path: &Path) -> anyhow::Result<TextContent> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("stat text file {}", path.display()))?;
    anyhow::ensure!(
        metadata.len() <= MAX_TEXT_BYTES,
        "file too large to preview as text ({} bytes)",
        metadata.len()
    );

    let bytes = std::fs::read(path)
        .with_context(|| format!("read text file {}", path.display()))?;
    anyhow::ensure!(!looks_binary(&bytes), "file appears to be binary");

    let text = String::from_utf8_lossy(&bytes);
    let lines = text
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect();
    Ok(TextContent { lines })
}

fn looks_binary(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .take(BINARY_SNIFF_BYTES)
        .any(|&b| b == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn temp_file(name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("filepeek-text-{}-{name}", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        path
    }

    #[test]
    fn loads_lines_and_strips_crlf() {
        let path = temp_file("crlf.txt", b"one\r\ntwo\nthree");
        let content = load_text(&path).unwrap();
        assert_eq!(content.lines, vec!["one", "two", "three"]);
        assert_eq!(content.line_count(), 3);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn refuses_binary_content() {
        let path = temp_file("binary.bin", b"ab\0cd");
        let err = load_text(&path).unwrap_err();
        assert!(err.to_string().contains("binary"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_text(Path::new("/nonexistent/filepeek.txt")).is_err());
    }
}
