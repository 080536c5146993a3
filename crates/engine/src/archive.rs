//! Archive inflation for the archive viewer (zip only).

use std::fs;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context as _;
use filepeek_core::archive::{ArchiveEntry, ArchiveTree};

/// Inflates an archive into a rebuilt directory tree. Only zip is decoded
/// locally; other archive formats surface a render error the shell can act
/// on (download / open externally).
pub fn load_archive_tree(path: &Path) -> anyhow::Result<ArchiveTree> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    anyhow::ensure!(
        extension == "zip",
        "unsupported archive codec: {}",
        if extension.is_empty() { "(none)" } else { &extension }
    );

    let entries = list_zip(path)?;
    Ok(ArchiveTree::build(entries))
}

fn list_zip(path: &Path) -> anyhow::Result<Vec<ArchiveEntry>> {
    let file = fs::File::open(path).with_context(|| format!("open archive {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut archive = zip::ZipArchive::new(reader)
        .with_context(|| format!("read zip archive {}", path.display()))?;

    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .with_context(|| format!("read zip entry {index}"))?;

        // Entries escaping the archive root are dropped, not surfaced.
        if entry.enclosed_name().is_none() {
            continue;
        }

        if entry.is_dir() {
            entries.push(ArchiveEntry::directory(entry.name()));
        } else {
            entries.push(ArchiveEntry::file(entry.name(), entry.size()));
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use zip::write::SimpleFileOptions;

    fn write_sample_zip(name: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("filepeek-zip-{}-{name}", std::process::id()));
        let file = fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        writer.add_directory("a/", options).unwrap();
        writer.start_file("a/b.txt", options).unwrap();
        writer.write_all(b"hello zip").unwrap();
        writer.start_file("c.txt", options).unwrap();
        writer.write_all(b"root").unwrap();
        writer.finish().unwrap();
        path
    }

    #[test]
    fn rebuilds_tree_from_zip_entries() {
        let path = write_sample_zip("tree.zip");
        let tree = load_archive_tree(&path).unwrap();

        let roots: Vec<&str> = tree
            .roots()
            .iter()
            .map(|&i| tree.entries()[i].path.as_str())
            .collect();
        assert_eq!(roots, vec!["a/", "c.txt"]);
        assert_eq!(tree.file_count(), 2);
        assert_eq!(tree.directory_count(), 1);
        assert_eq!(tree.total_size(), 13);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn non_zip_codecs_are_reported_unsupported() {
        let err = load_archive_tree(Path::new("/tmp/sample.rar")).unwrap_err();
        assert!(err.to_string().contains("unsupported archive codec"));
    }

    #[test]
    fn corrupt_zip_is_an_error() {
        let path = std::env::temp_dir().join(format!("filepeek-zip-corrupt-{}", std::process::id()));
        std::fs::write(&path, b"not a zip at all").unwrap();
        let renamed = path.with_extension("zip");
        std::fs::rename(&path, &renamed).unwrap();
        assert!(load_archive_tree(&renamed).is_err());
        std::fs::remove_file(&renamed).ok();
    }
}
