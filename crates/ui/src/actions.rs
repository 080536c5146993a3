//! Host-side actions: save a copy, open externally, copy a link.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::Context as _;

/// Copies the file into the user's download directory (or home as a
/// fallback), never clobbering an existing file.
pub(crate) fn save_copy(source: &Path) -> anyhow::Result<PathBuf> {
    let dirs = directories::UserDirs::new().context("locate user directories")?;
    let target_dir = dirs
        .download_dir()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dirs.home_dir().to_path_buf());

    let file_name = source
        .file_name()
        .and_then(|name| name.to_str())
        .context("source path has no file name")?;
    let target = unique_target(&target_dir, file_name);

    std::fs::copy(source, &target)
        .with_context(|| format!("copy {} to {}", source.display(), target.display()))?;
    Ok(target)
}

/// First free name under `dir`: `name.ext`, then `name-1.ext`, `name-2.ext`.
fn unique_target(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };

    for counter in 1u32.. {
        let name = match ext {
            Some(ext) => format!("{stem}-{counter}.{ext}"),
            None => format!("{stem}-{counter}"),
        };
        let candidate = dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("counter space exhausted")
}

/// Hands a path or URL to the platform opener. The child is detached; we
/// only care that it spawned.
pub(crate) fn open_external(target: &str) -> anyhow::Result<()> {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    Command::new(opener)
        .arg(target)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("spawn {opener} for {target}"))?;
    Ok(())
}

/// Best effort: pipe the text through whichever clipboard tool is present.
pub(crate) fn copy_to_clipboard(text: &str) -> anyhow::Result<()> {
    let tools: &[&[&str]] = &[
        &["wl-copy"],
        &["xclip", "-selection", "clipboard"],
        &["pbcopy"],
    ];

    for tool in tools {
        let spawned = Command::new(tool[0])
            .args(&tool[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        let Ok(mut child) = spawned else {
            continue;
        };
        if let Some(stdin) = child.stdin.as_mut()
            && stdin.write_all(text.as_bytes()).is_err()
        {
            let _ = child.kill();
            continue;
        }
        drop(child.stdin.take());
        if child.wait().is_ok_and(|status| status.success()) {
            return Ok(());
        }
    }
    anyhow::bail!("no clipboard tool available (tried wl-copy, xclip, pbcopy)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_target_keeps_free_names() {
        let dir = std::env::temp_dir().join(format!("filepeek-dl-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        assert_eq!(unique_target(&dir, "a.txt"), dir.join("a.txt"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unique_target_suffixes_taken_names() {
        let dir = std::env::temp_dir().join(format!("filepeek-dl2-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a.txt"), b"x").unwrap();
        assert_eq!(unique_target(&dir, "a.txt"), dir.join("a-1.txt"));

        std::fs::write(dir.join("a-1.txt"), b"x").unwrap();
        assert_eq!(unique_target(&dir, "a.txt"), dir.join("a-2.txt"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unique_target_handles_extensionless_names() {
        let dir = std::env::temp_dir().join(format!("filepeek-dl3-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Makefile"), b"x").unwrap();
        assert_eq!(unique_target(&dir, "Makefile"), dir.join("Makefile-1"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn save_copy_lands_the_bytes() {
        let source = std::env::temp_dir().join(format!("filepeek-src-{}.txt", std::process::id()));
        std::fs::write(&source, b"payload").unwrap();

        if let Ok(copied) = save_copy(&source) {
            assert_eq!(std::fs::read(&copied).unwrap(), b"payload");
            std::fs::remove_file(&copied).ok();
        }
        std::fs::remove_file(&source).ok();
    }
}
