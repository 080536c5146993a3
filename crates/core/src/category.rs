//! Extension-based file classification.

/// Coarse file type driving which viewer and controls apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    Pdf,
    Image,
    Video,
    Audio,
    Office,
    Text,
    Archive,
    Other,
}

impl FileCategory {
    /// Classifies a file name by the substring after its last `.`, lower-cased.
    /// Total and deterministic: unknown or missing extensions map to `Other`.
    pub fn classify(file_name: &str) -> Self {
        let Some((_, ext)) = file_name.rsplit_once('.') else {
            return FileCategory::Other;
        };
        Self::from_extension(&ext.to_ascii_lowercase())
    }

    fn from_extension(ext: &str) -> Self {
        match ext {
            "pdf" => FileCategory::Pdf,
            "jpg" | "jpeg" | "jfif" | "png" | "gif" | "svg" | "webp" | "bmp" | "avif" => {
                FileCategory::Image
            }
            "mp4" | "webm" | "mov" | "avi" | "mkv" => FileCategory::Video,
            "mp3" | "wav" | "flac" | "ogg" | "m4a" | "aac" => FileCategory::Audio,
            "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "odt" | "ods" | "odp" => {
                FileCategory::Office
            }
            "txt" | "md" | "json" | "xml" | "csv" | "log" | "rs" | "py" | "js" | "ts" | "html"
            | "css" | "c" | "h" | "cpp" | "java" | "go" | "sh" | "yml" | "yaml" | "toml"
            | "sql" => FileCategory::Text,
            "zip" | "rar" | "7z" | "tar" | "gz" => FileCategory::Archive,
            _ => FileCategory::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Pdf => "pdf",
            FileCategory::Image => "image",
            FileCategory::Video => "video",
            FileCategory::Audio => "audio",
            FileCategory::Office => "office",
            FileCategory::Text => "text",
            FileCategory::Archive => "archive",
            FileCategory::Other => "other",
        }
    }

    /// Whether the viewer for this category exposes page navigation.
    pub fn is_paginated(&self) -> bool {
        matches!(self, FileCategory::Pdf)
    }

    /// Whether closing a session of this category must release playback.
    pub fn owns_playback(&self) -> bool {
        matches!(self, FileCategory::Audio | FileCategory::Video)
    }
}

impl std::fmt::Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileCategory {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(FileCategory::Pdf),
            "image" => Ok(FileCategory::Image),
            "video" => Ok(FileCategory::Video),
            "audio" => Ok(FileCategory::Audio),
            "office" => Ok(FileCategory::Office),
            "text" => Ok(FileCategory::Text),
            "archive" => Ok(FileCategory::Archive),
            "other" => Ok(FileCategory::Other),
            _ => Err("unknown file category"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(FileCategory::classify("report.PDF"), FileCategory::Pdf);
        assert_eq!(FileCategory::classify("notes.MD"), FileCategory::Text);
        assert_eq!(FileCategory::classify("photo.JpG"), FileCategory::Image);
    }

    #[test]
    fn classify_uses_last_extension() {
        assert_eq!(FileCategory::classify("backup.tar.gz"), FileCategory::Archive);
        assert_eq!(FileCategory::classify("release.notes.txt"), FileCategory::Text);
    }

    #[test]
    fn unknown_or_missing_extension_is_other() {
        assert_eq!(FileCategory::classify("data.unknown"), FileCategory::Other);
        assert_eq!(FileCategory::classify("Makefile"), FileCategory::Other);
        assert_eq!(FileCategory::classify(""), FileCategory::Other);
        assert_eq!(FileCategory::classify("trailing."), FileCategory::Other);
    }

    #[test]
    fn supported_extensions_map_to_expected_categories() {
        let table: &[(&str, FileCategory)] = &[
            ("a.pdf", FileCategory::Pdf),
            ("a.jpg", FileCategory::Image),
            ("a.png", FileCategory::Image),
            ("a.gif", FileCategory::Image),
            ("a.svg", FileCategory::Image),
            ("a.webp", FileCategory::Image),
            ("a.mp4", FileCategory::Video),
            ("a.webm", FileCategory::Video),
            ("a.mov", FileCategory::Video),
            ("a.mp3", FileCategory::Audio),
            ("a.wav", FileCategory::Audio),
            ("a.flac", FileCategory::Audio),
            ("a.doc", FileCategory::Office),
            ("a.docx", FileCategory::Office),
            ("a.xls", FileCategory::Office),
            ("a.xlsx", FileCategory::Office),
            ("a.ppt", FileCategory::Office),
            ("a.pptx", FileCategory::Office),
            ("a.txt", FileCategory::Text),
            ("a.md", FileCategory::Text),
            ("a.json", FileCategory::Text),
            ("a.xml", FileCategory::Text),
            ("a.csv", FileCategory::Text),
            ("a.rs", FileCategory::Text),
            ("a.zip", FileCategory::Archive),
            ("a.rar", FileCategory::Archive),
            ("a.7z", FileCategory::Archive),
            ("a.tar", FileCategory::Archive),
            ("a.gz", FileCategory::Archive),
        ];
        for (name, expected) in table {
            assert_eq!(FileCategory::classify(name), *expected, "{name}");
        }
    }

    #[test]
    fn category_parses_strings() {
        assert_eq!("pdf".parse::<FileCategory>().unwrap(), FileCategory::Pdf);
        assert_eq!(" Archive ".parse::<FileCategory>().unwrap(), FileCategory::Archive);
        assert!("nope".parse::<FileCategory>().is_err());
    }

    #[test]
    fn only_pdf_is_paginated() {
        assert!(FileCategory::Pdf.is_paginated());
        assert!(!FileCategory::Text.is_paginated());
        assert!(!FileCategory::Image.is_paginated());
    }
}
