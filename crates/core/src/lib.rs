//! Core domain types and state machines for Filepeek.

use serde::{Deserialize, Serialize};

pub mod archive;
pub mod category;
pub mod chrome;
pub mod external;
pub mod fallback;
pub mod markdown;
pub mod search;
pub mod session;

pub use category::FileCategory;
pub use fallback::{FallbackController, FallbackState, PdfStrategy, StrategyHint};
pub use session::ViewerSession;

/// One request to preview a file. Immutable for the duration of a session,
/// except that `file_url` may be replaced by its resolved form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRequest {
    pub file_url: String,
    pub file_name: String,
    pub is_open: bool,
}

impl ViewRequest {
    pub fn new(file_url: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            file_url: file_url.into(),
            file_name: file_name.into(),
            is_open: true,
        }
    }

    pub fn category(&self) -> FileCategory {
        FileCategory::classify(&self.file_name)
    }
}

/// A previously viewed file, kept for the recents list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentFile {
    pub path: String,
    pub name: String,
    pub last_opened: Option<i64>,
}

impl RecentFile {
    pub fn category(&self) -> FileCategory {
        FileCategory::classify(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub default_zoom_percent: u16,
    pub line_numbers: bool,
    pub safe_pdf_mode: bool,
    pub text_font_size: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_zoom_percent: 100,
            line_numbers: true,
            safe_pdf_mode: false,
            text_font_size: 14,
        }
    }
}

impl Settings {
    pub fn normalize(&mut self) {
        self.default_zoom_percent = session::clamp_zoom(self.default_zoom_percent);
        self.text_font_size = self.text_font_size.clamp(session::FONT_SIZE_MIN, session::FONT_SIZE_MAX);
    }

    pub fn toggle_line_numbers(&mut self) {
        self.line_numbers = !self.line_numbers;
    }

    pub fn strategy_hint(&self) -> StrategyHint {
        StrategyHint {
            prefer_safe: self.safe_pdf_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_starts_open() {
        let request = ViewRequest::new("/tmp/report.pdf", "report.pdf");
        assert!(request.is_open);
        assert_eq!(request.category(), FileCategory::Pdf);
    }

    #[test]
    fn settings_normalize_clamps_zoom_and_font() {
        let mut settings = Settings {
            default_zoom_percent: 10_000,
            line_numbers: false,
            safe_pdf_mode: false,
            text_font_size: 2,
        };
        settings.normalize();
        assert_eq!(settings.default_zoom_percent, 300);
        assert_eq!(settings.text_font_size, session::FONT_SIZE_MIN);
    }

    #[test]
    fn settings_normalize_snaps_zoom_to_step() {
        let mut settings = Settings {
            default_zoom_percent: 110,
            ..Settings::default()
        };
        settings.normalize();
        assert_eq!(settings.default_zoom_percent, 100);
    }

    #[test]
    fn safe_mode_feeds_strategy_hint() {
        let mut settings = Settings::default();
        assert!(!settings.strategy_hint().prefer_safe);
        settings.safe_pdf_mode = true;
        assert!(settings.strategy_hint().prefer_safe);
    }
}
