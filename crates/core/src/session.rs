//! Mutable state of one open viewer instance.

use crate::category::FileCategory;

pub const ZOOM_MIN: u16 = 25;
pub const ZOOM_MAX: u16 = 300;
pub const ZOOM_STEP: u16 = 25;

pub const FONT_SIZE_MIN: u16 = 8;
pub const FONT_SIZE_MAX: u16 = 32;
pub const FONT_SIZE_STEP: u16 = 2;

/// Snaps a zoom value into `[ZOOM_MIN, ZOOM_MAX]` on the 25% grid.
pub fn clamp_zoom(value: u16) -> u16 {
    let value = value.clamp(ZOOM_MIN, ZOOM_MAX);
    value - value % ZOOM_STEP
}

/// Created on open, mutated by user interaction and load callbacks,
/// destroyed on close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerSession {
    pub category: FileCategory,
    pub loading: bool,
    pub error: Option<String>,
    pub retry_count: u32,
    pub zoom_percent: u16,
    pub page: u32,
    pub total_pages: u32,
    pub is_fullscreen: bool,
    pub show_controls: bool,
}

impl ViewerSession {
    pub fn open(category: FileCategory, zoom_percent: u16) -> Self {
        Self {
            category,
            loading: true,
            error: None,
            retry_count: 0,
            zoom_percent: clamp_zoom(zoom_percent),
            page: 1,
            total_pages: 0,
            is_fullscreen: false,
            show_controls: true,
        }
    }

    pub fn loaded(&mut self) {
        self.loading = false;
        self.error = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    pub fn zoom_in(&mut self) {
        self.zoom_percent = clamp_zoom(self.zoom_percent.saturating_add(ZOOM_STEP));
    }

    pub fn zoom_out(&mut self) {
        self.zoom_percent = clamp_zoom(self.zoom_percent.saturating_sub(ZOOM_STEP).max(ZOOM_MIN));
    }

    /// Upper page bound; a document with no known pages still has page 1.
    pub fn max_page(&self) -> u32 {
        self.total_pages.max(1)
    }

    pub fn set_total_pages(&mut self, total: u32) {
        self.total_pages = total;
        self.page = self.page.clamp(1, self.max_page());
    }

    pub fn next_page(&mut self) {
        if self.page < self.max_page() {
            self.page += 1;
        }
    }

    pub fn prev_page(&mut self) {
        if self.page > 1 {
            self.page -= 1;
        }
    }

    pub fn go_to_page(&mut self, page: u32) {
        self.page = page.clamp(1, self.max_page());
    }

    pub fn toggle_fullscreen(&mut self) {
        self.is_fullscreen = !self.is_fullscreen;
        // Entering fullscreen starts with controls visible; the idle timer
        // takes it from there.
        self.show_controls = true;
    }

    /// Resyncs after an externally triggered fullscreen exit.
    pub fn sync_fullscreen(&mut self, active: bool) {
        if self.is_fullscreen != active {
            self.is_fullscreen = active;
            self.show_controls = true;
        }
    }
}
