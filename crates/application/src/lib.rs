//! Application orchestration layer for Filepeek.
//!
//! Owns the lifecycle of one viewer session: open, resolve, render
//! callbacks, close. Errors land in the session's `error` field; nothing
//! here panics or propagates render failures to the caller.

use filepeek_core::fallback::{FallbackController, FallbackState};
use filepeek_core::{FileCategory, RecentFile, Settings, ViewRequest, ViewerSession};

/// Error taxonomy for the viewer boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// The external URL resolver failed. Terminal for the session.
    Resolution(String),
    /// Network/read failure while retrieving content. Recoverable.
    Transport(String),
    /// The chosen technique cannot display the content. Recoverable.
    Render(String),
    /// Every fallback strategy failed. Terminal for the session.
    Exhausted,
}

impl ViewError {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ViewError::Resolution(_) | ViewError::Exhausted)
    }

    pub fn user_message(&self) -> String {
        match self {
            ViewError::Resolution(msg) => format!("could not resolve file: {msg}"),
            ViewError::Transport(msg) => format!("could not load file: {msg}"),
            ViewError::Render(msg) => format!("could not display file: {msg}"),
            ViewError::Exhausted => {
                "no rendering strategy could display this file; download it or open it externally"
                    .to_string()
            }
        }
    }
}

/// State of the external URL resolution collaborator, consumed only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Resolution {
    #[default]
    Idle,
    Resolving,
    Resolved(String),
    Failed(String),
}

/// Turns a durable file reference into a fetchable location. Callers must
/// not assume the raw reference is directly readable.
pub trait UrlResolver {
    fn resolve(&self, file_url: &str, expires_in_secs: u64) -> Result<String, String>;
}

/// Cleanup obligations produced by closing a session. Emitted at most once
/// per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cleanup {
    pub pause_media: bool,
    pub exit_fullscreen: bool,
}

#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub settings: Settings,
    pub request: Option<ViewRequest>,
    pub session: Option<ViewerSession>,
    pub resolution: Resolution,
    pub fallback: Option<FallbackController>,
    pub recent: Vec<RecentFile>,
}

impl ViewerContext {
    pub fn new(mut settings: Settings) -> Self {
        settings.normalize();
        Self {
            settings,
            request: None,
            session: None,
            resolution: Resolution::Idle,
            fallback: None,
            recent: Vec::new(),
        }
    }

    pub fn with_recent(mut self, recent: Vec<RecentFile>) -> Self {
        self.recent = recent;
        self
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn category(&self) -> Option<FileCategory> {
        self.session.as_ref().map(|s| s.category)
    }

    /// Opens a viewer session for the request. An already-open session is
    /// closed first (one viewer at a time).
    pub fn open(&mut self, request: ViewRequest) -> Option<Cleanup> {
        let cleanup = self.close();
        let category = request.category();
        let mut session = ViewerSession::open(category, self.settings.default_zoom_percent);
        session.loading = true;

        self.fallback = category.is_paginated().then(|| {
            let mut controller = FallbackController::new(self.settings.strategy_hint());
            controller.begin();
            controller
        });
        self.resolution = Resolution::Resolving;
        self.request = Some(request);
        self.session = Some(session);
        cleanup
    }

    /// Full session reset for the current request; PDF strategies restart
    /// from strategy 0.
    pub fn reopen(&mut self) -> Option<Cleanup> {
        let request = self.request.clone()?;
        self.open(request)
    }

    /// Closing an already-closed viewer is a no-op.
    pub fn close(&mut self) -> Option<Cleanup> {
        let session = self.session.take()?;
        if let Some(request) = self.request.as_mut() {
            request.is_open = false;
        }
        self.resolution = Resolution::Idle;
        self.fallback = None;
        Some(Cleanup {
            pause_media: session.category.owns_playback(),
            exit_fullscreen: session.is_fullscreen,
        })
    }

    /// Runs the resolver and gates the session on its outcome. A resolver
    /// failure is terminal for the session.
    pub fn resolve_with(&mut self, resolver: &dyn UrlResolver, expires_in_secs: u64) {
        let Some(file_url) = self.request.as_ref().map(|r| r.file_url.clone()) else {
            return;
        };
        self.resolution = Resolution::Resolving;
        match resolver.resolve(&file_url, expires_in_secs) {
            Ok(resolved) => self.resolution_succeeded(resolved),
            Err(err) => self.resolution_failed(err),
        }
    }

    pub fn resolution_succeeded(&mut self, resolved_url: String) {
        if let Some(request) = self.request.as_mut() {
            request.file_url = resolved_url.clone();
        }
        self.resolution = Resolution::Resolved(resolved_url);
    }

    pub fn resolution_failed(&mut self, message: String) {
        self.resolution = Resolution::Failed(message.clone());
        if let Some(session) = self.session.as_mut() {
            session.fail(ViewError::Resolution(message).user_message());
        }
    }

    pub fn resolved_url(&self) -> Option<&str> {
        match &self.resolution {
            Resolution::Resolved(url) => Some(url),
            _ => None,
        }
    }

    /// Load-success callback from whichever viewer is mounted.
    pub fn render_succeeded(&mut self, total_pages: Option<u32>) {
        if let Some(controller) = self.fallback.as_mut() {
            controller.mark_success(total_pages);
        }
        if let Some(session) = self.session.as_mut() {
            if let Some(total) = total_pages {
                session.set_total_pages(total);
            }
            session.loaded();
        }
    }

    /// Load-failure callback. For PDFs this drives the fallback chain; the
    /// session only surfaces an error once the chain is exhausted. For other
    /// categories the error is surfaced immediately but stays recoverable.
    pub fn render_failed(&mut self, error: ViewError) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match self.fallback.as_mut() {
            Some(controller) => {
                controller.mark_failure();
                if controller.state() == FallbackState::Exhausted {
                    session.fail(ViewError::Exhausted.user_message());
                } else {
                    // Next strategy mounts; keep the spinner, not the error.
                    session.loading = true;
                    session.error = None;
                }
            }
            None => session.fail(error.user_message()),
        }
    }

    /// User-initiated retry. Distinct from automatic advancement: it always
    /// counts, always clears the error, and for PDFs advances the strategy
    /// cursor with wrap-around.
    pub fn manual_retry(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.retry_count += 1;
        session.error = None;
        session.loading = true;
        if let Some(controller) = self.fallback.as_mut() {
            controller.manual_retry();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filepeek_core::PdfStrategy;

    struct FixedResolver(Result<String, String>);

    impl UrlResolver for FixedResolver {
        fn resolve(&self, _file_url: &str, _expires_in_secs: u64) -> Result<String, String> {
            self.0.clone()
        }
    }

    fn open_ctx(file_name: &str) -> ViewerContext {
        let mut ctx = ViewerContext::new(Settings::default());
        ctx.open(ViewRequest::new(format!("/tmp/{file_name}"), file_name));
        ctx
    }

    #[test]
    fn open_classifies_and_starts_loading() {
        let ctx = open_ctx("song.mp3");
        assert_eq!(ctx.category(), Some(FileCategory::Audio));
        assert!(ctx.session.as_ref().unwrap().loading);
        assert!(ctx.fallback.is_none());
    }

    #[test]
    fn pdf_open_begins_the_fallback_chain() {
        let ctx = open_ctx("report.pdf");
        let controller = ctx.fallback.as_ref().unwrap();
        assert_eq!(controller.current(), Some(PdfStrategy::Native));
    }

    #[test]
    fn close_is_idempotent() {
        let mut ctx = open_ctx("song.mp3");
        ctx.session.as_mut().unwrap().toggle_fullscreen();

        let cleanup = ctx.close().unwrap();
        assert!(cleanup.pause_media);
        assert!(cleanup.exit_fullscreen);
        assert_eq!(ctx.close(), None);
        assert!(!ctx.request.as_ref().unwrap().is_open);
    }

    #[test]
    fn close_without_playback_or_fullscreen_has_nothing_to_release() {
        let mut ctx = open_ctx("notes.txt");
        let cleanup = ctx.close().unwrap();
        assert!(!cleanup.pause_media);
        assert!(!cleanup.exit_fullscreen);
    }

    #[test]
    fn resolution_failure_is_terminal() {
        let mut ctx = open_ctx("report.pdf");
        ctx.resolve_with(&FixedResolver(Err("expired link".into())), 60);
        let session = ctx.session.as_ref().unwrap();
        assert!(session.error.as_deref().unwrap().contains("expired link"));
        assert!(!session.loading);
        assert_eq!(ctx.resolved_url(), None);
    }

    #[test]
    fn resolution_success_replaces_the_file_url() {
        let mut ctx = open_ctx("report.pdf");
        ctx.resolve_with(&FixedResolver(Ok("/resolved/report.pdf".into())), 60);
        assert_eq!(ctx.resolved_url(), Some("/resolved/report.pdf"));
        assert_eq!(
            ctx.request.as_ref().unwrap().file_url,
            "/resolved/report.pdf"
        );
    }

    #[test]
    fn pdf_failures_fall_through_strategies_then_exhaust() {
        let mut ctx = open_ctx("report.pdf");
        ctx.render_failed(ViewError::Render("bad page".into()));
        assert!(ctx.session.as_ref().unwrap().error.is_none());
        ctx.render_failed(ViewError::Render("bad page".into()));
        ctx.render_failed(ViewError::Render("bad page".into()));

        let session = ctx.session.as_ref().unwrap();
        assert!(session.error.as_deref().unwrap().contains("download"));
        assert_eq!(
            ctx.fallback.as_ref().unwrap().state(),
            FallbackState::Exhausted
        );
    }

    #[test]
    fn non_pdf_render_failure_surfaces_immediately() {
        let mut ctx = open_ctx("broken.zip");
        ctx.render_failed(ViewError::Render("corrupt archive".into()));
        let session = ctx.session.as_ref().unwrap();
        assert!(session.error.as_deref().unwrap().contains("corrupt archive"));
    }

    #[test]
    fn render_success_records_pages_and_stops_loading() {
        let mut ctx = open_ctx("report.pdf");
        ctx.render_succeeded(Some(7));
        let session = ctx.session.as_ref().unwrap();
        assert!(!session.loading);
        assert_eq!(session.total_pages, 7);
    }

    #[test]
    fn manual_retry_counts_and_advances() {
        let mut ctx = open_ctx("report.pdf");
        ctx.render_failed(ViewError::Render("x".into()));
        ctx.manual_retry();
        let session = ctx.session.as_ref().unwrap();
        assert_eq!(session.retry_count, 1);
        assert!(session.loading);
        assert_eq!(
            ctx.fallback.as_ref().unwrap().current(),
            Some(PdfStrategy::External)
        );
    }

    #[test]
    fn reopen_restarts_from_strategy_zero() {
        let mut ctx = open_ctx("report.pdf");
        ctx.render_failed(ViewError::Render("x".into()));
        ctx.render_failed(ViewError::Render("x".into()));
        ctx.render_failed(ViewError::Render("x".into()));
        ctx.reopen();
        assert_eq!(
            ctx.fallback.as_ref().unwrap().current(),
            Some(PdfStrategy::Native)
        );
        assert_eq!(ctx.session.as_ref().unwrap().retry_count, 0);
    }

    #[test]
    fn terminal_errors_are_flagged() {
        assert!(ViewError::Resolution("x".into()).is_terminal());
        assert!(ViewError::Exhausted.is_terminal());
        assert!(!ViewError::Transport("x".into()).is_terminal());
        assert!(!ViewError::Render("x".into()).is_terminal());
    }
}
