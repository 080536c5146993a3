//! ratatui-based viewer shell.
//!
//! One file on screen at a time: chrome (header, footer, fullscreen
//! auto-hide controls), per-category content panes, and the keyboard
//! surface that drives the session state machines.

use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{event, terminal};
use filepeek_application::{Cleanup, Resolution, UrlResolver, ViewError, ViewerContext};
use filepeek_core::archive::ArchiveTree;
use filepeek_core::chrome::{CONTROLS_HIDE_TIMEOUT, IdleTimer, Watchdog};
use filepeek_core::markdown::{self, MarkdownLine};
use filepeek_core::search::TextSearch;
use filepeek_core::session;
use filepeek_core::{FileCategory, PdfStrategy, ViewRequest, external};
use filepeek_engine::{AudioPlayback, Engine, PdfAttempt, RgbaBitmap, TextContent};
use image::DynamicImage;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap,
};
use ratatui_image::picker::{Picker, cap_parser::QueryStdioOptions};
use ratatui_image::protocol::Protocol as ImageProtocol;
use ratatui_image::{Image as ImageWidget, Resize};
use unicode_width::UnicodeWidthStr;

mod actions;
mod image_protocol;

/// Pan distance per arrow key press, in image pixels.
const PAN_STEP_PX: i32 = 64;

/// A file the user opened during this UI session, for recents persistence.
#[derive(Debug, Clone)]
pub struct OpenedFile {
    pub path: String,
    pub name: String,
    pub opened_at: i64,
}

#[derive(Debug)]
pub struct UiOutcome {
    pub ctx: ViewerContext,
    pub opened: Vec<OpenedFile>,
}

/// What is currently mounted in the content pane.
enum Content {
    /// Nothing loaded yet; the load step runs on the next tick.
    Pending,
    /// A rasterized page or decoded image.
    Page(DynamicImage),
    /// Line-oriented text (text files and the PDF text layer).
    Lines(TextContent),
    Audio(AudioPlayback),
    Archive(ArchiveTree),
    /// Handed to an external opener; the pane shows where it went.
    Delegated(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RenderKey {
    page: u32,
    zoom: u16,
    pan_x: u32,
    pan_y: u32,
    width: u16,
    height: u16,
}

struct RenderedImage {
    protocol: ImageProtocol,
    key: RenderKey,
}

pub struct Ui {
    ctx: ViewerContext,
    resolver: Box<dyn UrlResolver>,
    engine: Engine,
    image_picker: Picker,
    content: Content,
    /// The PDF strategy that last succeeded; page turns reuse it instead of
    /// restarting the fallback chain.
    active_strategy: Option<PdfStrategy>,
    rendered: Option<RenderedImage>,
    /// Pan offset into a zoomed image, in scaled-image pixels.
    pan_x: u32,
    pan_y: u32,
    search: TextSearch,
    search_open: bool,
    search_input: String,
    goto_open: bool,
    goto_input: String,
    goto_error: Option<String>,
    scroll: usize,
    archive_cursor: usize,
    recents_cursor: usize,
    controls_timer: IdleTimer,
    watchdog: Watchdog,
    notice: Option<String>,
    opened: Vec<OpenedFile>,
    viewport: Rect,
    /// Launched on a single file: closing the viewer quits instead of
    /// falling back to the recents browser.
    standalone: bool,
}

impl Ui {
    pub fn new(mut ctx: ViewerContext, resolver: Box<dyn UrlResolver>) -> Self {
        ctx.settings.normalize();
        let standalone = ctx.is_open();
        let watchdog = if standalone {
            Watchdog::start(Instant::now())
        } else {
            Watchdog::default()
        };
        Self {
            ctx,
            resolver,
            engine: Engine::new(),
            image_picker: Picker::halfblocks(),
            content: Content::Pending,
            active_strategy: None,
            rendered: None,
            pan_x: 0,
            pan_y: 0,
            search: TextSearch::new(),
            search_open: false,
            search_input: String::new(),
            goto_open: false,
            goto_input: String::new(),
            goto_error: None,
            scroll: 0,
            archive_cursor: 0,
            recents_cursor: 0,
            controls_timer: IdleTimer::new(),
            watchdog,
            notice: None,
            opened: Vec::new(),
            viewport: Rect::new(0, 0, 80, 24),
            standalone,
        }
    }

    pub fn run(&mut self) -> anyhow::Result<UiOutcome> {
        let mut terminal = setup_terminal()?;
        image_protocol::ensure_tmux_allow_passthrough();
        let hints = image_protocol::TerminalHints::from_env();
        self.image_picker = if hints.should_query_stdio() {
            let mut options = QueryStdioOptions::default();
            options.timeout = hints.query_timeout();
            options.text_sizing_protocol = false;
            Picker::from_query_stdio_with_options(options).unwrap_or_else(|_| Picker::halfblocks())
        } else {
            Picker::halfblocks()
        };
        self.image_picker
            .set_background_color(image::Rgba([255u8, 255u8, 255u8, 255u8]));
        hints.prefer_kitty(&mut self.image_picker);
        if !hints.image_supported(&self.image_picker) {
            self.notice = Some("terminal has no image protocol; pages render as halfblocks".to_string());
        }
        terminal.clear().ok();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.event_loop(&mut terminal)
        }));
        let restore_result = restore_terminal(&mut terminal);

        match (result, restore_result) {
            (Ok(Ok(())), Ok(())) => Ok(UiOutcome {
                ctx: self.ctx.clone(),
                opened: std::mem::take(&mut self.opened),
            }),
            (Ok(Ok(())), Err(err)) => Err(err),
            (Ok(Err(err)), _) => Err(err),
            (Err(panic), Ok(())) => Err(anyhow::anyhow!(panic_to_string(panic))),
            (Err(panic), Err(err)) => Err(anyhow::anyhow!(
                "{}\n(additionally failed to restore terminal: {err})",
                panic_to_string(panic)
            )),
        }
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<()> {
        let tick_rate = Duration::from_millis(250);

        loop {
            self.load_pending();
            terminal.draw(|frame| self.draw(frame))?;

            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Resize(_, _) => {
                        self.rendered = None;
                    }
                    Event::Key(key) => {
                        if key.kind == KeyEventKind::Release {
                            continue;
                        }
                        if self.handle_key(key)? {
                            return Ok(());
                        }
                    }
                    _ => {}
                }
            }

            self.tick(Instant::now());
        }
    }

    fn tick(&mut self, now: Instant) {
        if self.controls_timer.fire_if_expired(now)
            && let Some(session) = self.ctx.session.as_mut()
            && session.is_fullscreen
        {
            session.show_controls = false;
        }

        if self.watchdog.expired(now) {
            self.watchdog.disarm();
            if self.ctx.session.as_ref().is_some_and(|s| s.loading) {
                self.ctx
                    .render_failed(ViewError::Transport("load timed out".to_string()));
                // A PDF chain may have advanced to the next strategy; give
                // that attempt its own deadline.
                if self.ctx.session.as_ref().is_some_and(|s| s.loading) {
                    self.watchdog = Watchdog::start(now);
                }
            }
        }

        if let Content::Audio(playback) = &mut self.content
            && let Err(err) = playback.tick()
        {
            self.notice = Some(format!("playback restart failed: {err}"));
        }
    }

    // Content loading -----------------------------------------------------

    fn load_pending(&mut self) {
        if !matches!(self.content, Content::Pending) {
            return;
        }
        let Some(session) = self.ctx.session.as_ref() else {
            return;
        };
        if !session.loading {
            return;
        }
        let category = session.category;
        let page = session.page;

        if matches!(self.ctx.resolution, Resolution::Idle | Resolution::Resolving) {
            self.ctx.resolve_with(self.resolver.as_ref(), 3600);
        }
        let Some(url) = self.ctx.resolved_url().map(str::to_string) else {
            // Resolution failed; the session already carries the error.
            self.watchdog.disarm();
            return;
        };
        let path = PathBuf::from(&url);

        match category {
            FileCategory::Pdf => self.load_pdf(&path, page),
            FileCategory::Image => match filepeek_engine::load_image(&path) {
                Ok(frame) => {
                    self.content = Content::Page(frame);
                    self.rendered = None;
                    self.finish_load(None);
                }
                Err(err) => self.fail_load(ViewError::Render(format!("{err:#}"))),
            },
            FileCategory::Audio => match AudioPlayback::open(&path) {
                Ok(playback) => {
                    self.content = Content::Audio(playback);
                    self.finish_load(None);
                }
                Err(err) => self.fail_load(ViewError::Render(format!("{err:#}"))),
            },
            FileCategory::Text => match filepeek_engine::load_text(&path) {
                Ok(text) => {
                    self.search.recompute(&text.lines);
                    self.content = Content::Lines(text);
                    self.scroll = 0;
                    self.finish_load(None);
                }
                Err(err) => self.fail_load(ViewError::Render(format!("{err:#}"))),
            },
            FileCategory::Archive => match filepeek_engine::load_archive_tree(&path) {
                Ok(tree) => {
                    self.content = Content::Archive(tree);
                    self.archive_cursor = 0;
                    self.finish_load(None);
                }
                Err(err) => self.fail_load(ViewError::Render(format!("{err:#}"))),
            },
            FileCategory::Video | FileCategory::Office | FileCategory::Other => {
                let shown = share_link(Some(category), &url);
                self.delegate(&url, shown);
            }
        }
    }

    /// No local rendering for this category: hand the file to the platform
    /// opener and show where it went.
    fn delegate(&mut self, target: &str, shown_url: String) {
        if let Err(err) = actions::open_external(target) {
            self.notice = Some(format!("external open failed: {err}"));
        }
        self.content = Content::Delegated(shown_url);
        self.finish_load(None);
    }

    fn load_pdf(&mut self, path: &Path, page: u32) {
        let strategy = self
            .ctx
            .fallback
            .as_ref()
            .and_then(|controller| controller.current())
            .or(self.active_strategy);
        let Some(strategy) = strategy else {
            return;
        };

        let zoom = self
            .ctx
            .session
            .as_ref()
            .map(|s| s.zoom_percent)
            .unwrap_or(100);
        let (font_w, font_h) = self.image_picker.font_size();
        let target_width =
            i32::from(self.viewport.width) * i32::from(font_w.max(1)) * i32::from(zoom) / 100;
        let max_height =
            i32::from(self.viewport.height) * i32::from(font_h.max(1)) * i32::from(zoom) / 100;

        match self
            .engine
            .attempt_pdf(path, page.saturating_sub(1), strategy, target_width, max_height)
        {
            PdfAttempt::Bitmap {
                bitmap,
                total_pages,
            } => match rgba_to_image(bitmap) {
                Some(frame) => {
                    self.content = Content::Page(frame);
                    self.rendered = None;
                    self.active_strategy = Some(strategy);
                    self.finish_load(Some(total_pages));
                }
                None => self.fail_load(ViewError::Render("empty page bitmap".to_string())),
            },
            PdfAttempt::Text { text, total_pages } => {
                let lines = text.lines().map(str::to_string).collect();
                let text = TextContent { lines };
                self.search.recompute(&text.lines);
                self.content = Content::Lines(text);
                self.scroll = 0;
                self.active_strategy = Some(strategy);
                self.finish_load(Some(total_pages));
            }
            PdfAttempt::External => {
                let shown = path.display().to_string();
                let total_pages = self.engine.pdf_page_count(path).ok();
                if let Err(err) = actions::open_external(&path.display().to_string()) {
                    self.notice = Some(format!("external open failed: {err}"));
                }
                self.content = Content::Delegated(shown);
                self.active_strategy = Some(strategy);
                self.finish_load(total_pages);
            }
            PdfAttempt::Failed(message) => self.fail_load(ViewError::Render(message)),
        }
    }

    fn finish_load(&mut self, total_pages: Option<u32>) {
        self.ctx.render_succeeded(total_pages);
        self.watchdog.disarm();
    }

    fn fail_load(&mut self, error: ViewError) {
        self.ctx.render_failed(error);
        if self.ctx.session.as_ref().is_some_and(|s| s.loading) {
            // The fallback chain advanced; the next tick mounts the next
            // strategy under a fresh deadline.
            self.watchdog = Watchdog::start(Instant::now());
        } else {
            self.watchdog.disarm();
        }
    }

    // Session lifecycle ---------------------------------------------------

    fn open_request(&mut self, path: String, name: String) {
        if let Some(cleanup) = self.ctx.open(ViewRequest::new(path.clone(), name.clone())) {
            self.apply_cleanup(cleanup);
        }
        self.reset_viewer_state();
        self.watchdog = Watchdog::start(Instant::now());
        self.opened.push(OpenedFile {
            path,
            name,
            opened_at: unix_now_secs(),
        });
    }

    fn close_viewer(&mut self) {
        if let Some(cleanup) = self.ctx.close() {
            self.apply_cleanup(cleanup);
        }
        self.watchdog.disarm();
        self.reset_viewer_state();
    }

    fn apply_cleanup(&mut self, cleanup: Cleanup) {
        if cleanup.pause_media
            && let Content::Audio(playback) = &mut self.content
        {
            playback.pause();
        }
        if cleanup.exit_fullscreen {
            self.controls_timer.cancel();
        }
    }

    fn reset_viewer_state(&mut self) {
        self.content = Content::Pending;
        self.rendered = None;
        self.active_strategy = None;
        self.pan_x = 0;
        self.pan_y = 0;
        self.search.clear();
        self.search_open = false;
        self.search_input.clear();
        self.goto_open = false;
        self.goto_input.clear();
        self.goto_error = None;
        self.scroll = 0;
        self.archive_cursor = 0;
        self.controls_timer.cancel();
        self.notice = None;
    }

    /// Re-mounts the current page (page turn, zoom change, retry).
    fn remount(&mut self) {
        self.content = Content::Pending;
        self.rendered = None;
        if let Some(session) = self.ctx.session.as_mut() {
            session.loading = true;
        }
        self.watchdog = Watchdog::start(Instant::now());
    }

    // Key handling --------------------------------------------------------

    /// Returns true when the UI should exit.
    fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        if !self.ctx.is_open() {
            return self.handle_recents_key(key);
        }
        if self.goto_open {
            self.handle_goto_key(key);
            return Ok(false);
        }
        if self.search_open {
            self.handle_search_key(key);
            return Ok(false);
        }
        self.handle_viewer_key(key)
    }

    fn handle_recents_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Ok(true),
            KeyCode::Up => {
                self.recents_cursor = self.recents_cursor.saturating_sub(1);
                Ok(false)
            }
            KeyCode::Down => {
                let len = self.ctx.recent.len();
                if len > 0 {
                    self.recents_cursor = (self.recents_cursor + 1).min(len - 1);
                }
                Ok(false)
            }
            KeyCode::Enter => {
                if let Some(recent) = self.ctx.recent.get(self.recents_cursor).cloned() {
                    self.open_request(recent.path, recent.name);
                }
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    fn handle_viewer_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        let now = Instant::now();
        let fullscreen = self
            .ctx
            .session
            .as_ref()
            .is_some_and(|s| s.is_fullscreen);
        if fullscreen {
            // Any input surfaces the controls and restarts the hide clock.
            if let Some(session) = self.ctx.session.as_mut() {
                session.show_controls = true;
            }
            self.controls_timer.arm(now, CONTROLS_HIDE_TIMEOUT);
        }

        match key.code {
            KeyCode::Esc => {
                if fullscreen {
                    if let Some(session) = self.ctx.session.as_mut() {
                        session.sync_fullscreen(false);
                    }
                    self.controls_timer.cancel();
                    return Ok(false);
                }
                self.close_viewer();
                Ok(self.standalone)
            }
            KeyCode::Char('q') => {
                self.close_viewer();
                Ok(true)
            }
            KeyCode::Char('f') | KeyCode::Char('F') => {
                if let Some(session) = self.ctx.session.as_mut() {
                    session.toggle_fullscreen();
                    if session.is_fullscreen {
                        self.controls_timer.arm(now, CONTROLS_HIDE_TIMEOUT);
                    } else {
                        self.controls_timer.cancel();
                    }
                }
                self.rendered = None;
                Ok(false)
            }
            KeyCode::Char('r') => {
                self.ctx.manual_retry();
                self.active_strategy = None;
                self.remount();
                Ok(false)
            }
            KeyCode::Char('R') => {
                if let Some(cleanup) = self.ctx.reopen() {
                    self.apply_cleanup(cleanup);
                }
                self.reset_viewer_state();
                self.watchdog = Watchdog::start(now);
                Ok(false)
            }
            KeyCode::Char('d') => {
                self.download_copy();
                Ok(false)
            }
            KeyCode::Char('o') => {
                if let Some(url) = self.ctx.resolved_url().map(str::to_string) {
                    match actions::open_external(&url) {
                        Ok(()) => self.notice = Some("opened externally".to_string()),
                        Err(err) => self.notice = Some(format!("external open failed: {err}")),
                    }
                }
                Ok(false)
            }
            KeyCode::Char('y') => {
                self.copy_link();
                Ok(false)
            }
            _ => {
                self.handle_category_key(key);
                Ok(false)
            }
        }
    }

    fn handle_category_key(&mut self, key: KeyEvent) {
        let Some(category) = self.ctx.category() else {
            return;
        };
        match category {
            FileCategory::Pdf => self.handle_pdf_key(key),
            FileCategory::Image => self.handle_image_key(key),
            FileCategory::Audio => self.handle_audio_key(key),
            FileCategory::Text => self.handle_text_key(key),
            FileCategory::Archive => self.handle_archive_key(key),
            FileCategory::Video | FileCategory::Office | FileCategory::Other => {}
        }
    }

    fn handle_pdf_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left => self.turn_page(-1),
            KeyCode::Right => self.turn_page(1),
            KeyCode::Char('+') | KeyCode::Char('=') => self.zoom(1),
            KeyCode::Char('-') => self.zoom(-1),
            KeyCode::Char('g') => {
                self.goto_open = true;
                self.goto_error = None;
                self.goto_input = self
                    .ctx
                    .session
                    .as_ref()
                    .map(|s| s.page.to_string())
                    .unwrap_or_default();
            }
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down => self.scroll_down(1),
            KeyCode::Char('/') => {
                if matches!(self.content, Content::Lines(_)) {
                    self.search_open = true;
                    self.search_input = self.search.query().to_string();
                }
            }
            KeyCode::Char('n') => self.jump_to_match(true),
            KeyCode::Char('N') => self.jump_to_match(false),
            _ => {}
        }
    }

    fn handle_image_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('+') | KeyCode::Char('=') => self.zoom(1),
            KeyCode::Char('-') => self.zoom(-1),
            KeyCode::Left => self.pan(-PAN_STEP_PX, 0),
            KeyCode::Right => self.pan(PAN_STEP_PX, 0),
            KeyCode::Up => self.pan(0, -PAN_STEP_PX),
            KeyCode::Down => self.pan(0, PAN_STEP_PX),
            _ => {}
        }
    }

    fn handle_audio_key(&mut self, key: KeyEvent) {
        let Content::Audio(playback) = &mut self.content else {
            return;
        };
        match key.code {
            KeyCode::Char(' ') => playback.toggle_play(),
            KeyCode::Char('m') => playback.toggle_mute(),
            KeyCode::Char('l') => playback.toggle_repeat(),
            KeyCode::Left => {
                if let Err(err) = playback.seek_by(-5) {
                    self.notice = Some(format!("seek failed: {err}"));
                }
            }
            KeyCode::Right => {
                if let Err(err) = playback.seek_by(5) {
                    self.notice = Some(format!("seek failed: {err}"));
                }
            }
            KeyCode::Up => playback.adjust_volume(0.1),
            KeyCode::Down => playback.adjust_volume(-0.1),
            _ => {}
        }
    }

    fn handle_text_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down => self.scroll_down(1),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::PageDown => self.scroll_down(10),
            KeyCode::Home => self.scroll = 0,
            KeyCode::End => self.scroll_down(usize::MAX),
            KeyCode::Char('/') => {
                self.search_open = true;
                self.search_input = self.search.query().to_string();
            }
            KeyCode::Char('n') => self.jump_to_match(true),
            KeyCode::Char('N') => self.jump_to_match(false),
            KeyCode::Char('l') => {
                self.ctx.settings.toggle_line_numbers();
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_font_size(1),
            KeyCode::Char('-') => self.adjust_font_size(-1),
            _ => {}
        }
    }

    /// Adjusts the persisted text font size. Terminals pick their own cell
    /// size; the value travels with the settings for GUI frontends.
    fn adjust_font_size(&mut self, delta: i16) {
        let settings = &mut self.ctx.settings;
        let step = session::FONT_SIZE_STEP;
        settings.text_font_size = if delta > 0 {
            settings.text_font_size.saturating_add(step)
        } else {
            settings.text_font_size.saturating_sub(step)
        }
        .clamp(session::FONT_SIZE_MIN, session::FONT_SIZE_MAX);
        self.notice = Some(format!("font size {}", settings.text_font_size));
    }

    fn handle_archive_key(&mut self, key: KeyEvent) {
        let Content::Archive(tree) = &mut self.content else {
            return;
        };
        let visible = tree.visible();
        match key.code {
            KeyCode::Up => self.archive_cursor = self.archive_cursor.saturating_sub(1),
            KeyCode::Down => {
                if !visible.is_empty() {
                    self.archive_cursor = (self.archive_cursor + 1).min(visible.len() - 1);
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(&(_, index)) = visible.get(self.archive_cursor) {
                    let entry = &tree.entries()[index];
                    if entry.is_directory {
                        let path = entry.path.clone();
                        tree.toggle(&path);
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.search_open = false;
                self.search.clear();
            }
            KeyCode::Enter => {
                let query = self.search_input.clone();
                if let Content::Lines(text) = &self.content {
                    self.search.set_query(query, &text.lines);
                }
                self.search_open = false;
                self.jump_to_current_match();
            }
            KeyCode::Backspace => {
                self.search_input.pop();
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                self.search_input.push(ch);
            }
            _ => {}
        }
    }

    fn handle_goto_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.goto_open = false;
                self.goto_input.clear();
                self.goto_error = None;
            }
            KeyCode::Enter => {
                let input = self.goto_input.trim();
                let page = match input.parse::<u32>() {
                    Ok(page) if page >= 1 => page,
                    _ => {
                        self.goto_error = Some("Enter a page number".to_string());
                        return;
                    }
                };
                let max_page = self.ctx.session.as_ref().map(|s| s.max_page()).unwrap_or(1);
                if page > max_page {
                    self.goto_error = Some(format!("Page out of range (1..={max_page})"));
                    return;
                }
                if let Some(session) = self.ctx.session.as_mut() {
                    session.go_to_page(page);
                }
                self.goto_open = false;
                self.goto_error = None;
                self.remount();
            }
            KeyCode::Backspace => {
                self.goto_input.pop();
            }
            KeyCode::Char(ch) if ch.is_ascii_digit() => {
                self.goto_input.push(ch);
            }
            _ => {}
        }
    }

    // Key helpers ---------------------------------------------------------

    fn turn_page(&mut self, delta: i32) {
        let Some(session) = self.ctx.session.as_mut() else {
            return;
        };
        let before = session.page;
        if delta > 0 {
            session.next_page();
        } else {
            session.prev_page();
        }
        if session.page != before {
            self.remount();
        }
    }

    fn zoom(&mut self, delta: i32) {
        let Some(session) = self.ctx.session.as_mut() else {
            return;
        };
        let before = session.zoom_percent;
        if delta > 0 {
            session.zoom_in();
        } else {
            session.zoom_out();
        }
        if session.zoom_percent == before {
            return;
        }
        let after = session.zoom_percent;
        // Keep the panned region stable across the zoom change.
        self.pan_x = (u64::from(self.pan_x) * u64::from(after) / u64::from(before)) as u32;
        self.pan_y = (u64::from(self.pan_y) * u64::from(after) / u64::from(before)) as u32;
        // Images rescale in place; PDFs rasterize the page again.
        if session.category == FileCategory::Pdf {
            self.remount();
        } else {
            self.rendered = None;
        }
    }

    /// Pans a zoomed-in image. Offsets are clamped against the scaled frame
    /// at draw time.
    fn pan(&mut self, dx: i32, dy: i32) {
        let zoomed_in = self
            .ctx
            .session
            .as_ref()
            .is_some_and(|s| s.zoom_percent > 100);
        if !zoomed_in {
            return;
        }
        self.pan_x = self.pan_x.saturating_add_signed(dx);
        self.pan_y = self.pan_y.saturating_add_signed(dy);
    }

    fn scroll_down(&mut self, amount: usize) {
        let max = self
            .content_lines()
            .map(|lines| lines.len().saturating_sub(1))
            .unwrap_or(0);
        self.scroll = self.scroll.saturating_add(amount).min(max);
    }

    fn jump_to_match(&mut self, forward: bool) {
        if forward {
            self.search.next();
        } else {
            self.search.prev();
        }
        self.jump_to_current_match();
    }

    fn jump_to_current_match(&mut self) {
        if let Some(line) = self.search.current() {
            let half = usize::from(self.viewport.height / 2);
            self.scroll = line.saturating_sub(half);
        }
    }

    fn content_lines(&self) -> Option<&[String]> {
        match &self.content {
            Content::Lines(text) => Some(&text.lines),
            _ => None,
        }
    }

    fn download_copy(&mut self) {
        let Some(url) = self.ctx.resolved_url().map(str::to_string) else {
            return;
        };
        match actions::save_copy(Path::new(&url)) {
            Ok(target) => self.notice = Some(format!("saved to {}", target.display())),
            Err(err) => {
                // Fall back to the platform opener so the user still gets
                // at the file.
                match actions::open_external(&url) {
                    Ok(()) => {
                        self.notice = Some(format!("save failed ({err}); opened externally"))
                    }
                    Err(open_err) => {
                        self.notice = Some(format!("save failed: {err}; open failed: {open_err}"))
                    }
                }
            }
        }
    }

    fn copy_link(&mut self) {
        let Some(url) = self.ctx.resolved_url().map(str::to_string) else {
            return;
        };
        let link = share_link(self.ctx.category(), &url);
        match actions::copy_to_clipboard(&link) {
            Ok(()) => self.notice = Some("link copied".to_string()),
            Err(err) => self.notice = Some(format!("copy failed: {err}")),
        }
    }

    // Drawing -------------------------------------------------------------

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();
        frame.render_widget(Clear, area);

        if !self.ctx.is_open() {
            self.draw_recents(frame, area);
            return;
        }

        let fullscreen = self
            .ctx
            .session
            .as_ref()
            .is_some_and(|s| s.is_fullscreen);
        let show_controls = self
            .ctx
            .session
            .as_ref()
            .is_some_and(|s| s.show_controls);

        let content_area = if fullscreen {
            if show_controls && area.height > 2 {
                let layout = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(2)])
                    .split(area);
                self.draw_footer(frame, layout[1]);
                layout[0]
            } else {
                area
            }
        } else {
            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(2),
                    Constraint::Min(0),
                    Constraint::Length(2),
                ])
                .split(area);
            self.draw_header(frame, layout[0]);
            self.draw_footer(frame, layout[2]);
            layout[1]
        };
        self.viewport = content_area;

        self.draw_content(frame, content_area);

        if self.search_open {
            self.draw_search_input(frame, area);
        }
        if self.goto_open {
            self.draw_goto_panel(frame, area);
        }
    }

    fn draw_header(&self, frame: &mut ratatui::Frame, area: Rect) {
        let Some(session) = self.ctx.session.as_ref() else {
            return;
        };
        let name = self
            .ctx
            .request
            .as_ref()
            .map(|r| r.file_name.as_str())
            .unwrap_or("(unnamed)");

        let mut spans = vec![
            Span::styled(name, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                session.category.to_string(),
                Style::default().fg(Color::Cyan),
            ),
        ];
        if session.category == FileCategory::Pdf {
            spans.push(Span::raw(format!(
                "  page {}/{}",
                session.page,
                session.max_page()
            )));
            if let Some(strategy) = self.active_strategy {
                spans.push(Span::styled(
                    format!("  [{}]", strategy.label()),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
        if matches!(session.category, FileCategory::Pdf | FileCategory::Image) {
            spans.push(Span::raw(format!("  {}%", session.zoom_percent)));
        }
        if session.retry_count > 0 {
            spans.push(Span::styled(
                format!("  retry #{}", session.retry_count),
                Style::default().fg(Color::Yellow),
            ));
        }
        if session.loading {
            spans.push(Span::styled(
                "  loading…",
                Style::default().fg(Color::Yellow),
            ));
        }

        let header = Paragraph::new(Line::from(spans))
            .alignment(Alignment::Left)
            .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(header, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame, area: Rect) {
        let text = match self.notice.as_deref() {
            Some(notice) => Line::from(Span::styled(
                notice.to_string(),
                Style::default().fg(Color::Yellow),
            )),
            None => Line::from(Span::styled(
                self.footer_help(),
                Style::default().fg(Color::DarkGray),
            )),
        };
        let footer = Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(footer, area);
    }

    fn footer_help(&self) -> String {
        let common = "Esc close  f fullscreen  r retry  d save  o open  y link";
        match self.ctx.category() {
            Some(FileCategory::Pdf) => {
                format!("{common}  ←/→ page  g goto  +/- zoom")
            }
            Some(FileCategory::Image) => format!("{common}  +/- zoom  arrows pan"),
            Some(FileCategory::Audio) => {
                format!("{common}  space play  m mute  l loop  ←/→ seek  ↑/↓ volume")
            }
            Some(FileCategory::Text) => {
                format!("{common}  / search  n/N match  l line numbers  +/- font")
            }
            Some(FileCategory::Archive) => format!("{common}  ↑/↓ move  enter expand"),
            _ => common.to_string(),
        }
    }

    fn draw_content(&mut self, frame: &mut ratatui::Frame, area: Rect) {
        let (loading, error) = self
            .ctx
            .session
            .as_ref()
            .map(|s| (s.loading, s.error.clone()))
            .unwrap_or((false, None));

        if let Some(message) = error {
            self.draw_error(frame, area, &message);
            return;
        }
        if loading && matches!(self.content, Content::Pending) {
            self.draw_loading(frame, area);
            return;
        }

        match &self.content {
            Content::Pending => self.draw_loading(frame, area),
            Content::Page(_) => self.draw_page(frame, area),
            Content::Lines(_) => self.draw_lines(frame, area),
            Content::Audio(_) => self.draw_audio(frame, area),
            Content::Archive(_) => self.draw_archive(frame, area),
            Content::Delegated(url) => {
                let url = url.clone();
                self.draw_delegated(frame, area, &url);
            }
        }
    }

    fn draw_loading(&self, frame: &mut ratatui::Frame, area: Rect) {
        let strategy = self
            .ctx
            .fallback
            .as_ref()
            .and_then(|controller| controller.current());
        let message = match strategy {
            Some(strategy) => format!("loading ({})…", strategy.label()),
            None => "loading…".to_string(),
        };
        let paragraph = Paragraph::new(message)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(paragraph, centered_rect(60, 20, area));
    }

    fn draw_error(&self, frame: &mut ratatui::Frame, area: Rect, message: &str) {
        let lines = vec![
            Line::from(Span::styled(
                message.to_string(),
                Style::default().fg(Color::Red),
            )),
            Line::raw(""),
            Line::from(Span::styled(
                "r retry  R reopen  d save copy  o open externally",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let paragraph = Paragraph::new(Text::from(lines))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("error"));
        frame.render_widget(paragraph, centered_rect(70, 40, area));
    }

    fn draw_page(&mut self, frame: &mut ratatui::Frame, area: Rect) {
        let Content::Page(image) = &self.content else {
            return;
        };
        let (page, zoom) = self
            .ctx
            .session
            .as_ref()
            .map(|s| (s.page, s.zoom_percent))
            .unwrap_or((1, 100));
        // PDF pages come back from the rasterizer already at the session
        // zoom; only decoded images scale at draw time.
        let prescaled = self.ctx.category() == Some(FileCategory::Pdf);
        let (scaled_w, scaled_h) = pane_frame_size(image.width(), image.height(), zoom, prescaled);
        let (font_w, font_h) = self.image_picker.font_size();
        let view_w = u32::from(area.width) * u32::from(font_w.max(1));
        let view_h = u32::from(area.height) * u32::from(font_h.max(1));
        self.pan_x = self.pan_x.min(scaled_w.saturating_sub(view_w));
        self.pan_y = self.pan_y.min(scaled_h.saturating_sub(view_h));

        let key = RenderKey {
            page,
            zoom,
            pan_x: self.pan_x,
            pan_y: self.pan_y,
            width: area.width,
            height: area.height,
        };

        if self.rendered.as_ref().map(|r| r.key) != Some(key) {
            let frame_image = if prescaled {
                image.clone()
            } else {
                scale_for_zoom(image, zoom)
            };
            // Zooming past 100% shows the panned window of the larger
            // frame; at or below 100% the whole frame fits the pane.
            let frame_image = if zoom > 100 {
                frame_image.crop_imm(
                    self.pan_x,
                    self.pan_y,
                    scaled_w.min(view_w),
                    scaled_h.min(view_h),
                )
            } else {
                frame_image
            };
            let resize = Resize::Fit(Some(image::imageops::FilterType::Triangle));
            match self.image_picker.new_protocol(frame_image, area, resize) {
                Ok(protocol) => self.rendered = Some(RenderedImage { protocol, key }),
                Err(err) => {
                    self.rendered = None;
                    self.notice = Some(format!(
                        "image protocol failed ({}): {err}",
                        image_protocol::protocol_label(&self.image_picker)
                    ));
                }
            }
        }

        if let Some(rendered) = self.rendered.as_ref() {
            let proto_area = rendered.protocol.area();
            let draw_width = proto_area.width.min(area.width);
            let draw_height = proto_area.height.min(area.height);
            let draw_area = Rect::new(
                area.x + area.width.saturating_sub(draw_width) / 2,
                area.y + area.height.saturating_sub(draw_height) / 2,
                draw_width,
                draw_height,
            );
            frame.render_widget(ImageWidget::new(&rendered.protocol), draw_area);
        }
    }

    fn draw_lines(&self, frame: &mut ratatui::Frame, area: Rect) {
        let Content::Lines(text) = &self.content else {
            return;
        };
        let is_markdown = self
            .ctx
            .request
            .as_ref()
            .is_some_and(|r| r.file_name.to_ascii_lowercase().ends_with(".md"));
        let gutter = self.ctx.settings.line_numbers
            && self.ctx.category() == Some(FileCategory::Text);
        let number_width = if gutter {
            text.line_count().to_string().len().max(3)
        } else {
            0
        };

        let height = usize::from(area.height);
        let mut lines: Vec<Line> = Vec::with_capacity(height);
        for (offset, raw) in text.lines.iter().skip(self.scroll).take(height).enumerate() {
            let index = self.scroll + offset;
            let mut spans = Vec::new();
            if gutter {
                spans.push(Span::styled(
                    format!("{:>number_width$} ", index + 1),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            if is_markdown {
                spans.extend(markdown_spans(raw));
            } else {
                spans.push(Span::raw(raw.clone()));
            }

            let mut line = Line::from(spans);
            if self.search.is_match_line(index) {
                line = if self.search.current() == Some(index) {
                    line.style(Style::default().add_modifier(Modifier::REVERSED))
                } else {
                    line.style(Style::default().bg(Color::DarkGray))
                };
            }
            lines.push(line);
        }

        let mut block = Block::default();
        if let Some((position, total)) = self.search.cursor_position() {
            block = block
                .borders(Borders::BOTTOM)
                .title(format!("match {position}/{total}"));
        }
        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
    }

    fn draw_audio(&self, frame: &mut ratatui::Frame, area: Rect) {
        let Content::Audio(playback) = &self.content else {
            return;
        };
        let name = self
            .ctx
            .request
            .as_ref()
            .map(|r| r.file_name.as_str())
            .unwrap_or("(unnamed)");

        let position = playback.position();
        let state = if playback.is_paused() {
            "paused"
        } else if playback.finished() {
            "finished"
        } else {
            "playing"
        };
        let mut flags = Vec::new();
        if playback.is_muted() {
            flags.push("muted");
        }
        if playback.repeat() {
            flags.push("loop");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", flags.join(", "))
        };

        let time = match playback.duration() {
            Some(duration) => format!("{} / {}", format_secs(position), format_secs(duration)),
            None => format_secs(position),
        };
        let ratio = playback
            .duration()
            .filter(|d| !d.is_zero())
            .map(|d| (position.as_secs_f64() / d.as_secs_f64()).clamp(0.0, 1.0))
            .unwrap_or(0.0);

        let panel = centered_rect(70, 40, area);
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Length(2),
            ])
            .split(panel);

        let title = Paragraph::new(Line::from(vec![
            Span::styled(name, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("  {state}{flags}")),
        ]))
        .alignment(Alignment::Center);
        frame.render_widget(title, layout[0]);

        let gauge = Gauge::default()
            .ratio(ratio)
            .label(time)
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray));
        frame.render_widget(gauge, layout[1]);

        let volume = Paragraph::new(format!("volume {:3.0}%", playback.volume() * 100.0))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(volume, layout[2]);
    }

    fn draw_archive(&self, frame: &mut ratatui::Frame, area: Rect) {
        let Content::Archive(tree) = &self.content else {
            return;
        };
        let visible = tree.visible();

        let items: Vec<ListItem> = visible
            .iter()
            .map(|&(depth, index)| {
                let entry = &tree.entries()[index];
                let indent = "  ".repeat(depth);
                let line = if entry.is_directory {
                    let marker = if tree.is_expanded(&entry.path) {
                        "▾"
                    } else {
                        "▸"
                    };
                    Line::from(vec![
                        Span::raw(format!("{indent}{marker} ")),
                        Span::styled(
                            format!("{}/", entry.name()),
                            Style::default().fg(Color::Cyan),
                        ),
                        Span::styled(
                            format!("  {}", format_bytes(tree.directory_size(&entry.path))),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ])
                } else {
                    Line::from(vec![
                        Span::raw(format!("{indent}  {}", entry.name())),
                        Span::styled(
                            format!("  {}", format_bytes(entry.size)),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ])
                };
                ListItem::new(line)
            })
            .collect();

        let summary = format!(
            "{} files, {} dirs, {}",
            tree.file_count(),
            tree.directory_count(),
            format_bytes(tree.total_size())
        );
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(summary))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut state = ListState::default();
        state.select(Some(self.archive_cursor.min(visible.len().saturating_sub(1))));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_delegated(&self, frame: &mut ratatui::Frame, area: Rect, url: &str) {
        let lines = vec![
            Line::from(Span::styled(
                "no inline preview for this file type",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::raw(""),
            Line::raw("it was handed to your system viewer; the shareable link is"),
            Line::from(Span::styled(
                url.to_string(),
                Style::default().fg(Color::Cyan),
            )),
            Line::raw(""),
            Line::from(Span::styled(
                "d save copy  o open again  y copy link",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let paragraph = Paragraph::new(Text::from(lines))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, centered_rect(80, 50, area));
    }

    fn draw_recents(&self, frame: &mut ratatui::Frame, area: Rect) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(area);

        let title = Paragraph::new(Span::styled(
            "filepeek — recent files",
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(title, layout[0]);

        if self.ctx.recent.is_empty() {
            let empty = Paragraph::new("no recent files; pass a file path to preview one")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(empty, centered_rect(80, 20, layout[1]));
        } else {
            let items: Vec<ListItem> = self
                .ctx
                .recent
                .iter()
                .map(|recent| {
                    let width = usize::from(layout[1].width);
                    let name_width = UnicodeWidthStr::width(recent.name.as_str());
                    let pad = width
                        .saturating_sub(name_width)
                        .saturating_sub(24)
                        .max(2);
                    ListItem::new(Line::from(vec![
                        Span::raw(recent.name.clone()),
                        Span::styled(
                            format!(
                                "{}{}  {}",
                                " ".repeat(pad),
                                recent.category(),
                                format_last_opened(recent.last_opened)
                            ),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]))
                })
                .collect();
            let list = List::new(items)
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
            let mut state = ListState::default();
            state.select(Some(
                self.recents_cursor
                    .min(self.ctx.recent.len().saturating_sub(1)),
            ));
            frame.render_stateful_widget(list, layout[1], &mut state);
        }

        let footer = Paragraph::new(Span::styled(
            "↑/↓ move  Enter open  Esc quit",
            Style::default().fg(Color::DarkGray),
        ))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
        frame.render_widget(footer, layout[2]);
    }

    fn draw_search_input(&self, frame: &mut ratatui::Frame, area: Rect) {
        let popup = centered_rect(60, 15, area);
        frame.render_widget(Clear, popup);
        let paragraph = Paragraph::new(format!("/{}", self.search_input))
            .block(Block::default().borders(Borders::ALL).title("search"));
        frame.render_widget(paragraph, popup);
    }

    fn draw_goto_panel(&self, frame: &mut ratatui::Frame, area: Rect) {
        let popup = centered_rect(50, 15, area);
        frame.render_widget(Clear, popup);
        let mut lines = vec![Line::raw(format!("page: {}", self.goto_input))];
        if let Some(error) = &self.goto_error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        let paragraph = Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::ALL).title("go to page"));
        frame.render_widget(paragraph, popup);
    }
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    terminal::enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen).context("enter alt screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    terminal::disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("leave alt screen")?;
    Ok(())
}

fn panic_to_string(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: (unknown payload)".to_string()
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn rgba_to_image(bitmap: RgbaBitmap) -> Option<DynamicImage> {
    let width = u32::try_from(bitmap.width).ok()?;
    let height = u32::try_from(bitmap.height).ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    let buffer = image::RgbaImage::from_raw(width, height, bitmap.pixels)?;
    Some(DynamicImage::ImageRgba8(buffer))
}

/// Size of the frame as shown in the pane. Prescaled frames already carry
/// the zoom factor in their pixel dimensions.
fn pane_frame_size(width: u32, height: u32, zoom: u16, prescaled: bool) -> (u32, u32) {
    if prescaled {
        (width.max(1), height.max(1))
    } else {
        (
            (u64::from(width) * u64::from(zoom) / 100).max(1) as u32,
            (u64::from(height) * u64::from(zoom) / 100).max(1) as u32,
        )
    }
}

/// Scales a decoded frame for display zoom.
fn scale_for_zoom(image: &DynamicImage, zoom: u16) -> DynamicImage {
    if zoom == 100 {
        return image.clone();
    }
    let width = (u64::from(image.width()) * u64::from(zoom) / 100).max(1) as u32;
    let height = (u64::from(image.height()) * u64::from(zoom) / 100).max(1) as u32;
    image.resize_exact(width, height, image::imageops::FilterType::Triangle)
}

/// One span list for a rendered Markdown line.
fn markdown_spans(raw: &str) -> Vec<Span<'static>> {
    match markdown::classify_line(raw) {
        MarkdownLine::Heading { level, text } => vec![Span::styled(
            format!("{} {}", "#".repeat(usize::from(level)), text),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )],
        MarkdownLine::Bullet { text } => {
            let mut spans = vec![Span::styled("  • ", Style::default().fg(Color::Cyan))];
            spans.extend(inline_spans(text));
            spans
        }
        MarkdownLine::Numbered { marker, text } => {
            let mut spans = vec![Span::styled(
                format!("  {marker} "),
                Style::default().fg(Color::Cyan),
            )];
            spans.extend(inline_spans(text));
            spans
        }
        MarkdownLine::Blockquote { text } => vec![Span::styled(
            format!("│ {text}"),
            Style::default().fg(Color::Green),
        )],
        MarkdownLine::Rule => vec![Span::styled(
            "─".repeat(40),
            Style::default().fg(Color::DarkGray),
        )],
        MarkdownLine::Blank => vec![Span::raw("")],
        MarkdownLine::Paragraph { text } => inline_spans(text),
    }
}

fn inline_spans(text: &str) -> Vec<Span<'static>> {
    markdown::split_inline_code(text)
        .into_iter()
        .map(|(is_code, segment)| {
            if is_code {
                Span::styled(
                    segment.to_string(),
                    Style::default().fg(Color::Yellow).bg(Color::Black),
                )
            } else {
                Span::raw(segment.to_string())
            }
        })
        .collect()
}

fn is_remote_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// The link handed out for sharing and delegation notices. Hosted viewer
/// endpoints only work for sources those services can fetch; local files
/// share their plain path.
fn share_link(category: Option<FileCategory>, url: &str) -> String {
    if !is_remote_url(url) {
        return url.to_string();
    }
    match category {
        Some(FileCategory::Office) => external::office_viewer_url(url),
        Some(FileCategory::Other) => external::hosted_viewer_url(url),
        _ => url.to_string(),
    }
}

fn unix_now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn format_secs(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{}:{:02}", total / 60, total % 60)
}

fn format_last_opened(last_opened: Option<i64>) -> String {
    let Some(last_opened) = last_opened else {
        return "never".to_string();
    };

    let now = unix_now_secs();
    let delta = now.saturating_sub(last_opened);
    if delta < 60 {
        return "just now".to_string();
    }
    if delta < 60 * 60 {
        return format!("{}m ago", delta / 60);
    }
    if delta < 60 * 60 * 24 {
        return format!("{}h ago", delta / (60 * 60));
    }
    format!("{}d ago", delta / (60 * 60 * 24))
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
