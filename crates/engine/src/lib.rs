//! Rendering and I/O engine: per-category loaders and the PDF attempt paths.

use std::cell::{Ref, RefCell};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use filepeek_core::PdfStrategy;
use pdf::file::FileOptions;
use pdfium_render::prelude::{PdfBitmapFormat, PdfRenderConfig, Pdfium};

mod archive;
mod audio;
mod imagefile;
mod pdf_text;
mod text;

pub use archive::load_archive_tree;
pub use audio::AudioPlayback;
pub use imagefile::load_image;
pub use text::{TextContent, load_text};

/// Outcome of one PDF strategy attempt. Errors are folded into `Failed`
/// and never escape as `Err`; they only drive the fallback state machine.
#[derive(Debug)]
pub enum PdfAttempt {
    Bitmap {
        bitmap: RgbaBitmap,
        total_pages: u32,
    },
    Text {
        text: String,
        total_pages: u32,
    },
    /// The file should be handed to an external opener by the shell.
    External,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct RgbaBitmap {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Default)]
enum PdfiumState {
    #[default]
    Uninitialized,
    Available(Pdfium),
    Unavailable(String),
}

#[derive(Debug, Default)]
pub struct Engine {
    pdfium: RefCell<PdfiumState>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment hint for the strategy planner: true when the in-process
    /// bitmap path should not lead the chain.
    pub fn prefer_safe_pdf_path(&self) -> bool {
        pdfium_disabled()
    }

    /// Mounts one PDF rendering strategy. All failures are caught here.
    pub fn attempt_pdf(
        &self,
        path: &Path,
        page_index: u32,
        strategy: PdfStrategy,
        target_width: i32,
        max_height: i32,
    ) -> PdfAttempt {
        match strategy {
            PdfStrategy::Native => {
                match self.render_pdf_bitmap(path, page_index, target_width, max_height) {
                    Ok((bitmap, total_pages)) => PdfAttempt::Bitmap {
                        bitmap,
                        total_pages,
                    },
                    Err(err) => PdfAttempt::Failed(format!("{err:#}")),
                }
            }
            PdfStrategy::TextLayer => match self.render_pdf_text(path, page_index) {
                Ok((text, total_pages)) => PdfAttempt::Text { text, total_pages },
                Err(err) => PdfAttempt::Failed(format!("{err:#}")),
            },
            PdfStrategy::External => PdfAttempt::External,
        }
    }

    pub fn pdf_page_count(&self, path: &Path) -> anyhow::Result<u32> {
        let file = FileOptions::cached()
            .open(path)
            .with_context(|| format!("open pdf {}", path.display()))?;
        Ok(file.num_pages())
    }

    /// Text-layer rendering through the pure-Rust parser.
    pub fn render_pdf_text(&self, path: &Path, page_index: u32) -> anyhow::Result<(String, u32)> {
        let file = FileOptions::cached()
            .open(path)
            .with_context(|| format!("open pdf {}", path.display()))?;
        let total_pages = file.num_pages();
        anyhow::ensure!(page_index < total_pages.max(1), "page index out of range");

        let resolver = file.resolver();
        let page = file
            .get_page(page_index)
            .with_context(|| format!("get pdf page {page_index}"))?;
        let resources = page.resources()?;
        let Some(content) = &page.contents else {
            return Ok(("(this page has no text layer)".to_string(), total_pages));
        };
        let ops = content.operations(&resolver)?;
        let text = pdf_text::extract(&ops, &resolver, resources);
        let text = text.trim().to_string();
        if text.is_empty() {
            Ok(("(this page has no text layer)".to_string(), total_pages))
        } else {
            Ok((text, total_pages))
        }
    }

    /// In-process bitmap rendering through pdfium.
    pub fn render_pdf_bitmap(
        &self,
        path: &Path,
        page_index: u32,
        target_width: i32,
        max_height: i32,
    ) -> anyhow::Result<(RgbaBitmap, u32)> {
        if pdfium_disabled() {
            anyhow::bail!("native pdf rendering disabled via FILEPEEK_DISABLE_PDFIUM");
        }

        let pdfium = self.pdfium()?;
        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|err| anyhow::anyhow!(err))?;
        let total_pages = document.pages().len() as u32;

        let page_index =
            u16::try_from(page_index).map_err(|_| anyhow::anyhow!("page index out of range"))?;
        let page = document
            .pages()
            .get(page_index)
            .map_err(|err| anyhow::anyhow!(err))?;

        let render_config = PdfRenderConfig::new()
            .set_target_width(target_width.max(1))
            .set_maximum_width(target_width.max(1))
            .set_maximum_height(max_height.max(1))
            .render_form_data(false)
            .render_annotations(false)
            .set_format(PdfBitmapFormat::BGRA);

        let rendered = page
            .render_with_config(&render_config)
            .map_err(|err| anyhow::anyhow!(err))?;

        let width = rendered.width().max(0) as usize;
        let height = rendered.height().max(0) as usize;
        let source = rendered.as_raw_bytes();
        let stride = if height == 0 { 0 } else { source.len() / height };

        let mut pixels = Vec::with_capacity(width.saturating_mul(height).saturating_mul(4));
        for y in 0..height {
            let base = y.saturating_mul(stride);
            for x in 0..width {
                let idx = base.saturating_add(x.saturating_mul(4));
                let b = source.get(idx).copied().unwrap_or(255);
                let g = source.get(idx + 1).copied().unwrap_or(255);
                let r = source.get(idx + 2).copied().unwrap_or(255);
                let a = source.get(idx + 3).copied().unwrap_or(255);
                pixels.extend_from_slice(&[r, g, b, a]);
            }
        }

        Ok((
            RgbaBitmap {
                width,
                height,
                pixels,
            },
            total_pages,
        ))
    }

    fn pdfium(&self) -> anyhow::Result<Ref<'_, Pdfium>> {
        let init_error = {
            let mut state = self.pdfium.borrow_mut();
            match &*state {
                PdfiumState::Available(_) => None,
                PdfiumState::Unavailable(err) => Some(err.clone()),
                PdfiumState::Uninitialized => match bind_pdfium() {
                    Ok(pdfium) => {
                        *state = PdfiumState::Available(pdfium);
                        None
                    }
                    Err(err) => {
                        let msg = err.to_string();
                        *state = PdfiumState::Unavailable(msg.clone());
                        Some(msg)
                    }
                },
            }
        };

        if let Some(err) = init_error {
            return Err(anyhow::anyhow!(err));
        }

        let state = self.pdfium.borrow();
        match &*state {
            PdfiumState::Available(_) => Ok(Ref::map(state, |state| match state {
                PdfiumState::Available(pdfium) => pdfium,
                _ => unreachable!("pdfium state checked above"),
            })),
            PdfiumState::Unavailable(err) => Err(anyhow::anyhow!(err.clone())),
            PdfiumState::Uninitialized => unreachable!("pdfium state initialized above"),
        }
    }
}

fn pdfium_disabled() -> bool {
    std::env::var("FILEPEEK_DISABLE_PDFIUM")
        .map(|v| !v.trim().is_empty() && v.trim() != "0")
        .unwrap_or(false)
}

/// Binds the pdfium shared library once per process; sessions share the
/// resulting handle read-only.
fn bind_pdfium() -> anyhow::Result<Pdfium> {
    if let Ok(path) = std::env::var("FILEPEEK_PDFIUM_LIB_PATH") {
        let path = PathBuf::from(path);
        let bindings = Pdfium::bind_to_library(&path).map_err(|err| {
            anyhow::anyhow!(
                "{err}\n\nfailed to load pdfium from FILEPEEK_PDFIUM_LIB_PATH={}",
                path.display()
            )
        })?;
        return Ok(Pdfium::new(bindings));
    }

    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(dir) = std::env::var("FILEPEEK_PDFIUM_DIR") {
        candidates.push(Pdfium::pdfium_platform_library_name_at_path(Path::new(
            &dir,
        )));
    }
    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        candidates.push(Pdfium::pdfium_platform_library_name_at_path(dir));
    }
    candidates.push(Pdfium::pdfium_platform_library_name_at_path(Path::new(".")));

    for path in candidates {
        if let Ok(bindings) = Pdfium::bind_to_library(&path) {
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|err| {
        let lib_name = Pdfium::pdfium_platform_library_name();
        anyhow::anyhow!(
            "{err}\n\npdfium library not found; install it system-wide or place {} next to the executable",
            lib_name.to_string_lossy()
        )
    })?;
    Ok(Pdfium::new(bindings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_strategy_always_defers_to_the_shell() {
        let engine = Engine::new();
        let attempt = engine.attempt_pdf(
            Path::new("/nonexistent.pdf"),
            0,
            PdfStrategy::External,
            80,
            40,
        );
        assert!(matches!(attempt, PdfAttempt::External));
    }

    #[test]
    fn missing_file_fails_the_attempt_without_propagating() {
        let engine = Engine::new();
        let attempt = engine.attempt_pdf(
            Path::new("/nonexistent.pdf"),
            0,
            PdfStrategy::TextLayer,
            80,
            40,
        );
        assert!(matches!(attempt, PdfAttempt::Failed(_)));
    }
}
