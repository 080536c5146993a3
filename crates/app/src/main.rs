use std::fs;
use std::path::Path;

use anyhow::Context as _;
use directories::ProjectDirs;
use filepeek_application::{UrlResolver, ViewerContext};
use filepeek_core::ViewRequest;
use filepeek_engine::Engine;
use filepeek_storage::Storage;
use filepeek_ui::Ui;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let project_dirs =
        ProjectDirs::from("dev", "xiey", "filepeek").context("resolve project dirs")?;

    let config_dir = project_dirs.config_dir();
    fs::create_dir_all(config_dir)
        .with_context(|| format!("create config dir {}", config_dir.display()))?;

    let db_path = config_dir.join("filepeek.db");
    let storage = Storage::open(&db_path)?;
    let settings = storage.load_settings()?;
    let stored_safe_pdf_mode = settings.safe_pdf_mode;

    // The environment can veto the in-process pdf renderer for this run
    // without flipping the persisted setting.
    let env_prefers_safe = Engine::new().prefer_safe_pdf_path();

    let mut ctx = ViewerContext::new(settings).with_recent(storage.list_recent()?);
    if env_prefers_safe {
        ctx.settings.safe_pdf_mode = true;
    }

    if let Some(path) = std::env::args().nth(1) {
        let (path, name) = describe_file(&path)?;
        storage.touch_recent(&path, &name, unix_now_secs())?;
        ctx.recent = storage.list_recent()?;
        ctx.open(ViewRequest::new(path, name));
    }

    let mut ui = Ui::new(ctx, Box::new(LocalResolver));
    let outcome = ui.run()?;

    for opened in &outcome.opened {
        storage.touch_recent(&opened.path, &opened.name, opened.opened_at)?;
    }

    let mut settings = outcome.ctx.settings;
    if env_prefers_safe {
        settings.safe_pdf_mode = stored_safe_pdf_mode;
    }
    storage.save_settings(&settings)?;

    Ok(())
}

/// Normalizes a CLI argument into a (path, display name) pair.
fn describe_file(arg: &str) -> anyhow::Result<(String, String)> {
    let path = Path::new(arg);
    anyhow::ensure!(path.exists(), "no such file: {arg}");
    let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let name = canonical
        .file_name()
        .and_then(|name| name.to_str())
        .context("path has no file name")?
        .to_string();
    Ok((canonical.to_string_lossy().to_string(), name))
}

/// Local filesystem resolver: a file reference is viewable when the path
/// exists and is a regular file. The expiry parameter is meaningless for
/// local paths and ignored.
struct LocalResolver;

impl UrlResolver for LocalResolver {
    fn resolve(&self, file_url: &str, _expires_in_secs: u64) -> Result<String, String> {
        let path = Path::new(file_url);
        if !path.exists() {
            return Err(format!("no such file: {file_url}"));
        }
        if !path.is_file() {
            return Err(format!("not a regular file: {file_url}"));
        }
        let canonical = fs::canonicalize(path).map_err(|err| err.to_string())?;
        Ok(canonical.to_string_lossy().to_string())
    }
}

fn unix_now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
