//! Sqlite-backed persistence for settings and the recents list.

use std::path::Path;

use anyhow::Context as _;
use filepeek_core::{RecentFile, Settings};
use rusqlite::{Connection, OptionalExtension as _};

const RECENTS_LIMIT: usize = 50;

#[derive(Debug)]
pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("open sqlite db at {}", path.as_ref().display()))?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    fn migrate(&self) -> anyhow::Result<()> {
        // Settings live in one JSON document; fields added later fall back
        // to their serde defaults on load.
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                json TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS recent_files (
                path TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                last_opened INTEGER
            );
            "#,
        )?;
        Ok(())
    }

    pub fn load_settings(&self) -> anyhow::Result<Settings> {
        let json: Option<String> = self
            .conn
            .query_row("SELECT json FROM settings WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        let mut settings: Settings = json
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default();
        settings.normalize();
        Ok(settings)
    }

    pub fn save_settings(&self, settings: &Settings) -> anyhow::Result<()> {
        let mut settings = settings.clone();
        settings.normalize();

        let json = serde_json::to_string(&settings)?;
        self.conn.execute(
            r#"
            INSERT INTO settings (id, json) VALUES (1, ?)
            ON CONFLICT(id) DO UPDATE SET json = excluded.json
            "#,
            [json],
        )?;
        Ok(())
    }

    /// Records a view; refreshes the timestamp for known paths.
    pub fn touch_recent(&self, path: &str, name: &str, opened_at: i64) -> anyhow::Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO recent_files (path, name, last_opened) VALUES (?, ?, ?)
            ON CONFLICT(path) DO UPDATE SET name = excluded.name, last_opened = excluded.last_opened
            "#,
            (path, name, opened_at),
        )?;

        // Bound the table; recents are a convenience, not a history.
        self.conn.execute(
            "DELETE FROM recent_files WHERE path NOT IN (
                SELECT path FROM recent_files ORDER BY last_opened DESC LIMIT ?
            )",
            [RECENTS_LIMIT as i64],
        )?;
        Ok(())
    }

    pub fn list_recent(&self) -> anyhow::Result<Vec<RecentFile>> {
        let mut stmt = self.conn.prepare(
            "SELECT path, name, last_opened FROM recent_files ORDER BY last_opened DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RecentFile {
                path: row.get(0)?,
                name: row.get(1)?,
                last_opened: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn forget_recent(&self, path: &str) -> anyhow::Result<()> {
        self.conn
            .execute("DELETE FROM recent_files WHERE path = ?", [path])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_in_memory() -> anyhow::Result<Storage> {
        let conn = Connection::open_in_memory()?;
        let storage = Storage { conn };
        storage.migrate()?;
        Ok(storage)
    }

    #[test]
    fn missing_settings_row_yields_defaults() -> anyhow::Result<()> {
        let storage = open_in_memory()?;
        let settings = storage.load_settings()?;
        assert_eq!(settings.default_zoom_percent, 100);
        assert!(settings.line_numbers);
        Ok(())
    }

    #[test]
    fn settings_roundtrip() -> anyhow::Result<()> {
        let storage = open_in_memory()?;
        let mut settings = storage.load_settings()?;
        settings.default_zoom_percent = 150;
        settings.line_numbers = false;
        settings.text_font_size = 18;
        settings.safe_pdf_mode = true;
        storage.save_settings(&settings)?;

        let settings2 = storage.load_settings()?;
        assert_eq!(settings2.default_zoom_percent, 150);
        assert!(!settings2.line_numbers);
        assert_eq!(settings2.text_font_size, 18);
        assert!(settings2.safe_pdf_mode);
        Ok(())
    }

    #[test]
    fn saved_settings_are_normalized() -> anyhow::Result<()> {
        let storage = open_in_memory()?;
        let mut settings = storage.load_settings()?;
        settings.default_zoom_percent = 999;
        storage.save_settings(&settings)?;
        assert_eq!(storage.load_settings()?.default_zoom_percent, 300);
        Ok(())
    }

    #[test]
    fn documents_from_older_schemas_fill_in_new_fields() -> anyhow::Result<()> {
        let storage = open_in_memory()?;
        storage.conn.execute(
            "INSERT INTO settings (id, json) VALUES (1, ?)",
            [r#"{"default_zoom_percent":125,"line_numbers":false}"#],
        )?;

        let settings = storage.load_settings()?;
        assert_eq!(settings.default_zoom_percent, 125);
        assert!(!settings.line_numbers);
        assert!(!settings.safe_pdf_mode);
        assert_eq!(settings.text_font_size, 14);
        Ok(())
    }

    #[test]
    fn recents_roundtrip_most_recent_first() -> anyhow::Result<()> {
        let storage = open_in_memory()?;
        storage.touch_recent("/a/one.pdf", "one.pdf", 100)?;
        storage.touch_recent("/a/two.zip", "two.zip", 200)?;

        let recents = storage.list_recent()?;
        assert_eq!(recents.len(), 2);
        assert_eq!(recents[0].path, "/a/two.zip");
        assert_eq!(recents[1].name, "one.pdf");
        Ok(())
    }

    #[test]
    fn touching_a_known_path_updates_in_place() -> anyhow::Result<()> {
        let storage = open_in_memory()?;
        storage.touch_recent("/a/one.pdf", "one.pdf", 100)?;
        storage.touch_recent("/a/one.pdf", "one.pdf", 300)?;

        let recents = storage.list_recent()?;
        assert_eq!(recents.len(), 1);
        assert_eq!(recents[0].last_opened, Some(300));
        Ok(())
    }

    #[test]
    fn forget_removes_the_entry() -> anyhow::Result<()> {
        let storage = open_in_memory()?;
        storage.touch_recent("/a/one.pdf", "one.pdf", 100)?;
        storage.forget_recent("/a/one.pdf")?;
        assert!(storage.list_recent()?.is_empty());
        Ok(())
    }

    #[test]
    fn recents_are_bounded() -> anyhow::Result<()> {
        let storage = open_in_memory()?;
        for i in 0..60 {
            storage.touch_recent(&format!("/f/{i}.txt"), &format!("{i}.txt"), i)?;
        }
        let recents = storage.list_recent()?;
        assert_eq!(recents.len(), RECENTS_LIMIT);
        assert_eq!(recents[0].path, "/f/59.txt");
        Ok(())
    }
}
