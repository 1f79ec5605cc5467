use chrono::{DateTime, Utc};
use eyre::Result;
use rusqlite::{Connection, params};
use std::path::Path;

use crate::ari::Ari;
use crate::config::get_app_data_prefix;
use crate::logging;
use crate::models::{AnnotationMap, HistoryEntry, MarkerKind, VerseAnnotations};
use crate::reading::AnnotationSource;

impl MarkerKind {
    fn as_str(self) -> &'static str {
        match self {
            MarkerKind::Bookmark => "bookmark",
            MarkerKind::Note => "note",
            MarkerKind::Highlight => "highlight",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "bookmark" => Some(MarkerKind::Bookmark),
            "note" => Some(MarkerKind::Note),
            "highlight" => Some(MarkerKind::Highlight),
            _ => None,
        }
    }
}

/// One stored marker: a bookmark, note, or highlight attached to a verse.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub gid: String,
    pub ari: Ari,
    pub kind: MarkerKind,
    pub caption: String,
    /// Highlight color as 0xRRGGBB; meaningful for highlights only.
    pub color: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// SQLite-backed store for markers, progress-marker pins, the jump history,
/// and the last reading location. Externally mutable (editor flows); readers
/// always re-query instead of caching.
pub struct MarkerStore {
    conn: Connection,
}

impl MarkerStore {
    pub fn new() -> Result<Self> {
        let prefix = get_app_data_prefix()?;
        let filepath = prefix.join("markers.db");

        if let Some(parent) = filepath.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Self::open(&filepath)
    }

    pub fn open(filepath: &Path) -> Result<Self> {
        let conn = Connection::open(filepath)?;

        // Schema creation is idempotent, so opening an existing database is
        // safe and also repairs previously-created empty files.
        Self::init_db(&conn)?;

        Ok(Self { conn })
    }

    fn init_db(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS markers (
                gid TEXT PRIMARY KEY,
                ari INTEGER NOT NULL,
                kind TEXT NOT NULL,
                caption TEXT NOT NULL DEFAULT '',
                color INTEGER,
                created_at DATETIME DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS markers_ari ON markers(ari);

            CREATE TABLE IF NOT EXISTS progress_marks (
                preset_id INTEGER PRIMARY KEY,
                ari INTEGER NOT NULL,
                caption TEXT
            );

            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ari INTEGER NOT NULL,
                timestamp DATETIME DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS last_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                ari INTEGER NOT NULL,
                split_version_id TEXT
            );
            ",
        )?;
        Ok(())
    }

    pub fn insert_marker(
        &self,
        kind: MarkerKind,
        ari: Ari,
        caption: &str,
        color: Option<u32>,
    ) -> Result<String> {
        use sha1::{Digest, Sha1};
        let mut hasher = Sha1::new();
        hasher.update(format!("{}{}{}{}", ari.0, kind.as_str(), caption, Utc::now()).as_bytes());
        let hash = hasher.finalize();
        let gid = hex::encode(hash)[..10].to_string();

        self.conn.execute(
            "INSERT INTO markers (gid, ari, kind, caption, color) VALUES (?, ?, ?, ?, ?)",
            params![gid, ari.0, kind.as_str(), caption, color],
        )?;
        Ok(gid)
    }

    pub fn update_marker_caption(&self, gid: &str, caption: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE markers SET caption=? WHERE gid=?",
            params![caption, gid],
        )?;
        Ok(())
    }

    pub fn delete_marker(&self, gid: &str) -> Result<()> {
        self.conn.execute("DELETE FROM markers WHERE gid=?", params![gid])?;
        Ok(())
    }

    pub fn list_markers_for_ari_kind(&self, ari: Ari, kind: MarkerKind) -> Result<Vec<Marker>> {
        let mut stmt = self.conn.prepare(
            "SELECT gid, ari, kind, caption, color, created_at FROM markers
             WHERE ari=? AND kind=? ORDER BY created_at",
        )?;
        let markers_iter = stmt.query_map(params![ari.0, kind.as_str()], row_to_marker)?;

        let mut markers = Vec::new();
        for marker in markers_iter {
            markers.push(marker?);
        }
        Ok(markers)
    }

    pub fn set_progress_mark(&self, preset_id: i32, ari: Ari, caption: Option<&str>) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO progress_marks (preset_id, ari, caption) VALUES (?, ?, ?)",
            params![preset_id, ari.0, caption],
        )?;
        Ok(())
    }

    pub fn delete_progress_mark(&self, preset_id: i32) -> Result<()> {
        self.conn
            .execute("DELETE FROM progress_marks WHERE preset_id=?", params![preset_id])?;
        Ok(())
    }

    pub fn add_history(&self, ari: Ari) -> Result<()> {
        self.conn
            .execute("INSERT INTO history (ari) VALUES (?)", params![ari.0])?;
        Ok(())
    }

    /// Recent locations, most recent first.
    pub fn recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT ari, timestamp FROM history ORDER BY id DESC LIMIT ?",
        )?;
        let entries_iter = stmt.query_map(params![limit as i64], |row| {
            Ok(HistoryEntry {
                ari: Ari(row.get::<_, i64>(0)? as u32),
                timestamp: row.get(1)?,
            })
        })?;

        let mut entries = Vec::new();
        for entry in entries_iter {
            entries.push(entry?);
        }
        Ok(entries)
    }

    pub fn save_last_state(&self, ari: Ari, split_version_id: Option<&str>) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO last_state (id, ari, split_version_id) VALUES (1, ?, ?)",
            params![ari.0, split_version_id],
        )?;
        Ok(())
    }

    pub fn load_last_state(&self) -> Result<Option<(Ari, Option<String>)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT ari, split_version_id FROM last_state WHERE id=1")?;
        let result = stmt.query_row([], |row| {
            Ok((Ari(row.get::<_, i64>(0)? as u32), row.get(1)?))
        });

        match result {
            Ok(state) => Ok(Some(state)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn annotations_for_chapter(&self, book_id: u8, chapter_1: i32) -> Result<AnnotationMap> {
        let base = Ari::encode(book_id, chapter_1 as u8, 0);
        let lo = base.0 as i64 + 1;
        let hi = base.0 as i64 + 0xff;

        let mut map = AnnotationMap::new();

        let mut stmt = self
            .conn
            .prepare("SELECT ari, kind, color FROM markers WHERE ari BETWEEN ? AND ?")?;
        let rows = stmt.query_map(params![lo, hi], |row| {
            Ok((
                row.get::<_, i64>(0)? as u32,
                row.get::<_, String>(1)?,
                row.get::<_, Option<u32>>(2)?,
            ))
        })?;
        for row in rows {
            let (ari, kind, color) = row?;
            let verse_1 = Ari(ari).verse() as i32;
            let entry: &mut VerseAnnotations = map.entry(verse_1).or_default();
            match MarkerKind::from_str(&kind) {
                Some(MarkerKind::Bookmark) => entry.bookmark_count += 1,
                Some(MarkerKind::Note) => entry.has_note = true,
                Some(MarkerKind::Highlight) => entry.highlight_color = color,
                None => {}
            }
        }

        let mut stmt = self
            .conn
            .prepare("SELECT preset_id, ari FROM progress_marks WHERE ari BETWEEN ? AND ?")?;
        let rows = stmt.query_map(params![lo, hi], |row| {
            Ok((row.get::<_, i32>(0)?, row.get::<_, i64>(1)? as u32))
        })?;
        for row in rows {
            let (preset_id, ari) = row?;
            let verse_1 = Ari(ari).verse() as i32;
            map.entry(verse_1).or_default().pins.push(preset_id);
        }

        Ok(map)
    }
}

impl AnnotationSource for MarkerStore {
    fn load_for_chapter(&self, book_id: u8, chapter_1: i32) -> AnnotationMap {
        match self.annotations_for_chapter(book_id, chapter_1) {
            Ok(map) => map,
            Err(err) => {
                logging::error(format!("cannot load annotations: {err}"));
                AnnotationMap::new()
            }
        }
    }
}

fn row_to_marker(row: &rusqlite::Row<'_>) -> rusqlite::Result<Marker> {
    let kind: String = row.get(2)?;
    Ok(Marker {
        gid: row.get(0)?,
        ari: Ari(row.get::<_, i64>(1)? as u32),
        kind: MarkerKind::from_str(&kind).unwrap_or(MarkerKind::Bookmark),
        caption: row.get(3)?,
        color: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_store() -> (MarkerStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = MarkerStore::open(&temp_dir.path().join("test_markers.db")).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_store_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("init.db");
        assert!(!db_path.exists());
        MarkerStore::open(&db_path).unwrap();
        assert!(db_path.exists());

        // reopening an existing database is fine
        MarkerStore::open(&db_path).unwrap();
    }

    #[test]
    fn test_marker_crud() {
        let (store, _temp_dir) = setup_test_store();
        let ari = Ari::encode(0, 1, 2);

        let gid = store
            .insert_marker(MarkerKind::Bookmark, ari, "important", None)
            .unwrap();
        assert_eq!(gid.len(), 10);

        let markers = store.list_markers_for_ari_kind(ari, MarkerKind::Bookmark).unwrap();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].caption, "important");
        assert_eq!(markers[0].ari, ari);
        assert_eq!(markers[0].kind, MarkerKind::Bookmark);

        store.update_marker_caption(&gid, "renamed").unwrap();
        let markers = store.list_markers_for_ari_kind(ari, MarkerKind::Bookmark).unwrap();
        assert_eq!(markers[0].caption, "renamed");

        store.delete_marker(&gid).unwrap();
        assert!(store.list_markers_for_ari_kind(ari, MarkerKind::Bookmark).unwrap().is_empty());
    }

    #[test]
    fn test_markers_separated_by_kind() {
        let (store, _temp_dir) = setup_test_store();
        let ari = Ari::encode(0, 1, 1);

        store.insert_marker(MarkerKind::Bookmark, ari, "b", None).unwrap();
        store.insert_marker(MarkerKind::Note, ari, "n", None).unwrap();

        assert_eq!(store.list_markers_for_ari_kind(ari, MarkerKind::Bookmark).unwrap().len(), 1);
        assert_eq!(store.list_markers_for_ari_kind(ari, MarkerKind::Note).unwrap().len(), 1);
        assert!(store.list_markers_for_ari_kind(ari, MarkerKind::Highlight).unwrap().is_empty());
    }

    #[test]
    fn test_annotation_map_for_chapter() {
        let (store, _temp_dir) = setup_test_store();

        store.insert_marker(MarkerKind::Bookmark, Ari::encode(0, 1, 2), "a", None).unwrap();
        store.insert_marker(MarkerKind::Bookmark, Ari::encode(0, 1, 2), "b", None).unwrap();
        store.insert_marker(MarkerKind::Note, Ari::encode(0, 1, 3), "note", None).unwrap();
        store
            .insert_marker(MarkerKind::Highlight, Ari::encode(0, 1, 5), "", Some(0xffff00))
            .unwrap();
        store.set_progress_mark(1, Ari::encode(0, 1, 5), Some("pin")).unwrap();
        // different chapter, must not leak into the map
        store.insert_marker(MarkerKind::Bookmark, Ari::encode(0, 2, 1), "x", None).unwrap();

        let map = store.load_for_chapter(0, 1);
        assert_eq!(map.len(), 3);
        assert_eq!(map[&2].bookmark_count, 2);
        assert!(map[&3].has_note);
        assert_eq!(map[&5].highlight_color, Some(0xffff00));
        assert_eq!(map[&5].pins, vec![1]);

        let map2 = store.load_for_chapter(0, 2);
        assert_eq!(map2.len(), 1);
        assert_eq!(map2[&1].bookmark_count, 1);
    }

    #[test]
    fn test_progress_mark_replace_and_delete() {
        let (store, _temp_dir) = setup_test_store();

        store.set_progress_mark(1, Ari::encode(0, 1, 1), Some("start")).unwrap();
        store.set_progress_mark(1, Ari::encode(0, 2, 1), Some("moved")).unwrap();

        assert!(store.load_for_chapter(0, 1).is_empty());
        assert_eq!(store.load_for_chapter(0, 2)[&1].pins, vec![1]);

        store.delete_progress_mark(1).unwrap();
        assert!(store.load_for_chapter(0, 2).is_empty());
    }

    #[test]
    fn test_history_order_and_limit() {
        let (store, _temp_dir) = setup_test_store();

        store.add_history(Ari::encode(0, 1, 1)).unwrap();
        store.add_history(Ari::encode(0, 2, 1)).unwrap();
        store.add_history(Ari::encode(42, 3, 16)).unwrap();

        let entries = store.recent_history(10).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].ari, Ari::encode(42, 3, 16));
        assert_eq!(entries[2].ari, Ari::encode(0, 1, 1));

        let limited = store.recent_history(2).unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].ari, Ari::encode(42, 3, 16));
    }

    #[test]
    fn test_last_state_roundtrip() {
        let (store, _temp_dir) = setup_test_store();

        assert_eq!(store.load_last_state().unwrap(), None);

        store.save_last_state(Ari::encode(42, 3, 16), Some("kjv")).unwrap();
        assert_eq!(
            store.load_last_state().unwrap(),
            Some((Ari::encode(42, 3, 16), Some("kjv".to_string())))
        );

        store.save_last_state(Ari::encode(0, 1, 1), None).unwrap();
        assert_eq!(
            store.load_last_state().unwrap(),
            Some((Ari::encode(0, 1, 1), None))
        );
    }

    #[test]
    fn test_empty_chapter_has_empty_map() {
        let (store, _temp_dir) = setup_test_store();
        assert!(store.load_for_chapter(7, 7).is_empty());
    }
}
