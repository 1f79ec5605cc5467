use std::collections::BTreeMap;

use crate::ari::Ari;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Outcome of a verse up/down key press inside a pane: either the pane
/// consumed it (scrolled to a verse), or it escalated to a chapter step at
/// the chapter edge, or nothing happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressResult {
    Left,
    Right,
    Consumed { target_verse_1: i32 },
    Nop,
}

/// Static reference data for one book of a version. Owned by the version;
/// everything else holds ids or borrows.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub book_id: u8,
    pub name: String,
    pub abbreviations: Vec<String>,
    /// `verse_counts[c - 1]` is the verse count of chapter `c`.
    pub verse_counts: Vec<u16>,
}

impl Book {
    pub fn chapter_count(&self) -> i32 {
        self.verse_counts.len() as i32
    }

    pub fn verse_count(&self, chapter_1: i32) -> i32 {
        self.verse_counts
            .get((chapter_1 - 1).max(0) as usize)
            .copied()
            .unwrap_or(0) as i32
    }

    /// Human reference for a whole chapter, e.g. "Genesis 3".
    pub fn reference(&self, chapter_1: i32) -> String {
        format!("{} {}", self.name, chapter_1)
    }

    /// Human reference for a single verse, e.g. "Genesis 3:16".
    pub fn reference_verse(&self, chapter_1: i32, verse_1: i32) -> String {
        format!("{} {}:{}", self.name, chapter_1, verse_1)
    }

    /// Human reference for a set of verses, collapsing runs into ranges,
    /// e.g. "Genesis 3:1-3,5". Verses must be sorted ascending.
    pub fn reference_verses(&self, chapter_1: i32, verses_1: &[i32]) -> String {
        match verses_1.len() {
            0 => self.reference(chapter_1),
            1 => self.reference_verse(chapter_1, verses_1[0]),
            _ => {
                debug_assert!(verses_1.windows(2).all(|w| w[0] < w[1]), "verses must be sorted");
                let mut parts = String::new();
                let mut run_start = verses_1[0];
                let mut prev = verses_1[0];
                for &v in &verses_1[1..] {
                    if v == prev + 1 {
                        prev = v;
                        continue;
                    }
                    push_run(&mut parts, run_start, prev);
                    run_start = v;
                    prev = v;
                }
                push_run(&mut parts, run_start, prev);
                format!("{} {}:{}", self.name, chapter_1, parts)
            }
        }
    }
}

fn push_run(out: &mut String, start: i32, end: i32) {
    if !out.is_empty() {
        out.push(',');
    }
    if start == end {
        out.push_str(&start.to_string());
    } else {
        out.push_str(&format!("{}-{}", start, end));
    }
}

/// The verse texts of one loaded chapter. Index 0 is verse 1.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChapterText {
    pub verses: Vec<String>,
}

impl ChapterText {
    pub fn verse_text(&self, verse_1: i32) -> Option<&str> {
        self.verses.get((verse_1 - 1).max(0) as usize).map(String::as_str)
    }

    pub fn verse_count(&self) -> i32 {
        self.verses.len() as i32
    }
}

/// A section heading starting at some verse within a chapter.
#[derive(Debug, Clone, PartialEq)]
pub struct PericopeBlock {
    pub caption: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Bookmark,
    Note,
    Highlight,
}

/// Per-verse annotation info derived from the marker store, plus any
/// progress-marker pins parked on the verse.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VerseAnnotations {
    pub bookmark_count: u32,
    pub has_note: bool,
    /// Highlight color as 0xRRGGBB when highlighted.
    pub highlight_color: Option<u32>,
    /// Preset ids of progress markers pinned here.
    pub pins: Vec<i32>,
}

pub type AnnotationMap = BTreeMap<i32, VerseAnnotations>;

/// Immutable dataset for one pane showing one chapter of one version.
/// Replaced wholesale on every chapter change, never mutated in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VerseDataSnapshot {
    /// Book + chapter of this snapshot, verse bits zero.
    pub ari_bc: Ari,
    pub chapter: ChapterText,
    /// Pericope heading positions (full aris) and captions, already capped.
    pub pericopes: Vec<(Ari, PericopeBlock)>,
    pub version_id: String,
    pub annotations: AnnotationMap,
}

impl VerseDataSnapshot {
    pub fn is_empty(&self) -> bool {
        self.ari_bc.is_zero() && self.chapter.verses.is_empty()
    }

    pub fn verse_text(&self, verse_1: i32) -> Option<&str> {
        self.chapter.verse_text(verse_1)
    }
}

/// Mutable navigation state, written only by the reading controller.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationState {
    pub book_id: u8,
    pub chapter_1: i32,
    pub pane_count: u8,
    pub split_version_id: Option<String>,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self { book_id: 0, chapter_1: 1, pane_count: 1, split_version_id: None }
    }
}

impl NavigationState {
    pub fn ari_bc(&self) -> Ari {
        Ari::encode(self.book_id, self.chapter_1 as u8, 0)
    }
}

/// One row of the recent-locations history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub ari: Ari,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
