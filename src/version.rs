use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use eyre::{Result, WrapErr};
use serde::Deserialize;

use crate::ari::Ari;
use crate::models::{Book, ChapterText, PericopeBlock};

/// A named text source. Multiple versions may be open at once (primary plus
/// split); the reading controller only ever talks to this trait.
pub trait VersionSource {
    fn version_id(&self) -> &str;
    fn short_name(&self) -> Option<&str>;
    fn long_name(&self) -> Option<&str>;

    fn book(&self, book_id: u8) -> Option<&Book>;
    fn first_book(&self) -> Option<&Book>;
    fn last_book(&self) -> Option<&Book>;
    /// One past the highest book id, for forward walks over sparse ids.
    fn max_book_id_plus_one(&self) -> i32;
    /// Books in canonical order, used to resolve abbreviated book tokens.
    fn consecutive_books(&self) -> Vec<&Book>;

    /// Full verse text of a chapter, or `None` when the chapter data is
    /// unavailable (missing or corrupt). Callers treat `None` as a transient
    /// condition and keep their previous state.
    fn load_chapter_text(&self, book: &Book, chapter_1: i32) -> Option<ChapterText>;

    /// Pericope blocks of a chapter, truncated to at most `max` entries.
    fn load_pericopes(&self, book_id: u8, chapter_1: i32, max: usize) -> Vec<(Ari, PericopeBlock)>;

    fn footnote(&self, ari: Ari) -> Option<String>;
    fn cross_references(&self, ari: Ari) -> Vec<Ari>;
}

#[derive(Debug, Deserialize)]
struct RawVersion {
    id: String,
    short_name: Option<String>,
    long_name: Option<String>,
    books: Vec<RawBook>,
}

#[derive(Debug, Deserialize)]
struct RawBook {
    book_id: u8,
    name: String,
    #[serde(default)]
    abbreviations: Vec<String>,
    chapters: Vec<RawChapter>,
}

#[derive(Debug, Deserialize)]
struct RawChapter {
    verses: Vec<String>,
    #[serde(default)]
    pericopes: Vec<RawPericope>,
    #[serde(default)]
    footnotes: Vec<RawFootnote>,
    #[serde(default)]
    cross_references: Vec<RawCrossReference>,
}

#[derive(Debug, Deserialize)]
struct RawPericope {
    verse: u8,
    caption: String,
}

#[derive(Debug, Deserialize)]
struct RawFootnote {
    verse: u8,
    text: String,
}

#[derive(Debug, Deserialize)]
struct RawCrossReference {
    verse: u8,
    /// Targets as [book_id, chapter, verse] triples.
    targets: Vec<[u8; 3]>,
}

#[derive(Debug)]
struct LoadedChapter {
    verses: Vec<String>,
    pericopes: Vec<(u8, PericopeBlock)>,
    footnotes: BTreeMap<u8, String>,
    cross_references: BTreeMap<u8, Vec<Ari>>,
}

#[derive(Debug)]
struct LoadedBook {
    book: Book,
    chapters: Vec<LoadedChapter>,
}

/// A version backed by a single JSON file, fully loaded into memory.
#[derive(Debug)]
pub struct JsonVersion {
    id: String,
    short_name: Option<String>,
    long_name: Option<String>,
    books: BTreeMap<u8, LoadedBook>,
}

impl JsonVersion {
    pub fn open(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .wrap_err_with(|| format!("cannot read version file {}", path.display()))?;
        Self::from_str(&raw)
            .wrap_err_with(|| format!("cannot parse version file {}", path.display()))
    }

    pub fn from_str(raw: &str) -> Result<Self> {
        let raw: RawVersion = serde_json::from_str(raw)?;

        let mut books = BTreeMap::new();
        for raw_book in raw.books {
            let verse_counts = raw_book
                .chapters
                .iter()
                .map(|c| c.verses.len() as u16)
                .collect();
            let chapters = raw_book
                .chapters
                .into_iter()
                .map(|c| LoadedChapter {
                    verses: c.verses,
                    pericopes: c
                        .pericopes
                        .into_iter()
                        .map(|p| (p.verse, PericopeBlock { caption: p.caption }))
                        .collect(),
                    footnotes: c.footnotes.into_iter().map(|f| (f.verse, f.text)).collect(),
                    cross_references: c
                        .cross_references
                        .into_iter()
                        .map(|x| {
                            let targets = x
                                .targets
                                .into_iter()
                                .map(|[b, c, v]| Ari::encode(b, c, v))
                                .collect();
                            (x.verse, targets)
                        })
                        .collect(),
                })
                .collect();
            books.insert(
                raw_book.book_id,
                LoadedBook {
                    book: Book {
                        book_id: raw_book.book_id,
                        name: raw_book.name,
                        abbreviations: raw_book.abbreviations,
                        verse_counts,
                    },
                    chapters,
                },
            );
        }

        Ok(Self {
            id: raw.id,
            short_name: raw.short_name,
            long_name: raw.long_name,
            books,
        })
    }

    fn chapter(&self, book_id: u8, chapter_1: i32) -> Option<&LoadedChapter> {
        if chapter_1 < 1 {
            return None;
        }
        self.books
            .get(&book_id)?
            .chapters
            .get((chapter_1 - 1) as usize)
    }
}

impl VersionSource for JsonVersion {
    fn version_id(&self) -> &str {
        &self.id
    }

    fn short_name(&self) -> Option<&str> {
        self.short_name.as_deref()
    }

    fn long_name(&self) -> Option<&str> {
        self.long_name.as_deref()
    }

    fn book(&self, book_id: u8) -> Option<&Book> {
        self.books.get(&book_id).map(|b| &b.book)
    }

    fn first_book(&self) -> Option<&Book> {
        self.books.values().next().map(|b| &b.book)
    }

    fn last_book(&self) -> Option<&Book> {
        self.books.values().next_back().map(|b| &b.book)
    }

    fn max_book_id_plus_one(&self) -> i32 {
        self.books
            .keys()
            .next_back()
            .map(|&id| id as i32 + 1)
            .unwrap_or(0)
    }

    fn consecutive_books(&self) -> Vec<&Book> {
        self.books.values().map(|b| &b.book).collect()
    }

    fn load_chapter_text(&self, book: &Book, chapter_1: i32) -> Option<ChapterText> {
        let chapter = self.chapter(book.book_id, chapter_1)?;
        Some(ChapterText { verses: chapter.verses.clone() })
    }

    fn load_pericopes(&self, book_id: u8, chapter_1: i32, max: usize) -> Vec<(Ari, PericopeBlock)> {
        let Some(chapter) = self.chapter(book_id, chapter_1) else {
            return Vec::new();
        };
        chapter
            .pericopes
            .iter()
            .take(max)
            .map(|(verse, block)| {
                (Ari::encode(book_id, chapter_1 as u8, *verse), block.clone())
            })
            .collect()
    }

    fn footnote(&self, ari: Ari) -> Option<String> {
        self.chapter(ari.book(), ari.chapter() as i32)?
            .footnotes
            .get(&ari.verse())
            .cloned()
    }

    fn cross_references(&self, ari: Ari) -> Vec<Ari> {
        self.chapter(ari.book(), ari.chapter() as i32)
            .and_then(|c| c.cross_references.get(&ari.verse()))
            .cloned()
            .unwrap_or_default()
    }
}
