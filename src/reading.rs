use std::collections::BTreeSet;
use std::rc::Rc;

use eyre::{Result, bail, eyre};

use crate::ari::{Ari, clamp_1};
use crate::logging;
use crate::models::{
    AnnotationMap, Book, Direction, NavigationState, PressResult, VerseDataSnapshot,
};
use crate::parser::{parse_reference, resolve_book_token};
use crate::split::SplitState;
use crate::version::VersionSource;

/// Chapter-scoped read access to the marker store. The store is externally
/// owned and externally mutated, so maps are always re-read, never cached.
pub trait AnnotationSource {
    fn load_for_chapter(&self, book_id: u8, chapter_1: i32) -> AnnotationMap;
}

/// Annotation source for contexts with no marker database (tests, `--dump`).
pub struct NoAnnotations;

impl AnnotationSource for NoAnnotations {
    fn load_for_chapter(&self, _book_id: u8, _chapter_1: i32) -> AnnotationMap {
        AnnotationMap::new()
    }
}

/// The active primary version plus the optional split, passed explicitly
/// into the controller instead of living in process-wide state.
pub struct ReadingSession {
    pub version_id: String,
    pub version: Rc<dyn VersionSource>,
    pub split: SplitState,
}

impl ReadingSession {
    pub fn new(version_id: impl Into<String>, version: Rc<dyn VersionSource>) -> Self {
        Self { version_id: version_id.into(), version, split: SplitState::Single }
    }
}

/// Display state of one pane: the published snapshot, the checked-verse set,
/// the scroll position, and transient display effects. Mutated only through
/// the controller.
#[derive(Debug, Clone, Default)]
pub struct PaneState {
    snapshot: VerseDataSnapshot,
    checked: BTreeSet<i32>,
    scroll_verse_1: i32,
    empty_message: Option<String>,
    attention_verse_1: Option<i32>,
}

impl PaneState {
    pub fn snapshot(&self) -> &VerseDataSnapshot {
        &self.snapshot
    }

    pub fn checked_verses(&self) -> Vec<i32> {
        self.checked.iter().copied().collect()
    }

    pub fn is_checked(&self, verse_1: i32) -> bool {
        self.checked.contains(&verse_1)
    }

    pub fn has_selection(&self) -> bool {
        !self.checked.is_empty()
    }

    pub fn scroll_verse(&self) -> i32 {
        self.scroll_verse_1
    }

    pub fn empty_message(&self) -> Option<&str> {
        self.empty_message.as_deref()
    }

    /// The verse to visually call attention to, consumed by the renderer.
    pub fn take_attention(&mut self) -> Option<i32> {
        self.attention_verse_1.take()
    }

    pub(crate) fn set_snapshot(&mut self, snapshot: VerseDataSnapshot) {
        self.snapshot = snapshot;
    }

    pub(crate) fn set_empty_message(&mut self, message: Option<String>) {
        self.empty_message = message;
    }

    pub(crate) fn scroll_to_verse(&mut self, verse_1: i32) {
        self.scroll_verse_1 = verse_1;
    }

    pub(crate) fn call_attention(&mut self, verse_1: i32) {
        self.attention_verse_1 = Some(verse_1);
    }

    pub(crate) fn uncheck_all(&mut self) {
        self.checked.clear();
    }

    pub(crate) fn set_checked(&mut self, verses_1: &[i32]) {
        self.checked = verses_1.iter().copied().collect();
    }

    pub(crate) fn toggle(&mut self, verse_1: i32) {
        if !self.checked.remove(&verse_1) {
            self.checked.insert(verse_1);
        }
    }

    fn verse_down(&mut self) -> PressResult {
        if self.scroll_verse_1 < self.snapshot.chapter.verse_count() {
            self.scroll_verse_1 += 1;
            PressResult::Consumed { target_verse_1: self.scroll_verse_1 }
        } else {
            PressResult::Right
        }
    }

    fn verse_up(&mut self) -> PressResult {
        if self.scroll_verse_1 > 1 {
            self.scroll_verse_1 -= 1;
            PressResult::Consumed { target_verse_1: self.scroll_verse_1 }
        } else {
            PressResult::Left
        }
    }
}

/// Load one chapter of one version into a fresh snapshot. `None` means the
/// provider reported the chapter unavailable; the caller keeps its previous
/// snapshot untouched.
pub(crate) fn load_snapshot(
    version: &dyn VersionSource,
    version_id: &str,
    annotations: &dyn AnnotationSource,
    book: &Book,
    chapter_1: i32,
    max_pericope_blocks: usize,
) -> Option<VerseDataSnapshot> {
    let chapter = version.load_chapter_text(book, chapter_1)?;
    let pericopes = version.load_pericopes(book.book_id, chapter_1, max_pericope_blocks);
    let annotations = annotations.load_for_chapter(book.book_id, chapter_1);

    Some(VerseDataSnapshot {
        ari_bc: Ari::encode(book.book_id, chapter_1 as u8, 0),
        chapter,
        pericopes,
        version_id: version_id.to_string(),
        annotations,
    })
}

/// Owns the displayed book/chapter for the primary pane, clamps navigation
/// requests, and keeps the split pane in step. Single writer of both panes.
pub struct ReadingController {
    pub(crate) session: ReadingSession,
    pub(crate) nav: NavigationState,
    pub(crate) active_book: Book,
    pub(crate) primary: PaneState,
    pub(crate) secondary: PaneState,
    pub(crate) annotations: Rc<dyn AnnotationSource>,
    pub(crate) max_pericope_blocks: usize,
}

impl ReadingController {
    /// Open a controller on the session's first book, chapter 1 verse 1.
    pub fn new(
        session: ReadingSession,
        annotations: Rc<dyn AnnotationSource>,
        max_pericope_blocks: usize,
    ) -> Result<Self> {
        let first_book = session
            .version
            .first_book()
            .cloned()
            .ok_or_else(|| eyre!("version {} contains no books", session.version_id))?;

        let mut controller = Self {
            nav: NavigationState {
                book_id: first_book.book_id,
                chapter_1: 1,
                pane_count: 1,
                split_version_id: None,
            },
            active_book: first_book,
            primary: PaneState::default(),
            secondary: PaneState::default(),
            session,
            annotations,
            max_pericope_blocks,
        };

        if controller.display_at(1, 1).is_none() {
            bail!(
                "version {} cannot display its first chapter",
                controller.session.version_id
            );
        }
        Ok(controller)
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.nav
    }

    pub fn active_book(&self) -> &Book {
        &self.active_book
    }

    pub fn primary(&self) -> &PaneState {
        &self.primary
    }

    pub fn secondary(&self) -> &PaneState {
        &self.secondary
    }

    pub fn session(&self) -> &ReadingSession {
        &self.session
    }

    /// Current location, verse taken from the primary scroll position.
    pub fn current_ari(&self) -> Ari {
        Ari::encode_with_bc(self.nav.ari_bc(), self.primary.scroll_verse().max(1) as u8)
    }

    /// Human reference of the displayed chapter, e.g. "Genesis 3".
    pub fn reference(&self) -> String {
        self.active_book.reference(self.nav.chapter_1)
    }

    /// Display a chapter and verse of the active book, clearing selection.
    pub fn display_at(&mut self, chapter_1: i32, verse_1: i32) -> Option<Ari> {
        self.display_at_retaining(chapter_1, verse_1, true)
    }

    /// Display a chapter and verse of the active book.
    ///
    /// The requested chapter and verse may be any integers; both are clamped
    /// into the book's valid ranges. Returns the resolved chapter/verse with
    /// the book component zero, or `None` when the chapter data is
    /// unavailable (prior state fully retained).
    ///
    /// When `uncheck_selection` is false the checked verses survive only if
    /// the resolved chapter equals the current one; any chapter change still
    /// clears them.
    pub fn display_at_retaining(
        &mut self,
        chapter_1: i32,
        verse_1: i32,
        uncheck_selection: bool,
    ) -> Option<Ari> {
        let current_chapter_1 = self.nav.chapter_1;

        let available_chapter_1 = clamp_1(chapter_1, self.active_book.chapter_count());
        let available_verse_1 = clamp_1(verse_1, self.active_book.verse_count(available_chapter_1));

        let snapshot = load_snapshot(
            &*self.session.version,
            &self.session.version_id,
            &*self.annotations,
            &self.active_book,
            available_chapter_1,
            self.max_pericope_blocks,
        )?;

        let retained = if !uncheck_selection && available_chapter_1 == current_chapter_1 {
            Some(self.primary.checked_verses())
        } else {
            None
        };

        // Snapshot swap is a single assignment; observers see old or new,
        // never a mix.
        self.primary.set_snapshot(snapshot);
        self.primary.uncheck_all();
        if let Some(verses) = retained {
            self.primary.set_checked(&verses);
        }
        self.on_primary_selection_changed();

        self.nav.chapter_1 = available_chapter_1;
        self.primary.scroll_to_verse(available_verse_1);

        self.display_split_following_primary(available_verse_1);

        Some(Ari::encode(0, available_chapter_1 as u8, available_verse_1 as u8))
    }

    /// Step one chapter backward or forward, crossing book boundaries and
    /// skipping books the version lacks. A no-op at the first or last book.
    pub fn step_chapter(&mut self, direction: Direction) -> Option<Ari> {
        match direction {
            Direction::Previous => {
                if self.nav.chapter_1 == 1 {
                    let mut try_book_id = self.active_book.book_id as i32 - 1;
                    while try_book_id >= 0 {
                        if let Some(book) = self.session.version.book(try_book_id as u8) {
                            if book.chapter_count() > 0 {
                                let book = book.clone();
                                let last_chapter_1 = book.chapter_count();
                                return self.display_book_at(book, last_chapter_1, 1);
                            }
                        }
                        try_book_id -= 1;
                    }
                    // already at the beginning of the first book
                    None
                } else {
                    self.display_at(self.nav.chapter_1 - 1, 1)
                }
            }
            Direction::Next => {
                if self.nav.chapter_1 >= self.active_book.chapter_count() {
                    let max_book_id = self.session.version.max_book_id_plus_one();
                    let mut try_book_id = self.active_book.book_id as i32 + 1;
                    while try_book_id < max_book_id {
                        if let Some(book) = self.session.version.book(try_book_id as u8) {
                            if book.chapter_count() > 0 {
                                let book = book.clone();
                                return self.display_book_at(book, 1, 1);
                            }
                        }
                        try_book_id += 1;
                    }
                    // already at the end of the last book
                    None
                } else {
                    self.display_at(self.nav.chapter_1 + 1, 1)
                }
            }
        }
    }

    /// Jump to a packed location. A missing book is logged and ignored; the
    /// attention effect fires only when the displayed location equals the
    /// requested one exactly.
    pub fn jump_to_ari(&mut self, ari: Ari) {
        if ari.is_zero() {
            return;
        }

        let book_id = ari.book();
        let Some(book) = self.session.version.book(book_id).cloned() else {
            logging::warn(format!("book_id={book_id} not found for ari={ari}"));
            return;
        };

        if let Some(ari_cv) = self.display_book_at(book, ari.chapter() as i32, ari.verse() as i32) {
            if ari == Ari(((book_id as u32) << 16) | ari_cv.0) {
                self.call_attention_to_both(ari.verse() as i32);
            }
        }
    }

    /// Jump to a free-form reference string.
    ///
    /// Blank input returns `Ari::ZERO` with no navigation; unparseable input
    /// is an error ("invalid address") with no state change. An unknown book
    /// token falls back to the current book; a missing chapter/verse
    /// defaults to 1:1.
    pub fn jump_to(&mut self, reference: &str) -> Result<Ari> {
        if reference.trim().is_empty() {
            return Ok(Ari::ZERO);
        }

        logging::debug(format!("going to jump to {reference}"));

        let Some(parsed) = parse_reference(reference) else {
            bail!("invalid address: {reference}");
        };

        let version = Rc::clone(&self.session.version);
        let resolved_book = parsed
            .book_token
            .as_deref()
            .and_then(|token| resolve_book_token(token, &version.consecutive_books()))
            .and_then(|book_id| version.book(book_id).cloned());

        // Book token that maps to no available book: fall back rather than fail.
        let selected = resolved_book.unwrap_or_else(|| self.active_book.clone());
        let selected_book_id = selected.book_id;

        let ari_cv = if parsed.chapter.is_none() && parsed.verse.is_none() {
            self.display_book_at(selected, 1, 1)
        } else {
            self.display_book_at(selected, parsed.chapter.unwrap_or(0), parsed.verse.unwrap_or(0))
        };

        Ok(Ari(((selected_book_id as u32) << 16) | ari_cv.unwrap_or(Ari::ZERO).0))
    }

    /// Move the reading position one verse down; at the last verse the press
    /// escalates to a next-chapter request for the caller.
    pub fn verse_down(&mut self) -> PressResult {
        let result = self.primary.verse_down();
        self.follow_press_on_split(result);
        result
    }

    /// Move the reading position one verse up; at verse 1 the press
    /// escalates to a previous-chapter request for the caller.
    pub fn verse_up(&mut self) -> PressResult {
        let result = self.primary.verse_up();
        self.follow_press_on_split(result);
        result
    }

    fn follow_press_on_split(&mut self, result: PressResult) {
        if let PressResult::Consumed { target_verse_1 } = result {
            if self.is_split() {
                self.secondary.scroll_to_verse(target_verse_1);
            }
        }
    }

    /// Re-read the annotation maps of both panes from the store. Called when
    /// an external editor flow may have changed markers. Each pane gets a
    /// freshly built snapshot; the displayed text is untouched.
    pub fn reload_annotation_maps(&mut self) {
        let map = self
            .annotations
            .load_for_chapter(self.nav.book_id, self.nav.chapter_1);

        let mut snapshot = self.primary.snapshot().clone();
        snapshot.annotations = map.clone();
        self.primary.set_snapshot(snapshot);

        if !self.secondary.snapshot().is_empty() {
            let mut snapshot = self.secondary.snapshot().clone();
            snapshot.annotations = map;
            self.secondary.set_snapshot(snapshot);
        }
    }

    pub(crate) fn call_attention_to_both(&mut self, verse_1: i32) {
        self.primary.call_attention(verse_1);
        self.secondary.call_attention(verse_1);
    }

    /// Switch to another book and display a chapter there. The book becomes
    /// active only when the chapter data loads; on failure the previous book
    /// stays in place along with the rest of the navigation state.
    fn display_book_at(&mut self, book: Book, chapter_1: i32, verse_1: i32) -> Option<Ari> {
        let previous = std::mem::replace(&mut self.active_book, book);
        self.nav.book_id = self.active_book.book_id;

        let resolved = self.display_at(chapter_1, verse_1);
        if resolved.is_none() {
            self.nav.book_id = previous.book_id;
            self.active_book = previous;
        }
        resolved
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::controller;
    use super::*;

    #[test]
    fn test_new_lands_on_first_chapter() {
        let c = controller();
        assert_eq!(c.navigation().book_id, 0);
        assert_eq!(c.navigation().chapter_1, 1);
        assert_eq!(c.primary().scroll_verse(), 1);
        assert_eq!(c.primary().snapshot().ari_bc, Ari::encode(0, 1, 0));
        assert_eq!(c.reference(), "Genesis 1");
    }

    #[test]
    fn test_display_at_clamps_everything() {
        let mut c = controller();
        for (chapter, verse) in [(-7, -7), (0, 0), (99, 99), (2, 100), (1, 2)] {
            let resolved = c.display_at(chapter, verse).unwrap();
            let book = c.active_book().clone();
            let rc = resolved.chapter() as i32;
            let rv = resolved.verse() as i32;
            assert!(rc >= 1 && rc <= book.chapter_count(), "chapter {rc} out of range");
            assert!(rv >= 1 && rv <= book.verse_count(rc), "verse {rv} out of range");
        }
    }

    #[test]
    fn test_display_at_clamp_values() {
        let mut c = controller();
        assert_eq!(c.display_at(-3, -3).unwrap(), Ari::encode(0, 1, 1));
        assert_eq!(c.display_at(99, 1).unwrap(), Ari::encode(0, 3, 1));
        assert_eq!(c.display_at(2, 99).unwrap(), Ari::encode(0, 2, 2));
        assert_eq!(c.display_at(1, 2).unwrap(), Ari::encode(0, 1, 2));
        // book component always zero in the return value
        assert_eq!(c.display_at(1, 1).unwrap().book(), 0);
    }

    #[test]
    fn test_display_at_loads_snapshot() {
        let mut c = controller();
        c.display_at(3, 2).unwrap();
        let snapshot = c.primary().snapshot();
        assert_eq!(snapshot.ari_bc, Ari::encode(0, 3, 0));
        assert_eq!(snapshot.chapter.verse_count(), 4);
        assert_eq!(snapshot.verse_text(1), Some("g3.1"));
        assert_eq!(snapshot.version_id, "tv");
        assert_eq!(c.primary().scroll_verse(), 2);
    }

    #[test]
    fn test_display_pericopes_present() {
        let c = controller();
        let snapshot = c.primary().snapshot();
        assert_eq!(snapshot.pericopes.len(), 1);
        assert_eq!(snapshot.pericopes[0].0, Ari::encode(0, 1, 1));
        assert_eq!(snapshot.pericopes[0].1.caption, "The Creation");
    }

    #[test]
    fn test_selection_cleared_on_chapter_change() {
        let mut c = controller();
        c.toggle_check_primary(2);
        assert_eq!(c.primary().checked_verses(), vec![2]);

        c.display_at(2, 1).unwrap();
        assert!(!c.primary().has_selection());
    }

    #[test]
    fn test_selection_retained_same_chapter_only() {
        let mut c = controller();
        c.toggle_check_primary(2);

        // same chapter, retaining: selection survives
        c.display_at_retaining(1, 3, false).unwrap();
        assert_eq!(c.primary().checked_verses(), vec![2]);

        // different chapter, retaining requested: still cleared
        c.display_at_retaining(2, 1, false).unwrap();
        assert!(!c.primary().has_selection());
    }

    #[test]
    fn test_selection_uncheck_explicit() {
        let mut c = controller();
        c.toggle_check_primary(1);
        c.display_at_retaining(1, 1, true).unwrap();
        assert!(!c.primary().has_selection());
    }

    #[test]
    fn test_step_next_within_book() {
        let mut c = controller();
        assert_eq!(c.step_chapter(Direction::Next).unwrap(), Ari::encode(0, 2, 1));
        assert_eq!(c.navigation().chapter_1, 2);
    }

    #[test]
    fn test_step_next_crosses_missing_books() {
        let mut c = controller();
        c.display_at(3, 1).unwrap(); // last chapter of Genesis
        let resolved = c.step_chapter(Direction::Next).unwrap();
        // books 1..41 are absent; lands on John 1:1
        assert_eq!(c.navigation().book_id, 42);
        assert_eq!(resolved, Ari::encode(0, 1, 1));
        assert_eq!(c.reference(), "John 1");
    }

    #[test]
    fn test_step_next_at_end_is_noop() {
        let mut c = controller();
        c.jump_to_ari(Ari::encode(42, 1, 1));
        let before = c.primary().snapshot().clone();
        assert_eq!(c.step_chapter(Direction::Next), None);
        assert_eq!(c.navigation().book_id, 42);
        assert_eq!(c.navigation().chapter_1, 1);
        assert_eq!(*c.primary().snapshot(), before);
    }

    #[test]
    fn test_step_previous_lands_on_last_chapter() {
        let mut c = controller();
        c.jump_to_ari(Ari::encode(42, 1, 1));
        let resolved = c.step_chapter(Direction::Previous).unwrap();
        assert_eq!(c.navigation().book_id, 0);
        assert_eq!(resolved, Ari::encode(0, 3, 1));
    }

    #[test]
    fn test_step_previous_at_start_is_noop() {
        let mut c = controller();
        assert_eq!(c.step_chapter(Direction::Previous), None);
        assert_eq!(c.navigation().book_id, 0);
        assert_eq!(c.navigation().chapter_1, 1);
    }

    #[test]
    fn test_step_next_terminates_at_last_book() {
        let mut c = controller();
        let mut steps = 0;
        while c.step_chapter(Direction::Next).is_some() {
            steps += 1;
            assert!(steps < 100, "stepping must terminate");
        }
        assert_eq!(c.navigation().book_id, 42);
        assert_eq!(c.navigation().chapter_1, 1);
        assert_eq!(steps, 3);
    }

    #[test]
    fn test_jump_to_ari_exact_fires_attention() {
        let mut c = controller();
        c.jump_to_ari(Ari::encode(42, 1, 3));
        assert_eq!(c.navigation().book_id, 42);
        assert_eq!(c.primary.take_attention(), Some(3));
    }

    #[test]
    fn test_jump_to_ari_clamped_no_attention() {
        let mut c = controller();
        c.jump_to_ari(Ari::encode(42, 1, 99));
        assert_eq!(c.primary().scroll_verse(), 5); // clamped to last verse
        assert_eq!(c.primary.take_attention(), None);
    }

    #[test]
    fn test_jump_to_ari_roundtrip_iff_in_range() {
        let mut c = controller();

        c.jump_to_ari(Ari::encode(0, 2, 2));
        assert_eq!(c.current_ari(), Ari::encode(0, 2, 2));

        c.jump_to_ari(Ari::encode(0, 2, 40));
        assert_ne!(c.current_ari(), Ari::encode(0, 2, 40));
        assert_eq!(c.current_ari(), Ari::encode(0, 2, 2));
    }

    #[test]
    fn test_jump_to_ari_missing_book_is_noop() {
        let mut c = controller();
        c.display_at(2, 1).unwrap();
        c.jump_to_ari(Ari::encode(7, 1, 1)); // book 7 absent
        assert_eq!(c.navigation().book_id, 0);
        assert_eq!(c.navigation().chapter_1, 2);
    }

    /// Genesis plus a book whose chapter list is empty, so displaying it
    /// always fails even though the book itself resolves.
    fn hollow_book_version() -> Rc<dyn VersionSource> {
        Rc::new(
            crate::version::JsonVersion::from_str(
                r#"{
                    "id": "hv",
                    "books": [
                        {
                            "book_id": 0,
                            "name": "Genesis",
                            "chapters": [{"verses": ["g1.1", "g1.2"]}]
                        },
                        {"book_id": 5, "name": "Hollow", "chapters": []}
                    ]
                }"#,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_jump_to_ari_unloadable_book_keeps_state() {
        let session = ReadingSession::new("hv", hollow_book_version());
        let mut c = ReadingController::new(session, Rc::new(NoAnnotations), 30).unwrap();
        c.display_at(1, 2).unwrap();

        c.jump_to_ari(Ari::encode(5, 1, 1));
        assert_eq!(c.navigation().book_id, 0);
        assert_eq!(c.navigation().chapter_1, 1);
        assert_eq!(c.active_book().name, "Genesis");
        assert_eq!(c.primary().snapshot().ari_bc, Ari::encode(0, 1, 0));
        assert_eq!(c.current_ari(), Ari::encode(0, 1, 2));
        assert_eq!(c.reference(), "Genesis 1");
    }

    #[test]
    fn test_jump_to_reference_unloadable_book_keeps_state() {
        let session = ReadingSession::new("hv", hollow_book_version());
        let mut c = ReadingController::new(session, Rc::new(NoAnnotations), 30).unwrap();

        let ari = c.jump_to("Hollow 2:3").unwrap();
        assert_eq!(ari.chapter(), 0); // nothing was displayed
        assert_eq!(c.navigation().book_id, 0);
        assert_eq!(c.active_book().name, "Genesis");
        assert_eq!(c.reference(), "Genesis 1");
    }

    #[test]
    fn test_jump_to_reference() {
        let mut c = controller();
        let ari = c.jump_to("John 1:4").unwrap();
        assert_eq!(ari, Ari::encode(42, 1, 4));
        assert_eq!(c.navigation().book_id, 42);
        assert_eq!(c.primary().scroll_verse(), 4);
    }

    #[test]
    fn test_jump_to_blank_is_no_navigation() {
        let mut c = controller();
        c.display_at(2, 2).unwrap();
        assert_eq!(c.jump_to("   ").unwrap(), Ari::ZERO);
        assert_eq!(c.navigation().chapter_1, 2);
    }

    #[test]
    fn test_jump_to_invalid_is_error_without_state_change() {
        let mut c = controller();
        c.display_at(2, 1).unwrap();
        let err = c.jump_to("??!").unwrap_err();
        assert!(err.to_string().contains("invalid address"));
        assert_eq!(c.navigation().chapter_1, 2);
        assert_eq!(c.navigation().book_id, 0);
    }

    #[test]
    fn test_jump_to_unknown_book_falls_back_to_current() {
        let mut c = controller();
        let ari = c.jump_to("Obadiah 1:2").unwrap();
        assert_eq!(c.navigation().book_id, 0); // stayed on Genesis
        assert_eq!(ari, Ari::encode(0, 1, 2));
    }

    #[test]
    fn test_jump_to_book_only_defaults_to_1_1() {
        let mut c = controller();
        let ari = c.jump_to("John").unwrap();
        assert_eq!(ari, Ari::encode(42, 1, 1));
    }

    #[test]
    fn test_verse_down_up_and_edges() {
        let mut c = controller();
        assert_eq!(c.verse_down(), PressResult::Consumed { target_verse_1: 2 });
        assert_eq!(c.verse_down(), PressResult::Consumed { target_verse_1: 3 });
        assert_eq!(c.verse_down(), PressResult::Right); // chapter has 3 verses
        assert_eq!(c.verse_up(), PressResult::Consumed { target_verse_1: 2 });
        assert_eq!(c.verse_up(), PressResult::Consumed { target_verse_1: 1 });
        assert_eq!(c.verse_up(), PressResult::Left);
    }

    #[test]
    fn test_reload_annotation_maps_replaces_snapshots() {
        use std::cell::RefCell;

        use crate::models::VerseAnnotations;
        use crate::split::ActiveSplit;

        struct SharedAnnotations(RefCell<AnnotationMap>);

        impl AnnotationSource for SharedAnnotations {
            fn load_for_chapter(&self, _book_id: u8, _chapter_1: i32) -> AnnotationMap {
                self.0.borrow().clone()
            }
        }

        let store = Rc::new(SharedAnnotations(RefCell::new(AnnotationMap::new())));
        let session = ReadingSession::new("tv", super::fixtures::two_book_version());
        let mut c = ReadingController::new(session, store.clone(), 30).unwrap();
        c.attach_split(Ok(ActiveSplit {
            version_id: "tv2".to_string(),
            version: super::fixtures::two_book_version(),
        }));
        assert!(c.primary().snapshot().annotations.is_empty());

        store
            .0
            .borrow_mut()
            .insert(1, VerseAnnotations { bookmark_count: 1, ..Default::default() });
        c.reload_annotation_maps();
        assert_eq!(c.primary().snapshot().annotations[&1].bookmark_count, 1);
        assert_eq!(c.secondary().snapshot().annotations[&1].bookmark_count, 1);
        // the verse text came through the rebuild unchanged
        assert_eq!(c.primary().snapshot().verse_text(1), Some("g1.1"));
    }

    #[test]
    fn test_empty_version_is_an_error() {
        let version = crate::version::JsonVersion::from_str(
            r#"{"id": "empty", "books": []}"#,
        )
        .unwrap();
        let session = ReadingSession::new("empty", Rc::new(version));
        assert!(ReadingController::new(session, Rc::new(NoAnnotations), 30).is_err());
    }
}
