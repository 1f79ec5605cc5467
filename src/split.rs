use std::rc::Rc;

use eyre::Result;

use crate::logging;
use crate::models::VerseDataSnapshot;
use crate::reading::{PaneState, ReadingController, load_snapshot};
use crate::version::VersionSource;

/// The secondary pane's version. Opening it may fail (corrupt or missing
/// source), which is why attach takes a `Result`.
pub struct ActiveSplit {
    pub version_id: String,
    pub version: Rc<dyn VersionSource>,
}

/// Split state machine: either no secondary pane, or one bound to a version.
/// There is no direct `Split -> Split` shortcut; re-attaching goes through
/// detach first.
#[derive(Default)]
pub enum SplitState {
    #[default]
    Single,
    Split(ActiveSplit),
}

impl ReadingController {
    pub fn is_split(&self) -> bool {
        matches!(self.session.split, SplitState::Split(_))
    }

    pub fn split_version_id(&self) -> Option<&str> {
        match &self.session.split {
            SplitState::Single => None,
            SplitState::Split(split) => Some(&split.version_id),
        }
    }

    /// Attach a secondary version and synchronize it to the primary pane.
    /// A failed open falls back to `Single` with no residual secondary data
    /// and returns false.
    pub fn attach_split(&mut self, opened: Result<ActiveSplit>) -> bool {
        self.detach_split();

        match opened {
            Ok(split) => {
                self.nav.split_version_id = Some(split.version_id.clone());
                self.nav.pane_count = 2;
                self.session.split = SplitState::Split(split);
                self.display_split_following_primary(self.primary.scroll_verse());
                true
            }
            Err(err) => {
                logging::error(format!("error opening split version: {err}"));
                false
            }
        }
    }

    pub fn detach_split(&mut self) {
        self.session.split = SplitState::Single;
        self.nav.split_version_id = None;
        self.nav.pane_count = 1;
        self.secondary = PaneState::default();
    }

    /// Load the primary's current book/chapter into the secondary pane.
    /// A book the split version lacks is a documented content gap, shown as
    /// an explicit placeholder rather than an error. The secondary's
    /// selection always starts cleared.
    pub(crate) fn display_split_following_primary(&mut self, verse_1: i32) {
        let SplitState::Split(split) = &self.session.split else {
            return;
        };
        let split_version = Rc::clone(&split.version);
        let split_version_id = split.version_id.clone();

        match split_version.book(self.nav.book_id).cloned() {
            None => {
                let name = split_version
                    .short_name()
                    .unwrap_or(&split_version_id)
                    .to_string();
                self.secondary.set_empty_message(Some(format!(
                    "Version {} cannot display {}",
                    name,
                    self.reference()
                )));
                self.secondary.set_snapshot(VerseDataSnapshot::default());
                self.secondary.uncheck_all();
            }
            Some(split_book) => {
                self.secondary.set_empty_message(None);
                if let Some(snapshot) = load_snapshot(
                    &*split_version,
                    &split_version_id,
                    &*self.annotations,
                    &split_book,
                    self.nav.chapter_1,
                    self.max_pericope_blocks,
                ) {
                    self.secondary.set_snapshot(snapshot);
                    self.secondary.uncheck_all();
                    self.secondary.scroll_to_verse(verse_1);
                }
            }
        }
    }

    /// Toggle a checked verse on the primary pane and mirror the result.
    pub fn toggle_check_primary(&mut self, verse_1: i32) {
        debug_assert!(
            verse_1 >= 1 && verse_1 <= self.primary.snapshot().chapter.verse_count(),
            "checked verse {verse_1} outside the displayed chapter"
        );
        self.primary.toggle(verse_1);
        self.on_primary_selection_changed();
    }

    /// Toggle a checked verse on the secondary pane. Secondary-origin
    /// changes are normalized through the primary, so the primary stays the
    /// single source of truth.
    pub fn toggle_check_secondary(&mut self, verse_1: i32) {
        if !self.is_split() {
            return;
        }
        self.secondary.toggle(verse_1);
        let verses = self.secondary.checked_verses();
        if verses.is_empty() {
            self.primary.uncheck_all();
        } else {
            self.primary.set_checked(&verses);
        }
        self.on_primary_selection_changed();
    }

    /// Replace the primary selection wholesale (restore flows).
    pub fn check_primary_verses(&mut self, verses_1: &[i32]) {
        self.primary.set_checked(verses_1);
        self.on_primary_selection_changed();
    }

    pub fn uncheck_all_verses(&mut self) {
        self.primary.uncheck_all();
        self.on_primary_selection_changed();
    }

    /// Push the primary's checked set down to the secondary pane. The push
    /// mutates the pane directly, so it cannot re-trigger secondary-origin
    /// normalization (the loop-breaking "do not re-notify" direction).
    pub(crate) fn on_primary_selection_changed(&mut self) {
        if !self.is_split() {
            return;
        }
        let verses = self.primary.checked_verses();
        if verses.is_empty() {
            self.secondary.uncheck_all();
        } else {
            self.secondary.set_checked(&verses);
        }
    }
}
