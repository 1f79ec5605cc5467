use std::rc::Rc;

use lectern::reading::{NoAnnotations, ReadingController, ReadingSession};
use lectern::version::{JsonVersion, VersionSource};

/// A small canon: Genesis (id 0, 50 chapters), Exodus (id 1, 40 chapters),
/// Obadiah (id 30, 1 chapter), John (id 42, 21 chapters). Verse counts are
/// 10 everywhere except John 3, which has 36. Genesis can be left out to
/// model a translation with a content gap.
pub fn canon_json(id: &str, short_name: &str, include_genesis: bool) -> String {
    let mut books = Vec::new();

    if include_genesis {
        books.push(book_json(0, "Genesis", &["Gen"], &vec![10; 50]));
    }
    books.push(book_json(1, "Exodus", &["Ex"], &vec![10; 40]));
    books.push(book_json(30, "Obadiah", &["Ob"], &[21]));

    // John 3 has 36 verses, the rest 10
    let mut john_chapters = vec![10u16; 21];
    john_chapters[2] = 36;
    books.push(book_json(42, "John", &["Jn"], &john_chapters));

    let books = books.join(",");
    format!(r#"{{"id": "{id}", "short_name": "{short_name}", "books": [{books}]}}"#)
}

fn book_json(book_id: u8, name: &str, abbrevs: &[&str], verse_counts: &[u16]) -> String {
    let abbrevs = abbrevs
        .iter()
        .map(|a| format!("\"{a}\""))
        .collect::<Vec<_>>()
        .join(",");
    let chapters = verse_counts
        .iter()
        .enumerate()
        .map(|(chapter_0, &count)| {
            let verses = (1..=count)
                .map(|v| format!("\"{name} {}:{v}\"", chapter_0 + 1))
                .collect::<Vec<_>>()
                .join(",");
            format!(r#"{{"verses": [{verses}]}}"#)
        })
        .collect::<Vec<_>>()
        .join(",");
    format!(
        r#"{{"book_id": {book_id}, "name": "{name}", "abbreviations": [{abbrevs}], "chapters": [{chapters}]}}"#
    )
}

pub fn canon_version() -> Rc<dyn VersionSource> {
    Rc::new(JsonVersion::from_str(&canon_json("prim", "PRIM", true)).unwrap())
}

pub fn controller() -> ReadingController {
    let session = ReadingSession::new("prim", canon_version());
    ReadingController::new(session, Rc::new(NoAnnotations), 30).unwrap()
}
