use regex::Regex;
use std::sync::OnceLock;

use crate::models::Book;

/// A parsed free-form reference such as "John 3:16", "Gen 1", "1 John 2" or
/// "3:16" (book omitted). Absent parts stay `None`; the caller decides the
/// fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedReference {
    pub book_token: Option<String>,
    pub chapter: Option<i32>,
    pub verse: Option<i32>,
}

fn reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Book token may carry a leading ordinal ("1 John") and must end in a
        // letter so trailing chapter digits are not swallowed.
        Regex::new(
            r"(?x)
            ^\s*
            (?P<book> \d? \s* [\p{Alphabetic}] [\p{Alphabetic} .'-]*? )?
            \s*
            (?: (?P<chapter> \d{1,3} ) (?: \s* [:.] \s* (?P<verse> \d{1,3} ) )? )?
            \s*$",
        )
        .expect("reference regex is valid")
    })
}

/// Parse a human reference string. Returns `None` when the text matches no
/// recognizable shape (the caller surfaces this as an invalid address).
pub fn parse_reference(text: &str) -> Option<ParsedReference> {
    let captures = reference_regex().captures(text)?;

    let book_token = captures
        .name("book")
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty());
    let chapter = captures.name("chapter").and_then(|m| m.as_str().parse().ok());
    let verse = captures.name("verse").and_then(|m| m.as_str().parse().ok());

    if book_token.is_none() && chapter.is_none() {
        return None;
    }

    Some(ParsedReference { book_token, chapter, verse })
}

/// Resolve a book token against the version's consecutive books: exact name
/// or abbreviation match first (case-insensitive), then unique-enough name
/// prefix. Returns the first match in canonical order.
pub fn resolve_book_token(token: &str, consecutive_books: &[&Book]) -> Option<u8> {
    let needle = normalize(token);
    if needle.is_empty() {
        return None;
    }

    for book in consecutive_books {
        if normalize(&book.name) == needle {
            return Some(book.book_id);
        }
        if book.abbreviations.iter().any(|a| normalize(a) == needle) {
            return Some(book.book_id);
        }
    }

    consecutive_books
        .iter()
        .find(|book| normalize(&book.name).starts_with(&needle))
        .map(|book| book.book_id)
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect::<String>()
        .to_lowercase()
}
