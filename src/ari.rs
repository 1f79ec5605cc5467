use std::fmt;

/// Packed location reference: book id in bits 16..24, 1-based chapter in
/// bits 8..16, 1-based verse in bits 0..8. A zero component means
/// "unspecified", so `Ari::ZERO` is the universal "nowhere" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Ari(pub u32);

impl Ari {
    pub const ZERO: Ari = Ari(0);

    pub fn encode(book_id: u8, chapter_1: u8, verse_1: u8) -> Self {
        Ari(((book_id as u32) << 16) | ((chapter_1 as u32) << 8) | verse_1 as u32)
    }

    /// Compose a book+chapter base (verse bits must be zero) with a verse.
    pub fn encode_with_bc(ari_bc: Ari, verse_1: u8) -> Self {
        debug_assert_eq!(ari_bc.verse(), 0, "base ari must have no verse component");
        Ari(ari_bc.0 | verse_1 as u32)
    }

    pub fn book(self) -> u8 {
        ((self.0 >> 16) & 0xff) as u8
    }

    pub fn chapter(self) -> u8 {
        ((self.0 >> 8) & 0xff) as u8
    }

    pub fn verse(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    /// The same location with the verse bits cleared (book+chapter only).
    pub fn to_book_chapter(self) -> Ari {
        Ari(self.0 & 0xffff00)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Ari {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.book(), self.chapter(), self.verse())
    }
}

/// Clamp a requested value into `[1, max]`. `max` of zero yields 1, which
/// callers only hit for books with no verse data; display still proceeds.
pub fn clamp_1(requested: i32, max: i32) -> i32 {
    requested.clamp(1, max.max(1))
}
