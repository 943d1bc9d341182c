//! Weighted title/artist similarity between two tracks.

use rapidfuzz::fuzz;

use crate::normalize::normalize;
use crate::track::Track;

/// Weight of the title ratio. A wrong title is a wrong recording; a
/// differently formatted artist credit usually is not.
pub const TITLE_WEIGHT: f64 = 0.7;
pub const ARTIST_WEIGHT: f64 = 0.3;

/// Indel similarity of two strings after [`normalize`], in `[0, 1]`:
/// `1 - indel_distance / (len_a + len_b)`. Two empty strings are identical.
pub fn text_ratio(a: &str, b: &str) -> f64 {
    let (a, b) = (normalize(a), normalize(b));
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    fuzz::ratio(a.chars(), b.chars())
}

/// Similarity of two tracks in `[0, 1]`; 1.0 means title and artist are
/// identical after normalisation. Symmetric in its arguments.
pub fn score(a: &Track, b: &Track) -> f64 {
    let title = text_ratio(&a.title, &b.title);
    let artist = text_ratio(&a.artist, &b.artist);
    (TITLE_WEIGHT * title + ARTIST_WEIGHT * artist).clamp(0.0, 1.0)
}
