use lazy_static::lazy_static;
use regex::Regex;
use unidecode::unidecode;

lazy_static! {
    static ref NON_LETTER_RE: Regex = Regex::new(r"[^a-z ]").unwrap();
    static ref SPACES_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Canonical form used to spot the same English word coming back from the
/// generator with different casing, accents or punctuation.
pub fn normalize_word(word: &str) -> String {
    let folded = unidecode(word).to_lowercase();
    let letters = NON_LETTER_RE.replace_all(&folded, " ");
    SPACES_RE.replace_all(letters.trim(), " ").into_owned()
}
