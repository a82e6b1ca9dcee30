use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// A letter or underscore followed by letters, decimal digits or underscores.
    static ref WORD: Regex = Regex::new(r"[\p{L}_][\p{L}\p{Nd}_]*").unwrap();
}

/// Borrowing iterator over the words of `text`.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    WORD.find_iter(text).map(|m| m.as_str())
}

/// Owning, lazily evaluated iterator over the words of a text.
///
/// Everything that isn't part of a word (punctuation, quotes, digits that
/// don't follow a letter) acts as a separator and is dropped.
#[derive(Debug, Clone)]
pub struct Tokens {
    text: String,
    position: usize,
}

impl Tokens {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            position: 0,
        }
    }
}

impl Iterator for Tokens {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let found = WORD.find_at(&self.text, self.position)?;
        self.position = found.end();
        Some(found.as_str().to_string())
    }
}
