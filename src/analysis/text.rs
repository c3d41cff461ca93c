//! Title normalization and keyword matching.

use std::collections::HashMap;

/// Lower-case `text` and collapse every whitespace run to a single space.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ordered, duplicate-free set of normalized keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordVocabulary {
    keywords: Vec<String>,
}

impl KeywordVocabulary {
    /// Normalize each keyword, dropping empties and later repeats.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocab = Self::default();
        for kw in keywords {
            let k = normalize(kw.as_ref());
            if !k.is_empty() && !vocab.keywords.contains(&k) {
                vocab.keywords.push(k);
            }
        }
        vocab
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Presence-based hits of each keyword in `title`.
///
/// A keyword contained in the title contributes exactly 1, however many
/// times it occurs. Keywords are checked independently, so overlapping
/// terms ("can", "can bus") may both match.
pub fn keyword_hits<'a, I>(title: &str, keywords: I) -> HashMap<String, u64>
where
    I: IntoIterator<Item = &'a str>,
{
    let t = normalize(title);
    let mut hits = HashMap::new();

    for kw in keywords {
        let k = normalize(kw);
        if !k.is_empty() && t.contains(&k) {
            *hits.entry(k).or_insert(0) += 1;
        }
    }

    hits
}
