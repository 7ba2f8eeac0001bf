use std::collections::HashSet;
use std::sync::OnceLock;

/// English stopwords excluded from prompt keyword sets. Includes the bare
/// contraction fragments ("don", "t", ...) that word splitting produces.
const STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such",
    "no", "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
    "will", "just", "don", "should", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain",
    "aren", "couldn", "didn", "doesn", "hadn", "hasn", "haven", "isn", "ma", "mightn",
    "mustn", "needn", "shan", "shouldn", "wasn", "weren", "won", "wouldn",
];

fn stopword_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

/// Tokenized view of a text: everything the metric calculators consume
#[derive(Debug, Clone)]
pub struct TokenizedText {
    /// Lowercased alphanumeric word tokens, punctuation discarded
    pub words: Vec<String>,
    /// Sentence segments; unterminated trailing text counts as one sentence
    pub sentences: Vec<String>,
    /// Word tokens minus English stopwords (used for prompt keyword coverage)
    pub keywords: HashSet<String>,
}

/// Tokenize a text into words, sentences, and stopword-filtered keywords.
/// Empty input yields empty collections; no downstream calculator errors on that.
pub fn tokenize(text: &str) -> TokenizedText {
    let words = split_words(text);
    let sentences = split_sentences(text);
    let keywords = words
        .iter()
        .filter(|w| !stopword_set().contains(w.as_str()))
        .cloned()
        .collect();
    TokenizedText {
        words,
        sentences,
        keywords,
    }
}

fn split_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if matches!(ch, '.' | '!' | '?') {
            if !current.trim().is_empty() {
                sentences.push(current.trim().to_string());
            }
            current.clear();
        } else {
            current.push(ch);
        }
    }
    if !current.trim().is_empty() {
        sentences.push(current.trim().to_string());
    }
    sentences
}
