use crate::models::MetricVector;
use crate::text::{self, TokenizedText};
use std::collections::HashSet;

/// Percentage of unique words among all words; 0.0 for an empty response
pub fn lexical_diversity(response_words: &[String]) -> f64 {
    if response_words.is_empty() {
        return 0.0;
    }
    let unique: HashSet<&str> = response_words.iter().map(String::as_str).collect();
    unique.len() as f64 / response_words.len() as f64 * 100.0
}

/// Percentage of prompt keywords that appear in the response.
/// An empty keyword set counts as fully covered (100.0): a prompt made
/// entirely of stopwords places no coverage demand on the response.
pub fn query_coverage(prompt_keywords: &HashSet<String>, response_words: &[String]) -> f64 {
    if prompt_keywords.is_empty() {
        return 100.0;
    }
    let response: HashSet<&str> = response_words.iter().map(String::as_str).collect();
    let covered = prompt_keywords
        .iter()
        .filter(|k| response.contains(k.as_str()))
        .count();
    covered as f64 / prompt_keywords.len() as f64 * 100.0
}

/// Flesch-Kincaid grade level; 0.0 when there are no words or no sentences
pub fn flesch_kincaid_grade(words: &[String], sentences: &[String]) -> f64 {
    if words.is_empty() || sentences.is_empty() {
        return 0.0;
    }
    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();
    0.39 * (words.len() as f64 / sentences.len() as f64)
        + 11.8 * (syllables as f64 / words.len() as f64)
        - 15.59
}

/// Heuristic syllable count: vowel-group transitions with a silent-e
/// adjustment, floored at 1 per word. Expects a lowercased word.
fn count_syllables(word: &str) -> usize {
    let mut count = 0;
    let mut prev_is_vowel = false;
    for ch in word.chars() {
        let is_vowel = matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if is_vowel && !prev_is_vowel {
            count += 1;
        }
        prev_is_vowel = is_vowel;
    }
    if word.ends_with('e') && count > 1 {
        count -= 1;
    }
    count.max(1)
}

/// Percentage of repeated n-gram windows: trigrams for 3+ words, bigrams
/// for exactly 2 words, 0.0 when no n-gram can be formed
pub fn repetition_penalty(response_words: &[String]) -> f64 {
    let n = match response_words.len() {
        0 | 1 => return 0.0,
        2 => 2,
        _ => 3,
    };
    let total = response_words.len() - n + 1;
    let unique: HashSet<&[String]> = response_words.windows(n).collect();
    (total - unique.len()) as f64 / total as f64 * 100.0
}

/// Compute the full raw metric vector for one prompt/response pair
pub fn calculate_metrics(prompt: &str, response: &str) -> MetricVector {
    let prompt_tokens = text::tokenize(prompt);
    let response_tokens = text::tokenize(response);
    calculate_from_tokens(&prompt_tokens, &response_tokens)
}

/// Metric vector from already-tokenized input; pure and total over any input
pub fn calculate_from_tokens(prompt: &TokenizedText, response: &TokenizedText) -> MetricVector {
    MetricVector {
        lexical_diversity: lexical_diversity(&response.words),
        query_coverage: query_coverage(&prompt.keywords, &response.words),
        flesch_kincaid_grade: flesch_kincaid_grade(&response.words, &response.sentences),
        repetition_penalty: repetition_penalty(&response.words),
    }
}
