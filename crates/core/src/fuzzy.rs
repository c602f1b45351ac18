//! Approximate string matching for typo-tolerant search
//!
//! All distances count Unicode scalar values, not bytes, and are
//! case-sensitive unless a caller folds case first.

use crate::config::SearchConfig;
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A document substring within edit-distance tolerance of a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyMatch {
    pub text: String,
    /// `1 - distance / max(len(query), len(text))`, in `[0, 1]`
    pub similarity: f64,
    pub edit_distance: usize,
    /// Char offset of the match in the searched text
    pub position: usize,
    /// Length of the match in chars
    pub length: usize,
    /// Surrounding text, filled by word-mode search
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
}

/// Options for [`fuzzy_search_words`]. Defaults come from [`SearchConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordSearchOptions {
    pub max_distance: usize,
    /// 0 means unlimited
    pub max_results: usize,
    pub case_sensitive: bool,
    pub context_chars: usize,
}

impl Default for WordSearchOptions {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for WordSearchOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            max_distance: config.max_distance,
            max_results: config.max_results,
            case_sensitive: config.case_sensitive,
            context_chars: config.context_chars,
        }
    }
}

/// Classic edit distance: insertion, deletion and substitution each cost 1
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    levenshtein_chars(&a, &b)
}

fn levenshtein_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev_row: Vec<usize> = (0..=b.len()).collect();
    let mut curr_row = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr_row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr_row[j + 1] = (curr_row[j] + 1)
                .min(prev_row[j + 1] + 1)
                .min(prev_row[j] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b.len()]
}

/// Edit distance that gives up once it is certain to exceed `max_distance`.
///
/// Returns the exact distance when it is `<= max_distance`, otherwise
/// `max_distance + 1`.
pub fn levenshtein_distance_bounded(a: &str, b: &str, max_distance: usize) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    levenshtein_bounded_chars(&a, &b, max_distance)
}

fn levenshtein_bounded_chars(a: &[char], b: &[char], max_distance: usize) -> usize {
    let over = max_distance.saturating_add(1);

    if a.len().abs_diff(b.len()) > max_distance {
        return over;
    }
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev_row: Vec<usize> = (0..=b.len()).collect();
    let mut curr_row = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr_row[0] = i + 1;
        let mut row_min = curr_row[0];

        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr_row[j + 1] = (curr_row[j] + 1)
                .min(prev_row[j + 1] + 1)
                .min(prev_row[j] + cost);
            row_min = row_min.min(curr_row[j + 1]);
        }

        if row_min > max_distance {
            return over;
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b.len()].min(over)
}

/// Edit distance that also counts swapping two adjacent characters as one
/// edit (optimal string alignment)
pub fn damerau_levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut matrix = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        matrix[0][j] = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);

            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(matrix[i - 2][j - 2] + 1);
            }
            matrix[i][j] = best;
        }
    }

    matrix[a.len()][b.len()]
}

/// `1 - distance / longest length`; two empty strings are identical
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(a, b) as f64 / longest as f64
}

/// Whether `target` is within `max_distance` edits of `query`
pub fn is_fuzzy_match(target: &str, query: &str, max_distance: usize) -> bool {
    levenshtein_distance_bounded(target, query, max_distance) <= max_distance
}

/// Jaro similarity with the Winkler common-prefix boost
pub fn jaro_winkler_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let match_window = (a.len().max(b.len()) / 2).saturating_sub(1);
    let mut a_matched = vec![false; a.len()];
    let mut b_matched = vec![false; b.len()];
    let mut matches = 0usize;

    for (i, ca) in a.iter().enumerate() {
        let start = i.saturating_sub(match_window);
        let end = (i + match_window + 1).min(b.len());
        for j in start..end {
            if b_matched[j] || *ca != b[j] {
                continue;
            }
            a_matched[i] = true;
            b_matched[j] = true;
            matches += 1;
            break;
        }
    }

    if matches == 0 {
        return 0.0;
    }

    let mut transpositions = 0usize;
    let mut k = 0usize;
    for (i, ca) in a.iter().enumerate() {
        if !a_matched[i] {
            continue;
        }
        while !b_matched[k] {
            k += 1;
        }
        if *ca != b[k] {
            transpositions += 1;
        }
        k += 1;
    }

    let m = matches as f64;
    let jaro = (m / a.len() as f64 + m / b.len() as f64 + (m - transpositions as f64 / 2.0) / m)
        / 3.0;

    if jaro < 0.7 {
        return jaro;
    }

    let prefix = a
        .iter()
        .zip(b.iter())
        .take(4)
        .take_while(|(x, y)| x == y)
        .count();

    jaro + 0.1 * prefix as f64 * (1.0 - jaro)
}

/// Jaccard similarity of the two strings' character n-gram sets
pub fn ngram_similarity(a: &str, b: &str, n: usize) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() || n == 0 {
        return 0.0;
    }

    let grams = |s: &str| -> HashSet<Vec<char>> {
        let chars: Vec<char> = s.chars().collect();
        chars.windows(n).map(|w| w.to_vec()).collect()
    };

    let a_grams = grams(a);
    let b_grams = grams(b);
    let union = a_grams.union(&b_grams).count();
    if union == 0 {
        return 0.0;
    }
    a_grams.intersection(&b_grams).count() as f64 / union as f64
}

/// American Soundex code (letter followed by three digits)
pub fn soundex(word: &str) -> String {
    fn code(c: char) -> char {
        match c {
            'B' | 'F' | 'P' | 'V' => '1',
            'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => '2',
            'D' | 'T' => '3',
            'L' => '4',
            'M' | 'N' => '5',
            'R' => '6',
            'H' | 'W' => '-',
            _ => '0',
        }
    }

    let mut letters = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase());

    let Some(first) = letters.next() else {
        return "0000".to_string();
    };

    let mut result = String::with_capacity(4);
    result.push(first);
    let mut last = code(first);

    for c in letters {
        if result.len() == 4 {
            break;
        }
        match code(c) {
            // H and W do not separate letters with the same code
            '-' => {}
            '0' => last = '0',
            digit if digit != last => {
                result.push(digit);
                last = digit;
            }
            _ => {}
        }
    }

    while result.len() < 4 {
        result.push('0');
    }
    result
}

pub fn soundex_match(a: &str, b: &str) -> bool {
    soundex(a) == soundex(b)
}

/// Slide windows of `len(query) - 1 ..= len(query) + 1` chars over `text` and
/// report the places within `max_distance` edits of `query`.
///
/// Overlapping candidate windows describe the same occurrence; of each
/// overlapping run only the closest window is reported (earliest on ties,
/// preferring the query's own length). Results are in document order.
pub fn fuzzy_search(text: &str, query: &str, max_distance: usize) -> Vec<FuzzyMatch> {
    let text: Vec<char> = text.chars().collect();
    let query: Vec<char> = query.chars().collect();
    fuzzy_search_chars(&text, &query, max_distance)
}

/// [`fuzzy_search`] over pre-split characters, for callers that need match
/// positions to line up with their own char indices
pub fn fuzzy_search_chars(text: &[char], query: &[char], max_distance: usize) -> Vec<FuzzyMatch> {
    if query.is_empty() || text.is_empty() {
        return Vec::new();
    }

    let q = query.len();
    let lengths = [q, q.saturating_sub(1), q + 1];

    // Best window per start position
    let mut candidates: Vec<(usize, usize, usize)> = Vec::new();
    for start in 0..text.len() {
        let mut best: Option<(usize, usize)> = None;
        for &len in &lengths {
            if len == 0 || start + len > text.len() {
                continue;
            }
            let distance = levenshtein_bounded_chars(&text[start..start + len], query, max_distance);
            if distance > max_distance {
                continue;
            }
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, len));
            }
        }
        if let Some((distance, len)) = best {
            candidates.push((start, len, distance));
        }
    }

    // Collapse overlapping candidates onto their closest member
    let mut kept: Vec<(usize, usize, usize)> = Vec::new();
    for candidate in candidates {
        match kept.last_mut() {
            Some(last) if candidate.0 < last.0 + last.1 => {
                if candidate.2 < last.2 {
                    *last = candidate;
                }
            }
            _ => kept.push(candidate),
        }
    }

    trace!("fuzzy search kept {} windows", kept.len());

    kept.into_iter()
        .map(|(start, len, distance)| {
            let window = &text[start..start + len];
            FuzzyMatch {
                text: window.iter().collect(),
                similarity: 1.0 - distance as f64 / q.max(len) as f64,
                edit_distance: distance,
                position: start,
                length: len,
                context: String::new(),
            }
        })
        .collect()
}

/// Compare whole whitespace-separated words of `text` with `query`.
///
/// Matches carry surrounding context and are ordered by similarity,
/// best first; equal similarities keep document order.
pub fn fuzzy_search_words(text: &str, query: &str, options: &WordSearchOptions) -> Vec<FuzzyMatch> {
    if query.is_empty() || text.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let query: Vec<char> = fold(query.chars(), options.case_sensitive);
    let mut matches = Vec::new();

    let mut position = 0;
    while position < chars.len() {
        if chars[position].is_whitespace() {
            position += 1;
            continue;
        }

        let start = position;
        while position < chars.len() && !chars[position].is_whitespace() {
            position += 1;
        }
        let word = &chars[start..position];
        let folded = fold(word.iter().copied(), options.case_sensitive);

        let distance = levenshtein_bounded_chars(&folded, &query, options.max_distance);
        if distance > options.max_distance {
            continue;
        }

        let context_start = start.saturating_sub(options.context_chars);
        let context_end = (position + options.context_chars).min(chars.len());

        matches.push(FuzzyMatch {
            text: word.iter().collect(),
            similarity: 1.0 - distance as f64 / word.len().max(query.len()) as f64,
            edit_distance: distance,
            position: start,
            length: word.len(),
            context: chars[context_start..context_end].iter().collect(),
        });

        if options.max_results > 0 && matches.len() >= options.max_results {
            break;
        }
    }

    matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    matches
}

/// Lowercase char-by-char so indices stay aligned with the source text
pub fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn fold(chars: impl Iterator<Item = char>, case_sensitive: bool) -> Vec<char> {
    if case_sensitive {
        chars.collect()
    } else {
        chars.map(fold_case).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_known_values() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("test", "test"), 0);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("flaw", "lawn"), 2);
    }

    #[test]
    fn test_levenshtein_is_case_sensitive() {
        assert_eq!(levenshtein_distance("Test", "test"), 1);
    }

    #[test]
    fn test_levenshtein_counts_chars() {
        assert_eq!(levenshtein_distance("café", "cafe"), 1);
        assert_eq!(levenshtein_distance("日本語", "日本"), 1);
    }

    #[test]
    fn test_levenshtein_has_no_transposition_shortcut() {
        assert_eq!(levenshtein_distance("ab", "ba"), 2);
        assert_eq!(damerau_levenshtein_distance("ab", "ba"), 1);
        assert_eq!(damerau_levenshtein_distance("ca", "abc"), 3);
    }

    #[test]
    fn test_bounded_distance() {
        assert_eq!(levenshtein_distance_bounded("kitten", "sitting", 3), 3);
        assert_eq!(levenshtein_distance_bounded("kitten", "sitting", 2), 3);
        assert_eq!(levenshtein_distance_bounded("a", "abcdef", 2), 3);
        assert_eq!(levenshtein_distance_bounded("", "ab", 5), 2);
        assert_eq!(levenshtein_distance_bounded("same", "same", 0), 0);
    }

    #[test]
    fn test_is_fuzzy_match() {
        assert!(is_fuzzy_match("receive", "recieve", 2));
        assert!(!is_fuzzy_match("test", "completely_different", 2));
        assert!(is_fuzzy_match("test", "test", 0));
        assert!(!is_fuzzy_match("test", "tent", 0));
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert!((similarity("kitten", "sitting") - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn test_jaro_winkler() {
        assert_eq!(jaro_winkler_similarity("same", "same"), 1.0);
        assert_eq!(jaro_winkler_similarity("abc", ""), 0.0);
        assert_eq!(jaro_winkler_similarity("abc", "xyz"), 0.0);
        assert!((jaro_winkler_similarity("MARTHA", "MARHTA") - 0.961_111).abs() < 1e-4);
    }

    #[test]
    fn test_ngram_similarity() {
        assert_eq!(ngram_similarity("night", "night", 2), 1.0);
        assert_eq!(ngram_similarity("", "night", 2), 0.0);
        // {ni, ig, gh, ht} vs {na, ac, ch, ht}
        assert!((ngram_similarity("night", "nacht", 2) - 1.0 / 7.0).abs() < 1e-9);
        assert_eq!(ngram_similarity("a", "b", 2), 0.0);
    }

    #[test]
    fn test_soundex() {
        assert_eq!(soundex("Robert"), "R163");
        assert_eq!(soundex("Rupert"), "R163");
        assert_eq!(soundex("Tymczak"), "T522");
        assert_eq!(soundex("Ashcraft"), "A261");
        assert_eq!(soundex("Pfister"), "P236");
        assert_eq!(soundex("A"), "A000");
        assert_eq!(soundex(""), "0000");
        assert!(soundex_match("Smith", "Smyth"));
        assert!(!soundex_match("Smith", "Jones"));
    }

    #[test]
    fn test_fuzzy_search_invalid_parameters() {
        assert!(fuzzy_search("some text", "", 2).is_empty());
        assert!(fuzzy_search("", "query", 2).is_empty());
    }

    #[test]
    fn test_fuzzy_search_exact_hit() {
        let matches = fuzzy_search("the quick fox", "quick", 0);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "quick");
        assert_eq!(matches[0].position, 4);
        assert_eq!(matches[0].edit_distance, 0);
        assert_eq!(matches[0].similarity, 1.0);
    }

    #[test]
    fn test_fuzzy_search_tolerates_typos() {
        let matches = fuzzy_search("please recieve the parcel", "receive", 2);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].position, 7);
        assert_eq!(matches[0].text, "recieve");
        assert_eq!(matches[0].edit_distance, 2);
        assert!(matches[0].similarity > 0.7);
    }

    #[test]
    fn test_fuzzy_search_tolerates_missing_character() {
        let matches = fuzzy_search("a documnt here", "document", 1);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "documnt");
        assert_eq!(matches[0].length, 7);
        assert_eq!(matches[0].edit_distance, 1);
        assert!((matches[0].similarity - (1.0 - 1.0 / 8.0)).abs() < 1e-9);
    }

    #[test]
    fn test_fuzzy_search_document_order() {
        let matches = fuzzy_search("cat hat bat", "cat", 1);
        let positions: Vec<usize> = matches.iter().map(|m| m.position).collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(matches[0].text, "cat");
        assert!(matches.iter().all(|m| m.edit_distance <= 1));
    }

    #[test]
    fn test_fuzzy_search_respects_max_distance() {
        let matches = fuzzy_search("completely different words", "xyzzy", 1);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_fuzzy_search_words_sorted_with_context() {
        let options = WordSearchOptions {
            max_distance: 1,
            max_results: 0,
            case_sensitive: false,
            context_chars: 4,
        };
        let matches = fuzzy_search_words("Tent and TEST and best", "test", &options);

        let words: Vec<&str> = matches.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(words, vec!["TEST", "Tent", "best"]);
        assert_eq!(matches[0].position, 9);
        assert_eq!(matches[0].context, "and TEST and");
    }

    #[test]
    fn test_fuzzy_search_words_case_sensitive() {
        let options = WordSearchOptions {
            max_distance: 0,
            case_sensitive: true,
            ..WordSearchOptions::default()
        };
        let matches = fuzzy_search_words("Test test TEST", "test", &options);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].position, 5);
    }

    #[test]
    fn test_word_search_options_follow_config() {
        assert_eq!(
            WordSearchOptions::default(),
            WordSearchOptions::from(&SearchConfig::default())
        );

        let config = SearchConfig {
            max_distance: 0,
            max_results: 1,
            case_sensitive: false,
            context_chars: 3,
            ..SearchConfig::default()
        };
        let matches =
            fuzzy_search_words("alpha Beta beta", "beta", &WordSearchOptions::from(&config));

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "Beta");
        assert_eq!(matches[0].context, "ha Beta be");
    }

    #[test]
    fn test_fuzzy_search_words_max_results() {
        let options = WordSearchOptions {
            max_distance: 1,
            max_results: 2,
            case_sensitive: true,
            context_chars: 0,
        };
        let matches = fuzzy_search_words("cat cot cut cap", "cat", &options);
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.context == m.text));
    }
}
