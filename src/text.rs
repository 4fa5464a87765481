//! Sentence splitting, word counting, and the extractive summarizer and
//! keyword ranker used by the editor.
//!
//! Both rankers are TextRank: sentences (or words) are graph nodes, edges are
//! weighted by overlap (or co-occurrence), and scores come from a damped
//! power iteration.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

const SENTENCE_ENDINGS: [char; 5] = ['.', '!', '?', ';', '…'];
const DAMPING: f64 = 0.85;
const MAX_ITERATIONS: usize = 100;
const CONVERGENCE: f64 = 1e-6;
const COOCCURRENCE_WINDOW: usize = 2;
const MIN_KEYWORD_CHARS: usize = 3;

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and",
        "any", "are", "as", "at", "be", "because", "been", "before", "being", "below",
        "between", "both", "but", "by", "can", "could", "did", "do", "does", "doing", "down",
        "during", "each", "few", "for", "from", "further", "had", "has", "have", "having", "he",
        "her", "here", "hers", "herself", "him", "himself", "his", "how", "i", "if", "in",
        "into", "is", "it", "its", "itself", "just", "last", "more", "most", "much", "must",
        "my", "new", "no", "nor", "not", "now", "of", "off", "on", "once", "one", "only", "or",
        "other", "our", "ours", "out", "over", "own", "said", "same", "says", "she", "should",
        "since", "so", "some", "such", "than", "that", "the", "their", "theirs", "them", "then",
        "there", "these", "they", "this", "those", "through", "to", "too", "two", "under",
        "until", "up", "very", "was", "we", "were", "what", "when", "where", "which", "while",
        "who", "whom", "why", "will", "with", "would", "year", "years", "yet", "you", "your",
    ]
    .into_iter()
    .collect()
});

/// Split text into sentences. A sentence ends at terminal punctuation
/// followed by whitespace (or the end of the text), or at a line break.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' || c == '\r' {
            flush_sentence(&mut current, &mut sentences);
            continue;
        }
        current.push(c);
        let at_boundary = chars.peek().is_none_or(|next| next.is_whitespace());
        if SENTENCE_ENDINGS.contains(&c) && at_boundary {
            flush_sentence(&mut current, &mut sentences);
        }
    }
    flush_sentence(&mut current, &mut sentences);
    sentences
}

fn flush_sentence(current: &mut String, sentences: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

/// Number of `\w+` tokens, the unit translation quotas are counted in.
pub fn word_count(text: &str) -> usize {
    WORD.find_iter(text).count()
}

fn words(text: &str) -> Vec<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Damped power iteration over a symmetric weighted adjacency matrix.
fn rank(weights: &[Vec<f64>]) -> Vec<f64> {
    let n = weights.len();
    if n == 0 {
        return Vec::new();
    }
    let out_weight: Vec<f64> = weights.iter().map(|row| row.iter().sum()).collect();
    let mut scores = vec![1.0 / n as f64; n];

    for _ in 0..MAX_ITERATIONS {
        let mut next = vec![(1.0 - DAMPING) / n as f64; n];
        for (j, row) in weights.iter().enumerate() {
            if out_weight[j] == 0.0 {
                continue;
            }
            for (i, weight) in row.iter().enumerate() {
                if *weight > 0.0 {
                    next[i] += DAMPING * scores[j] * weight / out_weight[j];
                }
            }
        }
        let delta: f64 = next.iter().zip(&scores).map(|(a, b)| (a - b).abs()).sum();
        scores = next;
        if delta < CONVERGENCE {
            break;
        }
    }
    scores
}

fn sentence_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }
    let common = a.intersection(b).count() as f64;
    common / ((a.len() as f64).ln() + (b.len() as f64).ln())
}

/// Extractive summary keeping `ceil(ratio * sentences)` of the best ranked
/// sentences, in their original order, one per line.
///
/// Returns `None` when the text contains no sentence at all.
pub fn summarize(text: &str, ratio: f64) -> Option<String> {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return None;
    }
    let keep = ((sentences.len() as f64) * ratio.clamp(0.0, 1.0)).ceil().max(1.0) as usize;
    if keep >= sentences.len() {
        return Some(sentences.join("\n"));
    }

    let bags: Vec<HashSet<String>> = sentences
        .iter()
        .map(|s| {
            words(s)
                .into_iter()
                .filter(|w| !STOPWORDS.contains(w.as_str()))
                .collect()
        })
        .collect();
    let weights: Vec<Vec<f64>> = bags
        .iter()
        .enumerate()
        .map(|(i, a)| {
            bags.iter()
                .enumerate()
                .map(|(j, b)| if i == j { 0.0 } else { sentence_similarity(a, b) })
                .collect()
        })
        .collect();
    let scores = rank(&weights);

    let chosen: Vec<usize> = (0..sentences.len())
        .sorted_by(|a, b| scores[*b].total_cmp(&scores[*a]).then(a.cmp(b)))
        .take(keep)
        .sorted()
        .collect();
    Some(chosen.into_iter().map(|i| sentences[i].as_str()).join("\n"))
}

fn is_keyword_candidate(word: &str) -> bool {
    word.chars().count() >= MIN_KEYWORD_CHARS
        && !STOPWORDS.contains(word)
        && !word.chars().all(|c| c.is_numeric())
}

/// The `limit` highest ranked words of `text`, best first.
pub fn keywords(text: &str, limit: usize) -> Vec<String> {
    let tokens: Vec<String> = words(text)
        .into_iter()
        .filter(|w| is_keyword_candidate(w))
        .collect();

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut vocabulary: Vec<&str> = Vec::new();
    for token in &tokens {
        index.entry(token.as_str()).or_insert_with(|| {
            vocabulary.push(token.as_str());
            vocabulary.len() - 1
        });
    }

    let n = vocabulary.len();
    let mut weights = vec![vec![0.0; n]; n];
    for window in tokens.windows(COOCCURRENCE_WINDOW) {
        let a = index[window[0].as_str()];
        let b = index[window[COOCCURRENCE_WINDOW - 1].as_str()];
        if a != b {
            weights[a][b] += 1.0;
            weights[b][a] += 1.0;
        }
    }
    let scores = rank(&weights);

    (0..n)
        .sorted_by(|a, b| scores[*b].total_cmp(&scores[*a]).then(a.cmp(b)))
        .take(limit)
        .map(|i| vocabulary[i].to_string())
        .collect()
}
