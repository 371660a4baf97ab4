//! Keyword and summary derivation from scraped text.
//!
//! Everything here is pure and deterministic: same input, same output. The
//! snippet variants run on search-result blocks, the page variants on whole
//! extracted documents, with slightly stricter token and frequency rules.

use std::collections::HashMap;

/// Stop words for short snippet text.
const SNIPPET_STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
    "our", "out", "day", "get", "has", "him", "his", "how", "man", "new", "now", "old", "see",
    "two", "way", "who", "boy", "did", "its", "let", "put", "say", "she", "too", "use",
];

/// Extended set for full pages, where common filler dominates frequencies.
const PAGE_STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
    "our", "out", "day", "get", "has", "him", "his", "how", "man", "new", "now", "old", "see",
    "two", "way", "who", "boy", "did", "its", "let", "put", "say", "she", "too", "use", "with",
    "have", "this", "will", "your", "from", "they", "know", "want", "been", "good", "much",
    "some", "time", "very", "when", "come", "here", "just", "like", "long", "make", "many",
    "over", "such", "take", "than", "them", "well", "were",
];

pub const SNIPPET_KEYWORD_LIMIT: usize = 5;
pub const PAGE_KEYWORD_LIMIT: usize = 8;

/// Top keywords for a search-result block (title + snippet).
pub fn snippet_keywords(title: &str, snippet: &str) -> Vec<String> {
    rank_keywords(
        &format!("{title} {snippet}"),
        3,
        SNIPPET_STOP_WORDS,
        SNIPPET_KEYWORD_LIMIT,
        1,
    )
}

/// Top keywords for a fetched page. Long pages get a frequency floor of 2
/// so single-occurrence noise does not surface.
pub fn page_keywords(title: &str, content: &str) -> Vec<String> {
    let min_freq = if content.chars().count() > 1000 { 2 } else { 1 };
    rank_keywords(
        &format!("{title} {content}"),
        4,
        PAGE_STOP_WORDS,
        PAGE_KEYWORD_LIMIT,
        min_freq,
    )
}

/// Frequency-ranked tokens: lower-cased, stripped to ascii letters, at least
/// `min_len` long, stop words removed. Descending frequency, ties broken by
/// first occurrence so the ordering is stable.
fn rank_keywords(
    text: &str,
    min_len: usize,
    stop_words: &[&str],
    limit: usize,
    min_freq: usize,
) -> Vec<String> {
    let lower = text.to_lowercase();
    // word -> (count, first-seen index)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut seen = 0usize;
    for raw in lower.split_whitespace() {
        let word: String = raw.chars().filter(|c| c.is_ascii_alphabetic()).collect();
        if word.len() < min_len || stop_words.contains(&word.as_str()) {
            continue;
        }
        let entry = counts.entry(word).or_insert((0, seen));
        entry.0 += 1;
        seen += 1;
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked
        .into_iter()
        .filter(|(_, (count, _))| *count >= min_freq)
        .take(limit)
        .map(|(word, _)| word)
        .collect()
}

pub(crate) fn norm_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Host of a URL with a leading `www.` stripped; used for attribution lines.
pub(crate) fn domain_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| "unknown source".to_string())
}

fn ends_terminal(s: &str) -> bool {
    s.ends_with('.') || s.ends_with('!') || s.ends_with('?')
}

/// Guarantee terminal punctuation: plain period when there is room, ellipsis
/// when the text already sits near the cap.
fn ensure_terminal(mut s: String) -> String {
    if !ends_terminal(&s) {
        if s.chars().count() < 180 {
            s.push('.');
        } else {
            s.push_str("...");
        }
    }
    s
}

fn split_sentences(s: &str) -> Vec<&str> {
    s.split(['.', '!', '?'])
        .filter(|seg| !seg.trim().is_empty())
        .collect()
}

/// Short extractive summary for a search-result block.
///
/// No snippet at all synthesizes an attribution line; short snippets get the
/// title prefixed; long snippets are trimmed to their leading sentences.
pub fn snippet_summary(title: &str, snippet: &str, url: &str) -> String {
    if snippet.trim().is_empty() {
        return ensure_terminal(format!("Content from {}: {}", domain_of(url), title));
    }

    let mut summary = norm_ws(snippet);
    if summary.chars().count() < 50 {
        summary = format!("{title}: {summary}");
    }

    if summary.chars().count() > 200 {
        let sentences = split_sentences(&summary);
        let mut acc = String::new();
        for sentence in &sentences {
            if acc.chars().count() + sentence.chars().count() <= 180 {
                acc.push_str(sentence);
                acc.push('.');
            } else {
                break;
            }
        }
        summary = if acc.chars().count() > 50 {
            acc
        } else {
            format!("{}...", truncate_chars(&summary, 180))
        };
    }

    ensure_terminal(summary)
}

/// Paragraph-scored summary for a fetched page.
///
/// Scores the first few paragraphs on length and sentence count, favors the
/// opening paragraph, and emits the winner's leading sentences. Falls back
/// to a first-words summary when nothing substantial scores.
pub fn page_summary(title: &str, content: &str, url: &str) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() < 50 {
        return ensure_terminal(format!("Content from {}: {}", domain_of(url), title));
    }

    let paragraphs: Vec<&str> = trimmed
        .split("\n\n")
        .map(str::trim)
        .filter(|p| p.chars().count() > 20)
        .collect();
    if paragraphs.is_empty() {
        return ensure_terminal(first_words_summary(trimmed, title));
    }

    let mut best = paragraphs[0];
    let mut best_score = 0.0f64;
    for (i, paragraph) in paragraphs.iter().take(5).enumerate() {
        let sentence_count = split_sentences(paragraph)
            .iter()
            .filter(|s| s.trim().chars().count() > 10)
            .count();
        let length_score = (paragraph.chars().count() as f64 / 200.0).min(1.0);
        let sentence_score = (sentence_count as f64 / 3.0).min(1.0);
        let position = if i == 0 { 1.0 } else { 0.8 };

        let score = (length_score + sentence_score) * position;
        if score > best_score && paragraph.chars().count() > 80 {
            best_score = score;
            best = paragraph;
        }
    }

    let mut summary = String::new();
    for sentence in split_sentences(best).iter().take(3) {
        let sentence = sentence.trim();
        if summary.chars().count() + sentence.chars().count() <= 300 {
            summary.push_str(sentence);
            summary.push_str(". ");
        } else {
            break;
        }
    }
    let summary = summary.trim().to_string();

    if summary.chars().count() < 80 {
        return ensure_terminal(first_words_summary(trimmed, title));
    }
    ensure_terminal(summary)
}

fn first_words_summary(content: &str, title: &str) -> String {
    let mut out = content
        .split_whitespace()
        .take(50)
        .collect::<Vec<_>>()
        .join(" ");
    if out.chars().count() < 100 {
        out = format!("{title}: {out}");
    }

    let out = out.trim_end_matches(['.', '!', '?']).to_string();
    if out.chars().count() > 200 {
        format!("{}...", truncate_chars(&out, 197))
    } else {
        format!("{out}.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn keywords_rank_by_frequency_then_first_seen() {
        let kws = snippet_keywords("rust rust rust", "memory memory safety ownership");
        assert_eq!(kws[0], "rust");
        assert_eq!(kws[1], "memory");
        // "safety" and "ownership" both occur once; first-seen wins.
        assert_eq!(kws[2], "safety");
        assert_eq!(kws[3], "ownership");
    }

    #[test]
    fn keywords_strip_punctuation_and_stop_words() {
        let kws = snippet_keywords("The Rust, Book!", "and you can borrow; borrow-checker");
        assert!(kws.contains(&"rust".to_string()));
        assert!(kws.contains(&"borrow".to_string()));
        assert!(!kws.iter().any(|k| k == "the" || k == "and" || k == "you" || k == "can"));
    }

    #[test]
    fn snippet_keywords_cap_at_five() {
        let kws = snippet_keywords(
            "alpha bravo charlie delta echo foxtrot golf",
            "hotel india juliett kilo",
        );
        assert_eq!(kws.len(), SNIPPET_KEYWORD_LIMIT);
    }

    #[test]
    fn page_keywords_apply_frequency_floor_on_long_content() {
        let mut content = "platform platform platform ".to_string();
        for a in 'a'..='z' {
            for b in 'a'..='z' {
                content.push_str(&format!("once{a}{b}{a}x "));
            }
        }
        assert!(content.chars().count() > 1000);
        // Tokens occurring once are below the floor on long pages.
        assert_eq!(page_keywords("", &content), vec!["platform".to_string()]);
    }

    #[test]
    fn short_pages_keep_single_occurrence_keywords() {
        let kws = page_keywords("Compact article", "about distributed consensus");
        assert!(kws.contains(&"distributed".to_string()));
        assert!(kws.contains(&"consensus".to_string()));
    }

    #[test]
    fn empty_snippet_synthesizes_attribution_summary() {
        let s = snippet_summary("The Rust Book", "", "https://www.rust-lang.org/learn");
        assert_eq!(s, "Content from rust-lang.org: The Rust Book.");
    }

    #[test]
    fn short_snippet_gets_title_prefix() {
        let s = snippet_summary("Rust", "a systems language", "https://example.com");
        assert!(s.starts_with("Rust: a systems language"));
        assert!(s.ends_with('.'));
    }

    #[test]
    fn long_snippet_is_trimmed_to_leading_sentences() {
        let snippet = "Rust is a systems programming language. It guarantees memory safety \
                       without garbage collection. The borrow checker enforces ownership rules \
                       at compile time. Many large projects have adopted it for critical \
                       infrastructure because of these properties and its modern tooling story.";
        let s = snippet_summary("Rust", snippet, "https://example.com");
        assert!(s.chars().count() <= 200, "summary too long: {} chars", s.chars().count());
        assert!(s.ends_with('.') || s.ends_with("..."));
    }

    #[test]
    fn page_summary_prefers_substantial_paragraph() {
        let content = "Short intro line here, over twenty chars.\n\n\
            The second paragraph carries the substance of the page. It has several \
            real sentences to score well. It is comfortably longer than the eighty \
            character minimum required for selection.";
        let s = page_summary("Doc", content, "https://example.com");
        assert!(s.contains("second paragraph"), "got: {s}");
        assert!(s.ends_with('.'));
    }

    #[test]
    fn page_summary_falls_back_to_first_words_when_sentences_are_thin() {
        let content = "word ".repeat(120);
        let s = page_summary("Listicle", &content, "https://example.com");
        assert!(s.ends_with('.') || s.ends_with("..."));
        assert!(s.chars().count() <= 203);
    }

    #[test]
    fn tiny_content_synthesizes_attribution_summary() {
        let s = page_summary("Stub", "n/a", "https://docs.example.com/x");
        assert_eq!(s, "Content from docs.example.com: Stub.");
    }

    #[test]
    fn domain_of_handles_bad_urls() {
        assert_eq!(domain_of("https://www.example.com/a/b"), "example.com");
        assert_eq!(domain_of("not a url"), "unknown source");
    }

    proptest! {
        #[test]
        fn keywords_are_lowercase_alpha_and_bounded(text in ".{0,400}") {
            let kws = snippet_keywords(&text, &text);
            prop_assert!(kws.len() <= SNIPPET_KEYWORD_LIMIT);
            for k in &kws {
                prop_assert!(k.len() >= 3);
                prop_assert!(k.chars().all(|c| c.is_ascii_lowercase()));
                prop_assert!(!SNIPPET_STOP_WORDS.contains(&k.as_str()));
            }
        }

        #[test]
        fn keyword_extraction_is_order_stable(text in ".{0,400}") {
            prop_assert_eq!(
                snippet_keywords(&text, ""),
                snippet_keywords(&text, "")
            );
        }

        #[test]
        fn summaries_always_end_in_terminal_punctuation(
            title in ".{0,80}",
            snippet in ".{0,600}",
        ) {
            let s = snippet_summary(&title, &snippet, "https://example.com");
            prop_assert!(
                s.ends_with('.') || s.ends_with('!') || s.ends_with('?'),
                "summary missing terminal punctuation: {:?}", s
            );
        }
    }
}
